// Grievance domain module
// Aggregate root, lifecycle value objects, domain events and the records
// hanging off a grievance (remarks, feedback, change log)

#![allow(clippy::module_inception)]

pub mod change_log;
pub mod events;
pub mod feedback;
pub mod filter;
pub mod grievance;
pub mod remark;
pub mod value_objects;

// Re-export main types for convenience
pub use change_log::{ChangeLogEntry, NewChangeLog};
pub use events::GrievanceEvent;
pub use feedback::{Feedback, NewFeedback};
pub use filter::{CategoryFilter, GrievanceFilter, Page};
pub use grievance::{Grievance, NewGrievance};
pub use remark::{NewRemark, Remark};
pub use value_objects::{GrievanceStatus, Rating, TrackingId};
