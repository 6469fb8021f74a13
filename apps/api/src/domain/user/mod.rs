// User domain module
// Value objects shared by registration, login and administration

pub mod value_objects;

pub use value_objects::{Email, Role, Username};
