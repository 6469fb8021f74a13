// Domain layer module exports
// Following Hexagonal Architecture and DDD principles
// Domain is independent of infrastructure concerns

pub mod catalog;
pub mod grievance;
pub mod repositories;
pub mod user;
