//! Grievance Portal API Library
//!
//! Citizens file grievances, officers work them through their lifecycle and
//! administrators manage users, departments, categories and assignments.
//! This library provides the domain logic, repositories and HTTP layer.

pub mod api;
pub mod auth;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod state;
