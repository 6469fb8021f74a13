// Authentication primitives: JWT issuing/verification and password hashing

pub mod jwt;
pub mod password;
