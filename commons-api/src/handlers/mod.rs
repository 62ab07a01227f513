//! API request handlers.

pub mod admin;
pub mod health;
pub mod organization;
pub mod payments;
pub mod records;
pub mod session;
