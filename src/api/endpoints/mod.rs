//! API endpoint handlers, one module per resource.

pub mod admin;
pub mod appointments;
pub mod auth;
pub mod catalog;
pub mod health;
pub mod profile;
