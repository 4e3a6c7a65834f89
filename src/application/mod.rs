//! Application services: public content reads and admin writes.

pub mod admin;
pub mod content;
pub mod error;
pub mod repos;
