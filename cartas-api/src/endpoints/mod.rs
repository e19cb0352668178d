//! API endpoint modules organized by backend route group.

pub mod auth;
pub mod contacts;
pub mod favorites;
pub mod generate;
pub mod payments;
pub mod plans;
pub mod reminders;
