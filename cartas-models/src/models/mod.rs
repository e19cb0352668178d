//! Entity model definitions.

pub mod catalog;
pub mod contact;
pub mod favorite;
pub mod generation;
pub mod plan;
pub mod reminder;
pub mod user;
