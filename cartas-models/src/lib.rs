//! Cartas Models - DTOs exchanged with the backend and the client storage.
//!
//! The backend owns every record; the client treats them as plain data and
//! only keeps small key-value state (token, usage counters, onboarding and
//! banner flags) in a SQLite-backed store with `local` and `session` scopes.

pub mod models;
pub mod storage;
pub mod schema;
pub mod migrations;

// Re-export key types
pub use models::catalog::{MessageFormat, Occasion, Relationship, Tone};
pub use models::contact::{Contact, Feedback, HistoryEntry};
pub use models::favorite::FavoriteItem;
pub use models::generation::{GeneratedMessage, GenerationPayload, GiftRecommendation, GuardianPrompt};
pub use models::plan::{PlanLevel, PlanStrategy};
pub use models::reminder::Reminder;
pub use models::user::User;
pub use storage::{Scope, Storage};
