//! Cartas API - HTTP client for the Cartas backend.
//!
//! Typed access to every backend endpoint group (auth, contacts, favorites,
//! reminders, plans, checkout/payments) plus the streamed generation call.
//! Requests carry `Authorization: Bearer <token>` once a token is set; error
//! bodies of the form `{ error | message, upsell? }` become `CtError::Api`.
//! Nothing is retried automatically.

pub mod client;
pub mod decode;
pub mod endpoints;
pub mod response;

// Re-export key types
pub use client::ApiClient;
pub use decode::Utf8ChunkDecoder;
pub use endpoints::auth::{AuthSession, RegisterParams};
pub use endpoints::generate::{GenerateRequest, GenerationBackend};
pub use endpoints::payments::{CheckoutSession, MercadoPagoPreference, PaymentStatus};
pub use response::{ErrorBody, ListResponse};
