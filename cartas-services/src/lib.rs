//! Cartas Services - Business logic and service layer.
//!
//! This crate provides the service trait, the service registry, and the
//! concrete services behind the message generator:
//! - Streaming extraction (progressive preview, final JSON parse, fallbacks)
//! - Guardian prompt building (tone, relationship, region, contact memory)
//! - Plan limits, upsell triggers, and daily/session usage tracking
//! - Generator sessions (single in-flight request, chat transcript)
//! - Authentication and the current user
//! - Contacts with message history and feedback
//! - Favorites
//! - Reminders with a once-only due check and desktop notifications
//! - Onboarding tours, offer banners, and "new" badges
//! - Checkout through Stripe or MercadoPago
//! - Event bus (typed intra-service communication)

pub mod service;
pub mod registry;
pub mod event_bus;
pub mod extractor;
pub mod guardian;
pub mod plans;
pub mod generator;
pub mod auth;
pub mod contacts;
pub mod favorites;
pub mod reminders;
pub mod notification;
pub mod onboarding;
pub mod offers;
pub mod checkout;

// Re-export key types
pub use service::{Service, ServiceState};
pub use registry::ServiceRegistry;
pub use event_bus::{AppEvent, EventBus};
pub use extractor::{ExtractionOutcome, ExtractionSource, StreamExtractor};
pub use guardian::{build_guardian_prompt, GuardianInput};
pub use plans::{PlanGate, PlanLimits, UpsellTrigger, UsageSummary, UsageTracker};
pub use generator::{ChatMessage, GenerationForm, GeneratorSession, MessageStatus, Role};
pub use auth::{AuthService, CurrentUser};
pub use contacts::ContactService;
pub use favorites::FavoriteService;
pub use reminders::{DueReminder, ReminderService};
pub use notification::NotificationService;
pub use onboarding::{OnboardingService, Tour, TourProgress};
pub use offers::{Offer, OfferService};
pub use checkout::{CheckoutRedirect, CheckoutService, Gateway};
