//! Service registry: builds the shared infrastructure (storage, API client,
//! event bus, current user) once and wires every service to it.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{error, info};

use cartas_api::ApiClient;
use cartas_core::config::{AppConfig, ConfigHandle};
use cartas_core::error::{CtError, CtResult};
use cartas_models::Storage;

use crate::auth::{AuthService, CurrentUser};
use crate::checkout::CheckoutService;
use crate::contacts::ContactService;
use crate::event_bus::EventBus;
use crate::favorites::FavoriteService;
use crate::generator::GeneratorSession;
use crate::notification::NotificationService;
use crate::offers::OfferService;
use crate::onboarding::OnboardingService;
use crate::plans::UsageTracker;
use crate::reminders::ReminderService;
use crate::service::{Service, ServiceState};

type Shared<T> = Arc<RwLock<T>>;

fn shared<T>(value: T) -> Shared<T> {
    Arc::new(RwLock::new(value))
}

pub struct ServiceRegistry {
    pub config: ConfigHandle,
    pub storage: Storage,
    pub api: ApiClient,
    pub event_bus: EventBus,
    pub user: CurrentUser,
    pub auth: Shared<AuthService>,
    pub contacts: Shared<ContactService>,
    pub favorites: Shared<FavoriteService>,
    pub reminders: Shared<ReminderService>,
    pub onboarding: Shared<OnboardingService>,
    snapshot: AppConfig,
}

impl ServiceRegistry {
    /// Open storage at the configured path and wire all services.
    pub fn new(config: AppConfig) -> CtResult<Self> {
        let path = config.effective_storage_path()?;
        let storage = Storage::open(&path, &config.storage)?;
        Self::with_storage(config, storage)
    }

    /// Wire all services on top of an existing store.
    pub fn with_storage(config: AppConfig, storage: Storage) -> CtResult<Self> {
        let api = ApiClient::new(&config.api)?;
        let event_bus = EventBus::new(256);
        let user = CurrentUser::new();

        let auth = AuthService::new(api.clone(), storage.clone(), event_bus.clone(), user.clone());
        let contacts = ContactService::new(api.clone(), user.clone(), event_bus.clone());
        let favorites = FavoriteService::new(api.clone(), user.clone(), event_bus.clone());
        let reminders = ReminderService::new(
            api.clone(),
            user.clone(),
            storage.clone(),
            event_bus.clone(),
            NotificationService::new(config.notifications.enabled),
        );
        let onboarding = OnboardingService::new(storage.clone());

        Ok(Self {
            config: ConfigHandle::new(config.clone()),
            storage,
            api,
            event_bus,
            user,
            auth: shared(auth),
            contacts: shared(contacts),
            favorites: shared(favorites),
            reminders: shared(reminders),
            onboarding: shared(onboarding),
            snapshot: config,
        })
    }

    /// Services with a lifecycle, in initialization order.
    fn lifecycle(&self) -> Vec<Arc<RwLock<dyn Service>>> {
        vec![
            self.auth.clone(),
            self.contacts.clone(),
            self.favorites.clone(),
            self.reminders.clone(),
            self.onboarding.clone(),
        ]
    }

    pub async fn init_all(&self) -> CtResult<()> {
        for service in self.lifecycle() {
            let mut svc = service.write().await;
            let name = svc.name().to_string();
            if let Err(e) = svc.init() {
                error!("failed to initialize service {name}: {e}");
                return Err(CtError::Internal(format!("{name}: {e}")));
            }
        }
        info!("services initialized");
        Ok(())
    }

    /// Shut down in reverse order; failures are logged and skipped.
    pub async fn shutdown_all(&self) {
        for service in self.lifecycle().into_iter().rev() {
            let mut svc = service.write().await;
            if let Err(e) = svc.shutdown() {
                error!("error shutting down service {}: {e}", svc.name());
            }
        }
        info!("services shut down");
    }

    pub async fn health_check(&self) -> Vec<(String, ServiceState, bool)> {
        let mut out = Vec::new();
        for service in self.lifecycle() {
            let svc = service.read().await;
            out.push((svc.name().to_string(), svc.state(), svc.is_healthy()));
        }
        out
    }

    pub fn usage(&self) -> UsageTracker {
        UsageTracker::new(self.storage.clone(), &self.snapshot.generation)
    }

    pub fn offers(&self) -> OfferService {
        OfferService::new(self.storage.clone(), self.event_bus.clone())
    }

    pub fn checkout(&self) -> CheckoutService {
        CheckoutService::new(self.api.clone(), self.user.clone(), self.snapshot.checkout.clone())
    }

    /// A generator session for the current user's plan.
    pub async fn generator(&self) -> GeneratorSession<ApiClient> {
        GeneratorSession::new(
            Arc::new(self.api.clone()),
            self.usage(),
            self.event_bus.clone(),
            self.user.plan().await,
            self.snapshot.generation.default_country.clone(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_init_and_shutdown_all() {
        let registry =
            ServiceRegistry::with_storage(AppConfig::default(), Storage::open_in_memory().unwrap()).unwrap();
        assert!(registry.health_check().await.iter().all(|(_, _, ok)| !ok));

        registry.init_all().await.unwrap();
        let health = registry.health_check().await;
        assert_eq!(health.len(), 5);
        assert!(health.iter().all(|(_, state, ok)| *ok && *state == ServiceState::Running));

        registry.shutdown_all().await;
        assert!(registry.health_check().await.iter().all(|(_, s, _)| *s == ServiceState::Stopped));
    }

    #[tokio::test]
    async fn test_generator_uses_guest_plan_without_login() {
        let registry =
            ServiceRegistry::with_storage(AppConfig::default(), Storage::open_in_memory().unwrap()).unwrap();
        let generator = registry.generator().await;
        assert_eq!(generator.plan(), cartas_models::PlanLevel::Guest);
    }
}
