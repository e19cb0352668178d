//! Authentication and the current user.
//!
//! The bearer token lives in local storage under `token` and is loaded into
//! the shared `ApiClient` on restore. Without a user the client runs as a
//! guest.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{info, warn};

use cartas_api::endpoints::auth::RegisterParams;
use cartas_api::ApiClient;
use cartas_core::constants::keys;
use cartas_core::error::{CtError, CtResult};
use cartas_models::{PlanLevel, Scope, Storage, User};

use crate::event_bus::{AppEvent, EventBus};
use crate::service::{Service, ServiceState};

/// Shared handle on the logged-in user. Cheap to clone.
#[derive(Clone, Default)]
pub struct CurrentUser {
    inner: Arc<RwLock<Option<User>>>,
}

impl CurrentUser {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self) -> Option<User> {
        self.inner.read().await.clone()
    }

    pub async fn set(&self, user: Option<User>) {
        *self.inner.write().await = user;
    }

    /// Plan of the current user; guests have no user.
    pub async fn plan(&self) -> PlanLevel {
        self.inner
            .read()
            .await
            .as_ref()
            .map(|u| u.plan_level)
            .unwrap_or(PlanLevel::Guest)
    }

    pub async fn require(&self) -> CtResult<User> {
        self.get().await.ok_or(CtError::NotAuthenticated)
    }
}

pub struct AuthService {
    state: ServiceState,
    api: ApiClient,
    storage: Storage,
    bus: EventBus,
    user: CurrentUser,
}

impl AuthService {
    pub fn new(api: ApiClient, storage: Storage, bus: EventBus, user: CurrentUser) -> Self {
        Self {
            state: ServiceState::Created,
            api,
            storage,
            bus,
            user,
        }
    }

    pub fn current_user(&self) -> &CurrentUser {
        &self.user
    }

    /// Stored token, if any.
    pub fn stored_token(&self) -> CtResult<Option<String>> {
        Ok(self
            .storage
            .get(Scope::Local, keys::TOKEN)?
            .filter(|t| !t.trim().is_empty()))
    }

    /// Load the stored token and fetch the user behind it. A rejected token
    /// is dropped; a network failure keeps it for the next attempt.
    pub async fn restore(&self) -> CtResult<Option<User>> {
        let Some(token) = self.stored_token()? else {
            return Ok(None);
        };
        self.api.set_token(Some(token)).await;

        match self.api.me().await {
            Ok(user) => {
                info!("session restored for {}", user.email);
                self.user.set(Some(user.clone())).await;
                self.emit_changed(Some(&user));
                Ok(Some(user))
            }
            Err(CtError::AuthFailed(reason)) => {
                warn!("stored token rejected: {reason}");
                self.clear_local().await?;
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    pub async fn login(&self, email: &str, password: &str) -> CtResult<User> {
        let email = email.trim();
        let mut errors = Vec::new();
        if !email.contains('@') {
            errors.push("Ingresa un correo válido.".to_string());
        }
        if password.is_empty() {
            errors.push("Ingresa tu contraseña.".to_string());
        }
        if !errors.is_empty() {
            return Err(CtError::Validation(errors));
        }

        let session = self.api.login(email, password).await?;
        self.start_session(session.token, session.user).await
    }

    pub async fn register(&self, params: RegisterParams) -> CtResult<User> {
        let mut errors = Vec::new();
        if params.name.trim().is_empty() {
            errors.push("Ingresa tu nombre.".to_string());
        }
        if !params.email.contains('@') {
            errors.push("Ingresa un correo válido.".to_string());
        }
        if params.password.chars().count() < 8 {
            errors.push("La contraseña debe tener al menos 8 caracteres.".to_string());
        }
        if !errors.is_empty() {
            return Err(CtError::Validation(errors));
        }

        let session = self.api.register(&params).await?;
        self.start_session(session.token, session.user).await
    }

    /// Log out. The server call is best effort; local state is always cleared.
    pub async fn logout(&self) -> CtResult<()> {
        if self.api.has_token().await {
            if let Err(e) = self.api.logout().await {
                warn!("server logout failed, clearing local session anyway: {e}");
            }
        }
        self.clear_local().await?;
        info!("logged out");
        Ok(())
    }

    async fn start_session(&self, token: String, user: User) -> CtResult<User> {
        self.storage.set(Scope::Local, keys::TOKEN, &token)?;
        self.api.set_token(Some(token)).await;
        self.user.set(Some(user.clone())).await;
        info!("logged in as {} ({})", user.email, user.plan_level);
        self.emit_changed(Some(&user));
        Ok(user)
    }

    async fn clear_local(&self) -> CtResult<()> {
        self.storage.remove(Scope::Local, keys::TOKEN)?;
        self.api.set_token(None).await;
        self.user.set(None).await;
        self.emit_changed(None);
        Ok(())
    }

    fn emit_changed(&self, user: Option<&User>) {
        self.bus.emit(AppEvent::AuthChanged {
            logged_in: user.is_some(),
            plan: user
                .map(|u| u.plan_level)
                .unwrap_or(PlanLevel::Guest)
                .to_string(),
        });
    }
}

impl Service for AuthService {
    fn name(&self) -> &str {
        "auth"
    }
    fn state(&self) -> ServiceState {
        self.state
    }
    fn init(&mut self) -> CtResult<()> {
        self.state = ServiceState::Running;
        Ok(())
    }
    fn shutdown(&mut self) -> CtResult<()> {
        self.state = ServiceState::Stopped;
        Ok(())
    }
}
