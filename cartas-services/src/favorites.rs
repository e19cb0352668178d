//! Favorite messages.

use tokio::sync::RwLock;
use tracing::info;

use cartas_api::ApiClient;
use cartas_core::error::{CtError, CtResult};
use cartas_models::FavoriteItem;

use crate::auth::CurrentUser;
use crate::event_bus::{AppEvent, EventBus};
use crate::plans::PlanGate;
use crate::service::{Service, ServiceState};

pub struct FavoriteService {
    state: ServiceState,
    api: ApiClient,
    user: CurrentUser,
    event_bus: EventBus,
    cache: RwLock<Vec<FavoriteItem>>,
}

impl FavoriteService {
    pub fn new(api: ApiClient, user: CurrentUser, event_bus: EventBus) -> Self {
        Self {
            state: ServiceState::Created,
            api,
            user,
            event_bus,
            cache: RwLock::new(Vec::new()),
        }
    }

    pub async fn refresh(&self) -> CtResult<Vec<FavoriteItem>> {
        self.user.require().await?;
        let items = self.api.get_favorites().await?;
        info!("loaded {} favorite(s)", items.len());
        *self.cache.write().await = items.clone();
        self.emit_count().await;
        Ok(items)
    }

    pub async fn list(&self) -> Vec<FavoriteItem> {
        self.cache.read().await.clone()
    }

    pub async fn is_favorite(&self, content: &str) -> bool {
        self.cache.read().await.iter().any(|f| f.same_content(content))
    }

    /// Save a message. Saving the same text twice returns the existing entry.
    pub async fn add(&self, item: FavoriteItem) -> CtResult<FavoriteItem> {
        if item.content.trim().is_empty() {
            return Err(CtError::Validation(vec!["No hay mensaje para guardar.".to_string()]));
        }
        if let Some(existing) = self
            .cache
            .read()
            .await
            .iter()
            .find(|f| f.same_content(&item.content))
        {
            return Ok(existing.clone());
        }

        let plan = self.user.plan().await;
        let current = self.cache.read().await.len();
        PlanGate::check_favorite_slot(plan, current)?;

        let saved = self.api.add_favorite(&item).await?;
        self.cache.write().await.insert(0, saved.clone());
        self.emit_count().await;
        Ok(saved)
    }

    pub async fn remove(&self, id: &str) -> CtResult<()> {
        self.api.remove_favorite(id).await?;
        self.cache
            .write()
            .await
            .retain(|f| f.id.as_deref() != Some(id));
        self.emit_count().await;
        Ok(())
    }

    async fn emit_count(&self) {
        let count = self.cache.read().await.len();
        self.event_bus.emit(AppEvent::FavoritesUpdated { count });
    }
}

impl Service for FavoriteService {
    fn name(&self) -> &str {
        "favorite"
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
