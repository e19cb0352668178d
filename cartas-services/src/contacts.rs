//! Contact service.
//!
//! Keeps a cached copy of the backend's contact list. The cache changes only
//! after the corresponding network call succeeded.

use tokio::sync::RwLock;
use tracing::{debug, info};

use cartas_api::ApiClient;
use cartas_core::constants::MAX_RECIPIENT_NAME_LEN;
use cartas_core::error::{CtError, CtResult};
use cartas_models::{Contact, Feedback, HistoryEntry};

use crate::auth::CurrentUser;
use crate::event_bus::{AppEvent, EventBus};
use crate::plans::PlanGate;
use crate::service::{Service, ServiceState};

pub struct ContactService {
    state: ServiceState,
    api: ApiClient,
    user: CurrentUser,
    event_bus: EventBus,
    cache: RwLock<Vec<Contact>>,
}

impl ContactService {
    pub fn new(api: ApiClient, user: CurrentUser, event_bus: EventBus) -> Self {
        Self {
            state: ServiceState::Created,
            api,
            user,
            event_bus,
            cache: RwLock::new(Vec::new()),
        }
    }

    /// Reload from the backend.
    pub async fn refresh(&self) -> CtResult<Vec<Contact>> {
        self.user.require().await?;
        let contacts = self.api.get_contacts().await?;
        info!("loaded {} contact(s)", contacts.len());
        *self.cache.write().await = contacts.clone();
        self.emit_count().await;
        Ok(contacts)
    }

    pub async fn list(&self) -> Vec<Contact> {
        self.cache.read().await.clone()
    }

    pub async fn find(&self, id: &str) -> Option<Contact> {
        self.cache
            .read()
            .await
            .iter()
            .find(|c| c.id.as_deref() == Some(id))
            .cloned()
    }

    /// Case-insensitive lookup by name, for the CLI.
    pub async fn find_by_name(&self, name: &str) -> Option<Contact> {
        let needle = name.trim().to_lowercase();
        self.cache
            .read()
            .await
            .iter()
            .find(|c| c.name.trim().to_lowercase() == needle)
            .cloned()
    }

    pub async fn create(&self, contact: Contact) -> CtResult<Contact> {
        validate(&contact)?;
        let plan = self.user.plan().await;
        let current = self.cache.read().await.len();
        PlanGate::check_contact_slot(plan, current)?;

        let created = self.api.create_contact(&contact).await?;
        debug!("contact created: {:?}", created.id);
        self.cache.write().await.push(created.clone());
        self.emit_count().await;
        Ok(created)
    }

    pub async fn update(&self, id: &str, contact: Contact) -> CtResult<Contact> {
        validate(&contact)?;
        let updated = self.api.update_contact(id, &contact).await?;
        {
            let mut cache = self.cache.write().await;
            match cache.iter_mut().find(|c| c.id.as_deref() == Some(id)) {
                Some(slot) => *slot = updated.clone(),
                None => cache.push(updated.clone()),
            }
        }
        self.emit_count().await;
        Ok(updated)
    }

    pub async fn delete(&self, id: &str) -> CtResult<()> {
        self.api.delete_contact(id).await?;
        self.cache
            .write()
            .await
            .retain(|c| c.id.as_deref() != Some(id));
        self.emit_count().await;
        Ok(())
    }

    /// Append a generated message to the contact's history.
    pub async fn record_message(&self, id: &str, entry: HistoryEntry) -> CtResult<Contact> {
        let mut contact = self
            .find(id)
            .await
            .ok_or_else(|| CtError::NotFound(format!("contact {id}")))?;
        contact.message_history.push(entry);
        self.update(id, contact).await
    }

    /// Mark the most recent history entry with `content` as liked/disliked.
    pub async fn record_feedback(&self, id: &str, content: &str, feedback: Feedback) -> CtResult<Contact> {
        let mut contact = self
            .find(id)
            .await
            .ok_or_else(|| CtError::NotFound(format!("contact {id}")))?;
        let entry = contact
            .message_history
            .iter_mut()
            .rev()
            .find(|e| e.content.trim() == content.trim())
            .ok_or_else(|| CtError::NotFound("message not in contact history".into()))?;
        entry.feedback = Some(feedback);
        self.update(id, contact).await
    }

    async fn emit_count(&self) {
        let count = self.cache.read().await.len();
        self.event_bus.emit(AppEvent::ContactsUpdated { count });
    }
}

fn validate(contact: &Contact) -> CtResult<()> {
    let name = contact.name.trim();
    let mut errors = Vec::new();
    if name.is_empty() {
        errors.push("El contacto necesita un nombre.".to_string());
    } else if name.chars().count() > MAX_RECIPIENT_NAME_LEN {
        errors.push(format!(
            "El nombre no puede superar los {MAX_RECIPIENT_NAME_LEN} caracteres."
        ));
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(CtError::Validation(errors))
    }
}

impl Service for ContactService {
    fn name(&self) -> &str {
        "contact"
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

#[cfg(test)]
mod tests {
    use super::*;
    use cartas_core::config::ApiConfig;

    fn service() -> ContactService {
        let api = ApiClient::new(&ApiConfig {
            base_url: "http://127.0.0.1:9".into(),
            ..ApiConfig::default()
        })
        .unwrap();
        ContactService::new(api, CurrentUser::new(), EventBus::default())
    }

    #[tokio::test]
    async fn test_guest_cannot_create() {
        let svc = service();
        let err = svc.create(Contact::new("Ana", None)).await.unwrap_err();
        assert_eq!(err.upsell_trigger(), Some("account_required"));
        assert!(svc.list().await.is_empty());
    }

    #[tokio::test]
    async fn test_empty_name_rejected() {
        let svc = service();
        let err = svc.create(Contact::new("   ", None)).await.unwrap_err();
        assert!(matches!(err, CtError::Validation(_)));
    }

    #[tokio::test]
    async fn test_refresh_requires_login() {
        let svc = service();
        assert!(matches!(svc.refresh().await, Err(CtError::NotAuthenticated)));
    }

    #[tokio::test]
    async fn test_feedback_on_unknown_contact() {
        let svc = service();
        let err = svc.record_feedback("nope", "x", Feedback::Liked).await.unwrap_err();
        assert!(matches!(err, CtError::NotFound(_)));
    }
}
