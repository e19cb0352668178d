//! Generator session: one conversation of generated messages.
//!
//! A generation runs validation, plan gating, the guest rapid-click delay and
//! prompt assembly, then streams the backend response through a
//! [`StreamExtractor`], reporting every intermediate display value in chunk
//! order. Only one generation may run at a time per session.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use cartas_api::{GenerateRequest, GenerationBackend};
use cartas_core::constants::{
    MAX_EXTRA_CONTEXT_LEN, MAX_RECIPIENT_NAME_LEN, NETWORK_ERROR_MESSAGE, TYPING_PLACEHOLDER,
};
use cartas_core::error::{CtError, CtResult};
use cartas_models::{
    Contact, GiftRecommendation, MessageFormat, Occasion, PlanLevel, Relationship, Tone,
};

use crate::event_bus::{AppEvent, EventBus};
use crate::extractor::{ExtractionSource, StreamExtractor};
use crate::guardian::{build_guardian_prompt, GuardianInput};
use crate::plans::{PlanGate, PlanLimits, UpsellTrigger, UsageTracker};

/// What the user filled in.
#[derive(Debug, Clone)]
pub struct GenerationForm {
    pub occasion: Option<Occasion>,
    pub tone: Tone,
    pub relationship: Option<Relationship>,
    pub format: MessageFormat,
    pub recipient_name: String,
    pub extra_context: String,
    /// Overrides the configured default country.
    pub country: Option<String>,
    pub contact: Option<Contact>,
}

impl Default for GenerationForm {
    fn default() -> Self {
        Self {
            occasion: None,
            tone: Tone::Heartfelt,
            relationship: None,
            format: MessageFormat::Message,
            recipient_name: String::new(),
            extra_context: String::new(),
            country: None,
            contact: None,
        }
    }
}

impl GenerationForm {
    /// One Spanish message per failing field; empty when the form is valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.occasion.is_none() {
            errors.push("Elige una ocasión.".to_string());
        }
        if self.recipient_name.trim().chars().count() > MAX_RECIPIENT_NAME_LEN {
            errors.push(format!(
                "El nombre no puede superar los {MAX_RECIPIENT_NAME_LEN} caracteres."
            ));
        }
        if self.extra_context.trim().chars().count() > MAX_EXTRA_CONTEXT_LEN {
            errors.push(format!(
                "El contexto no puede superar los {MAX_EXTRA_CONTEXT_LEN} caracteres."
            ));
        }
        errors
    }

    fn summary(&self, occasion: Occasion) -> String {
        let mut s = format!("{} · {} · {}", occasion.label(), self.tone.label(), self.format.label());
        let name = self.recipient_name.trim();
        if !name.is_empty() {
            s.push_str(&format!(" · para {name}"));
        } else if let Some(c) = &self.contact {
            s.push_str(&format!(" · para {}", c.name));
        }
        s
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    Sent,
    Streaming,
    Done,
    Error,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub id: String,
    pub role: Role,
    pub content: String,
    pub status: MessageStatus,
    pub gift_recommendations: Vec<GiftRecommendation>,
    pub guardian_insight: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ChatMessage {
    fn new(role: Role, content: String, status: MessageStatus) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            content,
            status,
            gift_recommendations: Vec::new(),
            guardian_insight: None,
            created_at: Utc::now(),
        }
    }
}

/// Clears the loading flag however the generation ends.
struct LoadingGuard<'a>(&'a AtomicBool);

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

pub struct GeneratorSession<B: GenerationBackend> {
    backend: Arc<B>,
    usage: UsageTracker,
    bus: EventBus,
    plan: PlanLevel,
    default_country: String,
    messages: Mutex<Vec<ChatMessage>>,
    loading: AtomicBool,
    rng: Mutex<StdRng>,
}

impl<B: GenerationBackend> GeneratorSession<B> {
    pub fn new(
        backend: Arc<B>,
        usage: UsageTracker,
        bus: EventBus,
        plan: PlanLevel,
        default_country: impl Into<String>,
    ) -> Self {
        Self {
            backend,
            usage,
            bus,
            plan,
            default_country: default_country.into(),
            messages: Mutex::new(Vec::new()),
            loading: AtomicBool::new(false),
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Use a seeded RNG for the opening-style pick.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Mutex::new(StdRng::seed_from_u64(seed));
        self
    }

    pub fn plan(&self) -> PlanLevel {
        self.plan
    }

    pub fn set_plan(&mut self, plan: PlanLevel) {
        self.plan = plan;
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    pub fn messages(&self) -> Vec<ChatMessage> {
        self.lock_messages().clone()
    }

    pub fn clear(&self) {
        self.lock_messages().clear();
    }

    fn lock_messages(&self) -> std::sync::MutexGuard<'_, Vec<ChatMessage>> {
        self.messages.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Apply `f` to the message with `id` and return a copy of the result.
    fn update_message(&self, id: &str, f: impl FnOnce(&mut ChatMessage)) -> Option<ChatMessage> {
        let mut messages = self.lock_messages();
        let msg = messages.iter_mut().find(|m| m.id == id)?;
        f(msg);
        Some(msg.clone())
    }

    /// Assemble the request the backend would receive for `form`.
    pub fn build_request(&self, form: &GenerationForm) -> CtResult<GenerateRequest> {
        let occasion = form
            .occasion
            .ok_or_else(|| CtError::Validation(form.validate()))?;
        let limits = PlanLimits::for_level(self.plan);

        let country = form
            .country
            .clone()
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| self.default_country.clone());

        let name = form.recipient_name.trim();
        let input = GuardianInput {
            relationship: form.relationship,
            country: limits.regional_adaptation.then_some(country.as_str()),
            recipient_name: (!name.is_empty()).then_some(name),
            contact: form.contact.as_ref(),
            ..GuardianInput::new(occasion, form.tone, form.format)
        };
        let guardian = {
            let mut rng = self.rng.lock().unwrap_or_else(|p| p.into_inner());
            build_guardian_prompt(&input, &mut *rng)
        };

        let extra = form.extra_context.trim();
        Ok(GenerateRequest {
            occasion,
            tone: form.tone,
            relationship: form
                .relationship
                .or_else(|| form.contact.as_ref().and_then(|c| c.relationship))
                .unwrap_or(Relationship::Other),
            format: form.format,
            country,
            recipient_name: (!name.is_empty()).then(|| name.to_string()),
            extra_context: (!extra.is_empty()).then(|| extra.to_string()),
            plan_level: self.plan,
            contact_id: form.contact.as_ref().and_then(|c| c.id.clone()),
            guardian,
        })
    }

    fn emit_upsell(&self, trigger: &str) {
        let trigger = UpsellTrigger::from_key(trigger);
        info!("upsell triggered: {trigger}");
        self.bus.emit(AppEvent::UpsellTriggered {
            trigger: trigger.key().to_string(),
            message: trigger.message().to_string(),
        });
    }

    /// Run one generation. `on_update` sees the assistant message after every
    /// chunk and once more when it is final.
    pub async fn generate<F>(&self, form: &GenerationForm, mut on_update: F) -> CtResult<ChatMessage>
    where
        F: FnMut(&ChatMessage) + Send,
    {
        let errors = form.validate();
        if !errors.is_empty() {
            debug!("generation form invalid: {errors:?}");
            return Err(CtError::Validation(errors));
        }
        let Some(occasion) = form.occasion else {
            return Err(CtError::Validation(vec!["Elige una ocasión.".to_string()]));
        };

        if self
            .loading
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(CtError::GenerationInProgress);
        }
        let _guard = LoadingGuard(&self.loading);

        let today = self.usage.today_count()?;
        if let Err(e) = PlanGate::check_generation(self.plan, occasion, form.tone, form.format, today) {
            if let Some(trigger) = e.upsell_trigger() {
                self.emit_upsell(trigger);
            }
            return Err(e);
        }

        if let Some(delay) = self
            .usage
            .rapid_click_delay(self.plan, Utc::now().timestamp_millis())?
        {
            tokio::time::sleep(delay).await;
        }

        let request = self.build_request(form)?;
        self.usage.record_request()?;

        let user_msg = ChatMessage::new(Role::User, form.summary(occasion), MessageStatus::Sent);
        let assistant = ChatMessage::new(
            Role::Assistant,
            TYPING_PLACEHOLDER.to_string(),
            MessageStatus::Streaming,
        );
        let assistant_id = assistant.id.clone();
        {
            let mut messages = self.lock_messages();
            messages.push(user_msg);
            messages.push(assistant);
        }
        self.bus.emit(AppEvent::GenerationStarted {
            message_id: assistant_id.clone(),
        });
        info!(
            "generating {} / {} / {} for plan {}",
            occasion.id(),
            form.tone.id(),
            form.format.id(),
            self.plan
        );

        let mut extractor = StreamExtractor::new();
        let streamed = {
            let mut on_chunk = |chunk: &str| {
                let display = extractor.push(chunk);
                let chunk_index = extractor.chunk_count();
                if let Some(msg) = self.update_message(&assistant_id, |m| m.content = display.clone()) {
                    on_update(&msg);
                }
                self.bus.emit(AppEvent::GenerationProgress {
                    message_id: assistant_id.clone(),
                    display,
                    chunk_index,
                });
            };
            self.backend.stream_generation(&request, &mut on_chunk).await
        };

        match streamed {
            Ok(()) => {
                let outcome = extractor.finish(self.plan);
                if outcome.source != ExtractionSource::Json {
                    warn!("generation finished via {:?}", outcome.source);
                }
                let gifts = if PlanLimits::for_level(self.plan).gift_recommendations {
                    outcome.gift_recommendations
                } else {
                    Vec::new()
                };
                let final_msg = self
                    .update_message(&assistant_id, |m| {
                        m.content = outcome.content.clone();
                        m.status = MessageStatus::Done;
                        m.gift_recommendations = gifts;
                        m.guardian_insight = outcome.guardian_insight.clone();
                    })
                    .ok_or_else(|| CtError::Internal("assistant message vanished".into()))?;
                on_update(&final_msg);
                self.bus.emit(AppEvent::GenerationFinished {
                    message_id: assistant_id,
                    content: final_msg.content.clone(),
                });
                Ok(final_msg)
            }
            Err(e) => {
                warn!("generation failed: {e}");
                if let Some(msg) = self.update_message(&assistant_id, |m| {
                    m.content = NETWORK_ERROR_MESSAGE.to_string();
                    m.status = MessageStatus::Error;
                }) {
                    on_update(&msg);
                }
                self.bus.emit(AppEvent::GenerationFailed {
                    message_id: assistant_id,
                    error: e.to_string(),
                });
                if let Some(trigger) = e.upsell_trigger() {
                    self.emit_upsell(trigger);
                }
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use cartas_core::config::GenerationConfig;
    use cartas_core::constants::GENERATION_FALLBACK_MESSAGE;
    use cartas_models::Storage;

    struct ScriptedBackend {
        chunks: Vec<String>,
        fail: Option<fn() -> CtError>,
    }

    #[async_trait]
    impl GenerationBackend for ScriptedBackend {
        async fn stream_generation(
            &self,
            _request: &GenerateRequest,
            on_chunk: &mut (dyn for<'a> FnMut(&'a str) + Send),
        ) -> CtResult<()> {
            for c in &self.chunks {
                on_chunk(c);
            }
            match self.fail {
                Some(make) => Err(make()),
                None => Ok(()),
            }
        }
    }

    fn session(chunks: &[&str], plan: PlanLevel, fail: Option<fn() -> CtError>) -> GeneratorSession<ScriptedBackend> {
        let storage = Storage::open_in_memory().unwrap();
        let config = GenerationConfig {
            rapid_click_window_ms: 0,
            ..GenerationConfig::default()
        };
        let backend = ScriptedBackend {
            chunks: chunks.iter().map(|s| s.to_string()).collect(),
            fail,
        };
        GeneratorSession::new(
            Arc::new(backend),
            UsageTracker::new(storage, &config),
            EventBus::new(64),
            plan,
            "MX",
        )
        .with_seed(3)
    }

    fn form() -> GenerationForm {
        GenerationForm {
            occasion: Some(Occasion::Birthday),
            tone: Tone::Friendly,
            recipient_name: "Lucía".into(),
            ..GenerationForm::default()
        }
    }

    #[tokio::test]
    async fn test_streams_in_order_and_finishes() {
        let s = session(
            &[r#"{"selected_strategy":"x","gen"#, r#"erated_messages":[{"content":"Hola"#, r#" Lucía"}]}"#],
            PlanLevel::Freemium,
            None,
        );
        let mut seen = Vec::new();
        let msg = s.generate(&form(), |m| seen.push(m.content.clone())).await.unwrap();

        assert_eq!(seen, vec!["Escribiendo...", "Escribiendo...", "Hola Lucía", "Hola Lucía"]);
        assert_eq!(msg.status, MessageStatus::Done);
        assert_eq!(s.messages().len(), 2);
        assert!(!s.is_loading());
    }

    #[tokio::test]
    async fn test_empty_stream_ends_with_fallback_not_network_error() {
        let s = session(&[], PlanLevel::Freemium, None);
        let msg = s.generate(&form(), |_| {}).await.unwrap();
        assert_eq!(msg.status, MessageStatus::Done);
        assert_eq!(msg.content, GENERATION_FALLBACK_MESSAGE);
        assert_ne!(msg.content, NETWORK_ERROR_MESSAGE);
    }

    #[tokio::test]
    async fn test_validation_errors_returned_not_thrown() {
        let s = session(&[], PlanLevel::Premium, None);
        let bad = GenerationForm {
            occasion: None,
            recipient_name: "x".repeat(61),
            ..GenerationForm::default()
        };
        match s.generate(&bad, |_| {}).await {
            Err(CtError::Validation(errors)) => assert_eq!(errors.len(), 2),
            other => panic!("unexpected {other:?}"),
        }
        assert!(s.messages().is_empty());
    }

    #[tokio::test]
    async fn test_premium_tone_blocked_for_freemium() {
        let s = session(&["hola"], PlanLevel::Freemium, None);
        let mut rx = s.bus.subscribe();
        let f = GenerationForm {
            tone: Tone::Poetic,
            ..form()
        };
        let err = s.generate(&f, |_| {}).await.unwrap_err();
        assert_eq!(err.upsell_trigger(), Some("premium_tone"));
        match rx.recv().await.unwrap() {
            AppEvent::UpsellTriggered { trigger, .. } => assert_eq!(trigger, "premium_tone"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_network_failure_marks_message() {
        let s = session(&["{\"gen"], PlanLevel::Freemium, Some(|| CtError::Http("reset".into())));
        let err = s.generate(&form(), |_| {}).await.unwrap_err();
        assert!(err.is_network());
        let messages = s.messages();
        assert_eq!(messages[1].status, MessageStatus::Error);
        assert_eq!(messages[1].content, NETWORK_ERROR_MESSAGE);
        assert!(!s.is_loading());
    }

    #[tokio::test]
    async fn test_gifts_stripped_below_premium() {
        let body = r#"{"generated_messages":[{"content":"Hola"}],"gift_recommendations":[{"title":"Flores"}]}"#;
        let free = session(&[body], PlanLevel::Freemium, None);
        assert!(free.generate(&form(), |_| {}).await.unwrap().gift_recommendations.is_empty());

        let premium = session(&[body], PlanLevel::Premium, None);
        let msg = premium.generate(&form(), |_| {}).await.unwrap();
        assert_eq!(msg.gift_recommendations.len(), 1);
    }

    #[test]
    fn test_request_regional_only_for_premium() {
        let free = session(&[], PlanLevel::Freemium, None);
        let req = free.build_request(&form()).unwrap();
        assert_eq!(req.country, "MX");
        assert!(!req.guardian.relationship_context.contains("México"));

        let premium = session(&[], PlanLevel::Premium, None);
        let req = premium.build_request(&form()).unwrap();
        assert!(req.guardian.relationship_context.contains("México"));
        assert_eq!(req.recipient_name.as_deref(), Some("Lucía"));
    }
}
