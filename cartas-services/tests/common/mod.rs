//! Shared test utilities for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use tempfile::TempDir;

use cartas_api::{GenerateRequest, GenerationBackend};
use cartas_core::config::{AppConfig, GenerationConfig, StorageConfig};
use cartas_core::error::{CtError, CtResult};
use cartas_models::{PlanLevel, Storage};
use cartas_services::event_bus::EventBus;
use cartas_services::generator::GeneratorSession;
use cartas_services::plans::UsageTracker;

/// Create a file-backed store with schema and migrations applied.
/// Returns the Storage and the TempDir (must be held alive for the duration of the test).
pub fn create_test_storage() -> (Storage, TempDir) {
    let dir = TempDir::new().expect("failed to create temp dir");
    let path = dir.path().join("cartas.db");
    let storage = Storage::open(&path, &StorageConfig::default()).expect("failed to open test storage");
    (storage, dir)
}

/// Create a default test configuration with notifications off.
pub fn create_test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.notifications.enabled = false;
    config.api.base_url = "http://127.0.0.1:9".into();
    config
}

/// Generation settings without the guest rapid-click delay.
pub fn no_delay_generation_config() -> GenerationConfig {
    GenerationConfig {
        rapid_click_window_ms: 0,
        ..GenerationConfig::default()
    }
}

/// Create an EventBus with a small buffer suitable for tests.
pub fn create_test_event_bus() -> EventBus {
    EventBus::new(64)
}

/// Backend that replays fixed chunks, optionally ending with an error.
pub struct FakeBackend {
    pub chunks: Vec<String>,
    pub fail_with: Option<fn() -> CtError>,
}

impl FakeBackend {
    pub fn new(chunks: Vec<String>) -> Self {
        Self {
            chunks,
            fail_with: None,
        }
    }

    /// The whole body as a single chunk.
    pub fn whole(body: &str) -> Self {
        Self::new(vec![body.to_string()])
    }

    /// The body split into one chunk per character.
    pub fn char_by_char(body: &str) -> Self {
        Self::new(body.chars().map(String::from).collect())
    }
}

#[async_trait]
impl GenerationBackend for FakeBackend {
    async fn stream_generation(
        &self,
        _request: &GenerateRequest,
        on_chunk: &mut (dyn for<'a> FnMut(&'a str) + Send),
    ) -> CtResult<()> {
        for chunk in &self.chunks {
            on_chunk(chunk);
            tokio::task::yield_now().await;
        }
        match self.fail_with {
            Some(make) => Err(make()),
            None => Ok(()),
        }
    }
}

/// A generator session over `backend`, sharing `storage` and `bus`.
pub fn create_generator(
    backend: FakeBackend,
    storage: Storage,
    bus: EventBus,
    plan: PlanLevel,
    config: &GenerationConfig,
) -> GeneratorSession<FakeBackend> {
    GeneratorSession::new(
        Arc::new(backend),
        UsageTracker::new(storage, config),
        bus,
        plan,
        "MX",
    )
    .with_seed(7)
}

/// A complete generation document as the backend streams it.
pub fn sample_payload() -> String {
    serde_json::json!({
        "selected_strategy": "recuerdo compartido",
        "generated_messages": [
            { "tone": "amistoso", "tag": "estándar", "content": "¡Feliz cumpleaños, Lucía!\nQue este año te traiga risas." },
            { "tone": "amistoso", "tag": "premium", "content": "Lucía, hoy celebramos tu luz." }
        ],
        "guardian_insight": "Mencionar la risa funciona bien con amigas.",
        "gift_recommendations": [
            { "title": "Taza personalizada", "description": "Con una foto juntas" }
        ]
    })
    .to_string()
}
