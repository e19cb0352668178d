//! Streaming generation endpoint (`POST /api/generate`).
//!
//! The backend writes the generated document as a plain chunked text body.
//! Chunks are decoded incrementally and handed to the caller in arrival
//! order. The request carries no timeout and is not cancellable.

use async_trait::async_trait;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use cartas_core::constants::paths;
use cartas_core::error::CtResult;
use cartas_models::{GuardianPrompt, MessageFormat, Occasion, PlanLevel, Relationship, Tone};

use crate::client::ApiClient;
use crate::decode::Utf8ChunkDecoder;

/// Body of a generation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub occasion: Occasion,
    pub tone: Tone,
    pub relationship: Relationship,
    pub format: MessageFormat,
    pub country: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra_context: Option<String>,
    pub plan_level: PlanLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_id: Option<String>,
    /// Personalization blocks, flattened into the body.
    #[serde(flatten)]
    pub guardian: GuardianPrompt,
}

/// Anything that can stream a generation.
///
/// `on_chunk` is called once per decoded text chunk, strictly in order.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    async fn stream_generation(
        &self,
        request: &GenerateRequest,
        on_chunk: &mut (dyn for<'a> FnMut(&'a str) + Send),
    ) -> CtResult<()>;
}

#[async_trait]
impl GenerationBackend for ApiClient {
    async fn stream_generation(
        &self,
        request: &GenerateRequest,
        on_chunk: &mut (dyn for<'a> FnMut(&'a str) + Send),
    ) -> CtResult<()> {
        debug!(
            "POST {} occasion={} tone={} plan={}",
            paths::GENERATE,
            request.occasion.id(),
            request.tone.id(),
            request.plan_level
        );
        let builder = self
            .build_request(Method::POST, paths::GENERATE, None)
            .await
            .json(request);
        let mut response = ApiClient::send(builder).await?;

        let mut decoder = Utf8ChunkDecoder::new();
        let mut chunks = 0usize;
        let mut bytes = 0usize;
        while let Some(chunk) = response.chunk().await.map_err(ApiClient::classify_error)? {
            bytes += chunk.len();
            let text = decoder.decode(&chunk);
            if !text.is_empty() {
                chunks += 1;
                on_chunk(&text);
            }
        }
        let tail = decoder.finish();
        if !tail.is_empty() {
            chunks += 1;
            on_chunk(&tail);
        }

        if bytes == 0 {
            warn!("generation stream completed with an empty body");
        }
        info!("generation stream finished: {chunks} chunk(s), {bytes} byte(s)");
        Ok(())
    }
}
