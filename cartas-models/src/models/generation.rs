//! Shape of the document the generation endpoint streams back:
//!
//! ```json
//! { "selected_strategy": "...",
//!   "generated_messages": [ { "tone": "...", "tag": "premium", "content": "..." } ],
//!   "guardian_insight": "...",
//!   "gift_recommendations": [ { "title": "...", "description": "..." } ] }
//! ```
//!
//! Every field is optional on the wire and may be `null`; the model is
//! lenient.

use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationPayload {
    #[serde(default)]
    pub selected_strategy: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub generated_messages: Vec<GeneratedMessage>,
    /// Either a plain string or an object with a text field.
    #[serde(default)]
    pub guardian_insight: Option<serde_json::Value>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub gift_recommendations: Vec<GiftRecommendation>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "WireMessage")]
pub struct GeneratedMessage {
    pub tone: Option<String>,
    /// Variant label such as "premium", "regional" or "estándar".
    pub tag: Option<String>,
    pub content: String,
}

/// A generated message as sent. Several synonymous keys may be filled at
/// once.
#[derive(Deserialize)]
struct WireMessage {
    #[serde(default)]
    tone: Option<String>,
    #[serde(default)]
    tag: Option<String>,
    #[serde(default)]
    label: Option<String>,
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    text: Option<String>,
}

impl From<WireMessage> for GeneratedMessage {
    fn from(wire: WireMessage) -> Self {
        Self {
            tone: wire.tone,
            tag: first_filled([wire.tag, wire.label, wire.kind]),
            content: first_filled([wire.content, wire.message, wire.text]).unwrap_or_default(),
        }
    }
}

/// First present, non-blank value among synonymous keys.
fn first_filled<const N: usize>(fields: [Option<String>; N]) -> Option<String> {
    fields.into_iter().flatten().find(|s| !s.trim().is_empty())
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "WireGift")]
pub struct GiftRecommendation {
    pub title: String,
    pub description: Option<String>,
    pub price_range: Option<String>,
    pub link: Option<String>,
}

#[derive(Deserialize)]
struct WireGift {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    price_range: Option<String>,
    #[serde(default, rename = "priceRange")]
    price_range_camel: Option<String>,
    #[serde(default)]
    link: Option<String>,
    #[serde(default)]
    url: Option<String>,
}

impl From<WireGift> for GiftRecommendation {
    fn from(wire: WireGift) -> Self {
        Self {
            title: first_filled([wire.title, wire.name]).unwrap_or_default(),
            description: wire.description,
            price_range: first_filled([wire.price_range, wire.price_range_camel]),
            link: first_filled([wire.link, wire.url]),
        }
    }
}

/// Instruction blocks the prompt builder produces for the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardianPrompt {
    /// Tone blended with relationship and learned preferences.
    pub tone_instructions: String,
    /// Who the message is for and regional adaptation.
    pub relationship_context: String,
    /// Shape of the text (daily reflection template or format rules).
    pub structure_instructions: String,
    /// Words already used for this contact, to steer away from repetition.
    pub variety_instructions: String,
}

/// `null` reads as the type's default.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl GenerationPayload {
    /// Text of the guardian insight, whatever shape the backend sent.
    pub fn insight_text(&self) -> Option<String> {
        insight_text(self.guardian_insight.as_ref()?)
    }
}

/// Pull readable text out of a guardian insight value.
pub fn insight_text(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        serde_json::Value::Object(map) => ["insight", "message", "text", "summary"]
            .iter()
            .find_map(|k| map.get(*k).and_then(|v| v.as_str()))
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty()),
        _ => None,
    }
}

impl GeneratedMessage {
    /// Lowercased tag with Spanish accents folded, for tag matching.
    pub fn normalized_tag(&self) -> String {
        self.tag
            .as_deref()
            .unwrap_or_default()
            .to_lowercase()
            .chars()
            .map(|c| match c {
                'á' => 'a',
                'é' => 'e',
                'í' => 'i',
                'ó' => 'o',
                'ú' | 'ü' => 'u',
                other => other,
            })
            .collect()
    }
}
