//! Incremental extraction of the generated message from a streamed body.
//!
//! The backend streams a JSON document (`generated_messages`,
//! `guardian_insight`, `gift_recommendations`, ...) with no guaranteed chunk
//! boundaries, and sometimes plain prose instead. While chunks arrive,
//! [`StreamExtractor::push`] returns a best-effort preview: the value of the
//! first `"content"`/`"message"` key once that value is closed, a typing
//! placeholder while the buffer is still JSON syntax, or the raw text when
//! the buffer carries no JSON markers at all. [`StreamExtractor::finish`]
//! parses the complete buffer and can salvage a value that was cut off.
//!
//! The scan re-runs over the whole accumulator on every chunk. Payloads are
//! small, so the quadratic cost is irrelevant.

use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, warn};

use cartas_core::constants::{GENERATION_FALLBACK_MESSAGE, TYPING_PLACEHOLDER};
use cartas_models::{GeneratedMessage, GenerationPayload, GiftRecommendation, PlanLevel};

lazy_static! {
    // Closed value: closing quote followed by `,`, `}` or `]`.
    static ref CLOSED_CONTENT_VALUE: Regex =
        Regex::new(r#"(?s)"(?:content|message)"\s*:\s*"((?:[^"\\]|\\.)*)"\s*[,}\]]"#).unwrap();
    // Closing quote optional: matches a value that was cut off.
    static ref CONTENT_VALUE: Regex =
        Regex::new(r#"(?s)"(?:content|message)"\s*:\s*"((?:[^"\\]|\\.)*)"#).unwrap();

    static ref OPENING_FENCE: Regex = Regex::new(r"^```[A-Za-z0-9_-]*[ \t]*\r?\n?").unwrap();
    static ref CLOSING_FENCE: Regex = Regex::new(r"\r?\n?[ \t]*```\s*$").unwrap();
}

/// Field names that mark the buffer as JSON even before a brace shows up.
const STRUCTURAL_FIELDS: [&str; 4] = [
    "generated_messages",
    "guardian_insight",
    "gift_recommendations",
    "selected_strategy",
];

/// How the final content was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionSource {
    /// The buffer parsed as a generation document.
    Json,
    /// The buffer did not parse; the content key was found by pattern.
    Regex,
    /// The backend answered with prose.
    PlainText,
    /// Nothing usable; the generic apology was substituted.
    Fallback,
}

/// Final result of a stream.
#[derive(Debug, Clone)]
pub struct ExtractionOutcome {
    pub content: String,
    pub gift_recommendations: Vec<GiftRecommendation>,
    pub guardian_insight: Option<String>,
    pub selected_strategy: Option<String>,
    pub source: ExtractionSource,
}

impl ExtractionOutcome {
    fn text(content: String, source: ExtractionSource) -> Self {
        Self {
            content,
            gift_recommendations: Vec::new(),
            guardian_insight: None,
            selected_strategy: None,
            source,
        }
    }
}

/// Accumulates streamed chunks and derives the text to display.
#[derive(Debug, Default)]
pub struct StreamExtractor {
    buffer: String,
    chunks: usize,
}

impl StreamExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk and return what should be displayed right now.
    pub fn push(&mut self, chunk: &str) -> String {
        self.buffer.push_str(chunk);
        self.chunks += 1;
        preview(&self.buffer)
    }

    /// Current accumulator with leading whitespace removed.
    pub fn buffer(&self) -> &str {
        self.buffer.trim_start()
    }

    /// Number of chunks pushed so far.
    pub fn chunk_count(&self) -> usize {
        self.chunks
    }

    /// Interpret the complete buffer. Never fails: unusable input degrades to
    /// the regex scan, the raw prose, or the generic apology.
    pub fn finish(&self, plan: PlanLevel) -> ExtractionOutcome {
        let text = strip_code_fences(self.buffer.trim());

        if text.is_empty() {
            warn!("generation stream was empty");
            return ExtractionOutcome::text(
                GENERATION_FALLBACK_MESSAGE.to_string(),
                ExtractionSource::Fallback,
            );
        }

        if let Some(payload) = parse_payload(text) {
            if let Some(message) = select_message(&payload.generated_messages, plan) {
                debug!(
                    "extracted message from JSON (tag={:?}, {} gift(s))",
                    message.tag,
                    payload.gift_recommendations.len()
                );
                return ExtractionOutcome {
                    content: message.content.clone(),
                    guardian_insight: payload.insight_text(),
                    selected_strategy: payload.selected_strategy.clone(),
                    gift_recommendations: payload.gift_recommendations,
                    source: ExtractionSource::Json,
                };
            }
        }

        if let Some(content) = extract_content(text).filter(|c| !c.trim().is_empty()) {
            warn!("generation body is not valid JSON, used pattern extraction");
            return ExtractionOutcome::text(content, ExtractionSource::Regex);
        }

        if is_structural(text) {
            warn!("generation body unusable, substituting fallback message");
            return ExtractionOutcome::text(
                GENERATION_FALLBACK_MESSAGE.to_string(),
                ExtractionSource::Fallback,
            );
        }

        ExtractionOutcome::text(text.to_string(), ExtractionSource::PlainText)
    }
}

/// Display text for an accumulated (possibly truncated) buffer.
pub fn preview(buffer: &str) -> String {
    let text = buffer.trim_start();
    if let Some(content) = extract_closed_content(text) {
        return content;
    }
    if is_structural(text) {
        return TYPING_PLACEHOLDER.to_string();
    }
    text.to_string()
}

/// Whether the text carries JSON markers.
pub fn is_structural(text: &str) -> bool {
    text.contains('{') || text.contains('[') || STRUCTURAL_FIELDS.iter().any(|f| text.contains(f))
}

/// Value of the first `"content"` or `"message"` key, unescaped, once the
/// value is closed and followed by `,`, `}` or `]`.
pub fn extract_closed_content(text: &str) -> Option<String> {
    capture_value(&CLOSED_CONTENT_VALUE, text)
}

/// Value of the first `"content"` or `"message"` key, unescaped. The value
/// may be incomplete.
pub fn extract_content(text: &str) -> Option<String> {
    capture_value(&CONTENT_VALUE, text)
}

fn capture_value(pattern: &Regex, text: &str) -> Option<String> {
    pattern
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| unescape_json_fragment(m.as_str()))
}

/// Resolve JSON string escapes in a raw fragment. A trailing escape that is
/// cut off is dropped.
pub fn unescape_json_fragment(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some('/') => out.push('/'),
            Some('b') => out.push('\u{0008}'),
            Some('f') => out.push('\u{000C}'),
            Some('u') => {
                let hex: String = chars.clone().take(4).collect();
                if hex.len() < 4 || !hex.chars().all(|h| h.is_ascii_hexdigit()) {
                    // Cut-off escape at the end of the stream so far.
                    break;
                }
                for _ in 0..4 {
                    chars.next();
                }
                let code = u32::from_str_radix(&hex, 16).unwrap_or(0xFFFD);
                out.push(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER));
            }
            Some(other) => out.push(other),
            None => break,
        }
    }

    out
}

/// Remove surrounding Markdown code fences (```json ... ```).
pub fn strip_code_fences(text: &str) -> &str {
    let mut s = text;
    if let Some(m) = OPENING_FENCE.find(s) {
        s = &s[m.end()..];
    }
    if let Some(m) = CLOSING_FENCE.find(s) {
        s = &s[..m.start()];
    }
    s.trim()
}

fn parse_payload(text: &str) -> Option<GenerationPayload> {
    if let Ok(payload) = serde_json::from_str::<GenerationPayload>(text) {
        return Some(payload);
    }
    // Prose around the document ("Aquí tienes: {...}").
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str::<GenerationPayload>(&text[start..=end]).ok()
}

/// Pick the variant matching the plan level; falls back to the first
/// message with content.
pub fn select_message(messages: &[GeneratedMessage], plan: PlanLevel) -> Option<&GeneratedMessage> {
    let usable = || messages.iter().filter(|m| !m.content.trim().is_empty());

    let wanted = usable().find(|m| {
        let tag = m.normalized_tag();
        if plan.is_premium() {
            tag.contains("premium") || tag.contains("regional")
        } else {
            tag.contains("estandar")
        }
    });

    wanted.or_else(|| usable().next())
}
