//! Backend response shapes shared by all endpoints.
//!
//! Success bodies are plain JSON records or lists (some routes wrap lists in
//! an object). Error bodies look like `{ "error": "...", "upsell": ... }` or
//! `{ "message": "..." }`.

use serde::{Deserialize, Serialize};

/// A list response, bare or wrapped in an object.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ListResponse<T> {
    Bare(Vec<T>),
    Wrapped {
        #[serde(
            alias = "contacts",
            alias = "favorites",
            alias = "reminders",
            alias = "plans",
            alias = "items"
        )]
        data: Vec<T>,
    },
}

impl<T> ListResponse<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            ListResponse::Bare(v) => v,
            ListResponse::Wrapped { data } => data,
        }
    }
}

/// Error envelope returned with non-2xx statuses.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    /// `true`, a trigger key, or an object with a `trigger`/`type` field.
    #[serde(default)]
    pub upsell: Option<serde_json::Value>,
}

impl ErrorBody {
    /// Parse an error body, tolerating non-JSON text (used as the message).
    pub fn parse(raw: &str) -> Self {
        match serde_json::from_str::<ErrorBody>(raw) {
            Ok(body) => body,
            Err(_) => ErrorBody {
                error: None,
                message: Some(raw.trim().to_string()).filter(|s| !s.is_empty()),
                upsell: None,
            },
        }
    }

    /// Human message: `error`, else `message`.
    pub fn text(&self) -> Option<String> {
        self.error
            .clone()
            .or_else(|| self.message.clone())
            .filter(|s| !s.trim().is_empty())
    }

    /// Upsell trigger key, if the backend asked for an upgrade prompt.
    pub fn upsell_key(&self) -> Option<String> {
        match self.upsell.as_ref()? {
            serde_json::Value::Bool(true) => Some("generic".to_string()),
            serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
            serde_json::Value::Object(map) => map
                .get("trigger")
                .or_else(|| map.get("type"))
                .and_then(|v| v.as_str())
                .map(String::from)
                .or_else(|| Some("generic".to_string())),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_response_bare_and_wrapped() {
        let bare: ListResponse<u32> = serde_json::from_str("[1,2,3]").unwrap();
        assert_eq!(bare.into_vec(), vec![1, 2, 3]);

        let wrapped: ListResponse<u32> = serde_json::from_str(r#"{"contacts":[4,5]}"#).unwrap();
        assert_eq!(wrapped.into_vec(), vec![4, 5]);
    }

    #[test]
    fn test_error_body_variants() {
        let body = ErrorBody::parse(r#"{"error":"Límite diario alcanzado","upsell":"daily_limit"}"#);
        assert_eq!(body.text().as_deref(), Some("Límite diario alcanzado"));
        assert_eq!(body.upsell_key().as_deref(), Some("daily_limit"));

        let body = ErrorBody::parse(r#"{"message":"No autorizado","upsell":true}"#);
        assert_eq!(body.text().as_deref(), Some("No autorizado"));
        assert_eq!(body.upsell_key().as_deref(), Some("generic"));

        let body = ErrorBody::parse(r#"{"error":"x","upsell":{"trigger":"premium_tone"}}"#);
        assert_eq!(body.upsell_key().as_deref(), Some("premium_tone"));

        let body = ErrorBody::parse("Bad Gateway");
        assert_eq!(body.text().as_deref(), Some("Bad Gateway"));
        assert!(body.upsell_key().is_none());
    }
}
