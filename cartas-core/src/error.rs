//! Global error types for the Cartas client.
//!
//! Every failure the client can surface falls into one of three user-facing
//! categories: network/HTTP failure, validation failure, or an upsell-worthy
//! limit. They are unified into a single `CtError` enum with conversions
//! from the underlying library errors.

use thiserror::Error;

use crate::constants;

/// Convenience type alias for Results using CtError.
pub type CtResult<T> = Result<T, CtError>;

/// Unified error type covering all error categories in Cartas.
#[derive(Error, Debug)]
pub enum CtError {
    // -- Configuration errors --
    /// Failed to load or parse application configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// A required configuration value is missing.
    #[error("missing configuration: {0}")]
    MissingConfig(String),

    // -- Storage errors --
    /// SQLite storage error.
    #[error("storage error: {0}")]
    Storage(String),

    /// Storage connection pool error.
    #[error("connection pool error: {0}")]
    Pool(String),

    // -- Network errors --
    /// HTTP request failed before a response arrived.
    #[error("http error: {0}")]
    Http(String),

    /// HTTP request timed out.
    #[error("request timeout: {0}")]
    Timeout(String),

    /// Backend returned an error envelope (`{ error | message, upsell? }`).
    #[error("api error (status {status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Human-readable message from the backend.
        message: String,
        /// Upsell trigger key, when the backend wants an upgrade modal shown.
        upsell: Option<String>,
    },

    /// The backend rejected the credentials or token.
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// The operation needs a logged-in user.
    #[error("not authenticated")]
    NotAuthenticated,

    // -- Client-side rules --
    /// Form validation failed. Holds one message per failing field.
    #[error("validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    /// A plan limit was hit locally; `trigger` names the upsell to show.
    #[error("plan limit reached: {trigger}")]
    LimitReached {
        /// Upsell trigger key.
        trigger: String,
    },

    /// A generation is already running for this session.
    #[error("a generation is already in progress")]
    GenerationInProgress,

    /// Requested record does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    // -- File/IO errors --
    /// File system operation failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Desktop notification failed.
    #[error("notification error: {0}")]
    Notification(String),

    // -- Generic --
    /// An unexpected internal error.
    #[error("internal error: {0}")]
    Internal(String),

    /// Wrapping anyhow errors for interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CtError {
    /// The upsell trigger key carried by this error, if any.
    pub fn upsell_trigger(&self) -> Option<&str> {
        match self {
            CtError::Api { upsell, .. } => upsell.as_deref(),
            CtError::LimitReached { trigger } => Some(trigger),
            _ => None,
        }
    }

    /// Whether the caller should show an upgrade prompt instead of a plain error.
    pub fn is_upsell(&self) -> bool {
        self.upsell_trigger().is_some()
    }

    /// Whether this is a network-level failure (no usable response).
    pub fn is_network(&self) -> bool {
        matches!(self, CtError::Http(_) | CtError::Timeout(_))
    }

    /// Spanish string suitable for a toast or inline banner.
    pub fn user_message(&self) -> String {
        match self {
            CtError::Http(_) | CtError::Timeout(_) => constants::NETWORK_ERROR_MESSAGE.to_string(),
            CtError::Api { message, .. } if !message.is_empty() => message.clone(),
            CtError::Api { .. } => constants::GENERIC_ERROR_MESSAGE.to_string(),
            CtError::AuthFailed(_) | CtError::NotAuthenticated => {
                "Tu sesión expiró. Inicia sesión de nuevo.".to_string()
            }
            CtError::Validation(messages) => messages.join("\n"),
            CtError::GenerationInProgress => "Ya estamos escribiendo tu mensaje.".to_string(),
            CtError::NotFound(_) => "No encontramos lo que buscabas.".to_string(),
            _ => constants::GENERIC_ERROR_MESSAGE.to_string(),
        }
    }
}

impl From<serde_json::Error> for CtError {
    fn from(e: serde_json::Error) -> Self {
        CtError::Serialization(e.to_string())
    }
}

impl From<toml::de::Error> for CtError {
    fn from(e: toml::de::Error) -> Self {
        CtError::Config(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ct_error_display() {
        let err = CtError::Config("bad value".to_string());
        assert_eq!(err.to_string(), "configuration error: bad value");
    }

    #[test]
    fn test_validation_display_joins_messages() {
        let err = CtError::Validation(vec!["a".into(), "b".into()]);
        assert_eq!(err.to_string(), "validation failed: a; b");
        assert_eq!(err.user_message(), "a\nb");
    }

    #[test]
    fn test_upsell_trigger() {
        let api = CtError::Api {
            status: 403,
            message: "Límite alcanzado".into(),
            upsell: Some("daily_limit".into()),
        };
        assert_eq!(api.upsell_trigger(), Some("daily_limit"));
        assert!(api.is_upsell());

        let limit = CtError::LimitReached { trigger: "premium_tone".into() };
        assert_eq!(limit.upsell_trigger(), Some("premium_tone"));

        assert!(!CtError::Http("down".into()).is_upsell());
    }

    #[test]
    fn test_network_errors_use_fixed_message() {
        let err = CtError::Timeout("30s".into());
        assert!(err.is_network());
        assert_eq!(err.user_message(), constants::NETWORK_ERROR_MESSAGE);
    }
}
