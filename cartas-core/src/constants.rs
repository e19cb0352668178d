//! Application-wide constants and fixed user-facing strings.

/// Application name.
pub const APP_NAME: &str = "Cartas";

/// Application version.
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default backend API base URL.
pub const DEFAULT_API_BASE_URL: &str = "https://api.cartas.app";

/// Default API timeout in milliseconds for non-streaming requests.
pub const DEFAULT_API_TIMEOUT_MS: u64 = 30_000;

/// Shown while the streamed buffer is still raw JSON syntax.
pub const TYPING_PLACEHOLDER: &str = "Escribiendo...";

/// Substituted when a finished stream could not be turned into a message.
pub const GENERATION_FALLBACK_MESSAGE: &str =
    "Lo siento, tuve un problema al escribir tu mensaje. ¿Lo intentamos de nuevo?";

/// Shown in place of a generation that failed at the network level.
pub const NETWORK_ERROR_MESSAGE: &str =
    "Lo siento, no pude conectar con el servidor. Revisa tu conexión e inténtalo de nuevo.";

/// Generic error string for unexpected failures.
pub const GENERIC_ERROR_MESSAGE: &str = "Algo salió mal. Inténtalo de nuevo en unos segundos.";

/// Maximum number of "already used" keywords sent to the model.
pub const MAX_AVOID_KEYWORDS: usize = 15;

/// Minimum letter count for a word to count as a keyword.
pub const MIN_KEYWORD_LEN: usize = 5;

/// Maximum length of the recipient name in the generation form.
pub const MAX_RECIPIENT_NAME_LEN: usize = 60;

/// Maximum length of the free-form context in the generation form.
pub const MAX_EXTRA_CONTEXT_LEN: usize = 500;

/// Default window in which a repeated guest request counts as a rapid click.
pub const DEFAULT_RAPID_CLICK_WINDOW_MS: u64 = 2_000;

/// Artificial delay applied once to rapid guest requests.
pub const DEFAULT_ANONYMOUS_DELAY_MS: u64 = 1_000;

/// Storage schema version.
pub const STORAGE_SCHEMA_VERSION: i32 = 1;

/// Client-side storage keys and key prefixes.
pub mod keys {
    pub const TOKEN: &str = "token";
    pub const ONBOARDING_COMPLETED_TOURS: &str = "onboarding_completed_tours";
    pub const ONBOARDING_ACTIVE_TOUR: &str = "onboarding_active_tour";
    pub const ONBOARDING_STEP_INDEX: &str = "onboarding_step_index";
    pub const USAGE_DAILY_PREFIX: &str = "usage_daily_";
    pub const USAGE_SESSION_COUNT: &str = "usage_session_count";
    pub const LAST_REQUEST_TIME: &str = "last_request_time";
    pub const VISITED_OCCASION_PREFIX: &str = "visited_occasion_";
    pub const VISITED_TONE_PREFIX: &str = "visited_tone_";
    pub const OFFER_BANNER_DISMISSED_ID: &str = "offer_banner_dismissed_id";
    pub const NOTIFIED_PREFIX: &str = "notified_";
    /// Internal: last activity in the session scope (epoch ms).
    pub const SESSION_LAST_SEEN: &str = "__session_last_seen";
}

/// Backend API paths.
pub mod paths {
    pub const GENERATE: &str = "/api/generate";
    pub const AUTH_LOGIN: &str = "/api/auth/login";
    pub const AUTH_REGISTER: &str = "/api/auth/register";
    pub const AUTH_ME: &str = "/api/auth/me";
    pub const AUTH_LOGOUT: &str = "/api/auth/logout";
    pub const CONTACTS: &str = "/api/contacts";
    pub const FAVORITES: &str = "/api/favorites";
    pub const REMINDERS: &str = "/api/reminders";
    pub const PLANS: &str = "/api/config/plans";
    pub const CHECKOUT: &str = "/api/checkout";
    pub const MERCADOPAGO_PREFERENCE: &str = "/api/mercadopago/create_preference";
    pub const PAYMENTS: &str = "/api/payments";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_limits() {
        assert_eq!(MAX_AVOID_KEYWORDS, 15);
        assert_eq!(MIN_KEYWORD_LEN, 5);
    }

    #[test]
    fn test_paths_are_api_rooted() {
        for p in [paths::GENERATE, paths::CONTACTS, paths::PLANS, paths::PAYMENTS] {
            assert!(p.starts_with("/api/"));
        }
    }
}
