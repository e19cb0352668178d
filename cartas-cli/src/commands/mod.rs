//! CLI command implementations.

pub mod account;
pub mod generate;
pub mod contacts;
pub mod favorites;
pub mod reminders;
pub mod plans;
pub mod onboarding;

use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, ContentArrangement, Table};
use console::style;
use serde::Serialize;
use tracing::warn;

use cartas_core::config::ConfigHandle;
use cartas_core::error::{CtError, CtResult};
use cartas_models::{MessageFormat, Occasion, Relationship, Tone};
use cartas_services::plans::UpsellTrigger;
use cartas_services::ServiceRegistry;

/// Helper to build the service registry from config and restore the stored
/// session. A session that cannot be restored leaves the user as a guest.
pub async fn open_registry(config: &ConfigHandle) -> CtResult<ServiceRegistry> {
    let registry = ServiceRegistry::new(config.snapshot().await)?;
    registry.init_all().await?;
    if let Err(e) = registry.auth.read().await.restore().await {
        warn!("could not restore session: {e}");
    }
    Ok(registry)
}

/// Print any serializable value as pretty JSON.
pub fn print_json<T: Serialize + ?Sized>(value: &T) {
    println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
}

/// A table with the CLI's standard look.
pub fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

/// Print an error the way the app would show it.
pub fn print_error(e: &CtError) {
    match e {
        CtError::Validation(errors) => {
            for msg in errors {
                eprintln!("{} {msg}", style("!").yellow().bold());
            }
        }
        _ if e.is_upsell() => {
            let trigger = UpsellTrigger::from_key(e.upsell_trigger().unwrap_or_default());
            eprintln!("{} {}", style("Premium").magenta().bold(), trigger.message());
            eprintln!("  Ve los planes con `cartas plans`.");
        }
        CtError::NotAuthenticated => {
            eprintln!("{} Inicia sesión con `cartas login`.", style("!").yellow().bold());
        }
        _ => eprintln!("{} {}", style("Error").red().bold(), e.user_message()),
    }
}

/// Map a prompt failure into the crate error.
pub fn prompt_err(e: dialoguer::Error) -> CtError {
    CtError::Internal(e.to_string())
}

/// Truncate to at most `max_chars` characters, appending an ellipsis if truncated.
pub fn truncate(s: &str, max_chars: usize) -> String {
    let flat = s.replace('\n', " ");
    if flat.chars().count() <= max_chars {
        flat
    } else {
        let kept: String = flat.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

pub fn parse_occasion(s: &str) -> Result<Occasion, String> {
    Occasion::from_id(s).ok_or_else(|| format!("unknown occasion '{s}' (see `cartas catalog`)"))
}

pub fn parse_tone(s: &str) -> Result<Tone, String> {
    Tone::from_id(s).ok_or_else(|| format!("unknown tone '{s}' (see `cartas catalog`)"))
}

pub fn parse_relationship(s: &str) -> Result<Relationship, String> {
    Relationship::from_id(s).ok_or_else(|| format!("unknown relationship '{s}' (see `cartas catalog`)"))
}

pub fn parse_format(s: &str) -> Result<MessageFormat, String> {
    MessageFormat::from_id(s).ok_or_else(|| format!("unknown format '{s}' (see `cartas catalog`)"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_is_char_safe() {
        assert_eq!(truncate("corazón", 10), "corazón");
        assert_eq!(truncate("¡Feliz cumpleaños!", 10), "¡Feliz ...");
        assert_eq!(truncate("línea\nnueva", 20), "línea nueva");
    }

    #[test]
    fn test_parsers() {
        assert_eq!(parse_occasion("aniversario"), Ok(Occasion::Anniversary));
        assert_eq!(parse_tone("poetico"), Ok(Tone::Poetic));
        assert_eq!(parse_relationship("jefe"), Ok(Relationship::Boss));
        assert_eq!(parse_format("carta"), Ok(MessageFormat::Letter));
        assert!(parse_format("tweet").is_err());
    }
}
