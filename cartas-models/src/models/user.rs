//! Authenticated user as returned by `/api/auth/*`.

use serde::{Deserialize, Serialize};

use super::plan::PlanLevel;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default = "registered_plan", rename = "plan", alias = "plan_level", deserialize_with = "plan_from_str")]
    pub plan_level: PlanLevel,
    /// ISO country code, used for regional phrasing and gateway choice.
    #[serde(default)]
    pub country: Option<String>,
}

/// A logged-in user with no plan on record is on the free tier.
fn registered_plan() -> PlanLevel {
    PlanLevel::Freemium
}

fn plan_from_str<'de, D>(deserializer: D) -> Result<PlanLevel, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.map(|s| PlanLevel::parse(&s)).unwrap_or(PlanLevel::Freemium))
}

impl User {
    /// First name for greetings.
    pub fn first_name(&self) -> &str {
        self.name.split_whitespace().next().unwrap_or(&self.email)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_from_json() {
        let json = r#"{"id":"u1","email":"ana@example.com","name":"Ana María","plan":"premium_anual","country":"CO"}"#;
        let user: User = serde_json::from_str(json).unwrap();
        assert_eq!(user.plan_level, PlanLevel::Premium);
        assert_eq!(user.first_name(), "Ana");
        assert_eq!(user.country.as_deref(), Some("CO"));
    }

    #[test]
    fn test_user_without_plan_is_freemium() {
        let json = r#"{"id":"u2","email":"luis@example.com"}"#;
        let user: User = serde_json::from_str(json).unwrap();
        assert_eq!(user.plan_level, PlanLevel::Freemium);
        assert_eq!(user.first_name(), "luis@example.com");
    }
}
