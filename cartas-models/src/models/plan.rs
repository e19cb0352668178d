//! Subscription tiers and the plan catalog served by `/api/config/plans`.

use serde::{Deserialize, Serialize};

/// Subscription tier gating feature access.
///
/// Ordered so that `Guest < Freemium < Premium`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PlanLevel {
    /// Anonymous visitor, no account.
    #[default]
    Guest,
    /// Registered user on the free plan.
    Freemium,
    /// Paying subscriber.
    Premium,
}

impl PlanLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanLevel::Guest => "guest",
            PlanLevel::Freemium => "freemium",
            PlanLevel::Premium => "premium",
        }
    }

    /// Parse a backend plan string. Unknown or paid-variant names such as
    /// "premium_anual" map to the closest tier.
    pub fn parse(value: &str) -> Self {
        let v = value.trim().to_lowercase();
        if v.starts_with("premium") || v == "pro" {
            PlanLevel::Premium
        } else if v == "freemium" || v == "free" || v == "gratis" {
            PlanLevel::Freemium
        } else {
            PlanLevel::Guest
        }
    }

    pub fn is_premium(&self) -> bool {
        matches!(self, PlanLevel::Premium)
    }
}

impl std::fmt::Display for PlanLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A purchasable plan as configured on the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanStrategy {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub level: PlanLevel,
    #[serde(default)]
    pub price: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
    /// Billing interval, e.g. "month" or "year".
    #[serde(default)]
    pub interval: Option<String>,
    #[serde(default)]
    pub features: Vec<String>,
    /// Generations per day; `None` means unlimited.
    #[serde(default, rename = "dailyLimit", alias = "daily_limit")]
    pub daily_limit: Option<u32>,
    /// Marked as the recommended plan in the pricing table.
    #[serde(default)]
    pub highlighted: bool,
}

fn default_currency() -> String {
    "USD".to_string()
}

impl PlanStrategy {
    /// Price formatted for display, e.g. "USD 4.99 / month".
    pub fn price_label(&self) -> String {
        match &self.interval {
            Some(interval) => format!("{} {:.2} / {}", self.currency, self.price, interval),
            None => format!("{} {:.2}", self.currency, self.price),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_ordering() {
        assert!(PlanLevel::Guest < PlanLevel::Freemium);
        assert!(PlanLevel::Freemium < PlanLevel::Premium);
    }

    #[test]
    fn test_plan_parse() {
        assert_eq!(PlanLevel::parse("premium_anual"), PlanLevel::Premium);
        assert_eq!(PlanLevel::parse("Freemium"), PlanLevel::Freemium);
        assert_eq!(PlanLevel::parse(""), PlanLevel::Guest);
    }

    #[test]
    fn test_plan_strategy_from_json() {
        let json = serde_json::json!({
            "id": "premium_mensual",
            "name": "Premium",
            "level": "premium",
            "price": 4.99,
            "interval": "mes",
            "features": ["Mensajes ilimitados"],
            "highlighted": true
        });
        let plan: PlanStrategy = serde_json::from_value(json).unwrap();
        assert_eq!(plan.level, PlanLevel::Premium);
        assert_eq!(plan.currency, "USD");
        assert!(plan.daily_limit.is_none());
        assert_eq!(plan.price_label(), "USD 4.99 / mes");
    }
}
