//! Plan purchase: gateway choice and the checkout redirect.
//!
//! The backend creates the Stripe session or MercadoPago preference; the
//! client only opens the returned URL and later asks for the payment status.

use tracing::info;

use cartas_api::{ApiClient, PaymentStatus};
use cartas_core::config::CheckoutConfig;
use cartas_core::error::{CtError, CtResult};
use cartas_models::PlanStrategy;

use crate::auth::CurrentUser;

/// Countries where MercadoPago is the preferred gateway.
pub const MERCADOPAGO_COUNTRIES: &[&str] = &["AR", "BR", "CL", "CO", "MX", "PE", "UY"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gateway {
    Stripe,
    MercadoPago,
}

impl Gateway {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gateway::Stripe => "stripe",
            Gateway::MercadoPago => "mercadopago",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().replace(['-', '_', ' '], "").as_str() {
            "stripe" => Some(Gateway::Stripe),
            "mercadopago" | "mp" => Some(Gateway::MercadoPago),
            _ => None,
        }
    }

    /// Explicit choice, else MercadoPago where it operates, else the
    /// configured default (Stripe when that is unreadable).
    pub fn choose(explicit: Option<Gateway>, country: Option<&str>, default: &str) -> Gateway {
        if let Some(g) = explicit {
            return g;
        }
        let mp_country = country
            .map(|c| c.trim().to_ascii_uppercase())
            .is_some_and(|c| MERCADOPAGO_COUNTRIES.contains(&c.as_str()));
        if mp_country {
            return Gateway::MercadoPago;
        }
        Gateway::parse(default).unwrap_or(Gateway::Stripe)
    }
}

impl std::fmt::Display for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where to send the user to pay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutRedirect {
    pub gateway: Gateway,
    pub url: String,
    /// Session or preference id, for the later status check.
    pub reference: Option<String>,
}

pub struct CheckoutService {
    api: ApiClient,
    user: CurrentUser,
    config: CheckoutConfig,
}

impl CheckoutService {
    pub fn new(api: ApiClient, user: CurrentUser, config: CheckoutConfig) -> Self {
        Self { api, user, config }
    }

    /// Purchasable plans, highlighted first, then by price.
    pub async fn plans(&self) -> CtResult<Vec<PlanStrategy>> {
        let mut plans = self.api.get_plans().await?;
        plans.sort_by(|a, b| {
            b.highlighted
                .cmp(&a.highlighted)
                .then(a.price.partial_cmp(&b.price).unwrap_or(std::cmp::Ordering::Equal))
        });
        Ok(plans)
    }

    pub async fn start(&self, plan_id: &str, gateway: Option<Gateway>) -> CtResult<CheckoutRedirect> {
        let plan_id = plan_id.trim();
        if plan_id.is_empty() {
            return Err(CtError::Validation(vec!["Elige un plan.".to_string()]));
        }
        let user = self.user.require().await?;
        let gateway = Gateway::choose(gateway, user.country.as_deref(), &self.config.default_gateway);
        info!("starting {gateway} checkout for plan {plan_id}");

        match gateway {
            Gateway::Stripe => {
                let session = self
                    .api
                    .create_checkout(plan_id, &self.config.success_url, &self.config.cancel_url)
                    .await?;
                Ok(CheckoutRedirect {
                    gateway,
                    url: session.url,
                    reference: session.session_id,
                })
            }
            Gateway::MercadoPago => {
                let pref = self.api.create_mercadopago_preference(plan_id).await?;
                let url = pref
                    .redirect_url()
                    .map(str::to_string)
                    .ok_or_else(|| CtError::Serialization("preference without init_point".into()))?;
                Ok(CheckoutRedirect {
                    gateway,
                    url,
                    reference: pref.id,
                })
            }
        }
    }

    /// Payment status; a pending payment is confirmed once with the backend.
    pub async fn verify(&self, reference: &str) -> CtResult<PaymentStatus> {
        let status = self.api.payment_status(reference).await?;
        if status.is_pending() {
            return self.api.confirm_payment(reference).await;
        }
        Ok(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gateway_choice() {
        assert_eq!(Gateway::choose(None, Some("ar"), "stripe"), Gateway::MercadoPago);
        assert_eq!(Gateway::choose(None, Some("ES"), "stripe"), Gateway::Stripe);
        assert_eq!(Gateway::choose(None, None, "mercado_pago"), Gateway::MercadoPago);
        assert_eq!(Gateway::choose(None, None, "???"), Gateway::Stripe);
        assert_eq!(Gateway::choose(Some(Gateway::Stripe), Some("MX"), "stripe"), Gateway::Stripe);
    }

    #[tokio::test]
    async fn test_checkout_requires_login() {
        let api = ApiClient::new(&cartas_core::config::ApiConfig::default()).unwrap();
        let svc = CheckoutService::new(api, CurrentUser::new(), CheckoutConfig::default());
        assert!(matches!(svc.start("premium", None).await, Err(CtError::NotAuthenticated)));
        assert!(matches!(svc.start(" ", None).await, Err(CtError::Validation(_))));
    }
}
