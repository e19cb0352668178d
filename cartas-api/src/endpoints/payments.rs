//! Checkout and payment endpoints.
//!
//! The client never talks to a payment gateway directly: the backend creates
//! a Stripe checkout session or a MercadoPago preference and hands back the
//! URL to redirect the user to.

use serde::{Deserialize, Serialize};

use cartas_core::constants::paths;
use cartas_core::error::{CtError, CtResult};

use crate::client::ApiClient;

#[derive(Debug, Serialize)]
struct CheckoutBody<'a> {
    #[serde(rename = "planId")]
    plan_id: &'a str,
    #[serde(rename = "successUrl")]
    success_url: &'a str,
    #[serde(rename = "cancelUrl")]
    cancel_url: &'a str,
}

/// Stripe checkout session.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSession {
    pub url: String,
    #[serde(default, alias = "sessionId", alias = "id")]
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize)]
struct PreferenceBody<'a> {
    #[serde(rename = "planId")]
    plan_id: &'a str,
}

/// MercadoPago checkout preference.
#[derive(Debug, Clone, Deserialize)]
pub struct MercadoPagoPreference {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub init_point: Option<String>,
    #[serde(default)]
    pub sandbox_init_point: Option<String>,
}

impl MercadoPagoPreference {
    /// Redirect URL, preferring the production init point.
    pub fn redirect_url(&self) -> Option<&str> {
        self.init_point
            .as_deref()
            .or(self.sandbox_init_point.as_deref())
    }
}

/// Payment state as reported by the backend.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PaymentStatus {
    pub status: String,
    #[serde(default)]
    pub plan: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl PaymentStatus {
    /// Whether the payment went through and the plan is active.
    pub fn is_approved(&self) -> bool {
        matches!(
            self.status.to_lowercase().as_str(),
            "approved" | "paid" | "succeeded" | "complete" | "completed" | "active"
        )
    }

    pub fn is_pending(&self) -> bool {
        matches!(
            self.status.to_lowercase().as_str(),
            "pending" | "in_process" | "processing" | "open"
        )
    }
}

impl ApiClient {
    /// Create a Stripe checkout session for a plan.
    pub async fn create_checkout(
        &self,
        plan_id: &str,
        success_url: &str,
        cancel_url: &str,
    ) -> CtResult<CheckoutSession> {
        let body = CheckoutBody {
            plan_id,
            success_url,
            cancel_url,
        };
        self.post_json(paths::CHECKOUT, &body).await
    }

    /// Create a MercadoPago preference for a plan.
    pub async fn create_mercadopago_preference(&self, plan_id: &str) -> CtResult<MercadoPagoPreference> {
        let pref: MercadoPagoPreference = self
            .post_json(paths::MERCADOPAGO_PREFERENCE, &PreferenceBody { plan_id })
            .await?;
        if pref.redirect_url().is_none() {
            return Err(CtError::Serialization("preference without init_point".into()));
        }
        Ok(pref)
    }

    /// Status of a payment by gateway reference.
    pub async fn payment_status(&self, reference: &str) -> CtResult<PaymentStatus> {
        self.get_json(&format!("{}/status/{reference}", paths::PAYMENTS)).await
    }

    /// Ask the backend to confirm a payment after the gateway redirect.
    pub async fn confirm_payment(&self, reference: &str) -> CtResult<PaymentStatus> {
        self.post_json(
            &format!("{}/confirm", paths::PAYMENTS),
            &serde_json::json!({ "reference": reference }),
        )
        .await
    }
}
