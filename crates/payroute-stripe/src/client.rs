//! # Stripe REST Client
//!
//! Direct client for the two Stripe operations this layer uses:
//! confirmed payment intents (card and Google Pay flows) and payment-method
//! creation from a Google Pay network token.

use crate::config::StripeConfig;
use payroute_core::{minor_units, PaymentError, PaymentResult};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, error, info, instrument};

/// A created (and usually confirmed) payment intent
#[derive(Debug, Clone)]
pub struct PaymentIntent {
    pub id: String,
    pub client_secret: String,
    pub status: String,
}

/// Stripe API client
pub struct StripeClient {
    config: StripeConfig,
    client: Client,
}

impl StripeClient {
    pub fn new(config: StripeConfig) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self { config, client }
    }

    /// Create from environment variables
    pub fn from_env() -> PaymentResult<Self> {
        let config = StripeConfig::from_env()?;
        Ok(Self::new(config))
    }

    pub fn webhook_secret(&self) -> &str {
        &self.config.webhook_secret
    }

    /// Create and immediately confirm a payment intent.
    ///
    /// The caller id rides along as intent metadata so the webhook success
    /// path can recover it when the asynchronous confirmation lands.
    #[instrument(skip(self, payment_method_id), fields(currency = %currency))]
    pub async fn create_payment_intent(
        &self,
        amount: f64,
        currency: &str,
        payment_method_id: &str,
        user_id: &str,
    ) -> PaymentResult<PaymentIntent> {
        let amount_minor = minor_units(amount, currency);

        debug!("Creating payment intent: {} {}", amount_minor, currency);

        let form_params: Vec<(String, String)> = vec![
            ("amount".to_string(), amount_minor.to_string()),
            ("currency".to_string(), currency.to_lowercase()),
            ("payment_method".to_string(), payment_method_id.to_string()),
            ("confirm".to_string(), "true".to_string()),
            ("return_url".to_string(), self.config.return_url()),
            ("metadata[user_id]".to_string(), user_id.to_string()),
            (
                "automatic_payment_methods[enabled]".to_string(),
                "true".to_string(),
            ),
            (
                "automatic_payment_methods[allow_redirects]".to_string(),
                "always".to_string(),
            ),
        ];

        let body = self
            .post_form("/v1/payment_intents", &form_params)
            .await?;

        let intent: StripePaymentIntentResponse = serde_json::from_str(&body).map_err(|e| {
            PaymentError::Serialization(format!("Failed to parse Stripe response: {}", e))
        })?;

        info!(
            "Created payment intent: id={}, status={}",
            intent.id, intent.status
        );

        Ok(PaymentIntent {
            client_secret: intent.client_secret.ok_or_else(|| {
                PaymentError::Serialization("Payment intent missing client_secret".to_string())
            })?,
            id: intent.id,
            status: intent.status,
        })
    }

    /// Create a card payment method from a Google Pay network token
    #[instrument(skip(self, token))]
    pub async fn create_payment_method(&self, token: &str) -> PaymentResult<String> {
        let form_params: Vec<(String, String)> = vec![
            ("type".to_string(), "card".to_string()),
            ("card[token]".to_string(), token.to_string()),
        ];

        let body = self.post_form("/v1/payment_methods", &form_params).await?;

        let method: StripePaymentMethodResponse = serde_json::from_str(&body).map_err(|e| {
            PaymentError::Serialization(format!("Failed to parse Stripe response: {}", e))
        })?;

        debug!("Created payment method: id={}", method.id);
        Ok(method.id)
    }

    /// Google Pay flow: tokenized card becomes a payment method, then a
    /// confirmed intent. Two sequential vendor calls; if the second fails the
    /// orphaned payment method stays on the vendor side (accepted limitation).
    pub async fn charge_google_pay(
        &self,
        amount: f64,
        currency: &str,
        token: &str,
        user_id: &str,
    ) -> PaymentResult<PaymentIntent> {
        let payment_method_id = self.create_payment_method(token).await?;
        self.create_payment_intent(amount, currency, &payment_method_id, user_id)
            .await
    }

    /// POST a form-encoded request and return the success body,
    /// translating Stripe error bodies into typed errors
    async fn post_form(&self, path: &str, form_params: &[(String, String)]) -> PaymentResult<String> {
        let url = format!("{}{}", self.config.api_base_url, path);

        let response = self
            .client
            .post(&url)
            .header("Authorization", self.config.auth_header())
            .header("Stripe-Version", &self.config.api_version)
            .form(form_params)
            .send()
            .await
            .map_err(|e| PaymentError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| PaymentError::Network(e.to_string()))?;

        if !status.is_success() {
            error!("Stripe API error: status={}, body={}", status, body);
            return Err(parse_stripe_error(status.as_u16(), &body));
        }

        Ok(body)
    }
}

/// Map a Stripe error body onto the error taxonomy, preserving the vendor
/// message and code verbatim. Card errors (declines) are their own kind.
fn parse_stripe_error(status: u16, body: &str) -> PaymentError {
    if let Ok(parsed) = serde_json::from_str::<StripeErrorResponse>(body) {
        let err = parsed.error;
        if err.error_type.as_deref() == Some("card_error") {
            // The vendor's error.code passes through unchanged; decline_code
            // only fills in when no code was supplied.
            return PaymentError::PaymentDeclined {
                message: err.message,
                code: err.code.or(err.decline_code),
            };
        }
        return PaymentError::Provider {
            provider: "stripe".to_string(),
            message: err.message,
            code: err.code,
        };
    }

    PaymentError::Provider {
        provider: "stripe".to_string(),
        message: format!("HTTP {}: {}", status, body),
        code: None,
    }
}

// =============================================================================
// Stripe API Types
// =============================================================================

#[derive(Debug, Deserialize)]
struct StripePaymentIntentResponse {
    id: String,
    status: String,
    #[serde(default)]
    client_secret: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StripePaymentMethodResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct StripeErrorResponse {
    error: StripeError,
}

#[derive(Debug, Deserialize)]
struct StripeError {
    message: String,
    #[serde(default)]
    code: Option<String>,
    #[serde(default, rename = "type")]
    error_type: Option<String>,
    #[serde(default)]
    decline_code: Option<String>,
}
