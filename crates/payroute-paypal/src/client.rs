//! # PayPal Orders API Client
//!
//! Order creation and capture against the PayPal v2 Orders API.
//! Each call authenticates with a fresh client-credentials token; no state
//! is shared between requests.

use crate::config::PayPalConfig;
use payroute_core::{decimal_string, PaymentError, PaymentResult};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument};

/// Outcome of a capture call
#[derive(Debug, Clone)]
pub struct CaptureResult {
    /// Vendor order status (`COMPLETED` when settled)
    pub status: String,
    /// Capture id, when a capture was recorded
    pub capture_id: Option<String>,
}

impl CaptureResult {
    pub fn is_completed(&self) -> bool {
        self.status == "COMPLETED"
    }
}

/// PayPal API client
pub struct PayPalClient {
    config: PayPalConfig,
    client: Client,
}

impl PayPalClient {
    pub fn new(config: PayPalConfig) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self { config, client }
    }

    /// Create from environment variables
    pub fn from_env() -> PaymentResult<Self> {
        let config = PayPalConfig::from_env()?;
        Ok(Self::new(config))
    }

    /// Fetch an OAuth access token via client credentials
    async fn access_token(&self) -> PaymentResult<String> {
        let url = format!("{}/v1/oauth2/token", self.config.api_base_url);

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.config.client_id, Some(&self.config.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(|e| PaymentError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| PaymentError::Network(e.to_string()))?;

        if !status.is_success() {
            error!("PayPal token error: status={}, body={}", status, body);
            return Err(parse_paypal_error(status.as_u16(), &body));
        }

        let token: TokenResponse = serde_json::from_str(&body).map_err(|e| {
            PaymentError::Serialization(format!("Failed to parse PayPal token: {}", e))
        })?;

        Ok(token.access_token)
    }

    /// Create an order with intent CAPTURE and a single purchase unit.
    /// Returns the vendor-assigned order id.
    #[instrument(skip(self), fields(currency = %currency))]
    pub async fn create_order(&self, amount: f64, currency: &str) -> PaymentResult<String> {
        let token = self.access_token().await?;

        let request = CreateOrderRequest {
            intent: "CAPTURE".to_string(),
            purchase_units: vec![PurchaseUnit {
                amount: PurchaseAmount {
                    currency_code: currency.to_uppercase(),
                    value: decimal_string(amount, currency),
                },
            }],
        };

        debug!("Creating PayPal order: {} {}", request.purchase_units[0].amount.value, currency);

        let url = format!("{}/v2/checkout/orders", self.config.api_base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&token)
            .header("Prefer", "return=representation")
            .json(&request)
            .send()
            .await
            .map_err(|e| PaymentError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| PaymentError::Network(e.to_string()))?;

        if !status.is_success() {
            error!("PayPal create order error: status={}, body={}", status, body);
            return Err(parse_paypal_error(status.as_u16(), &body));
        }

        let order: OrderResponse = serde_json::from_str(&body).map_err(|e| {
            PaymentError::Serialization(format!("Failed to parse PayPal order: {}", e))
        })?;

        info!("Created PayPal order: id={}", order.id);
        Ok(order.id)
    }

    /// Capture a previously created order
    #[instrument(skip(self))]
    pub async fn capture_order(&self, order_id: &str) -> PaymentResult<CaptureResult> {
        let token = self.access_token().await?;

        let url = format!(
            "{}/v2/checkout/orders/{}/capture",
            self.config.api_base_url, order_id
        );
        let response = self
            .client
            .post(&url)
            .bearer_auth(&token)
            .header("Content-Type", "application/json")
            .send()
            .await
            .map_err(|e| PaymentError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| PaymentError::Network(e.to_string()))?;

        if !status.is_success() {
            error!("PayPal capture error: status={}, body={}", status, body);
            return Err(parse_paypal_error(status.as_u16(), &body));
        }

        let capture: CaptureResponse = serde_json::from_str(&body).map_err(|e| {
            PaymentError::Serialization(format!("Failed to parse PayPal capture: {}", e))
        })?;

        let capture_id = capture
            .purchase_units
            .first()
            .and_then(|u| u.payments.as_ref())
            .and_then(|p| p.captures.first())
            .map(|c| c.id.clone());

        info!(
            "Captured PayPal order: id={}, status={}",
            order_id, capture.status
        );

        Ok(CaptureResult {
            status: capture.status,
            capture_id,
        })
    }
}

/// Map a PayPal error body onto the taxonomy, keeping the vendor's
/// name as the code and joining issue descriptions into the detail.
fn parse_paypal_error(status: u16, body: &str) -> PaymentError {
    if let Ok(parsed) = serde_json::from_str::<PayPalErrorResponse>(body) {
        let detail = if parsed.details.is_empty() {
            parsed.message
        } else {
            let issues: Vec<String> = parsed
                .details
                .iter()
                .map(|d| d.description.clone().unwrap_or_else(|| d.issue.clone()))
                .collect();
            format!("{}: {}", parsed.message, issues.join("; "))
        };
        return PaymentError::Provider {
            provider: "paypal".to_string(),
            message: detail,
            code: parsed.name,
        };
    }

    PaymentError::Provider {
        provider: "paypal".to_string(),
        message: format!("HTTP {}: {}", status, body),
        code: None,
    }
}

// =============================================================================
// PayPal API Types
// =============================================================================

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Serialize)]
struct CreateOrderRequest {
    intent: String,
    purchase_units: Vec<PurchaseUnit>,
}

#[derive(Debug, Serialize)]
struct PurchaseUnit {
    amount: PurchaseAmount,
}

#[derive(Debug, Serialize)]
struct PurchaseAmount {
    currency_code: String,
    value: String,
}

#[derive(Debug, Deserialize)]
struct OrderResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct CaptureResponse {
    status: String,
    #[serde(default)]
    purchase_units: Vec<CapturedUnit>,
}

#[derive(Debug, Deserialize)]
struct CapturedUnit {
    #[serde(default)]
    payments: Option<CapturedPayments>,
}

#[derive(Debug, Deserialize)]
struct CapturedPayments {
    #[serde(default)]
    captures: Vec<Capture>,
}

#[derive(Debug, Deserialize)]
struct Capture {
    id: String,
}

#[derive(Debug, Deserialize)]
struct PayPalErrorResponse {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    message: String,
    #[serde(default)]
    details: Vec<PayPalErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct PayPalErrorDetail {
    #[serde(default)]
    issue: String,
    #[serde(default)]
    description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(base_url: &str) -> PayPalClient {
        let config = PayPalConfig::new("client_abc", "secret_xyz").with_api_base_url(base_url);
        PayPalClient::new(config)
    }

    async fn mount_token(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/v1/oauth2/token"))
            .and(body_string_contains("grant_type=client_credentials"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "A21AAtest",
                "token_type": "Bearer",
                "expires_in": 32400
            })))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_create_order_sends_capture_intent_and_string_amount() {
        let server = MockServer::start().await;
        mount_token(&server).await;

        Mock::given(method("POST"))
            .and(path("/v2/checkout/orders"))
            .and(header("Authorization", "Bearer A21AAtest"))
            .and(header("Prefer", "return=representation"))
            .and(body_partial_json(serde_json::json!({
                "intent": "CAPTURE",
                "purchase_units": [
                    { "amount": { "currency_code": "USD", "value": "12.50" } }
                ]
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
                "id": "ORDER123",
                "status": "CREATED"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let order_id = client.create_order(12.5, "usd").await.unwrap();
        assert_eq!(order_id, "ORDER123");
    }

    #[tokio::test]
    async fn test_capture_completed_returns_capture_id() {
        let server = MockServer::start().await;
        mount_token(&server).await;

        Mock::given(method("POST"))
            .and(path("/v2/checkout/orders/ORDER123/capture"))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
                "id": "ORDER123",
                "status": "COMPLETED",
                "purchase_units": [{
                    "payments": {
                        "captures": [{ "id": "CAP456", "status": "COMPLETED" }]
                    }
                }]
            })))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let result = client.capture_order("ORDER123").await.unwrap();
        assert!(result.is_completed());
        assert_eq!(result.capture_id.as_deref(), Some("CAP456"));
    }

    #[tokio::test]
    async fn test_capture_non_completed_status_passes_through() {
        let server = MockServer::start().await;
        mount_token(&server).await;

        Mock::given(method("POST"))
            .and(path("/v2/checkout/orders/ORDER123/capture"))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
                "id": "ORDER123",
                "status": "PENDING",
                "purchase_units": []
            })))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let result = client.capture_order("ORDER123").await.unwrap();
        assert!(!result.is_completed());
        assert_eq!(result.status, "PENDING");
        assert!(result.capture_id.is_none());
    }

    #[tokio::test]
    async fn test_vendor_error_carries_detail() {
        let server = MockServer::start().await;
        mount_token(&server).await;

        Mock::given(method("POST"))
            .and(path("/v2/checkout/orders"))
            .respond_with(ResponseTemplate::new(422).set_body_json(serde_json::json!({
                "name": "UNPROCESSABLE_ENTITY",
                "message": "The requested action could not be performed.",
                "details": [{
                    "issue": "CURRENCY_NOT_SUPPORTED",
                    "description": "Currency code is not supported."
                }]
            })))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let err = client.create_order(10.0, "xxx").await.unwrap_err();

        match err {
            PaymentError::Provider {
                provider,
                message,
                code,
            } => {
                assert_eq!(provider, "paypal");
                assert!(message.contains("Currency code is not supported."));
                assert_eq!(code.as_deref(), Some("UNPROCESSABLE_ENTITY"));
            }
            other => panic!("expected Provider, got {:?}", other),
        }
    }
}
