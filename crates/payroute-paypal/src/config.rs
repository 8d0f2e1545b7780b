//! # PayPal Configuration
//!
//! Client credentials for the PayPal Orders API, loaded from env vars.

use payroute_core::PaymentError;
use std::env;

/// PayPal API configuration
#[derive(Debug, Clone)]
pub struct PayPalConfig {
    /// REST app client id
    pub client_id: String,

    /// REST app client secret
    pub client_secret: String,

    /// API base URL (sandbox, live, or a test mock)
    pub api_base_url: String,
}

impl PayPalConfig {
    /// Load configuration from environment variables.
    ///
    /// Required env vars:
    /// - `PAYPAL_CLIENT_ID`
    /// - `PAYPAL_CLIENT_SECRET`
    ///
    /// `PAYPAL_API_BASE_URL` optionally overrides the live endpoint
    /// (e.g., the sandbox URL).
    pub fn from_env() -> Result<Self, PaymentError> {
        dotenvy::dotenv().ok();

        let client_id = env::var("PAYPAL_CLIENT_ID")
            .map_err(|_| PaymentError::Configuration("PAYPAL_CLIENT_ID not set".to_string()))?;

        let client_secret = env::var("PAYPAL_CLIENT_SECRET")
            .map_err(|_| PaymentError::Configuration("PAYPAL_CLIENT_SECRET not set".to_string()))?;

        let api_base_url = env::var("PAYPAL_API_BASE_URL")
            .unwrap_or_else(|_| "https://api-m.paypal.com".to_string());

        if client_id.is_empty() || client_secret.is_empty() {
            return Err(PaymentError::Configuration(
                "PayPal credentials must not be empty".to_string(),
            ));
        }

        Ok(Self {
            client_id,
            client_secret,
            api_base_url,
        })
    }

    /// Create config with explicit values (for testing)
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            api_base_url: "https://api-m.paypal.com".to_string(),
        }
    }

    /// Builder: set custom API base URL (for testing)
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_config() {
        let config = PayPalConfig::new("client_abc", "secret_xyz")
            .with_api_base_url("http://localhost:9999");
        assert_eq!(config.client_id, "client_abc");
        assert_eq!(config.api_base_url, "http://localhost:9999");
    }
}
