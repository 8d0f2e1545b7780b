//! # Application State
//!
//! Shared state for the Axum application: vendor clients (constructed once at
//! startup, read-only afterwards), the order-store collaborator, and config.

use payroute_core::{HttpOrderStore, LoggingOrderStore, OrderStore};
use payroute_paypal::PayPalClient;
use payroute_stripe::StripeClient;
use std::sync::Arc;

/// Rate-limit settings for the payment routes
#[derive(Debug, Clone, Copy)]
pub struct RateLimitConfig {
    /// Requests allowed per source address per window
    pub max_requests: u32,
    /// Window length in seconds
    pub window_secs: u64,
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Environment (development, staging, production)
    pub environment: String,
    /// Orders endpoint for the order-store collaborator (optional)
    pub orders_url: Option<String>,
    /// Per-IP rate limit (limiter disabled when unset)
    pub rate_limit: Option<RateLimitConfig>,
}

impl AppConfig {
    /// Load from environment variables
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let rate_limit = match (
            std::env::var("RATE_LIMIT_MAX_REQUESTS")
                .ok()
                .and_then(|v| v.parse().ok()),
            std::env::var("RATE_LIMIT_WINDOW_SECS")
                .ok()
                .and_then(|v| v.parse().ok()),
        ) {
            (Some(max_requests), Some(window_secs)) => Some(RateLimitConfig {
                max_requests,
                window_secs,
            }),
            _ => None,
        };

        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            orders_url: std::env::var("ORDERS_URL").ok(),
            rate_limit,
        }
    }

    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> std::net::SocketAddr {
        format!("{}:{}", self.host, self.port)
            .parse()
            .expect("Invalid socket address")
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Stripe client (card and Google Pay flows, webhook secret)
    pub stripe: Arc<StripeClient>,
    /// PayPal client (order create/capture)
    pub paypal: Arc<PayPalClient>,
    /// Order-creation collaborator
    pub orders: Arc<dyn OrderStore>,
    /// Application config
    pub config: AppConfig,
}

impl AppState {
    /// Create a new AppState from the environment
    pub fn new() -> anyhow::Result<Self> {
        let config = AppConfig::from_env();

        let stripe = StripeClient::from_env()
            .map_err(|e| anyhow::anyhow!("Failed to initialize Stripe: {}", e))?;

        let paypal = PayPalClient::from_env()
            .map_err(|e| anyhow::anyhow!("Failed to initialize PayPal: {}", e))?;

        let orders: Arc<dyn OrderStore> = match &config.orders_url {
            Some(url) => Arc::new(HttpOrderStore::new(url.clone())),
            None => {
                tracing::warn!("ORDERS_URL not set, orders will be logged only");
                Arc::new(LoggingOrderStore)
            }
        };

        Ok(Self {
            stripe: Arc::new(stripe),
            paypal: Arc::new(paypal),
            orders,
            config,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_config_defaults() {
        std::env::remove_var("HOST");
        std::env::remove_var("PORT");
        std::env::remove_var("RATE_LIMIT_MAX_REQUESTS");
        std::env::remove_var("RATE_LIMIT_WINDOW_SECS");

        let config = AppConfig::from_env();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8080);
        assert!(config.rate_limit.is_none());
        assert!(!config.is_production());
    }

    #[test]
    fn test_socket_addr() {
        let config = AppConfig {
            host: "0.0.0.0".to_string(),
            port: 3000,
            environment: "test".to_string(),
            orders_url: None,
            rate_limit: None,
        };

        let addr = config.socket_addr();
        assert_eq!(addr.to_string(), "0.0.0.0:3000");
    }
}
