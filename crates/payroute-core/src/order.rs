//! # Order Records
//!
//! The order-creation collaborator seam. This layer does not own order
//! persistence; it supplies values for a single create call per successful
//! payment and treats the collaborator as a black box behind `OrderStore`.

use crate::error::{PaymentError, PaymentResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Payment method recorded on a confirmed order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Card,
    Paypal,
    GooglePay,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Card => "card",
            PaymentMethod::Paypal => "paypal",
            PaymentMethod::GooglePay => "google_pay",
        }
    }
}

/// Order lifecycle status, as far as this layer ever writes it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Confirmed,
}

/// A confirmed order to hand to the collaborator
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRecord {
    /// Authenticated caller (or webhook metadata-derived) user id
    pub user_id: String,
    /// Vendor-assigned payment identifier (intent id or PayPal order id)
    pub payment_id: String,
    pub payment_method: PaymentMethod,
    pub status: OrderStatus,
}

impl OrderRecord {
    pub fn confirmed(
        user_id: impl Into<String>,
        payment_id: impl Into<String>,
        payment_method: PaymentMethod,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            payment_id: payment_id.into(),
            payment_method,
            status: OrderStatus::Confirmed,
        }
    }
}

/// The external order-creation collaborator.
///
/// Failures propagate as `PaymentError::OrderPersist`; nothing here retries
/// or deduplicates -- replayed webhooks produce repeated create calls and the
/// collaborator owns the consequences.
#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn create_order(&self, order: OrderRecord) -> PaymentResult<()>;
}

/// Order store that POSTs the record to an internal orders endpoint
pub struct HttpOrderStore {
    url: String,
    client: reqwest::Client,
}

impl HttpOrderStore {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl OrderStore for HttpOrderStore {
    async fn create_order(&self, order: OrderRecord) -> PaymentResult<()> {
        let response = self
            .client
            .post(&self.url)
            .json(&order)
            .send()
            .await
            .map_err(|e| PaymentError::OrderPersist(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PaymentError::OrderPersist(format!(
                "orders endpoint returned {}: {}",
                status, body
            )));
        }

        info!(
            "Order created: payment={}, method={}",
            order.payment_id,
            order.payment_method.as_str()
        );
        Ok(())
    }
}

/// Development fallback: logs the record instead of persisting it
pub struct LoggingOrderStore;

#[async_trait]
impl OrderStore for LoggingOrderStore {
    async fn create_order(&self, order: OrderRecord) -> PaymentResult<()> {
        info!(
            "Order (not persisted): user={}, payment={}, method={}",
            order.user_id,
            order.payment_id,
            order.payment_method.as_str()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json_string, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_order_record_wire_shape() {
        let order = OrderRecord::confirmed("user_1", "pi_123", PaymentMethod::Card);
        let json = serde_json::to_value(&order).unwrap();
        assert_eq!(json["userId"], "user_1");
        assert_eq!(json["paymentId"], "pi_123");
        assert_eq!(json["paymentMethod"], "card");
        assert_eq!(json["status"], "confirmed");
    }

    #[tokio::test]
    async fn test_http_order_store_posts_record() {
        let server = MockServer::start().await;
        let order = OrderRecord::confirmed("user_1", "ord_9", PaymentMethod::Paypal);
        let expected = serde_json::to_string(&order).unwrap();

        Mock::given(method("POST"))
            .and(path("/orders"))
            .and(body_json_string(expected))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let store = HttpOrderStore::new(format!("{}/orders", server.uri()));
        store.create_order(order).await.unwrap();
    }

    #[tokio::test]
    async fn test_http_order_store_surfaces_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(409).set_body_string("duplicate"))
            .mount(&server)
            .await;

        let store = HttpOrderStore::new(format!("{}/orders", server.uri()));
        let err = store
            .create_order(OrderRecord::confirmed("u", "p", PaymentMethod::Card))
            .await
            .unwrap_err();

        assert!(matches!(err, PaymentError::OrderPersist(_)));
        assert!(err.to_string().contains("duplicate"));
    }
}
