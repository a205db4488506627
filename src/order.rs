//! Order service boundary: create a payable order when the gate closes.
//!
//! ## Trust boundary
//!
//! Payment proof (`payment_id` + `order_id`) supplied by the caller is
//! accepted at face value: its presence is all the pipeline checks. Signature
//! verification against the provider is not performed here. This is a
//! documented boundary of the service, not a security control.
//!
//! ## Disabled state
//!
//! Without credentials no [`OrderService`] is constructed at all; the pipeline
//! then answers every closed gate with
//! [`Doc2PdfError::OrderServiceUnavailable`].

use crate::config::OrderServiceConfig;
use crate::error::Doc2PdfError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, warn};

/// Caller-supplied assertion that a payment was completed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentProof {
    pub payment_id: String,
    pub order_id: String,
}

impl PaymentProof {
    /// `Some` only when both identifiers are present and non-blank.
    pub fn from_parts(payment_id: Option<String>, order_id: Option<String>) -> Option<Self> {
        match (payment_id, order_id) {
            (Some(p), Some(o)) if !p.trim().is_empty() && !o.trim().is_empty() => Some(Self {
                payment_id: p.trim().to_string(),
                order_id: o.trim().to_string(),
            }),
            _ => None,
        }
    }
}

/// A payable order created by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: String,
    /// Amount in the currency's minor unit.
    pub amount: u64,
    pub currency: String,
}

/// Creates payable orders. Every call creates a new order.
#[async_trait]
pub trait OrderService: Send + Sync {
    async fn create_order(&self, amount_minor_units: u64, currency: &str) -> Result<Order, Doc2PdfError>;
}

/// Razorpay-compatible REST client (`POST /v1/orders`, HTTP basic auth).
#[derive(Debug, Clone)]
pub struct HttpOrderService {
    client: reqwest::Client,
    config: OrderServiceConfig,
}

#[derive(Debug, Serialize)]
struct CreateOrderRequest<'a> {
    amount: u64,
    currency: &'a str,
    payment_capture: u8,
    notes: OrderNotes<'a>,
}

#[derive(Debug, Serialize)]
struct OrderNotes<'a> {
    purpose: &'a str,
}

#[derive(Debug, Deserialize)]
struct CreateOrderResponse {
    id: String,
    amount: u64,
    #[serde(default)]
    currency: Option<String>,
}

impl HttpOrderService {
    pub fn new(config: OrderServiceConfig) -> Result<Self, Doc2PdfError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Doc2PdfError::InvalidConfig(format!("order client: {e}")))?;
        Ok(Self { client, config })
    }

    /// Public key id, safe to hand to a browser checkout widget.
    pub fn key_id(&self) -> &str {
        &self.config.credentials.key_id
    }

    fn orders_url(&self) -> String {
        format!("{}/v1/orders", self.config.base_url)
    }
}

#[async_trait]
impl OrderService for HttpOrderService {
    async fn create_order(&self, amount_minor_units: u64, currency: &str) -> Result<Order, Doc2PdfError> {
        let url = self.orders_url();
        let body = CreateOrderRequest {
            amount: amount_minor_units,
            currency,
            payment_capture: 1,
            notes: OrderNotes { purpose: "doc2pdf" },
        };

        let response = self
            .client
            .post(&url)
            .basic_auth(
                &self.config.credentials.key_id,
                Some(&self.config.credentials.key_secret),
            )
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                let reason = if e.is_timeout() {
                    format!("order request timed out after {}s", self.config.timeout_secs)
                } else {
                    format!("order request failed: {e}")
                };
                warn!("{}", reason);
                Doc2PdfError::OrderServiceUnavailable { reason }
            })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| Doc2PdfError::OrderServiceUnavailable {
                reason: format!("reading order response: {e}"),
            })?;

        if !status.is_success() {
            warn!("Order provider answered HTTP {}", status);
            return Err(Doc2PdfError::OrderServiceUnavailable {
                reason: format!("order provider answered HTTP {status}"),
            });
        }

        let order = parse_order(&text, currency)?;
        info!("Created order {} for {} {}", order.order_id, order.amount, order.currency);
        Ok(order)
    }
}

/// Decode the provider's create-order response.
fn parse_order(body: &str, requested_currency: &str) -> Result<Order, Doc2PdfError> {
    let parsed: CreateOrderResponse =
        serde_json::from_str(body).map_err(|e| Doc2PdfError::OrderServiceUnavailable {
            reason: format!("malformed order response: {e}"),
        })?;
    if parsed.id.is_empty() {
        return Err(Doc2PdfError::OrderServiceUnavailable {
            reason: "order response carried an empty id".into(),
        });
    }
    Ok(Order {
        order_id: parsed.id,
        amount: parsed.amount,
        currency: parsed
            .currency
            .unwrap_or_else(|| requested_currency.to_string()),
    })
}
