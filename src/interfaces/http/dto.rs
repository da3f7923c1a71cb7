//! Request and response bodies of the HTTP API.

use crate::application::payment::PaymentStep;
use crate::domain::order::{Order, OrderId, OrderStatus, PaymentMethod};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub order_id: OrderId,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentMethodRequest {
    pub order_id: OrderId,
    pub payment_method: PaymentMethod,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PaymentMethodResponse {
    pub acknowledged: bool,
    pub next: PaymentStep,
}

/// What the payment-status page polls for.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderView {
    pub order_id: OrderId,
    pub status: OrderStatus,
    pub price: Decimal,
    pub currency: String,
    pub payment_method: Option<PaymentMethod>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
    /// A payment arrived after the order failed; do not offer another charge.
    pub needs_review: bool,
}

impl From<Order> for OrderView {
    fn from(order: Order) -> Self {
        Self {
            order_id: order.id,
            status: order.status,
            price: order.price,
            currency: order.currency,
            payment_method: order.payment_method,
            failure_reason: order.failure_reason,
            needs_review: order.needs_review,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WebhookAck {
    pub received: bool,
}
