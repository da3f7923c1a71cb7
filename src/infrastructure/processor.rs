//! REST client for the card processor (Stripe-compatible API).

use crate::domain::order::Order;
use crate::domain::ports::{CheckoutSession, PaymentProcessor};
use crate::domain::settlement::{BalanceDetail, RawBalanceRef};
use crate::error::{OrderError, Result};
use crate::infrastructure::http_client::response_text;
use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Deserialize;

pub struct HttpPaymentProcessor {
    client: reqwest::Client,
    base_url: String,
    secret_key: String,
}

impl HttpPaymentProcessor {
    pub fn new(
        client: reqwest::Client,
        base_url: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            secret_key: secret_key.into(),
        }
    }
}

#[derive(Deserialize)]
struct RawSession {
    id: String,
    url: Option<String>,
}

#[derive(Deserialize)]
struct RawIntent {
    #[serde(default)]
    latest_charge: Option<RawChargeRef>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawChargeRef {
    Expanded {
        #[serde(default)]
        balance_transaction: Option<RawBalanceRef>,
    },
    #[allow(dead_code)]
    Id(String),
}

/// Major units to the processor's integer minor units.
fn to_minor_units(amount: Decimal) -> Result<i64> {
    (amount * Decimal::ONE_HUNDRED)
        .round()
        .to_i64()
        .ok_or_else(|| OrderError::Processor(format!("amount {amount} out of range")))
}

/// Form fields for a one-item hosted checkout that settles `order`.
fn checkout_form(order: &Order, return_url: &str) -> Result<Vec<(String, String)>> {
    let id = order.id.to_string();
    let fields = [
        ("mode", "payment".to_string()),
        ("success_url", return_url.to_string()),
        ("cancel_url", return_url.to_string()),
        ("client_reference_id", id.clone()),
        ("customer_email", order.customer.email.clone()),
        ("metadata[order_id]", id.clone()),
        ("payment_intent_data[metadata][order_id]", id.clone()),
        ("line_items[0][quantity]", "1".to_string()),
        (
            "line_items[0][price_data][currency]",
            order.currency.to_lowercase(),
        ),
        (
            "line_items[0][price_data][unit_amount]",
            to_minor_units(order.price)?.to_string(),
        ),
        (
            "line_items[0][price_data][product_data][name]",
            format!("{} ({})", order.plan_id, id),
        ),
    ];
    Ok(fields
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect())
}

#[async_trait]
impl PaymentProcessor for HttpPaymentProcessor {
    async fn create_checkout(&self, order: &Order, return_url: &str) -> Result<CheckoutSession> {
        let response = self
            .client
            .post(format!("{}/v1/checkout/sessions", self.base_url))
            .bearer_auth(&self.secret_key)
            .form(&checkout_form(order, return_url)?)
            .send()
            .await?;
        let session: RawSession = serde_json::from_str(&response_text(response).await?)?;
        let url = session.url.ok_or_else(|| {
            OrderError::Processor(format!("checkout session {} has no url", session.id))
        })?;
        Ok(CheckoutSession {
            id: session.id,
            url,
        })
    }

    async fn settlement_detail(&self, payment_intent: &str) -> Result<Option<BalanceDetail>> {
        let response = self
            .client
            .get(format!(
                "{}/v1/payment_intents/{}",
                self.base_url, payment_intent
            ))
            .bearer_auth(&self.secret_key)
            .query(&[("expand[]", "latest_charge.balance_transaction")])
            .send()
            .await?;
        let intent: RawIntent = serde_json::from_str(&response_text(response).await?)?;
        Ok(match intent.latest_charge {
            Some(RawChargeRef::Expanded {
                balance_transaction: Some(balance),
            }) => balance.expanded(),
            _ => None,
        })
    }
}
