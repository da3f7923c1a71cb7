//! Settlement events delivered by the card processor.
//!
//! The processor's payload is decoded once, here, into [`SettlementEvent`].
//! Everything downstream works with named optional fields instead of
//! digging through raw JSON.

use crate::domain::order::{OrderId, SettlementAmounts};
use crate::error::{OrderError, Result};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Deserialize;
use serde::de::DeserializeOwned;

pub const CHECKOUT_COMPLETED: &str = "checkout.session.completed";
pub const PAYMENT_SUCCEEDED: &str = "payment_intent.succeeded";
pub const PAYMENT_FAILED: &str = "payment_intent.payment_failed";
pub const CHARGE_SUCCEEDED: &str = "charge.succeeded";

/// Fee and net settlement as the processor reports them, in its own
/// settlement currency and major units.
#[derive(Debug, Clone, PartialEq)]
pub struct BalanceDetail {
    pub fee: Decimal,
    pub net: Decimal,
    pub currency: String,
    /// Settlement-currency units per storefront-currency unit.
    pub exchange_rate: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SettlementKind {
    CheckoutCompleted {
        order_id: OrderId,
        paid: bool,
        payment_intent: Option<String>,
    },
    PaymentSucceeded {
        order_id: OrderId,
        payment_intent: String,
    },
    PaymentFailed {
        order_id: OrderId,
        reason: Option<String>,
    },
    ChargeSucceeded {
        order_id: OrderId,
        payment_intent: Option<String>,
        balance: Option<BalanceDetail>,
    },
    /// A recognised event type that carries no order reference.
    Unreferenced { event_type: String },
    Other { event_type: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct SettlementEvent {
    pub id: String,
    pub kind: SettlementKind,
}

impl SettlementEvent {
    pub fn order_id(&self) -> Option<&OrderId> {
        match &self.kind {
            SettlementKind::CheckoutCompleted { order_id, .. }
            | SettlementKind::PaymentSucceeded { order_id, .. }
            | SettlementKind::PaymentFailed { order_id, .. }
            | SettlementKind::ChargeSucceeded { order_id, .. } => Some(order_id),
            SettlementKind::Unreferenced { .. } | SettlementKind::Other { .. } => None,
        }
    }

    /// Decodes a raw webhook body.
    pub fn decode(body: &[u8]) -> Result<Self> {
        let raw: RawEvent = serde_json::from_slice(body)
            .map_err(|e| OrderError::MalformedEvent(e.to_string()))?;
        let object = raw.data.object;
        let event_type = raw.event_type;

        let kind = match event_type.as_str() {
            CHECKOUT_COMPLETED => {
                let session: RawCheckoutSession = parse_object(object)?;
                match session.metadata.order_id.or(session.client_reference_id) {
                    Some(order_id) => SettlementKind::CheckoutCompleted {
                        order_id: OrderId::from(order_id),
                        paid: session.payment_status.as_deref() == Some("paid"),
                        payment_intent: session.payment_intent,
                    },
                    None => SettlementKind::Unreferenced { event_type },
                }
            }
            PAYMENT_SUCCEEDED => {
                let intent: RawPaymentIntent = parse_object(object)?;
                match intent.metadata.order_id {
                    Some(order_id) => SettlementKind::PaymentSucceeded {
                        order_id: OrderId::from(order_id),
                        payment_intent: intent.id,
                    },
                    None => SettlementKind::Unreferenced { event_type },
                }
            }
            PAYMENT_FAILED => {
                let intent: RawPaymentIntent = parse_object(object)?;
                match intent.metadata.order_id {
                    Some(order_id) => SettlementKind::PaymentFailed {
                        order_id: OrderId::from(order_id),
                        reason: intent.last_payment_error.and_then(|e| e.message.or(e.code)),
                    },
                    None => SettlementKind::Unreferenced { event_type },
                }
            }
            CHARGE_SUCCEEDED => {
                let charge: RawCharge = parse_object(object)?;
                match charge.metadata.order_id {
                    Some(order_id) => SettlementKind::ChargeSucceeded {
                        order_id: OrderId::from(order_id),
                        payment_intent: charge.payment_intent,
                        balance: charge.balance_transaction.and_then(RawBalanceRef::expanded),
                    },
                    None => SettlementKind::Unreferenced { event_type },
                }
            }
            _ => SettlementKind::Other { event_type },
        };

        Ok(Self { id: raw.id, kind })
    }
}

fn parse_object<T: DeserializeOwned>(object: serde_json::Value) -> Result<T> {
    serde_json::from_value(object).map_err(|e| OrderError::MalformedEvent(e.to_string()))
}

/// Converts processor amounts into the storefront currency.
///
/// The processor's own rate wins; `default_rate` covers events without one
/// and rates too small to divide by. Results are rounded to cents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrencyConversion {
    pub default_rate: Decimal,
}

impl CurrencyConversion {
    /// `None` when neither rate yields representable amounts.
    pub fn convert(&self, detail: &BalanceDetail) -> Option<SettlementAmounts> {
        detail
            .exchange_rate
            .filter(|rate| *rate > Decimal::ZERO)
            .and_then(|rate| convert_at(detail, rate))
            .or_else(|| convert_at(detail, self.default_rate))
    }
}

fn convert_at(detail: &BalanceDetail, rate: Decimal) -> Option<SettlementAmounts> {
    Some(SettlementAmounts {
        fee: to_display(detail.fee, rate)?,
        net: to_display(detail.net, rate)?,
    })
}

fn to_display(amount: Decimal, rate: Decimal) -> Option<Decimal> {
    if rate <= Decimal::ZERO {
        return None;
    }
    amount
        .checked_div(rate)
        .map(|v| v.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
}

/// Minor units (cents) to major units.
pub fn from_minor_units(amount: i64) -> Decimal {
    Decimal::new(amount, 2)
}

#[derive(Deserialize)]
struct RawEvent {
    id: String,
    #[serde(rename = "type")]
    event_type: String,
    data: RawData,
}

#[derive(Deserialize)]
struct RawData {
    object: serde_json::Value,
}

#[derive(Deserialize, Default)]
struct RawMetadata {
    order_id: Option<String>,
}

#[derive(Deserialize)]
struct RawCheckoutSession {
    #[serde(default)]
    client_reference_id: Option<String>,
    #[serde(default)]
    metadata: RawMetadata,
    #[serde(default)]
    payment_status: Option<String>,
    #[serde(default)]
    payment_intent: Option<String>,
}

#[derive(Deserialize)]
struct RawPaymentError {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Deserialize)]
struct RawPaymentIntent {
    id: String,
    #[serde(default)]
    metadata: RawMetadata,
    #[serde(default)]
    last_payment_error: Option<RawPaymentError>,
}

#[derive(Deserialize)]
struct RawCharge {
    #[serde(default)]
    payment_intent: Option<String>,
    #[serde(default)]
    metadata: RawMetadata,
    #[serde(default)]
    balance_transaction: Option<RawBalanceRef>,
}

/// A balance transaction is either an id or, when expanded, the object.
#[derive(Deserialize)]
#[serde(untagged)]
pub(crate) enum RawBalanceRef {
    Expanded(RawBalanceTransaction),
    #[allow(dead_code)]
    Id(String),
}

impl RawBalanceRef {
    pub(crate) fn expanded(self) -> Option<BalanceDetail> {
        match self {
            RawBalanceRef::Expanded(tx) => Some(tx.into_detail()),
            RawBalanceRef::Id(_) => None,
        }
    }
}

#[derive(Deserialize)]
pub(crate) struct RawBalanceTransaction {
    fee: i64,
    net: i64,
    currency: String,
    #[serde(default)]
    exchange_rate: Option<Decimal>,
}

impl RawBalanceTransaction {
    pub(crate) fn into_detail(self) -> BalanceDetail {
        BalanceDetail {
            fee: from_minor_units(self.fee),
            net: from_minor_units(self.net),
            currency: self.currency.to_uppercase(),
            exchange_rate: self.exchange_rate,
        }
    }
}
