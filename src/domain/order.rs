use crate::domain::period::PolicyPeriod;
use crate::domain::pricing::{PricingModel, PricingRules, compute_price};
use crate::domain::validation::{self, FieldError};
use crate::error::{OrderError, Result};
use chrono::{DateTime, NaiveDate, Utc};
use rand::Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

const ID_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
const ID_SUFFIX_LEN: usize = 6;

/// Human-readable order identifier, e.g. `TI-250101-7QX2KD`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(String);

impl OrderId {
    /// Generates `<prefix>-<YYMMDD>-<6 random characters>`.
    pub fn generate<R: Rng + ?Sized>(prefix: &str, today: NaiveDate, rng: &mut R) -> Self {
        let suffix: String = (0..ID_SUFFIX_LEN)
            .map(|_| ID_ALPHABET[rng.gen_range(0..ID_ALPHABET.len())] as char)
            .collect();
        Self(format!("{prefix}-{}-{suffix}", today.format("%y%m%d")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for OrderId {
    fn from(value: &str) -> Self {
        Self(value.trim().to_string())
    }
}

impl From<String> for OrderId {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle of an order as seen by settlement.
///
/// `Pending` may move to either terminal status; nothing ever moves back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Paid,
    PaymentFailed,
}

impl OrderStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, OrderStatus::Pending)
    }

    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        self == OrderStatus::Pending && next.is_terminal()
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Paid => "paid",
            OrderStatus::PaymentFailed => "payment_failed",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PaymentMethod {
    Card,
    BankTransfer,
    WireService,
    Crypto,
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PaymentMethod::Card => "card",
            PaymentMethod::BankTransfer => "bank-transfer",
            PaymentMethod::WireService => "wire-service",
            PaymentMethod::Crypto => "crypto",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Ka,
    Ru,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub first_name: String,
    pub last_name: String,
    pub birth_date: NaiveDate,
    pub passport_number: String,
    pub citizenship: String,
    pub phone: String,
    pub email: String,
    pub city: String,
}

impl Customer {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Marketing attribution captured at submission time.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Attribution {
    pub subid: Option<String>,
    pub click_id: Option<String>,
    pub utm_source: Option<String>,
    pub utm_medium: Option<String>,
    pub utm_campaign: Option<String>,
}

/// What the customer submits; the price is never part of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSubmission {
    pub plan_id: String,
    pub customer: Customer,
    pub period_start: NaiveDate,
    #[serde(default)]
    pub period_end: Option<NaiveDate>,
    #[serde(default)]
    pub subscription_option: Option<crate::domain::pricing::SubscriptionOption>,
    #[serde(default)]
    pub locale: Locale,
    #[serde(default)]
    pub attribution: Attribution,
}

/// Processor fee and net settlement, already in the storefront currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementAmounts {
    pub fee: Decimal,
    pub net: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub plan_id: String,
    pub customer: Customer,
    pub period: PolicyPeriod,
    pub pricing: PricingModel,
    pub price: Decimal,
    pub currency: String,
    pub status: OrderStatus,
    pub payment_method: Option<PaymentMethod>,
    pub processor_fee: Option<Decimal>,
    pub processor_net_amount: Option<Decimal>,
    pub failure_reason: Option<String>,
    /// Set when the processor reports a payment for an order that had
    /// already failed; the status stays `payment_failed`.
    #[serde(default)]
    pub needs_review: bool,
    pub locale: Locale,
    pub attribution: Attribution,
    pub has_document: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Field-scoped changes the two post-creation writers may make.
#[derive(Debug, Clone, PartialEq)]
pub enum OrderUpdate {
    PaymentMethod(PaymentMethod),
    Settlement(SettlementUpdate),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SettlementUpdate {
    pub status: Option<OrderStatus>,
    pub payment_method: Option<PaymentMethod>,
    pub amounts: Option<SettlementAmounts>,
    pub failure_reason: Option<String>,
}

/// What [`Order::apply`] did to the status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusChange {
    Unchanged(OrderStatus),
    Transitioned { from: OrderStatus, to: OrderStatus },
    /// The requested status was refused because the order already left `Pending`.
    Refused {
        current: OrderStatus,
        requested: OrderStatus,
    },
}

impl Order {
    /// Creates a pending order, checking every creation invariant.
    pub fn create(
        id: OrderId,
        submission: OrderSubmission,
        pricing: PricingModel,
        currency: &str,
        rules: &PricingRules,
        has_document: bool,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        let problems = validation::check_customer(&submission.customer);
        if !problems.is_empty() {
            return Err(OrderError::ValidationError(describe(&problems)));
        }
        let period = pricing.period(submission.period_start, submission.period_end)?;
        let price = rules.quote(&pricing, &period)?;

        Ok(Self {
            id,
            plan_id: submission.plan_id,
            customer: submission.customer,
            period,
            pricing,
            price,
            currency: currency.to_string(),
            status: OrderStatus::Pending,
            payment_method: None,
            processor_fee: None,
            processor_net_amount: None,
            failure_reason: None,
            needs_review: false,
            locale: submission.locale,
            attribution: submission.attribution,
            has_document,
            created_at: now,
            updated_at: now,
        })
    }

    /// The price the pricing rules give for the stored parameters.
    pub fn recomputed_price(&self) -> Decimal {
        compute_price(&self.pricing, &self.period)
    }

    /// Applies a field-scoped update.
    ///
    /// Re-applying the same update leaves the order unchanged, and no update
    /// moves the status out of a terminal value.
    pub fn apply(&mut self, update: &OrderUpdate, now: DateTime<Utc>) -> StatusChange {
        let change = match update {
            OrderUpdate::PaymentMethod(method) => {
                // Once paid, the settled method is the one that counts.
                if self.status != OrderStatus::Paid {
                    self.payment_method = Some(*method);
                }
                StatusChange::Unchanged(self.status)
            }
            OrderUpdate::Settlement(settlement) => self.apply_settlement(settlement),
        };
        self.updated_at = now;
        change
    }

    fn apply_settlement(&mut self, update: &SettlementUpdate) -> StatusChange {
        if let Some(amounts) = update.amounts {
            self.processor_fee = Some(amounts.fee);
            self.processor_net_amount = Some(amounts.net);
        }

        let change = match update.status {
            None => StatusChange::Unchanged(self.status),
            Some(requested) if requested == self.status => StatusChange::Unchanged(self.status),
            Some(requested) if self.status.can_transition_to(requested) => {
                let from = self.status;
                self.status = requested;
                if requested == OrderStatus::PaymentFailed {
                    self.failure_reason = update.failure_reason.clone();
                }
                StatusChange::Transitioned {
                    from,
                    to: requested,
                }
            }
            Some(requested) => {
                if self.status == OrderStatus::PaymentFailed && requested == OrderStatus::Paid {
                    self.needs_review = true;
                }
                StatusChange::Refused {
                    current: self.status,
                    requested,
                }
            }
        };

        if self.status == OrderStatus::Paid
            && update.status == Some(OrderStatus::Paid)
            && let Some(method) = update.payment_method
        {
            self.payment_method = Some(method);
        }
        change
    }
}

fn describe(problems: &[FieldError]) -> String {
    problems
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use rust_decimal_macros::dec;

    fn paid() -> OrderUpdate {
        OrderUpdate::Settlement(SettlementUpdate {
            status: Some(OrderStatus::Paid),
            payment_method: Some(PaymentMethod::Card),
            amounts: Some(SettlementAmounts {
                fee: dec!(1.20),
                net: dec!(13.80),
            }),
            failure_reason: None,
        })
    }

    fn failed() -> OrderUpdate {
        OrderUpdate::Settlement(SettlementUpdate {
            status: Some(OrderStatus::PaymentFailed),
            failure_reason: Some("card_declined".to_string()),
            ..Default::default()
        })
    }

    #[test]
    fn test_order_id_format() {
        let mut rng = rand::thread_rng();
        let id = OrderId::generate("TI", "2025-01-01".parse().unwrap(), &mut rng);
        let parts: Vec<&str> = id.as_str().split('-').collect();
        assert_eq!(parts[0], "TI");
        assert_eq!(parts[1], "250101");
        assert_eq!(parts[2].len(), 6);
        assert!(parts[2].bytes().all(|b| ID_ALPHABET.contains(&b)));
    }

    #[test]
    fn test_create_computes_price() {
        let order = pending_order("TI-1");
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.period.number_of_days(), 5);
        assert_eq!(order.price, dec!(15));
        assert_eq!(order.recomputed_price(), order.price);
    }

    #[test]
    fn test_create_rejects_invalid_customer() {
        let mut submission = submission();
        submission.customer.email = "not-an-email".to_string();
        let result = Order::create(
            OrderId::from("TI-1"),
            submission,
            PricingModel::PerDay {
                daily_rate: dec!(3),
            },
            "GEL",
            &PricingRules::default(),
            false,
            Utc::now(),
        );
        assert!(matches!(result, Err(OrderError::ValidationError(msg)) if msg.contains("email")));
    }

    #[test]
    fn test_paid_is_terminal() {
        let mut order = pending_order("TI-1");
        assert_eq!(
            order.apply(&paid(), Utc::now()),
            StatusChange::Transitioned {
                from: OrderStatus::Pending,
                to: OrderStatus::Paid
            }
        );
        assert_eq!(
            order.apply(&failed(), Utc::now()),
            StatusChange::Refused {
                current: OrderStatus::Paid,
                requested: OrderStatus::PaymentFailed
            }
        );
        assert_eq!(order.status, OrderStatus::Paid);
        assert_eq!(order.failure_reason, None);
        assert_eq!(order.payment_method, Some(PaymentMethod::Card));
    }

    #[test]
    fn test_payment_after_failure_needs_review() {
        let mut order = pending_order("TI-1");
        order.apply(&failed(), Utc::now());
        assert!(!order.needs_review);

        assert_eq!(
            order.apply(&paid(), Utc::now()),
            StatusChange::Refused {
                current: OrderStatus::PaymentFailed,
                requested: OrderStatus::Paid
            }
        );
        assert_eq!(order.status, OrderStatus::PaymentFailed);
        assert!(order.needs_review);
    }

    #[test]
    fn test_settlement_is_idempotent() {
        let mut once = pending_order("TI-1");
        once.apply(&paid(), Utc::now());
        let mut twice = once.clone();
        assert_eq!(
            twice.apply(&paid(), once.updated_at),
            StatusChange::Unchanged(OrderStatus::Paid)
        );
        assert_eq!(once, twice);
    }

    #[test]
    fn test_fee_only_update_keeps_status() {
        let mut order = pending_order("TI-1");
        order.apply(&failed(), Utc::now());
        let fee_only = OrderUpdate::Settlement(SettlementUpdate {
            amounts: Some(SettlementAmounts {
                fee: dec!(2),
                net: dec!(13),
            }),
            ..Default::default()
        });
        order.apply(&fee_only, Utc::now());
        assert_eq!(order.status, OrderStatus::PaymentFailed);
        assert_eq!(order.processor_fee, Some(dec!(2)));
        assert_eq!(order.failure_reason.as_deref(), Some("card_declined"));
    }

    #[test]
    fn test_payment_method_frozen_once_paid() {
        let mut order = pending_order("TI-1");
        order.apply(&OrderUpdate::PaymentMethod(PaymentMethod::Crypto), Utc::now());
        assert_eq!(order.payment_method, Some(PaymentMethod::Crypto));

        order.apply(&paid(), Utc::now());
        order.apply(
            &OrderUpdate::PaymentMethod(PaymentMethod::BankTransfer),
            Utc::now(),
        );
        assert_eq!(order.payment_method, Some(PaymentMethod::Card));
    }

    #[test]
    fn test_status_wire_format() {
        assert_eq!(
            serde_json::to_string(&OrderStatus::PaymentFailed).unwrap(),
            "\"payment_failed\""
        );
        assert_eq!(
            serde_json::to_string(&PaymentMethod::WireService).unwrap(),
            "\"wire-service\""
        );
    }
}
