use crate::domain::period::PolicyPeriod;
use crate::error::{OrderError, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Shortest per-day policy the storefront sells, in days, both endpoints included.
pub const DEFAULT_MIN_PER_DAY_DAYS: u32 = 5;

/// How a subscription is billed: three or twelve months up front.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionOption {
    Quarterly,
    Yearly,
}

impl SubscriptionOption {
    pub fn multiplier(self) -> u32 {
        match self {
            SubscriptionOption::Quarterly => 3,
            SubscriptionOption::Yearly => 12,
        }
    }
}

/// The pricing parameters recorded on an order.
///
/// Rates are copied from the plan at submission time so the price can be
/// re-derived from the order alone, whatever happens to the catalog later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "kebab-case")]
pub enum PricingModel {
    #[serde(rename_all = "camelCase")]
    PerDay { daily_rate: Decimal },
    #[serde(rename_all = "camelCase")]
    FixedPeriod { months: u32, period_rate: Decimal },
    #[serde(rename_all = "camelCase")]
    Subscription {
        monthly_rate: Decimal,
        option: SubscriptionOption,
    },
}

impl PricingModel {
    /// Builds the covered period for this model.
    ///
    /// Per-day policies use the customer's end date; the other models derive
    /// the end from the start date and ignore `end`.
    pub fn period(&self, start: NaiveDate, end: Option<NaiveDate>) -> Result<PolicyPeriod> {
        match self {
            PricingModel::PerDay { .. } => {
                let end = end.ok_or_else(|| {
                    OrderError::ValidationError("Per-day policies need an end date".to_string())
                })?;
                PolicyPeriod::new(start, end)
            }
            PricingModel::FixedPeriod { months, .. } => PolicyPeriod::of_months(start, *months),
            PricingModel::Subscription { option, .. } => {
                PolicyPeriod::of_months(start, option.multiplier())
            }
        }
    }

    fn rate(&self) -> Decimal {
        match self {
            PricingModel::PerDay { daily_rate } => *daily_rate,
            PricingModel::FixedPeriod { period_rate, .. } => *period_rate,
            PricingModel::Subscription { monthly_rate, .. } => *monthly_rate,
        }
    }
}

/// Computes the premium for a model over a period. Pure.
pub fn compute_price(model: &PricingModel, period: &PolicyPeriod) -> Decimal {
    match model {
        PricingModel::PerDay { daily_rate } => *daily_rate * Decimal::from(period.number_of_days()),
        PricingModel::FixedPeriod { period_rate, .. } => *period_rate,
        PricingModel::Subscription {
            monthly_rate,
            option,
        } => *monthly_rate * Decimal::from(option.multiplier()),
    }
}

/// Business constants that gate which parameters may be priced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricingRules {
    pub min_per_day_days: u32,
}

impl Default for PricingRules {
    fn default() -> Self {
        Self {
            min_per_day_days: DEFAULT_MIN_PER_DAY_DAYS,
        }
    }
}

impl PricingRules {
    /// Earliest end date a per-day policy starting on `start` may have.
    pub fn earliest_end(&self, start: NaiveDate) -> Option<NaiveDate> {
        start.checked_add_days(chrono::Days::new(
            u64::from(self.min_per_day_days.saturating_sub(1)),
        ))
    }

    /// Checks that `model` may be priced over `period`.
    pub fn check(&self, model: &PricingModel, period: &PolicyPeriod) -> Result<()> {
        if model.rate() < Decimal::ZERO {
            return Err(OrderError::ValidationError(
                "Rate must not be negative".to_string(),
            ));
        }
        if let PricingModel::PerDay { .. } = model
            && period.number_of_days() < self.min_per_day_days
        {
            return Err(OrderError::ValidationError(format!(
                "Per-day policies must cover at least {} days",
                self.min_per_day_days
            )));
        }
        Ok(())
    }

    /// Validates and prices in one step.
    pub fn quote(&self, model: &PricingModel, period: &PolicyPeriod) -> Result<Decimal> {
        self.check(model, period)?;
        Ok(compute_price(model, period))
    }
}
