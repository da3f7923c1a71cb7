use crate::domain::order::{Order, OrderId, PaymentMethod};
use crate::domain::pricing::{PricingModel, SubscriptionOption};
use crate::error::{OrderError, Result};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// How a plan is priced, before the customer picks any options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "kebab-case")]
pub enum PlanPricing {
    #[serde(rename_all = "camelCase")]
    PerDay { daily_rate: Decimal },
    #[serde(rename_all = "camelCase")]
    FixedPeriod { months: u32, period_rate: Decimal },
    #[serde(rename_all = "camelCase")]
    Subscription { monthly_rate: Decimal },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    pub id: String,
    pub name: String,
    pub currency: String,
    pub pricing: PlanPricing,
}

impl Plan {
    /// Resolves the plan into the pricing model an order records.
    ///
    /// Subscriptions need the customer's payment option; other plans ignore it.
    pub fn pricing_model(&self, option: Option<SubscriptionOption>) -> Result<PricingModel> {
        match self.pricing {
            PlanPricing::PerDay { daily_rate } => Ok(PricingModel::PerDay { daily_rate }),
            PlanPricing::FixedPeriod {
                months,
                period_rate,
            } => Ok(PricingModel::FixedPeriod {
                months,
                period_rate,
            }),
            PlanPricing::Subscription { monthly_rate } => {
                let option = option.ok_or_else(|| {
                    OrderError::ValidationError(format!(
                        "Plan {} needs a quarterly or yearly payment option",
                        self.id
                    ))
                })?;
                Ok(PricingModel::Subscription {
                    monthly_rate,
                    option,
                })
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankAccount {
    pub beneficiary: String,
    pub bank_name: String,
    pub iban: String,
    pub swift: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireServiceAccount {
    pub partner: String,
    pub recipient: String,
    pub country: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CryptoWallet {
    pub network: String,
    pub asset: String,
    pub address: String,
}

/// Destinations shown for the manually settled payment methods.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementAccounts {
    pub bank: BankAccount,
    pub wire_service: WireServiceAccount,
    pub crypto: CryptoWallet,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstructionLine {
    pub label: String,
    pub value: String,
}

/// Static text the confirmation view renders for a manual payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementInstructions {
    pub method: PaymentMethod,
    pub reference: OrderId,
    pub amount: Decimal,
    pub currency: String,
    pub lines: Vec<InstructionLine>,
}

fn line(label: &str, value: &str) -> InstructionLine {
    InstructionLine {
        label: label.to_string(),
        value: value.to_string(),
    }
}

impl SettlementAccounts {
    /// Instructions for a manual method; `None` for card, which settles off-site.
    pub fn instructions(&self, method: PaymentMethod, order: &Order) -> Option<SettlementInstructions> {
        let lines = match method {
            PaymentMethod::Card => return None,
            PaymentMethod::BankTransfer => vec![
                line("Beneficiary", &self.bank.beneficiary),
                line("Bank", &self.bank.bank_name),
                line("IBAN", &self.bank.iban),
                line("SWIFT", &self.bank.swift),
            ],
            PaymentMethod::WireService => vec![
                line("Service", &self.wire_service.partner),
                line("Recipient", &self.wire_service.recipient),
                line("Country", &self.wire_service.country),
            ],
            PaymentMethod::Crypto => vec![
                line("Network", &self.crypto.network),
                line("Asset", &self.crypto.asset),
                line("Wallet", &self.crypto.address),
            ],
        };
        let mut lines = lines;
        lines.push(line("Payment reference", order.id.as_str()));
        Some(SettlementInstructions {
            method,
            reference: order.id.clone(),
            amount: order.price,
            currency: order.currency.clone(),
            lines,
        })
    }
}

/// Plans on sale plus the manual settlement destinations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Catalog {
    pub plans: Vec<Plan>,
    pub settlement_accounts: SettlementAccounts,
}

impl Catalog {
    pub fn plan(&self, id: &str) -> Option<&Plan> {
        self.plans.iter().find(|plan| plan.id == id)
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self {
            plans: vec![
                Plan {
                    id: "travel-daily".to_string(),
                    name: "Travel insurance, per day".to_string(),
                    currency: "GEL".to_string(),
                    pricing: PlanPricing::PerDay {
                        daily_rate: dec!(3),
                    },
                },
                Plan {
                    id: "resident-6m".to_string(),
                    name: "Resident insurance, 6 months".to_string(),
                    currency: "GEL".to_string(),
                    pricing: PlanPricing::FixedPeriod {
                        months: 6,
                        period_rate: dec!(150),
                    },
                },
                Plan {
                    id: "resident-12m".to_string(),
                    name: "Resident insurance, 12 months".to_string(),
                    currency: "GEL".to_string(),
                    pricing: PlanPricing::FixedPeriod {
                        months: 12,
                        period_rate: dec!(270),
                    },
                },
                Plan {
                    id: "health-subscription".to_string(),
                    name: "Health subscription".to_string(),
                    currency: "GEL".to_string(),
                    pricing: PlanPricing::Subscription {
                        monthly_rate: dec!(30),
                    },
                },
            ],
            settlement_accounts: SettlementAccounts {
                bank: BankAccount {
                    beneficiary: "Policy Desk LLC".to_string(),
                    bank_name: "Bank of Georgia".to_string(),
                    iban: "GE00BG0000000000000000".to_string(),
                    swift: "BAGAGE22".to_string(),
                },
                wire_service: WireServiceAccount {
                    partner: "Regional money transfer".to_string(),
                    recipient: "Policy Desk LLC".to_string(),
                    country: "Georgia".to_string(),
                },
                crypto: CryptoWallet {
                    network: "TRON (TRC-20)".to_string(),
                    asset: "USDT".to_string(),
                    address: "T0000000000000000000000000000000000".to_string(),
                },
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::fixtures;

    #[test]
    fn test_subscription_plan_requires_option() {
        let catalog = Catalog::default();
        let plan = catalog.plan("health-subscription").unwrap();
        assert!(matches!(
            plan.pricing_model(None),
            Err(OrderError::ValidationError(_))
        ));
        assert_eq!(
            plan.pricing_model(Some(SubscriptionOption::Yearly)).unwrap(),
            PricingModel::Subscription {
                monthly_rate: dec!(30),
                option: SubscriptionOption::Yearly
            }
        );
    }

    #[test]
    fn test_instructions_carry_order_reference() {
        let accounts = Catalog::default().settlement_accounts;
        let order = fixtures::pending_order("TI-250101-ABCDEF");

        assert!(accounts.instructions(PaymentMethod::Card, &order).is_none());

        let crypto = accounts
            .instructions(PaymentMethod::Crypto, &order)
            .unwrap();
        assert_eq!(crypto.reference, order.id);
        assert_eq!(crypto.amount, dec!(15));
        assert!(
            crypto
                .lines
                .iter()
                .any(|l| l.label == "Payment reference" && l.value == "TI-250101-ABCDEF")
        );
    }

    #[test]
    fn test_catalog_file_format() {
        let json = r#"{
            "plans": [
                {"id": "p1", "name": "Plan", "currency": "USD",
                 "pricing": {"model": "fixed-period", "months": 3, "periodRate": "45.50"}}
            ],
            "settlementAccounts": {
                "bank": {"beneficiary": "B", "bankName": "N", "iban": "I", "swift": "S"},
                "wireService": {"partner": "P", "recipient": "R", "country": "C"},
                "crypto": {"network": "N", "asset": "A", "address": "X"}
            }
        }"#;
        let catalog: Catalog = serde_json::from_str(json).unwrap();
        assert_eq!(
            catalog.plan("p1").unwrap().pricing,
            PlanPricing::FixedPeriod {
                months: 3,
                period_rate: dec!(45.50)
            }
        );
        assert!(catalog.plan("missing").is_none());
    }
}
