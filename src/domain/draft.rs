use crate::domain::catalog::{Plan, PlanPricing};
use crate::domain::order::{Attribution, Customer, Locale, OrderSubmission};
use crate::domain::period::{PolicyPeriod, inclusive_day_count};
use crate::domain::ports::DocumentFields;
use crate::domain::pricing::{PricingRules, SubscriptionOption};
use crate::domain::transliteration::transliterate;
use crate::domain::validation::{self, Field, FieldError, Problem};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The order form as the customer is filling it in.
///
/// Every field may be empty; [`OrderDraft::validate`] decides whether the
/// form can be submitted.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OrderDraft {
    pub first_name: String,
    pub last_name: String,
    pub birth_date: Option<NaiveDate>,
    pub passport_number: String,
    pub citizenship: String,
    pub phone: String,
    pub email: String,
    pub city: String,
    pub period_start: Option<NaiveDate>,
    pub period_end: Option<NaiveDate>,
    pub subscription_option: Option<SubscriptionOption>,
    pub locale: Locale,
    #[serde(skip)]
    pub document: Option<Vec<u8>>,
}

/// Price preview shown while the form is being filled in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quote {
    pub period: PolicyPeriod,
    pub price: Decimal,
}

impl OrderDraft {
    /// Sets a text field. Name fields are transliterated as they are typed.
    /// Returns `false` for fields that do not hold text.
    pub fn set_text(&mut self, field: Field, value: &str) -> bool {
        let slot = match field {
            Field::FirstName => {
                self.first_name = transliterate(value);
                return true;
            }
            Field::LastName => {
                self.last_name = transliterate(value);
                return true;
            }
            Field::PassportNumber => &mut self.passport_number,
            Field::Citizenship => &mut self.citizenship,
            Field::Phone => &mut self.phone,
            Field::Email => &mut self.email,
            Field::City => &mut self.city,
            _ => return false,
        };
        *slot = value.trim().to_string();
        true
    }

    /// Sets a date field. Returns `false` for fields that do not hold a date.
    pub fn set_date(&mut self, field: Field, date: NaiveDate) -> bool {
        match field {
            Field::BirthDate => self.birth_date = Some(date),
            Field::PeriodStart => self.period_start = Some(date),
            Field::PeriodEnd => self.period_end = Some(date),
            _ => return false,
        }
        true
    }

    /// Copies whatever a document scan recognised over the form.
    pub fn apply_document(&mut self, fields: DocumentFields) {
        if let Some(first_name) = fields.first_name {
            self.set_text(Field::FirstName, &first_name);
        }
        if let Some(last_name) = fields.last_name {
            self.set_text(Field::LastName, &last_name);
        }
        if let Some(birth_date) = fields.birth_date {
            self.birth_date = Some(birth_date);
        }
        if let Some(passport_number) = fields.passport_number {
            self.set_text(Field::PassportNumber, &passport_number);
        }
        if let Some(citizenship) = fields.citizenship {
            self.set_text(Field::Citizenship, &citizenship);
        }
    }

    /// Current price, if the period and options are complete and acceptable.
    pub fn quote(&self, plan: &Plan, rules: &PricingRules) -> Option<Quote> {
        let model = plan.pricing_model(self.subscription_option).ok()?;
        let period = model.period(self.period_start?, self.period_end).ok()?;
        let price = rules.quote(&model, &period).ok()?;
        Some(Quote { period, price })
    }

    /// Checks the whole form and builds the submission payload.
    pub fn validate(
        &self,
        plan: &Plan,
        rules: &PricingRules,
    ) -> Result<OrderSubmission, Vec<FieldError>> {
        let mut errors = Vec::new();
        validation::check_contact_fields(
            &mut errors,
            &self.first_name,
            &self.last_name,
            &self.passport_number,
            &self.citizenship,
            &self.phone,
            &self.email,
            &self.city,
        );
        if self.birth_date.is_none() {
            errors.push(FieldError::new(Field::BirthDate, Problem::Missing));
        }
        self.check_period(plan, rules, &mut errors);

        match (errors.is_empty(), self.birth_date, self.period_start) {
            (true, Some(birth_date), Some(period_start)) => Ok(OrderSubmission {
                plan_id: plan.id.clone(),
                customer: Customer {
                    first_name: self.first_name.clone(),
                    last_name: self.last_name.clone(),
                    birth_date,
                    passport_number: self.passport_number.clone(),
                    citizenship: self.citizenship.clone(),
                    phone: self.phone.clone(),
                    email: self.email.clone(),
                    city: self.city.clone(),
                },
                period_start,
                period_end: self.period_end,
                subscription_option: self.subscription_option,
                locale: self.locale,
                attribution: Attribution::default(),
            }),
            _ => Err(errors),
        }
    }

    fn check_period(&self, plan: &Plan, rules: &PricingRules, errors: &mut Vec<FieldError>) {
        let Some(start) = self.period_start else {
            errors.push(FieldError::new(Field::PeriodStart, Problem::Missing));
            return;
        };
        match plan.pricing {
            PlanPricing::PerDay { .. } => match self.period_end {
                None => errors.push(FieldError::new(Field::PeriodEnd, Problem::Missing)),
                Some(end) if end < start => {
                    errors.push(FieldError::new(Field::PeriodEnd, Problem::BeforeStart))
                }
                Some(end) if inclusive_day_count(start, end) < rules.min_per_day_days => {
                    errors.push(FieldError::new(
                        Field::PeriodEnd,
                        Problem::TooShort {
                            min_days: rules.min_per_day_days,
                        },
                    ))
                }
                Some(_) => {}
            },
            PlanPricing::Subscription { .. } if self.subscription_option.is_none() => {
                errors.push(FieldError::new(Field::PaymentOption, Problem::Missing))
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::catalog::Catalog;
    use rust_decimal_macros::dec;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn filled() -> OrderDraft {
        let mut draft = OrderDraft::default();
        draft.set_text(Field::FirstName, "Nino");
        draft.set_text(Field::LastName, "ბერიძე");
        draft.set_date(Field::BirthDate, date("1990-04-12"));
        draft.set_text(Field::PassportNumber, " 13AB45678 ");
        draft.set_text(Field::Citizenship, "GE");
        draft.set_text(Field::Phone, "+995 555 12 34 56");
        draft.set_text(Field::Email, "nino@example.ge");
        draft.set_text(Field::City, "Tbilisi");
        draft.set_date(Field::PeriodStart, date("2025-01-01"));
        draft.set_date(Field::PeriodEnd, date("2025-01-05"));
        draft
    }

    #[test]
    fn test_names_are_transliterated_on_entry() {
        let draft = filled();
        assert_eq!(draft.first_name, "NINO");
        assert_eq!(draft.last_name, "BERIDZE");
        assert_eq!(draft.passport_number, "13AB45678");
    }

    #[test]
    fn test_per_day_quote() {
        let catalog = Catalog::default();
        let plan = catalog.plan("travel-daily").unwrap();
        let quote = filled().quote(plan, &PricingRules::default()).unwrap();
        assert_eq!(quote.period.number_of_days(), 5);
        assert_eq!(quote.price, dec!(15));
    }

    #[test]
    fn test_short_period_is_rejected() {
        let catalog = Catalog::default();
        let plan = catalog.plan("travel-daily").unwrap();
        let mut draft = filled();
        draft.set_date(Field::PeriodEnd, date("2025-01-04"));

        assert!(draft.quote(plan, &PricingRules::default()).is_none());
        assert_eq!(
            draft.validate(plan, &PricingRules::default()).unwrap_err(),
            vec![FieldError::new(
                Field::PeriodEnd,
                Problem::TooShort { min_days: 5 }
            )]
        );
    }

    #[test]
    fn test_subscription_requires_option() {
        let catalog = Catalog::default();
        let plan = catalog.plan("health-subscription").unwrap();
        let mut draft = filled();
        draft.period_end = None;

        let errors = draft.validate(plan, &PricingRules::default()).unwrap_err();
        assert_eq!(errors, vec![FieldError::new(Field::PaymentOption, Problem::Missing)]);

        draft.subscription_option = Some(SubscriptionOption::Quarterly);
        assert_eq!(
            draft.quote(plan, &PricingRules::default()).unwrap().price,
            dec!(90)
        );
        let submission = draft.validate(plan, &PricingRules::default()).unwrap();
        assert_eq!(submission.plan_id, "health-subscription");
    }

    #[test]
    fn test_document_fields_fill_form() {
        let mut draft = OrderDraft::default();
        draft.set_text(Field::City, "Batumi");
        draft.apply_document(DocumentFields {
            first_name: Some("Георгий".to_string()),
            last_name: None,
            birth_date: Some(date("1985-07-01")),
            passport_number: Some("A1234567".to_string()),
            citizenship: None,
        });
        assert_eq!(draft.first_name, "GEORGII");
        assert_eq!(draft.birth_date, Some(date("1985-07-01")));
        assert_eq!(draft.city, "Batumi");
        assert!(draft.last_name.is_empty());
    }

    #[test]
    fn test_non_text_field_refused() {
        let mut draft = OrderDraft::default();
        assert!(!draft.set_text(Field::PeriodStart, "2025-01-01"));
        assert!(!draft.set_date(Field::Email, date("2025-01-01")));
    }
}
