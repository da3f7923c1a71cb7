//! The order intake wizard as an explicit state machine.
//!
//! `form -> payment-selection -> confirmation`, with no way back once the
//! order has been submitted. The whole state is a plain serializable value,
//! so a front end only has to render it and forward user actions.

use crate::application::payment::PaymentStep;
use crate::domain::catalog::{Plan, SettlementInstructions};
use crate::domain::draft::{OrderDraft, Quote};
use crate::domain::messages;
use crate::domain::order::{OrderId, OrderStatus, OrderSubmission, PaymentMethod};
use crate::domain::ports::{AttributionSource, DocumentReader};
use crate::domain::pricing::{PricingRules, SubscriptionOption};
use crate::domain::validation::{Field, FieldError, Problem};
use crate::error::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum WizardStep {
    Form,
    PaymentSelection {
        order_id: OrderId,
        /// Set while the customer is on the processor's hosted card page.
        awaiting_processor: Option<String>,
    },
    Confirmation {
        order_id: OrderId,
        method: PaymentMethod,
        instructions: Option<SettlementInstructions>,
    },
}

impl WizardStep {
    fn name(&self) -> &'static str {
        match self {
            WizardStep::Form => "form",
            WizardStep::PaymentSelection { .. } => "payment-selection",
            WizardStep::Confirmation { .. } => "confirmation",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WizardState {
    pub plan_id: String,
    pub step: WizardStep,
    pub draft: OrderDraft,
    /// Inline, retryable message for the current step.
    pub last_error: Option<String>,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WizardError {
    #[error("The form has {} invalid field(s)", .0.len())]
    Invalid(Vec<FieldError>),

    #[error("Cannot {action} while in {step}")]
    IllegalTransition {
        step: &'static str,
        action: &'static str,
    },

    #[error("Request failed, please try again: {0}")]
    Submission(String),
}

/// Server-side operations the wizard drives.
#[async_trait]
pub trait OrderBackend: Send + Sync {
    async fn submit_order(
        &self,
        submission: OrderSubmission,
        document: Option<Vec<u8>>,
    ) -> Result<OrderId>;

    async fn choose_payment_method(
        &self,
        order_id: &OrderId,
        method: PaymentMethod,
    ) -> Result<PaymentStep>;
}

pub struct OrderWizard {
    plan: Plan,
    rules: PricingRules,
    state: WizardState,
}

impl OrderWizard {
    pub fn new(plan: Plan, rules: PricingRules) -> Self {
        let state = fresh_state(&plan);
        Self { plan, rules, state }
    }

    /// Resumes a wizard from a previously serialized state.
    pub fn from_state(plan: Plan, rules: PricingRules, state: WizardState) -> Self {
        Self { plan, rules, state }
    }

    pub fn state(&self) -> &WizardState {
        &self.state
    }

    pub fn step(&self) -> &WizardStep {
        &self.state.step
    }

    pub fn set_text(&mut self, field: Field, value: &str) -> std::result::Result<(), WizardError> {
        self.editing("edit the form")?;
        if self.state.draft.set_text(field, value) {
            Ok(())
        } else {
            Err(WizardError::Invalid(vec![FieldError::new(
                field,
                Problem::Malformed,
            )]))
        }
    }

    pub fn set_date(&mut self, field: Field, date: NaiveDate) -> std::result::Result<(), WizardError> {
        self.editing("edit the form")?;
        if self.state.draft.set_date(field, date) {
            Ok(())
        } else {
            Err(WizardError::Invalid(vec![FieldError::new(
                field,
                Problem::Malformed,
            )]))
        }
    }

    pub fn set_option(&mut self, option: SubscriptionOption) -> std::result::Result<(), WizardError> {
        self.editing("choose a payment option")?;
        self.state.draft.subscription_option = Some(option);
        Ok(())
    }

    pub fn attach_document(&mut self, image: Vec<u8>) -> std::result::Result<(), WizardError> {
        self.editing("attach a document")?;
        self.state.draft.document = Some(image).filter(|i| !i.is_empty());
        Ok(())
    }

    /// Fills the form from the attached document.
    ///
    /// Returns `false` when there is no document or the reader failed; the
    /// customer just keeps typing.
    pub async fn autofill(
        &mut self,
        reader: &dyn DocumentReader,
    ) -> std::result::Result<bool, WizardError> {
        self.editing("read a document")?;
        let Some(image) = self.state.draft.document.as_deref() else {
            return Ok(false);
        };
        match reader.read(image).await {
            Ok(fields) => {
                self.state.draft.apply_document(fields);
                Ok(true)
            }
            Err(e) => {
                warn!(error = %e, "document auto-fill failed");
                Ok(false)
            }
        }
    }

    pub fn quote(&self) -> Option<Quote> {
        self.state.draft.quote(&self.plan, &self.rules)
    }

    pub fn validate(&self) -> std::result::Result<OrderSubmission, WizardError> {
        self.state
            .draft
            .validate(&self.plan, &self.rules)
            .map_err(WizardError::Invalid)
    }

    /// Submits the form and moves to payment selection.
    ///
    /// On failure the wizard stays in `form` with everything entered kept.
    pub async fn submit(
        &mut self,
        backend: &dyn OrderBackend,
        attribution: &dyn AttributionSource,
    ) -> std::result::Result<OrderId, WizardError> {
        self.editing("submit")?;
        let mut submission = match self.validate() {
            Ok(submission) => submission,
            Err(e) => {
                self.state.last_error = Some(e.to_string());
                return Err(e);
            }
        };
        submission.attribution = attribution.attribution();

        match backend
            .submit_order(submission, self.state.draft.document.clone())
            .await
        {
            Ok(order_id) => {
                info!(order_id = %order_id, "wizard submitted order");
                self.state.step = WizardStep::PaymentSelection {
                    order_id: order_id.clone(),
                    awaiting_processor: None,
                };
                self.state.last_error = None;
                Ok(order_id)
            }
            Err(e) => Err(self.retryable(e)),
        }
    }

    /// Records the chosen method.
    ///
    /// Manual methods go straight to `confirmation`; card stays in
    /// `payment-selection` until the processor hands the customer back.
    pub async fn select_payment_method(
        &mut self,
        backend: &dyn OrderBackend,
        method: PaymentMethod,
    ) -> std::result::Result<PaymentStep, WizardError> {
        let WizardStep::PaymentSelection { order_id, .. } = &self.state.step else {
            return Err(self.illegal("select a payment method"));
        };
        let order_id = order_id.clone();

        let step = match backend.choose_payment_method(&order_id, method).await {
            Ok(step) => step,
            Err(e) => return Err(self.retryable(e)),
        };
        self.state.last_error = None;
        self.state.step = match &step {
            PaymentStep::Redirect { url } => WizardStep::PaymentSelection {
                order_id,
                awaiting_processor: Some(url.clone()),
            },
            PaymentStep::Instructions(instructions) => WizardStep::Confirmation {
                order_id,
                method,
                instructions: Some(instructions.clone()),
            },
        };
        Ok(step)
    }

    /// The processor sent the customer back; `status` is what the order
    /// lookup reports.
    ///
    /// A failed payment leaves the wizard on method selection with a
    /// localized message so the customer can retry.
    pub fn return_from_processor(
        &mut self,
        status: OrderStatus,
    ) -> std::result::Result<(), WizardError> {
        let WizardStep::PaymentSelection {
            order_id,
            awaiting_processor: Some(_),
        } = &self.state.step
        else {
            return Err(self.illegal("return from the card processor"));
        };
        let order_id = order_id.clone();

        if status == OrderStatus::PaymentFailed {
            self.state.last_error =
                Some(messages::card_payment_failed(self.state.draft.locale).to_string());
            self.state.step = WizardStep::PaymentSelection {
                order_id,
                awaiting_processor: None,
            };
        } else {
            self.state.last_error = None;
            self.state.step = WizardStep::Confirmation {
                order_id,
                method: PaymentMethod::Card,
                instructions: None,
            };
        }
        Ok(())
    }

    /// Discards all local progress. Submitted orders are unaffected.
    pub fn close(&mut self) {
        self.state = fresh_state(&self.plan);
    }

    fn editing(&self, action: &'static str) -> std::result::Result<(), WizardError> {
        match self.state.step {
            WizardStep::Form => Ok(()),
            _ => Err(self.illegal(action)),
        }
    }

    fn illegal(&self, action: &'static str) -> WizardError {
        WizardError::IllegalTransition {
            step: self.state.step.name(),
            action,
        }
    }

    fn retryable(&mut self, error: crate::error::OrderError) -> WizardError {
        warn!(step = self.state.step.name(), error = %error, "wizard request failed");
        let error = WizardError::Submission(error.to_string());
        self.state.last_error = Some(error.to_string());
        error
    }
}

fn fresh_state(plan: &Plan) -> WizardState {
    WizardState {
        plan_id: plan.id.clone(),
        step: WizardStep::Form,
        draft: OrderDraft::default(),
        last_error: None,
    }
}
