use crate::domain::catalog::{SettlementAccounts, SettlementInstructions};
use crate::domain::order::{OrderId, OrderStatus, OrderUpdate, PaymentMethod};
use crate::domain::ports::{PaymentProcessor, SharedOrderStore};
use crate::error::{OrderError, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

/// What the customer sees after choosing a payment method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum PaymentStep {
    /// Card payments continue on the processor's hosted page.
    Redirect { url: String },
    /// Manual methods end with settlement instructions.
    Instructions(SettlementInstructions),
}

/// The payment method selector.
pub struct PaymentSelector {
    store: SharedOrderStore,
    processor: Arc<dyn PaymentProcessor>,
    accounts: SettlementAccounts,
    public_url: String,
}

impl PaymentSelector {
    pub fn new(
        store: SharedOrderStore,
        processor: Arc<dyn PaymentProcessor>,
        accounts: SettlementAccounts,
        public_url: impl Into<String>,
    ) -> Self {
        Self {
            store,
            processor,
            accounts,
            public_url: public_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Where the processor sends the browser back to.
    pub fn return_url(&self, order_id: &OrderId) -> String {
        format!("{}/payment-status?order={}", self.public_url, order_id)
    }

    /// Records the chosen method and works out the next step.
    pub async fn select(&self, order_id: &OrderId, method: PaymentMethod) -> Result<PaymentStep> {
        let current = self
            .store
            .get(order_id)
            .await?
            .ok_or_else(|| OrderError::NotFound(order_id.clone()))?;
        if current.status == OrderStatus::Paid {
            return Err(OrderError::ValidationError(format!(
                "Order {order_id} is already paid"
            )));
        }

        let order = self
            .store
            .update(order_id, OrderUpdate::PaymentMethod(method))
            .await?
            .ok_or_else(|| OrderError::NotFound(order_id.clone()))?
            .order;
        info!(order_id = %order_id, %method, "payment method selected");

        match self.accounts.instructions(method, &order) {
            Some(instructions) => Ok(PaymentStep::Instructions(instructions)),
            None => {
                let session = self
                    .processor
                    .create_checkout(&order, &self.return_url(order_id))
                    .await?;
                info!(order_id = %order_id, session = %session.id, "card checkout opened");
                Ok(PaymentStep::Redirect { url: session.url })
            }
        }
    }
}
