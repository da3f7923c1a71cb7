use crate::application::intake::OrderIntake;
use crate::application::payment::{PaymentSelector, PaymentStep};
use crate::application::wizard::OrderBackend;
use crate::domain::order::{OrderId, OrderSubmission, PaymentMethod};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Lets the wizard talk to the gateway and selector in-process.
#[derive(Clone)]
pub struct Storefront {
    intake: Arc<OrderIntake>,
    selector: Arc<PaymentSelector>,
}

impl Storefront {
    pub fn new(intake: Arc<OrderIntake>, selector: Arc<PaymentSelector>) -> Self {
        Self { intake, selector }
    }
}

#[async_trait]
impl OrderBackend for Storefront {
    async fn submit_order(
        &self,
        submission: OrderSubmission,
        document: Option<Vec<u8>>,
    ) -> Result<OrderId> {
        // The fan-out keeps running after its handle is dropped.
        let receipt = self.intake.submit(submission, document).await?;
        Ok(receipt.order_id)
    }

    async fn choose_payment_method(
        &self,
        order_id: &OrderId,
        method: PaymentMethod,
    ) -> Result<PaymentStep> {
        self.selector.select(order_id, method).await
    }
}
