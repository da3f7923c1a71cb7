use crate::application::fanout::NotificationFanout;
use crate::domain::catalog::Catalog;
use crate::domain::order::{Order, OrderId, OrderSubmission};
use crate::domain::ports::SharedOrderStore;
use crate::domain::pricing::PricingRules;
use crate::error::{OrderError, Result};
use chrono::Utc;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

const MAX_ID_ATTEMPTS: usize = 5;

/// Result of a successful submission.
pub struct OrderReceipt {
    pub order_id: OrderId,
    /// The background notification fan-out. Dropping it does not cancel it.
    pub notifications: JoinHandle<()>,
}

/// The order submission gateway.
///
/// Validates a submission, prices it from the catalog, persists it as
/// `pending` and hands it to the notification fan-out without waiting.
pub struct OrderIntake {
    store: SharedOrderStore,
    catalog: Arc<Catalog>,
    rules: PricingRules,
    fanout: Arc<NotificationFanout>,
    id_prefix: String,
}

impl OrderIntake {
    pub fn new(
        store: SharedOrderStore,
        catalog: Arc<Catalog>,
        rules: PricingRules,
        fanout: Arc<NotificationFanout>,
        id_prefix: impl Into<String>,
    ) -> Self {
        Self {
            store,
            catalog,
            rules,
            fanout,
            id_prefix: id_prefix.into(),
        }
    }

    pub async fn submit(
        &self,
        submission: OrderSubmission,
        document: Option<Vec<u8>>,
    ) -> Result<OrderReceipt> {
        let plan = self
            .catalog
            .plan(&submission.plan_id)
            .ok_or_else(|| OrderError::UnknownPlan(submission.plan_id.clone()))?;
        let pricing = plan.pricing_model(submission.subscription_option)?;
        let now = Utc::now();
        let has_document = document.as_ref().is_some_and(|d| !d.is_empty());

        let template = Order::create(
            OrderId::from(""),
            submission,
            pricing,
            &plan.currency,
            &self.rules,
            has_document,
            now,
        )?;

        let order = self.persist(template).await?;
        info!(order_id = %order.id, price = %order.price, plan = %order.plan_id, "order persisted");

        let document = document.filter(|d| !d.is_empty());
        let notifications = self.fanout.spawn_order_received(order.clone(), document);
        Ok(OrderReceipt {
            order_id: order.id,
            notifications,
        })
    }

    /// Inserts `template` under a fresh id, retrying on the rare collision.
    async fn persist(&self, template: Order) -> Result<Order> {
        let today = template.created_at.date_naive();
        for _ in 0..MAX_ID_ATTEMPTS {
            let mut order = template.clone();
            order.id = OrderId::generate(&self.id_prefix, today, &mut rand::thread_rng());
            match self.store.insert(order.clone()).await {
                Ok(()) => return Ok(order),
                Err(OrderError::Duplicate(id)) => {
                    warn!(order_id = %id, "order id collision, regenerating");
                }
                Err(e) => return Err(e),
            }
        }
        Err(OrderError::InternalError(
            "could not allocate a unique order id".into(),
        ))
    }
}
