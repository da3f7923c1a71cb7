use crate::application::fanout::NotificationFanout;
use crate::domain::notification::NoticeKind;
use crate::domain::order::{
    OrderId, OrderStatus, OrderUpdate, PaymentMethod, SettlementAmounts, SettlementUpdate,
    StatusChange,
};
use crate::domain::ports::{AppliedUpdate, PaymentProcessor, SharedOrderStore};
use crate::domain::settlement::{BalanceDetail, CurrencyConversion, SettlementEvent, SettlementKind};
use crate::error::Result;
use crate::infrastructure::signature::SignatureVerifier;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// What the reconciler did with one delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    Applied {
        order_id: OrderId,
        change: StatusChange,
    },
    /// Acknowledged without touching any order.
    Ignored { event_id: String, reason: String },
}

/// Applies processor settlement callbacks to orders.
///
/// Every write is a field-scoped, idempotent [`OrderUpdate`], so deliveries
/// may arrive in any order and any number of times.
pub struct WebhookReconciler {
    store: SharedOrderStore,
    processor: Arc<dyn PaymentProcessor>,
    verifier: SignatureVerifier,
    fanout: Arc<NotificationFanout>,
    conversion: CurrencyConversion,
}

impl WebhookReconciler {
    pub fn new(
        store: SharedOrderStore,
        processor: Arc<dyn PaymentProcessor>,
        verifier: SignatureVerifier,
        fanout: Arc<NotificationFanout>,
        conversion: CurrencyConversion,
    ) -> Self {
        Self {
            store,
            processor,
            verifier,
            fanout,
            conversion,
        }
    }

    /// Verifies, decodes and applies one raw delivery.
    ///
    /// Nothing is read or written before the signature checks out.
    pub async fn handle(&self, signature: Option<&str>, body: &[u8]) -> Result<ReconcileOutcome> {
        if let Err(e) = self.verifier.verify(signature, body) {
            warn!(error = %e, "webhook rejected");
            return Err(e);
        }
        let event = SettlementEvent::decode(body)?;
        debug!(event_id = %event.id, "webhook verified");
        self.apply(event).await
    }

    pub async fn apply(&self, event: SettlementEvent) -> Result<ReconcileOutcome> {
        let event_id = event.id;
        match event.kind {
            SettlementKind::CheckoutCompleted { paid: false, order_id, .. } => {
                info!(%event_id, order_id = %order_id, "checkout completed without payment, ignoring");
                Ok(ignored(event_id, "checkout not paid"))
            }
            SettlementKind::CheckoutCompleted {
                order_id,
                payment_intent,
                ..
            } => self.mark_paid(event_id, order_id, payment_intent).await,
            SettlementKind::PaymentSucceeded {
                order_id,
                payment_intent,
            } => self.mark_paid(event_id, order_id, Some(payment_intent)).await,
            SettlementKind::PaymentFailed { order_id, reason } => {
                self.mark_failed(event_id, order_id, reason).await
            }
            SettlementKind::ChargeSucceeded {
                order_id,
                payment_intent,
                balance,
            } => {
                let amounts = match balance {
                    Some(detail) => self.convert(&order_id, &detail),
                    None => self.lookup_amounts(&order_id, payment_intent.as_deref()).await,
                };
                self.record_amounts(event_id, order_id, amounts).await
            }
            SettlementKind::Unreferenced { event_type } => {
                warn!(%event_id, %event_type, "settlement event without order reference, ignoring");
                Ok(ignored(event_id, "no order reference"))
            }
            SettlementKind::Other { event_type } => {
                debug!(%event_id, %event_type, "unhandled event type, ignoring");
                Ok(ignored(event_id, "unhandled event type"))
            }
        }
    }

    async fn mark_paid(
        &self,
        event_id: String,
        order_id: OrderId,
        payment_intent: Option<String>,
    ) -> Result<ReconcileOutcome> {
        if self.store.get(&order_id).await?.is_none() {
            warn!(%event_id, order_id = %order_id, "payment for unknown order, ignoring");
            return Ok(ignored(event_id, "unknown order"));
        }
        let amounts = self.lookup_amounts(&order_id, payment_intent.as_deref()).await;
        let update = OrderUpdate::Settlement(SettlementUpdate {
            status: Some(OrderStatus::Paid),
            payment_method: Some(PaymentMethod::Card),
            amounts,
            failure_reason: None,
        });
        self.write(event_id, order_id, update, NoticeKind::PaymentReceived)
            .await
    }

    async fn mark_failed(
        &self,
        event_id: String,
        order_id: OrderId,
        reason: Option<String>,
    ) -> Result<ReconcileOutcome> {
        let update = OrderUpdate::Settlement(SettlementUpdate {
            status: Some(OrderStatus::PaymentFailed),
            failure_reason: reason,
            ..Default::default()
        });
        self.write(event_id, order_id, update, NoticeKind::PaymentFailed)
            .await
    }

    async fn record_amounts(
        &self,
        event_id: String,
        order_id: OrderId,
        amounts: Option<SettlementAmounts>,
    ) -> Result<ReconcileOutcome> {
        let Some(amounts) = amounts else {
            debug!(%event_id, order_id = %order_id, "charge carries no settlement detail yet");
            return Ok(ignored(event_id, "no settlement detail"));
        };
        let update = OrderUpdate::Settlement(SettlementUpdate {
            amounts: Some(amounts),
            ..Default::default()
        });
        match self.store.update(&order_id, update).await? {
            Some(AppliedUpdate { change, .. }) => {
                info!(%event_id, order_id = %order_id, fee = %amounts.fee, net = %amounts.net, "settlement amounts recorded");
                Ok(ReconcileOutcome::Applied { order_id, change })
            }
            None => {
                warn!(%event_id, order_id = %order_id, "charge for unknown order, ignoring");
                Ok(ignored(event_id, "unknown order"))
            }
        }
    }

    /// Writes a status update and announces real transitions.
    async fn write(
        &self,
        event_id: String,
        order_id: OrderId,
        update: OrderUpdate,
        notice: NoticeKind,
    ) -> Result<ReconcileOutcome> {
        let Some(AppliedUpdate { order, change }) = self.store.update(&order_id, update).await?
        else {
            warn!(%event_id, order_id = %order_id, "settlement for unknown order, ignoring");
            return Ok(ignored(event_id, "unknown order"));
        };

        match change {
            StatusChange::Transitioned { to, .. } => {
                info!(%event_id, order_id = %order_id, status = %to, "order settled");
                // The processor is acknowledged without waiting on the bot.
                self.fanout.spawn_settlement(order, notice);
            }
            StatusChange::Refused { current, requested } => {
                if current == OrderStatus::PaymentFailed && requested == OrderStatus::Paid {
                    warn!(%event_id, order_id = %order_id, "payment reported after failure, needs manual review");
                } else {
                    info!(%event_id, order_id = %order_id, %current, %requested, "terminal status kept");
                }
            }
            StatusChange::Unchanged(status) => {
                debug!(%event_id, order_id = %order_id, %status, "redelivery, status unchanged");
            }
        }
        Ok(ReconcileOutcome::Applied { order_id, change })
    }

    fn convert(&self, order_id: &OrderId, detail: &BalanceDetail) -> Option<SettlementAmounts> {
        let amounts = self.conversion.convert(detail);
        if amounts.is_none() {
            warn!(order_id = %order_id, rate = ?detail.exchange_rate, "settlement amounts not convertible, leaving fee unset");
        }
        amounts
    }

    /// Fee and net for a payment, converted to the storefront currency.
    /// Lookup failures are logged and yield `None`.
    async fn lookup_amounts(
        &self,
        order_id: &OrderId,
        payment_intent: Option<&str>,
    ) -> Option<SettlementAmounts> {
        let payment_intent = payment_intent?;
        match self.processor.settlement_detail(payment_intent).await {
            Ok(detail) => detail.and_then(|d| self.convert(order_id, &d)),
            Err(e) => {
                warn!(order_id = %order_id, %payment_intent, error = %e, "fee lookup failed");
                None
            }
        }
    }
}

fn ignored(event_id: String, reason: &str) -> ReconcileOutcome {
    ReconcileOutcome::Ignored {
        event_id,
        reason: reason.to_string(),
    }
}
