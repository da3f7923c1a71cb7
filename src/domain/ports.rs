use super::notification::NotificationRecord;
use super::order::{Attribution, Order, OrderId, OrderUpdate, StatusChange};
use super::settlement::BalanceDetail;
use crate::error::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::Arc;

/// An order after an update, and what the update did to its status.
#[derive(Debug, Clone, PartialEq)]
pub struct AppliedUpdate {
    pub order: Order,
    pub change: StatusChange,
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Persists a new order. Fails with `Duplicate` if the id is taken.
    async fn insert(&self, order: Order) -> Result<()>;
    async fn get(&self, id: &OrderId) -> Result<Option<Order>>;
    /// Applies `update` atomically. Returns `None` if no order has this id.
    async fn update(&self, id: &OrderId, update: OrderUpdate) -> Result<Option<AppliedUpdate>>;
    async fn all_orders(&self) -> Result<Vec<Order>>;
}

#[async_trait]
pub trait NotificationLog: Send + Sync {
    async fn record(&self, record: NotificationRecord) -> Result<()>;
    async fn for_order(&self, id: &OrderId) -> Result<Vec<NotificationRecord>>;
}

/// Outbound channels. Each returns the provider's response text on success.
#[async_trait]
pub trait MessagingBot: Send + Sync {
    async fn send_text(&self, text: &str) -> Result<String>;
    async fn send_photo(&self, image: &[u8], caption: &str) -> Result<String>;
}

#[async_trait]
pub trait SmsGateway: Send + Sync {
    async fn send(&self, phone: &str, text: &str) -> Result<String>;
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_order_received(&self, order: &Order) -> Result<String>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSession {
    pub id: String,
    pub url: String,
}

#[async_trait]
pub trait PaymentProcessor: Send + Sync {
    /// Opens a hosted card checkout for `order` that returns to `return_url`.
    async fn create_checkout(&self, order: &Order, return_url: &str) -> Result<CheckoutSession>;
    /// Fee and net settlement for a payment, once the processor has them.
    async fn settlement_detail(&self, payment_intent: &str) -> Result<Option<BalanceDetail>>;
}

/// Supplies marketing attribution to the submission step.
pub trait AttributionSource: Send + Sync {
    fn attribution(&self) -> Attribution;
}

/// Fields a document scan may fill in. Everything is optional.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DocumentFields {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub passport_number: Option<String>,
    pub citizenship: Option<String>,
}

#[async_trait]
pub trait DocumentReader: Send + Sync {
    async fn read(&self, image: &[u8]) -> Result<DocumentFields>;
}

pub type SharedOrderStore = Arc<dyn OrderStore>;
pub type SharedNotificationLog = Arc<dyn NotificationLog>;
