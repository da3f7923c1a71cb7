use crate::domain::notification::NotificationRecord;
use crate::domain::order::{Order, OrderId, OrderUpdate};
use crate::domain::ports::{AppliedUpdate, NotificationLog, OrderStore};
use crate::error::{OrderError, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A thread-safe in-memory order store.
///
/// Updates are applied while holding the write lock, so concurrent
/// settlement callbacks for the same order never interleave.
#[derive(Default, Clone)]
pub struct InMemoryOrderStore {
    orders: Arc<RwLock<HashMap<OrderId, Order>>>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn insert(&self, order: Order) -> Result<()> {
        let mut orders = self.orders.write().await;
        match orders.entry(order.id.clone()) {
            Entry::Occupied(_) => Err(OrderError::Duplicate(order.id)),
            Entry::Vacant(slot) => {
                slot.insert(order);
                Ok(())
            }
        }
    }

    async fn get(&self, id: &OrderId) -> Result<Option<Order>> {
        let orders = self.orders.read().await;
        Ok(orders.get(id).cloned())
    }

    async fn update(&self, id: &OrderId, update: OrderUpdate) -> Result<Option<AppliedUpdate>> {
        let mut orders = self.orders.write().await;
        Ok(orders.get_mut(id).map(|order| {
            let change = order.apply(&update, Utc::now());
            AppliedUpdate {
                order: order.clone(),
                change,
            }
        }))
    }

    async fn all_orders(&self) -> Result<Vec<Order>> {
        let orders = self.orders.read().await;
        let mut all: Vec<Order> = orders.values().cloned().collect();
        all.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(all)
    }
}

/// Append-only in-memory notification log.
#[derive(Default, Clone)]
pub struct InMemoryNotificationLog {
    records: Arc<RwLock<Vec<NotificationRecord>>>,
}

impl InMemoryNotificationLog {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl NotificationLog for InMemoryNotificationLog {
    async fn record(&self, record: NotificationRecord) -> Result<()> {
        self.records.write().await.push(record);
        Ok(())
    }

    async fn for_order(&self, id: &OrderId) -> Result<Vec<NotificationRecord>> {
        let records = self.records.read().await;
        Ok(records.iter().filter(|r| &r.order_id == id).cloned().collect())
    }
}
