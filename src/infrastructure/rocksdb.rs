use crate::domain::notification::NotificationRecord;
use crate::domain::order::{Order, OrderId, OrderUpdate};
use crate::domain::ports::{AppliedUpdate, NotificationLog, OrderStore};
use crate::error::{OrderError, Result};
use async_trait::async_trait;
use chrono::Utc;
use rocksdb::{ColumnFamilyDescriptor, DB, Direction, IteratorMode, Options};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;

/// Column Family for orders, keyed by order id.
pub const CF_ORDERS: &str = "orders";
/// Column Family for notification records, keyed by order id and attempt time.
pub const CF_NOTIFICATIONS: &str = "notifications";

/// A persistent store for orders and the notification log using RocksDB.
///
/// `Clone` shares the underlying `Arc<DB>`. Read-modify-write operations
/// go through one async mutex so concurrent updates to the same order are
/// applied one after another.
#[derive(Clone)]
pub struct RocksDBStore {
    db: Arc<DB>,
    write_lock: Arc<Mutex<()>>,
    sequence: Arc<AtomicU64>,
}

impl RocksDBStore {
    /// Opens or creates a RocksDB instance at the specified path, creating
    /// the "orders" and "notifications" column families if needed.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_orders = ColumnFamilyDescriptor::new(CF_ORDERS, Options::default());
        let cf_notifications = ColumnFamilyDescriptor::new(CF_NOTIFICATIONS, Options::default());

        let db = DB::open_cf_descriptors(&opts, path, vec![cf_orders, cf_notifications])?;

        Ok(Self {
            db: Arc::new(db),
            write_lock: Arc::new(Mutex::new(())),
            sequence: Arc::new(AtomicU64::new(0)),
        })
    }

    fn cf(&self, name: &str) -> Result<&rocksdb::ColumnFamily> {
        self.db.cf_handle(name).ok_or_else(|| {
            OrderError::InternalError(Box::new(std::io::Error::other(format!(
                "{name} column family not found"
            ))))
        })
    }

    fn read_order(&self, id: &OrderId) -> Result<Option<Order>> {
        let cf = self.cf(CF_ORDERS)?;
        match self.db.get_cf(cf, id.as_str().as_bytes())? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    fn write_order(&self, order: &Order) -> Result<()> {
        let cf = self.cf(CF_ORDERS)?;
        self.db
            .put_cf(cf, order.id.as_str().as_bytes(), encode(order)?)?;
        Ok(())
    }
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(value).map_err(|e| {
        OrderError::InternalError(Box::new(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("Serialization error: {}", e),
        )))
    })
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    serde_json::from_slice(bytes).map_err(|e| {
        OrderError::InternalError(Box::new(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("Deserialization error: {}", e),
        )))
    })
}

fn notification_prefix(id: &OrderId) -> Vec<u8> {
    let mut prefix = id.as_str().as_bytes().to_vec();
    prefix.push(0);
    prefix
}

#[async_trait]
impl OrderStore for RocksDBStore {
    async fn insert(&self, order: Order) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let cf = self.cf(CF_ORDERS)?;
        // Just check if the key exists without retrieving the value
        if self.db.get_pinned_cf(cf, order.id.as_str().as_bytes())?.is_some() {
            return Err(OrderError::Duplicate(order.id));
        }
        self.write_order(&order)
    }

    async fn get(&self, id: &OrderId) -> Result<Option<Order>> {
        self.read_order(id)
    }

    async fn update(&self, id: &OrderId, update: OrderUpdate) -> Result<Option<AppliedUpdate>> {
        let _guard = self.write_lock.lock().await;
        let Some(mut order) = self.read_order(id)? else {
            return Ok(None);
        };
        let change = order.apply(&update, Utc::now());
        self.write_order(&order)?;
        Ok(Some(AppliedUpdate { order, change }))
    }

    async fn all_orders(&self) -> Result<Vec<Order>> {
        let cf = self.cf(CF_ORDERS)?;
        let mut orders = Vec::new();
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (_key, value) = item?;
            orders.push(decode::<Order>(&value)?);
        }
        orders.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(orders)
    }
}

#[async_trait]
impl NotificationLog for RocksDBStore {
    async fn record(&self, record: NotificationRecord) -> Result<()> {
        let cf = self.cf(CF_NOTIFICATIONS)?;
        let mut key = notification_prefix(&record.order_id);
        let nanos = record.attempted_at.timestamp_nanos_opt().unwrap_or_default();
        key.extend_from_slice(&nanos.to_be_bytes());
        key.extend_from_slice(&self.sequence.fetch_add(1, Ordering::Relaxed).to_be_bytes());
        self.db.put_cf(cf, key, encode(&record)?)?;
        Ok(())
    }

    async fn for_order(&self, id: &OrderId) -> Result<Vec<NotificationRecord>> {
        let cf = self.cf(CF_NOTIFICATIONS)?;
        let prefix = notification_prefix(id);
        let mut records = Vec::new();
        for item in self
            .db
            .iterator_cf(cf, IteratorMode::From(&prefix, Direction::Forward))
        {
            let (key, value) = item?;
            if !key.starts_with(&prefix) {
                break;
            }
            records.push(decode(&value)?);
        }
        Ok(records)
    }
}
