use crate::domain::order::OrderId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OrderError {
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Order not found: {0}")]
    NotFound(OrderId),
    #[error("Order already exists: {0}")]
    Duplicate(OrderId),
    #[error("Unknown plan: {0}")]
    UnknownPlan(String),
    #[error("Invalid webhook signature")]
    InvalidSignature,
    #[error("Malformed settlement event: {0}")]
    MalformedEvent(String),
    #[error("Payment processor error: {0}")]
    Processor(String),
    #[error("Notification error: {0}")]
    Notification(String),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[cfg(feature = "storage-rocksdb")]
    #[error("Storage error: {0}")]
    Storage(#[from] rocksdb::Error),
    #[error("Internal error: {0}")]
    InternalError(Box<dyn std::error::Error + Send + Sync>),
}

pub type Result<T> = std::result::Result<T, OrderError>;
