//! Adapters for the domain ports: stores, vendor APIs and webhook
//! signature checking.

pub mod channels;
pub mod http_client;
pub mod in_memory;
pub mod processor;
#[cfg(feature = "storage-rocksdb")]
pub mod rocksdb;
pub mod signature;
