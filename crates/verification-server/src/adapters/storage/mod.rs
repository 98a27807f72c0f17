//! # Production Storage Adapters
//!
//! Enable the `rocksdb` feature for persistent records:
//!
//! ```toml
//! verification-server = { path = "...", features = ["rocksdb"] }
//! ```
//!
//! Without it only the in-memory store from `pp-02-verification` is
//! available.

#[cfg(feature = "rocksdb")]
pub mod rocksdb_adapter;

#[cfg(feature = "rocksdb")]
pub use rocksdb_adapter::{
    RocksDbVerificationStore, CF_METADATA, CF_RECORDS, CF_RECORD_INDEX, COLUMN_FAMILIES,
};

// Re-export in-memory store for development
pub use pp_02_verification::InMemoryVerificationStore;
