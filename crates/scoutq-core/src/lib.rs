//! scoutq core - index-aware search planning over a wide-column store.
//!
//! Given any subset of the supported filters, a search picks the secondary index
//! that narrows the read (or falls back to a full scan), filters the rest after
//! the fetch, and pages through results with opaque cursors.

pub mod config;
pub mod error;
pub mod metrics;
pub mod query;
pub mod store;
pub mod value;

pub use config::SearchConfig;
pub use error::{Error, Result, StoreOperation, ValidationError};
pub use query::{
    Attribute, Cursor, Page, Pagination, Predicate, PredicateSet, SearchExecutor, SearchFilters,
    Strategy, StrategySelector,
};
pub use store::{
    ItemKey, SledStore, StoreAdapter, StoreConfig, StoreError, TableSchema, UpdateExpression,
};
pub use value::{Item, StoreKey, Value};

// Metrics exports
pub use metrics::{new_shared_metrics, SearchMetrics, SharedSearchMetrics};

/// Open a sled-backed store with every catalog index declared.
pub fn open_store(config: StoreConfig) -> std::result::Result<SledStore, StoreError> {
    SledStore::open(config, query::table_schema())
}
