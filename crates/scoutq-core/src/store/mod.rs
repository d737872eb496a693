//! Wide-column store access.
//!
//! The [`StoreAdapter`] trait is the only surface search code uses. [`SledStore`]
//! implements it over a local sled database, emulating secondary indexes with a
//! sparse index tree.

mod adapter;
mod config;
mod error;
pub mod expression;
mod key;
mod record;
mod schema;
mod sled_store;

pub use adapter::{QueryOptions, ScanOptions, StoreAdapter, StorePage};
pub use config::{StoreConfig, DEFAULT_TABLE};
pub use error::StoreError;
pub use expression::{
    Combinator, ExpressionAttributes, FilterExpression, FilterFunction, KeyComparison,
    KeyCondition, UpdateExpression,
};
pub use key::{current_millis, ItemKey};
pub use record::Record;
pub use schema::{KeySchema, TableSchema};
pub use sled_store::SledStore;
