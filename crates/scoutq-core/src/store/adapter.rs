//! The store adapter seam.
//!
//! Planning and execution only ever talk to a [`StoreAdapter`]; the sled-backed
//! [`SledStore`](super::SledStore) is one implementation, and tests wrap or
//! replace it to observe the calls a search makes.

use std::sync::Arc;

use super::expression::{FilterExpression, KeyCondition, UpdateExpression};
use super::{ItemKey, StoreError};
use crate::value::{Item, StoreKey};

/// Options for a key-condition query.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryOptions {
    /// Secondary index to query. `None` queries the base table.
    pub index_name: Option<String>,
    /// Maximum number of items to evaluate.
    pub limit: usize,
    /// Resume after this key.
    pub exclusive_start_key: Option<StoreKey>,
    /// Post-fetch filter.
    pub filter: Option<FilterExpression>,
    /// Ascending sort key order when true.
    pub scan_forward: bool,
}

impl QueryOptions {
    /// Ascending query with the given limit.
    pub fn new(limit: usize) -> Self {
        Self {
            index_name: None,
            limit,
            exclusive_start_key: None,
            filter: None,
            scan_forward: true,
        }
    }

    /// Query a secondary index.
    pub fn on_index(mut self, name: impl Into<String>) -> Self {
        self.index_name = Some(name.into());
        self
    }

    /// Resume after a key.
    pub fn starting_after(mut self, key: Option<StoreKey>) -> Self {
        self.exclusive_start_key = key;
        self
    }

    /// Apply a filter.
    pub fn with_filter(mut self, filter: Option<FilterExpression>) -> Self {
        self.filter = filter;
        self
    }

    /// Descending sort key order.
    pub fn descending(mut self) -> Self {
        self.scan_forward = false;
        self
    }
}

/// Options for a full scan.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanOptions {
    /// Maximum number of items to evaluate.
    pub limit: usize,
    /// Resume after this key.
    pub exclusive_start_key: Option<StoreKey>,
    /// Post-fetch filter.
    pub filter: Option<FilterExpression>,
}

impl ScanOptions {
    /// Scan with the given limit.
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            exclusive_start_key: None,
            filter: None,
        }
    }

    /// Resume after a key.
    pub fn starting_after(mut self, key: Option<StoreKey>) -> Self {
        self.exclusive_start_key = key;
        self
    }

    /// Apply a filter.
    pub fn with_filter(mut self, filter: Option<FilterExpression>) -> Self {
        self.filter = filter;
        self
    }
}

/// One page of query or scan results.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StorePage {
    /// Items that passed the filter.
    pub items: Vec<Item>,
    /// Resume key, present when evaluation stopped at the limit with more to read.
    pub last_evaluated_key: Option<StoreKey>,
    /// Number of items returned.
    pub count: usize,
}

/// A wide-column store with a base table and secondary indexes.
pub trait StoreAdapter: Send + Sync {
    /// Fetch one item by primary key.
    fn get(&self, key: &ItemKey) -> Result<Option<Item>, StoreError>;

    /// Insert or replace an item. Returns the stored item.
    fn put(&self, item: Item) -> Result<Item, StoreError>;

    /// Apply an update expression atomically. Returns the updated item.
    fn update(&self, key: &ItemKey, update: &UpdateExpression) -> Result<Item, StoreError>;

    /// Remove an item. Returns the removed item, if there was one.
    fn delete(&self, key: &ItemKey) -> Result<Option<Item>, StoreError>;

    /// Read items matching a key condition.
    fn query(&self, key: &KeyCondition, options: &QueryOptions) -> Result<StorePage, StoreError>;

    /// Read the whole table.
    fn scan(&self, options: &ScanOptions) -> Result<StorePage, StoreError>;
}

impl<T: StoreAdapter + ?Sized> StoreAdapter for Arc<T> {
    fn get(&self, key: &ItemKey) -> Result<Option<Item>, StoreError> {
        (**self).get(key)
    }

    fn put(&self, item: Item) -> Result<Item, StoreError> {
        (**self).put(item)
    }

    fn update(&self, key: &ItemKey, update: &UpdateExpression) -> Result<Item, StoreError> {
        (**self).update(key, update)
    }

    fn delete(&self, key: &ItemKey) -> Result<Option<Item>, StoreError> {
        (**self).delete(key)
    }

    fn query(&self, key: &KeyCondition, options: &QueryOptions) -> Result<StorePage, StoreError> {
        (**self).query(key, options)
    }

    fn scan(&self, options: &ScanOptions) -> Result<StorePage, StoreError> {
        (**self).scan(options)
    }
}

impl<T: StoreAdapter + ?Sized> StoreAdapter for &T {
    fn get(&self, key: &ItemKey) -> Result<Option<Item>, StoreError> {
        (**self).get(key)
    }

    fn put(&self, item: Item) -> Result<Item, StoreError> {
        (**self).put(item)
    }

    fn update(&self, key: &ItemKey, update: &UpdateExpression) -> Result<Item, StoreError> {
        (**self).update(key, update)
    }

    fn delete(&self, key: &ItemKey) -> Result<Option<Item>, StoreError> {
        (**self).delete(key)
    }

    fn query(&self, key: &KeyCondition, options: &QueryOptions) -> Result<StorePage, StoreError> {
        (**self).query(key, options)
    }

    fn scan(&self, options: &ScanOptions) -> Result<StorePage, StoreError> {
        (**self).scan(options)
    }
}
