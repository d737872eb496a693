//! Search execution.
//!
//! One call fetches one page: validate input, decode the cursor, select a
//! strategy, check the cursor belongs to it, make exactly one store call, then
//! wrap the store's resume key in a new cursor. Input errors (including a
//! cursor issued by a different query) surface before the store is touched. Store errors
//! carry the operation and the index (or "scan") they came from and are never
//! retried.

use std::time::Instant;

use serde::Serialize;
use tracing::{debug, error, warn};

use super::cursor::{self, Cursor};
use super::filter::text_filter;
use super::planner::{key_condition, Access, Strategy, StrategySelector};
use super::predicate::{Pagination, PredicateSet, SearchFilters};
use crate::config::SearchConfig;
use crate::error::{Error, Result, StoreOperation, ValidationError};
use crate::metrics::{new_shared_metrics, SharedSearchMetrics};
use crate::store::{QueryOptions, ScanOptions, StoreAdapter, StoreError, StorePage};
use crate::value::{Item, StoreKey};

/// Target reported for full scans.
pub const SCAN_TARGET: &str = "scan";

/// One page of search results.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    /// Matching items.
    pub items: Vec<Item>,
    /// Cursor for the next page; absent when there is nothing more to read.
    pub next_cursor: Option<Cursor>,
    /// Number of items on this page.
    pub count: usize,
}

/// Runs searches against a store.
pub struct SearchExecutor<S> {
    store: S,
    selector: StrategySelector,
    config: SearchConfig,
    metrics: SharedSearchMetrics,
}

impl<S: StoreAdapter> SearchExecutor<S> {
    /// Create an executor with the default rules and configuration.
    pub fn new(store: S) -> Self {
        Self {
            store,
            selector: StrategySelector::new(),
            config: SearchConfig::default(),
            metrics: new_shared_metrics(),
        }
    }

    /// Use a custom configuration.
    pub fn with_config(mut self, config: SearchConfig) -> Self {
        self.config = config;
        self
    }

    /// Use a custom strategy selector.
    pub fn with_selector(mut self, selector: StrategySelector) -> Self {
        self.selector = selector;
        self
    }

    /// Report into a shared metrics registry.
    pub fn with_metrics(mut self, metrics: SharedSearchMetrics) -> Self {
        self.metrics = metrics;
        self
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The search configuration.
    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// The metrics registry.
    pub fn metrics(&self) -> &SharedSearchMetrics {
        &self.metrics
    }

    /// The strategy a search over `predicates` would use. Touches nothing.
    pub fn plan(&self, predicates: &PredicateSet) -> Strategy {
        self.selector.select(predicates)
    }

    /// Fetch one page of items matching every predicate.
    pub fn search(&self, predicates: &PredicateSet, pagination: &Pagination) -> Result<Page> {
        let started = Instant::now();
        let limit = self.config.search_limit(pagination.limit)?;
        let start = decode_cursor(pagination.cursor.as_ref())?;

        let strategy = self.selector.select(predicates);
        if let Some(key) = &start {
            strategy.access().check_resume_key(key)?;
        }
        let filter = strategy.filter();

        let (page, operation, target) = match strategy.access() {
            Access::Index {
                index,
                partition,
                sort,
            } => {
                let key = key_condition(index, partition, sort.as_ref());
                let options = QueryOptions::new(limit)
                    .on_index(index.name)
                    .starting_after(start)
                    .with_filter(filter);

                debug!(index = index.name, key = %key, "Querying index");
                self.metrics.record_index_query(index.name);
                let page = self
                    .store
                    .query(&key, &options)
                    .map_err(|e| self.store_error(StoreOperation::Query, index.name, e))?;
                (page, StoreOperation::Query, index.name)
            }
            Access::Scan => {
                warn!(
                    predicates = predicates.len(),
                    filter = %filter.as_ref().map(|f| f.expression()).unwrap_or_default(),
                    "No index applies, falling back to a full scan"
                );
                self.metrics.record_scan_fallback();
                let options = ScanOptions::new(limit)
                    .starting_after(start)
                    .with_filter(filter);
                let page = self
                    .store
                    .scan(&options)
                    .map_err(|e| self.store_error(StoreOperation::Scan, SCAN_TARGET, e))?;
                (page, StoreOperation::Scan, SCAN_TARGET)
            }
        };

        self.finish(page, operation, target, started)
    }

    /// Validate caller filters, then search.
    pub fn search_filters(&self, filters: &SearchFilters, pagination: &Pagination) -> Result<Page> {
        let predicates = filters.to_predicates()?;
        self.search(&predicates, pagination)
    }

    /// Free-text search over the configured text fields.
    ///
    /// Always a full scan with an OR of containment tests; the expensive path.
    pub fn text_search(&self, query: &str, pagination: &Pagination) -> Result<Page> {
        let started = Instant::now();
        let query = query.trim();
        if query.is_empty() {
            return Err(ValidationError::EmptyTextQuery.into());
        }
        let limit = self.config.text_limit(pagination.limit)?;
        let start = decode_cursor(pagination.cursor.as_ref())?;
        if let Some(key) = &start {
            Access::Scan.check_resume_key(key)?;
        }

        let filter = text_filter(&self.config.text_fields, query);
        debug!(
            fields = self.config.text_fields.len(),
            limit,
            "Free-text search scans the table"
        );
        self.metrics.record_text_scan();

        let options = ScanOptions::new(limit)
            .starting_after(start)
            .with_filter(filter);
        let page = self
            .store
            .scan(&options)
            .map_err(|e| self.store_error(StoreOperation::Scan, SCAN_TARGET, e))?;

        self.finish(page, StoreOperation::Scan, SCAN_TARGET, started)
    }

    fn finish(
        &self,
        page: StorePage,
        operation: StoreOperation,
        target: &str,
        started: Instant,
    ) -> Result<Page> {
        let next_cursor = page
            .last_evaluated_key
            .as_ref()
            .map(cursor::encode)
            .transpose()
            .map_err(|e| self.store_error(operation, target, e))?;

        let count = page.items.len();
        self.metrics
            .record_search(count, started.elapsed().as_micros() as u64);

        Ok(Page {
            items: page.items,
            next_cursor,
            count,
        })
    }

    fn store_error(&self, operation: StoreOperation, target: &str, source: StoreError) -> Error {
        self.metrics.record_store_error();
        error!(operation = %operation, index = target, error = %source, "Store call failed");
        Error::store(operation, target, source)
    }
}

fn decode_cursor(token: Option<&Cursor>) -> std::result::Result<Option<StoreKey>, ValidationError> {
    token.map(cursor::decode).transpose()
}
