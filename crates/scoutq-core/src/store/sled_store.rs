//! Local store backed by sled.
//!
//! Items live in `{table}:items`, keyed by the encoded primary key. Secondary
//! indexes share one tree, `{table}:index:gsi`, keyed by
//! `index name | partition value | sort value | primary key` and pointing back at
//! the item key. Index entries are sparse: an item missing an index's key
//! attribute, or holding a value that is neither string nor number there, is
//! absent from that index. Index entries are rewritten in the same transaction
//! as the item they point at.

use std::ops::Bound;

use sled::transaction::{ConflictableTransactionError, TransactionError, TransactionalTree};
use sled::{Db, IVec, Transactional, Tree};
use tracing::{debug, info, warn};

use super::adapter::{QueryOptions, ScanOptions, StoreAdapter, StorePage};
use super::expression::{FilterExpression, KeyComparison, KeyCondition, UpdateExpression};
use super::key::{current_millis, prefix_successor, push_str, push_str_prefix, push_value};
use super::schema::{KeySchema, TableSchema};
use super::{ItemKey, Record, StoreConfig, StoreError};
use crate::value::{Item, StoreKey, Value, CREATED_AT, PARTITION_KEY, SORT_KEY, UPDATED_AT};

type Entries<'a> = Box<dyn Iterator<Item = sled::Result<(IVec, IVec)>> + 'a>;

/// A table and its secondary indexes in a sled database.
pub struct SledStore {
    db: Db,
    items: Tree,
    index: Tree,
    schema: TableSchema,
    table: String,
}

impl SledStore {
    /// Open or create the table described by `config` with the given indexes.
    pub fn open(config: StoreConfig, schema: TableSchema) -> Result<Self, StoreError> {
        let db = config.to_sled_config().open()?;
        let items = db.open_tree(format!("{}:items", config.table))?;
        let index = db.open_tree(format!("{}:index:gsi", config.table))?;

        info!(
            table = %config.table,
            indexes = schema.indexes().len(),
            recovered = db.was_recovered(),
            "Opened store"
        );

        Ok(Self {
            db,
            items,
            index,
            schema,
            table: config.table,
        })
    }

    /// Table name.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Key schemas of the table and its indexes.
    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    /// Number of items in the table.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if the table holds no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Flush all pending writes to disk.
    pub fn flush(&self) -> Result<(), StoreError> {
        self.db.flush()?;
        Ok(())
    }

    /// Get the size of the database on disk.
    pub fn size_on_disk(&self) -> Result<u64, StoreError> {
        Ok(self.db.size_on_disk()?)
    }

    /// Read-modify-write one item and its index entries in a single transaction.
    fn write<F>(&self, key: &ItemKey, change: F) -> Result<Item, StoreError>
    where
        F: Fn(Option<Item>) -> Result<Item, StoreError>,
    {
        let data_key = key.encode();

        let result: Result<Item, TransactionError<StoreError>> =
            (&self.items, &self.index).transaction(|(items_tx, index_tx)| {
                let previous = match items_tx.get(&data_key)? {
                    Some(bytes) => Some(decode_item(&bytes).map_err(ConflictableTransactionError::Abort)?),
                    None => None,
                };
                let next = change(previous.clone()).map_err(ConflictableTransactionError::Abort)?;
                let bytes = encode_item(&next).map_err(ConflictableTransactionError::Abort)?;

                self.unindex(index_tx, &data_key, previous.as_ref())?;
                items_tx.insert(data_key.as_slice(), bytes)?;
                self.reindex(index_tx, &data_key, &next)?;
                Ok(next)
            });

        match result {
            Ok(item) => Ok(item),
            Err(TransactionError::Abort(e)) => Err(e),
            Err(TransactionError::Storage(e)) => Err(StoreError::Backend(e)),
        }
    }

    fn unindex(
        &self,
        index_tx: &TransactionalTree,
        data_key: &[u8],
        item: Option<&Item>,
    ) -> Result<(), ConflictableTransactionError<StoreError>> {
        if let Some(item) = item {
            for schema in self.schema.indexes() {
                if let Some(entry) = index_key(schema, data_key, item) {
                    index_tx.remove(entry)?;
                }
            }
        }
        Ok(())
    }

    fn reindex(
        &self,
        index_tx: &TransactionalTree,
        data_key: &[u8],
        item: &Item,
    ) -> Result<(), ConflictableTransactionError<StoreError>> {
        for schema in self.schema.indexes() {
            if let Some(entry) = index_key(schema, data_key, item) {
                index_tx.insert(entry, data_key)?;
            }
        }
        Ok(())
    }

    /// Tree position to resume after, for a resume key read through `schema`.
    fn resume_position(
        &self,
        schema: &KeySchema,
        via_index: bool,
        key: &StoreKey,
    ) -> Result<Vec<u8>, StoreError> {
        let data_key = ItemKey::from_store_key(key)?.encode();
        if !via_index {
            return Ok(data_key);
        }
        index_key(schema, &data_key, key).ok_or_else(|| {
            StoreError::InvalidKey(format!(
                "resume key lacks the key attributes of index '{}'",
                schema.name
            ))
        })
    }

    /// Evaluate up to `limit` entries under `prefix`, resuming after `resume`.
    #[allow(clippy::too_many_arguments)]
    fn read_page(
        &self,
        tree: &Tree,
        schema: &KeySchema,
        via_index: bool,
        prefix: &[u8],
        resume: Option<Vec<u8>>,
        limit: usize,
        filter: Option<&FilterExpression>,
        forward: bool,
    ) -> Result<StorePage, StoreError> {
        if limit == 0 {
            return Err(StoreError::InvalidExpression(
                "limit must be at least 1".to_string(),
            ));
        }
        if let Some(position) = &resume {
            if !position.starts_with(prefix) {
                return Err(StoreError::InvalidKey(
                    "resume key lies outside the queried key range".to_string(),
                ));
            }
        }

        let lower = Bound::Included(prefix.to_vec());
        let upper = match prefix_successor(prefix) {
            Some(end) => Bound::Excluded(end),
            None => Bound::Unbounded,
        };
        let bounds = match (resume, forward) {
            (Some(position), true) => (Bound::Excluded(position), upper),
            (Some(position), false) => (lower, Bound::Excluded(position)),
            (None, _) => (lower, upper),
        };

        let range = tree.range::<Vec<u8>, _>(bounds);
        let mut entries: Entries<'_> = if forward {
            Box::new(range)
        } else {
            Box::new(range.rev())
        };

        let mut items = Vec::new();
        let mut evaluated = 0;
        let mut last_evaluated_key = None;

        while let Some(entry) = entries.next() {
            let (_, value) = entry?;
            let item = if via_index {
                match self.items.get(&value)? {
                    Some(bytes) => decode_item(&bytes)?,
                    None => {
                        warn!(index = %schema.name, "Index entry points at a missing item");
                        continue;
                    }
                }
            } else {
                decode_item(&value)?
            };

            evaluated += 1;
            let position = resume_key(schema, &item);
            let keep = match filter {
                Some(filter) => filter.matches(&item)?,
                None => true,
            };
            if keep {
                items.push(item);
            }

            if evaluated == limit {
                if entries.next().is_some() {
                    last_evaluated_key = Some(position);
                }
                break;
            }
        }

        debug!(
            table = %self.table,
            index = %schema.name,
            evaluated,
            returned = items.len(),
            more = last_evaluated_key.is_some(),
            "Read page"
        );

        Ok(StorePage {
            count: items.len(),
            items,
            last_evaluated_key,
        })
    }
}

impl StoreAdapter for SledStore {
    fn get(&self, key: &ItemKey) -> Result<Option<Item>, StoreError> {
        match self.items.get(key.encode())? {
            Some(bytes) => Ok(Some(decode_item(&bytes)?)),
            None => Ok(None),
        }
    }

    fn put(&self, mut item: Item) -> Result<Item, StoreError> {
        let key = ItemKey::from_item(&item)?;
        let now = Value::Int(current_millis() as i64);
        item.entry(CREATED_AT.to_string())
            .or_insert_with(|| now.clone());
        item.insert(UPDATED_AT.to_string(), now);

        self.write(&key, |_| Ok(item.clone()))
    }

    fn update(&self, key: &ItemKey, update: &UpdateExpression) -> Result<Item, StoreError> {
        let now = Value::Int(current_millis() as i64);
        self.write(key, |current| {
            let mut next = update.apply(current, key.to_item(), &[PARTITION_KEY, SORT_KEY])?;
            next.entry(CREATED_AT.to_string())
                .or_insert_with(|| now.clone());
            next.insert(UPDATED_AT.to_string(), now.clone());
            Ok(next)
        })
    }

    fn delete(&self, key: &ItemKey) -> Result<Option<Item>, StoreError> {
        let data_key = key.encode();

        let result: Result<Option<Item>, TransactionError<StoreError>> =
            (&self.items, &self.index).transaction(|(items_tx, index_tx)| {
                let previous = match items_tx.remove(data_key.as_slice())? {
                    Some(bytes) => Some(decode_item(&bytes).map_err(ConflictableTransactionError::Abort)?),
                    None => None,
                };
                self.unindex(index_tx, &data_key, previous.as_ref())?;
                Ok(previous)
            });

        match result {
            Ok(previous) => Ok(previous),
            Err(TransactionError::Abort(e)) => Err(e),
            Err(TransactionError::Storage(e)) => Err(StoreError::Backend(e)),
        }
    }

    fn query(&self, key: &KeyCondition, options: &QueryOptions) -> Result<StorePage, StoreError> {
        let (schema, via_index) = match &options.index_name {
            Some(name) => (
                self.schema
                    .index(name)
                    .ok_or_else(|| StoreError::UnknownIndex(name.clone()))?,
                true,
            ),
            None => (self.schema.base(), false),
        };

        let (partition, partition_value) = key.resolved_partition()?;
        if partition != schema.partition {
            return Err(StoreError::InvalidExpression(format!(
                "'{}' is not the partition key of {}",
                partition,
                describe(schema)
            )));
        }

        let mut prefix = Vec::new();
        if via_index {
            push_str(&mut prefix, &schema.name);
        }
        if !is_key_value(partition_value) || !push_value(&mut prefix, partition_value) {
            return Err(StoreError::InvalidKey(format!(
                "partition value must be a string or number, got {}",
                partition_value.type_name()
            )));
        }

        if let Some((comparison, sort, sort_value)) = key.resolved_sort()? {
            if schema.sort.as_deref() != Some(sort) {
                return Err(StoreError::InvalidExpression(format!(
                    "'{}' is not the sort key of {}",
                    sort,
                    describe(schema)
                )));
            }
            match comparison {
                KeyComparison::Equals => {
                    if !is_key_value(sort_value) || !push_value(&mut prefix, sort_value) {
                        return Err(StoreError::InvalidKey(format!(
                            "sort value must be a string or number, got {}",
                            sort_value.type_name()
                        )));
                    }
                }
                KeyComparison::BeginsWith => match sort_value.as_str() {
                    Some(s) => push_str_prefix(&mut prefix, s),
                    None => {
                        return Err(StoreError::InvalidExpression(format!(
                            "begins_with needs a string, got {}",
                            sort_value.type_name()
                        )))
                    }
                },
            }
        }

        let resume = options
            .exclusive_start_key
            .as_ref()
            .map(|k| self.resume_position(schema, via_index, k))
            .transpose()?;
        let tree = if via_index { &self.index } else { &self.items };

        self.read_page(
            tree,
            schema,
            via_index,
            &prefix,
            resume,
            options.limit,
            options.filter.as_ref(),
            options.scan_forward,
        )
    }

    fn scan(&self, options: &ScanOptions) -> Result<StorePage, StoreError> {
        let schema = self.schema.base();
        let resume = options
            .exclusive_start_key
            .as_ref()
            .map(|k| self.resume_position(schema, false, k))
            .transpose()?;

        self.read_page(
            &self.items,
            schema,
            false,
            &[],
            resume,
            options.limit,
            options.filter.as_ref(),
            true,
        )
    }
}

fn describe(schema: &KeySchema) -> String {
    if schema.name.is_empty() {
        "the base table".to_string()
    } else {
        format!("index '{}'", schema.name)
    }
}

fn is_key_value(value: &Value) -> bool {
    value.is_number() || value.as_str().is_some()
}

/// Index tree key for `item` under `schema`, or `None` when the item is not indexed.
fn index_key(schema: &KeySchema, data_key: &[u8], item: &Item) -> Option<Vec<u8>> {
    let mut key = Vec::with_capacity(schema.name.len() + data_key.len() + 32);
    push_str(&mut key, &schema.name);

    for attr in std::iter::once(schema.partition.as_str()).chain(schema.sort.as_deref()) {
        let value = item.get(attr)?;
        if !is_key_value(value) || !push_value(&mut key, value) {
            return None;
        }
    }

    key.extend_from_slice(data_key);
    Some(key)
}

/// The key attributes of `item` that let a read resume after it.
fn resume_key(schema: &KeySchema, item: &Item) -> StoreKey {
    schema
        .key_attributes()
        .into_iter()
        .filter_map(|attr| item.get(attr).map(|v| (attr.to_string(), v.clone())))
        .collect()
}

fn encode_item(item: &Item) -> Result<Vec<u8>, StoreError> {
    Record::from_item(item)?.to_bytes()
}

fn decode_item(bytes: &[u8]) -> Result<Item, StoreError> {
    Record::from_bytes(bytes)?.item()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::expression::FilterFunction;

    struct TestStore {
        store: SledStore,
        _dir: tempfile::TempDir,
    }

    impl std::ops::Deref for TestStore {
        type Target = SledStore;
        fn deref(&self) -> &Self::Target {
            &self.store
        }
    }

    fn test_store() -> TestStore {
        let dir = tempfile::tempdir().unwrap();
        let schema = TableSchema::new()
            .with_index(KeySchema::index(
                "category-subcategory",
                "category",
                Some("subCategory"),
            ))
            .with_index(KeySchema::index("category-cohort", "category", Some("cohort")));
        let store = SledStore::open(StoreConfig::new(dir.path()), schema).unwrap();
        TestStore { store, _dir: dir }
    }

    fn athlete(id: u32, category: &str, sub: Option<&str>, cohort: i64) -> Item {
        let mut item = Item::new();
        item.insert(PARTITION_KEY.into(), Value::from(format!("ATHLETE#{:03}", id)));
        item.insert(SORT_KEY.into(), Value::from("PROFILE"));
        item.insert("category".into(), Value::from(category));
        if let Some(sub) = sub {
            item.insert("subCategory".into(), Value::from(sub));
        }
        item.insert("cohort".into(), Value::from(cohort));
        item
    }

    fn ids(page: &StorePage) -> Vec<String> {
        page.items
            .iter()
            .filter_map(|i| i.get(PARTITION_KEY).and_then(Value::as_str).map(str::to_string))
            .collect()
    }

    #[test]
    fn test_put_and_get() {
        let store = test_store();
        let stored = store.put(athlete(1, "Football", Some("QB"), 2026)).unwrap();
        assert!(stored.contains_key(CREATED_AT));
        assert!(stored.contains_key(UPDATED_AT));

        let key = ItemKey::new("ATHLETE#001", "PROFILE");
        assert_eq!(store.get(&key).unwrap(), Some(stored));
        assert_eq!(store.get(&ItemKey::new("ATHLETE#999", "PROFILE")).unwrap(), None);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_put_requires_key() {
        let store = test_store();
        let mut item = athlete(1, "Football", None, 2026);
        item.remove(SORT_KEY);
        assert!(matches!(store.put(item), Err(StoreError::InvalidKey(_))));
    }

    #[test]
    fn test_put_keeps_given_created_at() {
        let store = test_store();
        let mut item = athlete(1, "Football", None, 2026);
        item.insert(CREATED_AT.into(), Value::Int(1_700_000_000_000));
        let stored = store.put(item).unwrap();
        assert_eq!(stored.get(CREATED_AT), Some(&Value::Int(1_700_000_000_000)));
    }

    #[test]
    fn test_stamps_stored_in_envelope() {
        let store = test_store();
        let stored = store.put(athlete(1, "Football", None, 2026)).unwrap();

        let raw = store
            .items
            .get(ItemKey::new("ATHLETE#001", "PROFILE").encode())
            .unwrap()
            .unwrap();
        let record = Record::from_bytes(&raw).unwrap();
        assert_eq!(record.created_at, stored.get(CREATED_AT).and_then(Value::as_i64));
        assert_eq!(record.updated_at, stored.get(UPDATED_AT).and_then(Value::as_i64));
        assert_eq!(decode_item(&raw).unwrap(), stored);
    }

    #[test]
    fn test_query_begins_with_on_index() {
        let store = test_store();
        store.put(athlete(1, "Football", Some("QB"), 2026)).unwrap();
        store.put(athlete(2, "Football", Some("QB-Dual"), 2025)).unwrap();
        store.put(athlete(3, "Football", Some("RB"), 2026)).unwrap();
        store.put(athlete(4, "Basketball", Some("QB"), 2026)).unwrap();

        let key = KeyCondition::partition("category", "Football").with_sort(
            KeyComparison::BeginsWith,
            "subCategory",
            "QB",
        );
        let options = QueryOptions::new(10).on_index("category-subcategory");
        let page = store.query(&key, &options).unwrap();

        assert_eq!(ids(&page), vec!["ATHLETE#001", "ATHLETE#002"]);
        assert_eq!(page.count, 2);
        assert!(page.last_evaluated_key.is_none());
    }

    #[test]
    fn test_query_equals_on_numeric_sort_key() {
        let store = test_store();
        store.put(athlete(1, "Football", None, 2026)).unwrap();
        store.put(athlete(2, "Football", None, 2025)).unwrap();

        let key = KeyCondition::partition("category", "Football").with_sort(
            KeyComparison::Equals,
            "cohort",
            Value::Float(2026.0),
        );
        let page = store
            .query(&key, &QueryOptions::new(10).on_index("category-cohort"))
            .unwrap();
        assert_eq!(ids(&page), vec!["ATHLETE#001"]);
    }

    #[test]
    fn test_index_is_sparse() {
        let store = test_store();
        store.put(athlete(1, "Football", None, 2026)).unwrap();
        store.put(athlete(2, "Football", Some("QB"), 2026)).unwrap();

        let key = KeyCondition::partition("category", "Football");
        let page = store
            .query(&key, &QueryOptions::new(10).on_index("category-subcategory"))
            .unwrap();
        assert_eq!(ids(&page), vec!["ATHLETE#002"]);
    }

    #[test]
    fn test_query_descending() {
        let store = test_store();
        for (id, cohort) in [(1, 2024), (2, 2026), (3, 2025)] {
            store.put(athlete(id, "Football", None, cohort)).unwrap();
        }

        let key = KeyCondition::partition("category", "Football");
        let page = store
            .query(
                &key,
                &QueryOptions::new(10).on_index("category-cohort").descending(),
            )
            .unwrap();
        assert_eq!(ids(&page), vec!["ATHLETE#002", "ATHLETE#003", "ATHLETE#001"]);
    }

    #[test]
    fn test_query_pagination_covers_every_item_once() {
        let store = test_store();
        for id in 0..7 {
            store.put(athlete(id, "Football", Some("QB"), 2026)).unwrap();
        }

        let key = KeyCondition::partition("category", "Football");
        let mut seen = Vec::new();
        let mut start = None;
        loop {
            let options = QueryOptions::new(3)
                .on_index("category-subcategory")
                .starting_after(start.take());
            let page = store.query(&key, &options).unwrap();
            seen.extend(ids(&page));
            match page.last_evaluated_key {
                Some(last) => {
                    assert!(last.contains_key("category"));
                    assert!(last.contains_key("subCategory"));
                    start = Some(last);
                }
                None => break,
            }
        }

        assert_eq!(seen.len(), 7);
        seen.dedup();
        assert_eq!(seen.len(), 7);
    }

    #[test]
    fn test_exact_limit_has_no_resume_key() {
        let store = test_store();
        for id in 0..3 {
            store.put(athlete(id, "Football", None, 2026)).unwrap();
        }
        let page = store.scan(&ScanOptions::new(3)).unwrap();
        assert_eq!(page.count, 3);
        assert!(page.last_evaluated_key.is_none());
    }

    #[test]
    fn test_limit_counts_evaluated_items() {
        let store = test_store();
        store.put(athlete(1, "Football", None, 2026)).unwrap();
        store.put(athlete(2, "Football", None, 2025)).unwrap();
        store.put(athlete(3, "Football", None, 2026)).unwrap();

        let filter = FilterExpression::all().with_condition(
            FilterFunction::Equals,
            "cohort",
            "cohort",
            Value::from(2026),
        );
        let page = store
            .scan(&ScanOptions::new(2).with_filter(Some(filter)))
            .unwrap();
        assert_eq!(ids(&page), vec!["ATHLETE#001"]);
        assert!(page.last_evaluated_key.is_some());
    }

    #[test]
    fn test_update_maintains_index() {
        let store = test_store();
        store.put(athlete(1, "Football", Some("QB"), 2026)).unwrap();

        let key = ItemKey::new("ATHLETE#001", "PROFILE");
        let update = UpdateExpression::new().set("category", "Baseball");
        let updated = store.update(&key, &update).unwrap();
        assert_eq!(updated.get("category"), Some(&Value::from("Baseball")));

        let football = KeyCondition::partition("category", "Football");
        let options = QueryOptions::new(10).on_index("category-cohort");
        assert_eq!(store.query(&football, &options).unwrap().count, 0);

        let baseball = KeyCondition::partition("category", "Baseball");
        assert_eq!(store.query(&baseball, &options).unwrap().count, 1);
    }

    #[test]
    fn test_update_conditional_failure_leaves_item() {
        let store = test_store();
        let key = ItemKey::new("POST#1", "META");
        let update = UpdateExpression::new().add("likes", 1).require_exists(PARTITION_KEY);
        assert!(matches!(
            store.update(&key, &update),
            Err(StoreError::ConditionalCheckFailed)
        ));
        assert_eq!(store.get(&key).unwrap(), None);
    }

    #[test]
    fn test_update_upserts_with_key() {
        let store = test_store();
        let key = ItemKey::new("POST#1", "META");
        let created = store
            .update(&key, &UpdateExpression::new().add("likes", 1))
            .unwrap();
        assert_eq!(created.get("likes"), Some(&Value::Int(1)));
        assert_eq!(created.get(PARTITION_KEY), Some(&Value::from("POST#1")));
        assert!(created.contains_key(CREATED_AT));
    }

    #[test]
    fn test_delete_removes_index_entries() {
        let store = test_store();
        store.put(athlete(1, "Football", Some("QB"), 2026)).unwrap();

        let key = ItemKey::new("ATHLETE#001", "PROFILE");
        let removed = store.delete(&key).unwrap();
        assert!(removed.is_some());
        assert!(store.delete(&key).unwrap().is_none());
        assert!(store.index.is_empty());
        assert!(store.is_empty());
    }

    #[test]
    fn test_query_errors() {
        let store = test_store();
        let key = KeyCondition::partition("category", "Football");

        assert!(matches!(
            store.query(&key, &QueryOptions::new(10).on_index("nope")),
            Err(StoreError::UnknownIndex(_))
        ));
        assert!(matches!(
            store.query(&key, &QueryOptions::new(10)),
            Err(StoreError::InvalidExpression(_))
        ));
        assert!(matches!(
            store.query(&key, &QueryOptions::new(0).on_index("category-cohort")),
            Err(StoreError::InvalidExpression(_))
        ));

        let wrong_sort = key.clone().with_sort(KeyComparison::Equals, "region", "West");
        assert!(matches!(
            store.query(&wrong_sort, &QueryOptions::new(10).on_index("category-cohort")),
            Err(StoreError::InvalidExpression(_))
        ));
    }

    #[test]
    fn test_resume_key_outside_range_rejected() {
        let store = test_store();
        let key = KeyCondition::partition("category", "Football");

        let mut foreign = ItemKey::new("ATHLETE#001", "PROFILE").to_item();
        foreign.insert("category".into(), Value::from("Basketball"));
        foreign.insert("cohort".into(), Value::from(2026));

        let options = QueryOptions::new(10)
            .on_index("category-cohort")
            .starting_after(Some(foreign));
        assert!(matches!(
            store.query(&key, &options),
            Err(StoreError::InvalidKey(_))
        ));
    }

    #[test]
    fn test_base_table_query() {
        let store = test_store();
        store.put(athlete(1, "Football", None, 2026)).unwrap();
        let mut post = ItemKey::new("ATHLETE#001", "POST#1").to_item();
        post.insert("body".into(), Value::from("game day"));
        store.put(post).unwrap();

        let key = KeyCondition::partition(PARTITION_KEY, "ATHLETE#001").with_sort(
            KeyComparison::BeginsWith,
            SORT_KEY,
            "POST#",
        );
        let page = store.query(&key, &QueryOptions::new(10)).unwrap();
        assert_eq!(page.count, 1);
        assert_eq!(page.items[0].get("body"), Some(&Value::from("game day")));
    }

    #[test]
    fn test_reopen_preserves_items() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = SledStore::open(StoreConfig::new(dir.path()), TableSchema::new()).unwrap();
            store.put(athlete(1, "Football", None, 2026)).unwrap();
            store.flush().unwrap();
        }
        let store = SledStore::open(StoreConfig::new(dir.path()), TableSchema::new()).unwrap();
        assert_eq!(store.len(), 1);
        assert!(store.size_on_disk().unwrap() > 0);
    }
}
