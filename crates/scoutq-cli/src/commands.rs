//! Command execution.

use std::io::Read;
use std::path::Path;

use serde_json::{json, Value as Json};
use thiserror::Error;

use scoutq_core::query::{Access, Strategy, StrategySelector};
use scoutq_core::value::PARTITION_KEY;
use scoutq_core::{
    open_store, Item, ItemKey, SearchConfig, SearchExecutor, SearchFilters, SledStore,
    StoreAdapter, StoreConfig, StoreError, UpdateExpression, ValidationError,
};

use crate::Command;

/// CLI errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Search failed.
    #[error(transparent)]
    Search(#[from] scoutq_core::Error),

    /// Store call failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Invalid filters.
    #[error("invalid input: {0}")]
    Validation(#[from] ValidationError),

    /// Input file is not a JSON object or array of objects.
    #[error("invalid input file: {0}")]
    Input(String),

    /// JSON error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// An open store plus a search executor over it.
pub struct Session {
    executor: SearchExecutor<SledStore>,
}

impl Session {
    /// Open the store and build the executor.
    pub fn open(store: StoreConfig, search: SearchConfig) -> Result<Self, CliError> {
        let store = open_store(store)?;
        Ok(Self {
            executor: SearchExecutor::new(store).with_config(search),
        })
    }

    fn store(&self) -> &SledStore {
        self.executor.store()
    }

    /// Run one command, returning its JSON output.
    pub fn run(&self, command: Command) -> Result<Json, CliError> {
        match command {
            Command::Put { file } => self.put(&file),
            Command::Get { pk, sk } => {
                let item = self.store().get(&ItemKey::new(pk, sk))?;
                Ok(serde_json::to_value(item)?)
            }
            Command::Delete { pk, sk } => {
                let removed = self.store().delete(&ItemKey::new(pk, sk))?;
                Ok(json!({ "deleted": removed.is_some(), "item": removed }))
            }
            Command::Incr {
                pk,
                sk,
                attribute,
                by,
            } => {
                let update = UpdateExpression::new()
                    .add(&attribute, by)
                    .require_exists(PARTITION_KEY);
                let item = self.store().update(&ItemKey::new(pk, sk), &update)?;
                Ok(serde_json::to_value(item)?)
            }
            Command::Search { filters, page } => {
                let page = self
                    .executor
                    .search_filters(&SearchFilters::from(filters), &page.into())?;
                Ok(serde_json::to_value(page)?)
            }
            Command::Text { query, page } => {
                let page = self.executor.text_search(&query, &page.into())?;
                Ok(serde_json::to_value(page)?)
            }
            Command::Explain { filters } => explain(filters.into()),
        }
    }

    fn put(&self, file: &Path) -> Result<Json, CliError> {
        let items = read_items(file)?;
        let mut stored = Vec::with_capacity(items.len());
        for item in items {
            stored.push(self.store().put(item)?);
        }
        tracing::info!(count = stored.len(), "stored items");
        Ok(json!({ "stored": stored.len(), "items": stored }))
    }

    /// Search metrics in Prometheus text format.
    pub fn metrics(&self) -> String {
        self.executor.metrics().to_prometheus()
    }

    /// Flush pending writes.
    pub fn flush(&self) -> Result<(), CliError> {
        self.store().flush()?;
        Ok(())
    }
}

/// Describe the strategy a search would use. Reads nothing.
pub fn explain(filters: SearchFilters) -> Result<Json, CliError> {
    let predicates = filters.to_predicates()?;
    let strategy = StrategySelector::new().select(&predicates);
    Ok(describe(&strategy))
}

fn describe(strategy: &Strategy) -> Json {
    let residual: Vec<String> = strategy.residual().iter().map(|p| p.to_string()).collect();
    let filter = strategy.filter().map(|f| f.expression());

    match strategy.access() {
        Access::Index { index, .. } => json!({
            "strategy": "index",
            "index": index.name,
            "keyCondition": strategy.key_condition().map(|k| k.expression()),
            "filter": filter,
            "residual": residual,
        }),
        Access::Scan => json!({
            "strategy": "scan",
            "index": null,
            "keyCondition": null,
            "filter": filter,
            "residual": residual,
        }),
    }
}

fn read_items(file: &Path) -> Result<Vec<Item>, CliError> {
    let text = if file.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(file)?
    };

    match serde_json::from_str::<Json>(&text)? {
        Json::Array(values) => values
            .into_iter()
            .map(|v| serde_json::from_value(v).map_err(CliError::from))
            .collect(),
        value @ Json::Object(_) => Ok(vec![serde_json::from_value(value)?]),
        other => Err(CliError::Input(format!(
            "expected an object or an array of objects, got {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FilterArgs, PageArgs};

    fn session(dir: &tempfile::TempDir) -> Session {
        Session::open(StoreConfig::new(dir.path()), SearchConfig::default()).unwrap()
    }

    fn write_roster(dir: &tempfile::TempDir) -> std::path::PathBuf {
        let path = dir.path().join("roster.json");
        std::fs::write(
            &path,
            r#"[
                {"PK": "ATHLETE#1", "SK": "PROFILE", "category": "Football", "subCategory": "QB", "cohort": 2026, "firstName": "Ann"},
                {"PK": "ATHLETE#2", "SK": "PROFILE", "category": "Football", "subCategory": "WR", "cohort": 2025, "firstName": "Bo"}
            ]"#,
        )
        .unwrap();
        path
    }

    #[test]
    fn test_put_then_search() {
        let dir = tempfile::tempdir().unwrap();
        let session = session(&dir);
        let file = write_roster(&dir);

        let out = session.run(Command::Put { file }).unwrap();
        assert_eq!(out["stored"], 2);

        let out = session
            .run(Command::Search {
                filters: FilterArgs {
                    category: Some("Football".into()),
                    sub_category: Some("Q".into()),
                    ..Default::default()
                },
                page: PageArgs::default(),
            })
            .unwrap();
        assert_eq!(out["count"], 1);
        assert_eq!(out["items"][0]["firstName"], "Ann");
        assert!(out["nextCursor"].is_null());
    }

    #[test]
    fn test_incr_requires_existing_item() {
        let dir = tempfile::tempdir().unwrap();
        let session = session(&dir);
        session
            .run(Command::Put {
                file: write_roster(&dir),
            })
            .unwrap();

        let out = session
            .run(Command::Incr {
                pk: "ATHLETE#1".into(),
                sk: "PROFILE".into(),
                attribute: "views".into(),
                by: 3,
            })
            .unwrap();
        assert_eq!(out["views"], 3);

        let err = session
            .run(Command::Incr {
                pk: "ATHLETE#9".into(),
                sk: "PROFILE".into(),
                attribute: "views".into(),
                by: 1,
            })
            .unwrap_err();
        assert!(matches!(
            err,
            CliError::Store(StoreError::ConditionalCheckFailed)
        ));
    }

    #[test]
    fn test_get_and_delete() {
        let dir = tempfile::tempdir().unwrap();
        let session = session(&dir);
        session
            .run(Command::Put {
                file: write_roster(&dir),
            })
            .unwrap();

        let got = session
            .run(Command::Get {
                pk: "ATHLETE#2".into(),
                sk: "PROFILE".into(),
            })
            .unwrap();
        assert_eq!(got["firstName"], "Bo");

        let out = session
            .run(Command::Delete {
                pk: "ATHLETE#2".into(),
                sk: "PROFILE".into(),
            })
            .unwrap();
        assert_eq!(out["deleted"], true);

        let gone = session
            .run(Command::Get {
                pk: "ATHLETE#2".into(),
                sk: "PROFILE".into(),
            })
            .unwrap();
        assert!(gone.is_null());
    }

    #[test]
    fn test_explain() {
        let out = explain(SearchFilters {
            category: Some("Football".into()),
            cohort: Some(2026),
            height_min: Some(70.0),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(out["strategy"], "index");
        assert_eq!(out["index"], "category-cohort");
        assert_eq!(out["keyCondition"], "#category = :category AND #cohort = :cohort");
        assert_eq!(out["filter"], "#height >= :heightMin");

        let scan = explain(SearchFilters::default()).unwrap();
        assert_eq!(scan["strategy"], "scan");
        assert!(scan["filter"].is_null());
    }

    #[test]
    fn test_put_rejects_scalars() {
        let dir = tempfile::tempdir().unwrap();
        let session = session(&dir);
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "42").unwrap();
        assert!(matches!(
            session.run(Command::Put { file: path }),
            Err(CliError::Input(_))
        ));
    }
}
