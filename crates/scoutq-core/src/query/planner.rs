//! Strategy selection.
//!
//! The selector turns a predicate set into a [`Strategy`]: which index (if any)
//! narrows the physical read, with which key condition, and which predicates are
//! left for the filter stage. Selection is pure and never fails; when no rule
//! applies the strategy is a full scan with every predicate residual.

use tracing::debug;

use super::catalog::{IndexDescriptor, KeyShape, Rule, RULES};
use super::filter::build_filter;
use super::predicate::{Predicate, PredicateSet};
use crate::error::ValidationError;
use crate::store::{FilterExpression, KeyComparison, KeyCondition, KeySchema};
use crate::value::{StoreKey, Value, PARTITION_KEY, SORT_KEY};

/// How a strategy reads the table.
#[derive(Debug, Clone, PartialEq)]
pub enum Access {
    /// Key-condition query on a secondary index.
    Index {
        /// Index queried.
        index: &'static IndexDescriptor,
        /// Predicate on the partition key.
        partition: Predicate,
        /// Predicate on the sort key, when the rule narrows on it.
        sort: Option<Predicate>,
    },
    /// Full table scan.
    Scan,
}

impl Access {
    /// Key schema whose attributes make up this read's resume keys.
    pub fn key_schema(&self) -> KeySchema {
        match self {
            Access::Index { index, .. } => index.key_schema(),
            Access::Scan => KeySchema::base(),
        }
    }

    /// Check that a decoded resume key lies inside this read.
    ///
    /// The key must hold exactly the resume-key attributes of the index (or of
    /// the base table for a scan), and its index key values must satisfy the
    /// key condition.
    pub fn check_resume_key(&self, key: &StoreKey) -> Result<(), ValidationError> {
        let schema = self.key_schema();
        let expected = schema.key_attributes();
        if key.len() != expected.len() || !expected.iter().all(|attr| key.contains_key(*attr)) {
            return Err(ValidationError::CursorMismatch(format!(
                "expected resume key attributes [{}]",
                expected.join(", ")
            )));
        }
        for attr in [PARTITION_KEY, SORT_KEY] {
            if key.get(attr).and_then(Value::as_str).is_none() {
                return Err(ValidationError::CursorMismatch(format!(
                    "resume key attribute '{}' is not a string",
                    attr
                )));
            }
        }

        let Access::Index {
            index,
            partition,
            sort,
        } = self
        else {
            return Ok(());
        };

        let in_partition = key
            .get(index.partition.field())
            .is_some_and(|value| value.loosely_equals(partition.value()));
        if !in_partition {
            return Err(ValidationError::CursorMismatch(format!(
                "cursor is from a different '{}' partition of index '{}'",
                index.partition.field(),
                index.name
            )));
        }

        if let Some(sort) = sort {
            let actual = key.get(index.sort.field());
            let in_range = match index.sort_comparison {
                KeyComparison::Equals => actual.is_some_and(|value| value.loosely_equals(sort.value())),
                KeyComparison::BeginsWith => {
                    match (actual.and_then(Value::as_str), sort.value().as_str()) {
                        (Some(value), Some(prefix)) => value.starts_with(prefix),
                        _ => false,
                    }
                }
            };
            if !in_range {
                return Err(ValidationError::CursorMismatch(format!(
                    "cursor lies outside the '{}' key range of index '{}'",
                    index.sort.field(),
                    index.name
                )));
            }
        }
        Ok(())
    }
}

/// The chosen read plan for one search.
#[derive(Debug, Clone, PartialEq)]
pub struct Strategy {
    access: Access,
    residual: Vec<Predicate>,
}

impl Strategy {
    /// How the table is read.
    pub fn access(&self) -> &Access {
        &self.access
    }

    /// The index queried, if any.
    pub fn index(&self) -> Option<&'static IndexDescriptor> {
        match &self.access {
            Access::Index { index, .. } => Some(*index),
            Access::Scan => None,
        }
    }

    /// Name of the index queried, if any.
    pub fn index_name(&self) -> Option<&'static str> {
        self.index().map(|index| index.name)
    }

    /// Check if this is a full scan.
    pub fn is_scan(&self) -> bool {
        matches!(self.access, Access::Scan)
    }

    /// Predicates consumed by the key condition.
    pub fn key_predicates(&self) -> Vec<&Predicate> {
        match &self.access {
            Access::Index {
                partition, sort, ..
            } => std::iter::once(partition).chain(sort.as_ref()).collect(),
            Access::Scan => Vec::new(),
        }
    }

    /// Predicates left for the filter stage, in attribute order.
    pub fn residual(&self) -> &[Predicate] {
        &self.residual
    }

    /// Key condition for an index strategy.
    pub fn key_condition(&self) -> Option<KeyCondition> {
        match &self.access {
            Access::Index {
                index,
                partition,
                sort,
            } => Some(key_condition(index, partition, sort.as_ref())),
            Access::Scan => None,
        }
    }

    /// Filter expression over the residual predicates; `None` when there are none.
    pub fn filter(&self) -> Option<FilterExpression> {
        build_filter(&self.residual)
    }
}

/// Build the key condition for an index read.
pub fn key_condition(
    index: &IndexDescriptor,
    partition: &Predicate,
    sort: Option<&Predicate>,
) -> KeyCondition {
    let key = KeyCondition::partition(partition.attribute().field(), partition.value().clone());
    match sort {
        Some(sort) => key.with_sort(
            index.sort_comparison,
            sort.attribute().field(),
            sort.value().clone(),
        ),
        None => key,
    }
}

/// Picks a strategy by walking an ordered rule table.
#[derive(Debug, Clone, Copy)]
pub struct StrategySelector {
    rules: &'static [Rule],
}

impl Default for StrategySelector {
    fn default() -> Self {
        Self::new()
    }
}

impl StrategySelector {
    /// Selector over the built-in rule table.
    pub fn new() -> Self {
        Self { rules: RULES }
    }

    /// Selector over a custom rule table.
    pub fn with_rules(rules: &'static [Rule]) -> Self {
        Self { rules }
    }

    /// The rule table, highest precedence first.
    pub fn rules(&self) -> &'static [Rule] {
        self.rules
    }

    /// Choose a strategy for the predicates. Never fails.
    pub fn select(&self, predicates: &PredicateSet) -> Strategy {
        for rule in self.rules {
            if let Some(strategy) = apply(rule, predicates) {
                debug!(
                    index = rule.index.name,
                    key = ?strategy.key_predicates().iter().map(|p| p.attribute()).collect::<Vec<_>>(),
                    residual = strategy.residual.len(),
                    "Selected index strategy"
                );
                return strategy;
            }
        }

        debug!(residual = predicates.len(), "No rule matched, selected scan");
        Strategy {
            access: Access::Scan,
            residual: predicates.values().cloned().collect(),
        }
    }
}

fn apply(rule: &Rule, predicates: &PredicateSet) -> Option<Strategy> {
    if !rule.matches(predicates) {
        return None;
    }

    let index = rule.index;
    let partition = predicates.get(&index.partition)?.clone();
    let sort = match rule.shape {
        KeyShape::PartitionAndSort => Some(predicates.get(&index.sort)?.clone()),
        KeyShape::PartitionOnly => None,
    };

    let consumed = rule.key_attributes();
    let residual = predicates
        .iter()
        .filter(|(attr, _)| !consumed.contains(*attr))
        .map(|(_, p)| p.clone())
        .collect();

    Some(Strategy {
        access: Access::Index {
            index,
            partition,
            sort,
        },
        residual,
    })
}
