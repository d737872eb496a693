//! Search planning and execution.
//!
//! - [`predicate`]: validated search conditions and caller filter input.
//! - [`catalog`]: the fixed index catalog and selection rule table.
//! - [`planner`]: picks an index or a scan for a predicate set.
//! - [`filter`]: turns residual predicates into a filter expression.
//! - [`cursor`]: opaque pagination tokens.
//! - [`executor`]: runs one page fetch against a store.

pub mod catalog;
pub mod cursor;
pub mod executor;
pub mod filter;
pub mod planner;
pub mod predicate;

pub use catalog::{find_index, table_schema, IndexDescriptor, KeyShape, Rule, INDEXES, RULES};
pub use cursor::Cursor;
pub use executor::{Page, SearchExecutor, SCAN_TARGET};
pub use filter::{build_filter, text_filter};
pub use planner::{Access, Strategy, StrategySelector};
pub use predicate::{
    predicate_set, Attribute, Operator, Pagination, Predicate, PredicateSet, SearchFilters,
};
