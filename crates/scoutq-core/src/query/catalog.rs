//! Index catalog and the rule table that maps predicate sets onto indexes.
//!
//! Rules are evaluated top to bottom; the first whose required attributes are
//! all present wins. Precedence is the order of [`RULES`].

use super::predicate::{Attribute, PredicateSet};
use crate::store::{KeyComparison, KeySchema, TableSchema};

/// A secondary index available for planning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexDescriptor {
    /// Index name in the store.
    pub name: &'static str,
    /// Partition key attribute.
    pub partition: Attribute,
    /// Sort key attribute.
    pub sort: Attribute,
    /// Comparison used on the sort key.
    pub sort_comparison: KeyComparison,
}

impl IndexDescriptor {
    /// Store-side key schema of the index.
    pub fn key_schema(&self) -> KeySchema {
        KeySchema::index(self.name, self.partition.field(), Some(self.sort.field()))
    }
}

/// `category` / prefix on `subCategory`.
pub const CATEGORY_SUBCATEGORY: IndexDescriptor = IndexDescriptor {
    name: "category-subcategory",
    partition: Attribute::Category,
    sort: Attribute::SubCategory,
    sort_comparison: KeyComparison::BeginsWith,
};

/// `category` / exact `cohort`.
pub const CATEGORY_COHORT: IndexDescriptor = IndexDescriptor {
    name: "category-cohort",
    partition: Attribute::Category,
    sort: Attribute::Cohort,
    sort_comparison: KeyComparison::Equals,
};

/// `region` / exact `category`.
pub const REGION_CATEGORY: IndexDescriptor = IndexDescriptor {
    name: "region-category",
    partition: Attribute::Region,
    sort: Attribute::Category,
    sort_comparison: KeyComparison::Equals,
};

/// Every index in the catalog.
pub const INDEXES: [&IndexDescriptor; 3] = [&CATEGORY_SUBCATEGORY, &CATEGORY_COHORT, &REGION_CATEGORY];

/// Which index key attributes a rule narrows on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyShape {
    /// Partition equality plus a sort key condition.
    PartitionAndSort,
    /// Partition equality only.
    PartitionOnly,
}

/// One row of the selection table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rule {
    /// Attributes that must all be present.
    pub required: &'static [Attribute],
    /// Index to query.
    pub index: &'static IndexDescriptor,
    /// Key attributes consumed.
    pub shape: KeyShape,
}

impl Rule {
    /// Attributes consumed by the key condition.
    pub fn key_attributes(&self) -> Vec<Attribute> {
        match self.shape {
            KeyShape::PartitionAndSort => vec![self.index.partition, self.index.sort],
            KeyShape::PartitionOnly => vec![self.index.partition],
        }
    }

    /// Check if the rule applies to a predicate set.
    pub fn matches(&self, predicates: &PredicateSet) -> bool {
        self.required
            .iter()
            .chain(self.key_attributes().iter())
            .all(|attr| predicates.contains_key(attr))
    }
}

/// The selection table, highest precedence first. Anything unmatched scans.
pub const RULES: &[Rule] = &[
    Rule {
        required: &[Attribute::Category, Attribute::SubCategory],
        index: &CATEGORY_SUBCATEGORY,
        shape: KeyShape::PartitionAndSort,
    },
    Rule {
        required: &[Attribute::Category, Attribute::Cohort],
        index: &CATEGORY_COHORT,
        shape: KeyShape::PartitionAndSort,
    },
    Rule {
        required: &[Attribute::Region, Attribute::Category],
        index: &REGION_CATEGORY,
        shape: KeyShape::PartitionAndSort,
    },
    Rule {
        required: &[Attribute::Category],
        index: &CATEGORY_SUBCATEGORY,
        shape: KeyShape::PartitionOnly,
    },
];

/// Look up a catalog index by name.
pub fn find_index(name: &str) -> Option<&'static IndexDescriptor> {
    INDEXES.into_iter().find(|index| index.name == name)
}

/// Table schema declaring every catalog index.
pub fn table_schema() -> TableSchema {
    INDEXES
        .iter()
        .fold(TableSchema::new(), |schema, index| schema.with_index(index.key_schema()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rules_require_exactly_their_key() {
        for rule in RULES {
            let mut required = rule.required.to_vec();
            let mut key = rule.key_attributes();
            required.sort();
            key.sort();
            assert_eq!(required, key, "rule on {}", rule.index.name);
        }
    }

    #[test]
    fn test_rule_indexes_are_in_catalog() {
        for rule in RULES {
            assert_eq!(find_index(rule.index.name), Some(rule.index));
        }
        assert!(find_index("by-school").is_none());
    }

    #[test]
    fn test_table_schema() {
        let schema = table_schema();
        assert_eq!(schema.indexes().len(), 3);
        let index = schema.index("region-category").unwrap();
        assert_eq!(index.partition, "region");
        assert_eq!(index.sort.as_deref(), Some("category"));
    }
}
