//! Table key schemas.

use crate::value::{PARTITION_KEY, SORT_KEY};

/// Key attributes of the base table or one secondary index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySchema {
    /// Index name. Empty for the base table.
    pub name: String,
    /// Partition key attribute.
    pub partition: String,
    /// Sort key attribute, if the index has one.
    pub sort: Option<String>,
}

impl KeySchema {
    /// Schema of a secondary index.
    pub fn index(name: impl Into<String>, partition: impl Into<String>, sort: Option<&str>) -> Self {
        Self {
            name: name.into(),
            partition: partition.into(),
            sort: sort.map(str::to_string),
        }
    }

    /// Schema of the base table: `PK` / `SK`.
    pub fn base() -> Self {
        Self {
            name: String::new(),
            partition: PARTITION_KEY.to_string(),
            sort: Some(SORT_KEY.to_string()),
        }
    }

    /// Attributes that make up a resume key for this schema.
    pub fn key_attributes(&self) -> Vec<&str> {
        let mut attrs = vec![PARTITION_KEY, SORT_KEY];
        for attr in std::iter::once(self.partition.as_str()).chain(self.sort.as_deref()) {
            if !attrs.contains(&attr) {
                attrs.push(attr);
            }
        }
        attrs
    }
}

/// The base table plus its secondary indexes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    base: KeySchema,
    indexes: Vec<KeySchema>,
}

impl Default for TableSchema {
    fn default() -> Self {
        Self::new()
    }
}

impl TableSchema {
    /// Base table with no secondary indexes.
    pub fn new() -> Self {
        Self {
            base: KeySchema::base(),
            indexes: Vec::new(),
        }
    }

    /// Add a secondary index.
    pub fn with_index(mut self, index: KeySchema) -> Self {
        self.indexes.retain(|i| i.name != index.name);
        self.indexes.push(index);
        self
    }

    /// Base table key schema.
    pub fn base(&self) -> &KeySchema {
        &self.base
    }

    /// Secondary indexes.
    pub fn indexes(&self) -> &[KeySchema] {
        &self.indexes
    }

    /// Look up a secondary index by name.
    pub fn index(&self, name: &str) -> Option<&KeySchema> {
        self.indexes.iter().find(|i| i.name == name)
    }
}
