//! Search predicates and caller-facing filter input.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::cursor::Cursor;
use crate::error::ValidationError;
use crate::value::Value;

/// A searchable attribute.
///
/// Variant order is the order residual predicates are filtered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Attribute {
    /// Sport or activity category.
    Category,
    /// Position or specialty within a category.
    SubCategory,
    /// Graduation year.
    Cohort,
    /// Geographic region.
    Region,
    /// Minimum grade point average.
    Gpa,
    /// Minimum height.
    Height,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Text,
    Number,
}

impl Attribute {
    /// Every attribute, in filter order.
    pub const ALL: [Attribute; 6] = [
        Attribute::Category,
        Attribute::SubCategory,
        Attribute::Cohort,
        Attribute::Region,
        Attribute::Gpa,
        Attribute::Height,
    ];

    /// Item attribute the predicate tests.
    pub fn field(&self) -> &'static str {
        match self {
            Attribute::Category => "category",
            Attribute::SubCategory => "subCategory",
            Attribute::Cohort => "cohort",
            Attribute::Region => "region",
            Attribute::Gpa => "gpa",
            Attribute::Height => "height",
        }
    }

    /// Label the predicate's value is bound under in expressions.
    pub fn label(&self) -> &'static str {
        match self {
            Attribute::Gpa => "gpaMin",
            Attribute::Height => "heightMin",
            other => other.field(),
        }
    }

    /// The one operator the attribute supports.
    pub fn operator(&self) -> Operator {
        match self {
            Attribute::Category | Attribute::Cohort | Attribute::Region => Operator::Equals,
            Attribute::SubCategory => Operator::Prefix,
            Attribute::Gpa | Attribute::Height => Operator::AtLeast,
        }
    }

    fn kind(&self) -> Kind {
        match self {
            Attribute::Category | Attribute::SubCategory | Attribute::Region => Kind::Text,
            Attribute::Cohort | Attribute::Gpa | Attribute::Height => Kind::Number,
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Predicate operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// Exact match.
    Equals,
    /// `begins_with` when it narrows an index sort key, containment when filtered.
    Prefix,
    /// Numeric minimum, inclusive.
    AtLeast,
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operator::Equals => write!(f, "equals"),
            Operator::Prefix => write!(f, "prefix"),
            Operator::AtLeast => write!(f, "at-least"),
        }
    }
}

/// One validated search condition.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    attribute: Attribute,
    operator: Operator,
    value: Value,
}

impl Predicate {
    /// Validate and build a predicate.
    pub fn new(attribute: Attribute, operator: Operator, value: Value) -> Result<Self, ValidationError> {
        if operator != attribute.operator() {
            return Err(ValidationError::UnsupportedOperator {
                attribute: attribute.label(),
                operator: operator.to_string(),
            });
        }

        match attribute.kind() {
            Kind::Text => match &value {
                Value::String(s) if s.trim().is_empty() => {
                    return Err(ValidationError::EmptyValue(attribute.label()))
                }
                Value::String(_) => {}
                _ => {
                    return Err(ValidationError::WrongValueType {
                        attribute: attribute.label(),
                        expected: "string",
                    })
                }
            },
            Kind::Number => {
                if !value.as_f64().is_some_and(f64::is_finite) {
                    return Err(ValidationError::WrongValueType {
                        attribute: attribute.label(),
                        expected: "number",
                    });
                }
            }
        }

        Ok(Self {
            attribute,
            operator,
            value,
        })
    }

    /// `category = value`
    pub fn category(value: impl Into<String>) -> Result<Self, ValidationError> {
        Self::new(Attribute::Category, Operator::Equals, Value::String(value.into()))
    }

    /// `subCategory` starts with / contains `value`
    pub fn sub_category(value: impl Into<String>) -> Result<Self, ValidationError> {
        Self::new(Attribute::SubCategory, Operator::Prefix, Value::String(value.into()))
    }

    /// `cohort = year`
    pub fn cohort(year: i64) -> Result<Self, ValidationError> {
        Self::new(Attribute::Cohort, Operator::Equals, Value::Int(year))
    }

    /// `region = value`
    pub fn region(value: impl Into<String>) -> Result<Self, ValidationError> {
        Self::new(Attribute::Region, Operator::Equals, Value::String(value.into()))
    }

    /// `gpa >= min`
    pub fn gpa_min(min: f64) -> Result<Self, ValidationError> {
        Self::new(Attribute::Gpa, Operator::AtLeast, Value::Float(min))
    }

    /// `height >= min`
    pub fn height_min(min: f64) -> Result<Self, ValidationError> {
        Self::new(Attribute::Height, Operator::AtLeast, Value::Float(min))
    }

    /// Attribute tested.
    pub fn attribute(&self) -> Attribute {
        self.attribute
    }

    /// Operator applied.
    pub fn operator(&self) -> Operator {
        self.operator
    }

    /// Comparison value.
    pub fn value(&self) -> &Value {
        &self.value
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.attribute.field(), self.operator, self.value)
    }
}

/// Predicates keyed by attribute; at most one per attribute.
pub type PredicateSet = BTreeMap<Attribute, Predicate>;

/// Collect predicates into a set. A later predicate on the same attribute wins.
pub fn predicate_set(predicates: impl IntoIterator<Item = Predicate>) -> PredicateSet {
    predicates
        .into_iter()
        .map(|p| (p.attribute(), p))
        .collect()
}

/// Filter input as callers send it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchFilters {
    /// Exact category.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Sub-category prefix.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_category: Option<String>,
    /// Exact graduation year.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cohort: Option<i64>,
    /// Exact region.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    /// Minimum GPA.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gpa_min: Option<f64>,
    /// Minimum height.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height_min: Option<f64>,
}

impl SearchFilters {
    /// Validate and convert to predicates.
    pub fn to_predicates(&self) -> Result<PredicateSet, ValidationError> {
        let mut set = PredicateSet::new();
        let mut add = |predicate: Predicate| {
            set.insert(predicate.attribute(), predicate);
        };

        if let Some(category) = &self.category {
            add(Predicate::category(category.as_str())?);
        }
        if let Some(sub) = &self.sub_category {
            add(Predicate::sub_category(sub.as_str())?);
        }
        if let Some(cohort) = self.cohort {
            add(Predicate::cohort(cohort)?);
        }
        if let Some(region) = &self.region {
            add(Predicate::region(region.as_str())?);
        }
        if let Some(min) = self.gpa_min {
            add(Predicate::gpa_min(min)?);
        }
        if let Some(min) = self.height_min {
            add(Predicate::height_min(min)?);
        }

        Ok(set)
    }
}

/// Page size and resume position for one search call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Pagination {
    /// Requested page size; the configured default when absent.
    pub limit: Option<usize>,
    /// Resume position; start from the beginning when absent.
    pub cursor: Option<Cursor>,
}

impl Pagination {
    /// First page with the given size.
    pub fn first(limit: usize) -> Self {
        Self {
            limit: Some(limit),
            cursor: None,
        }
    }

    /// Resume from a cursor.
    pub fn after(mut self, cursor: Option<Cursor>) -> Self {
        self.cursor = cursor;
        self
    }
}
