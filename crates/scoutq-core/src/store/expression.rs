//! Key-condition, filter and update expressions.
//!
//! Expressions refer to attributes and values only through placeholders
//! (`#name`, `:value`) bound in an [`ExpressionAttributes`] table, so attribute
//! names never collide with reserved words and values are never spliced into
//! expression text. Each expression renders to the store's expression syntax
//! for display, and evaluates against items directly.

use std::collections::BTreeMap;
use std::fmt;

use super::StoreError;
use crate::value::{Item, Value};

/// Placeholder bindings for names (`#x`) and values (`:x`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpressionAttributes {
    names: BTreeMap<String, String>,
    values: BTreeMap<String, Value>,
}

impl ExpressionAttributes {
    /// Create an empty binding table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind an attribute name, returning its placeholder `#attribute`.
    pub fn bind_name(&mut self, attribute: &str) -> String {
        let placeholder = format!("#{}", attribute);
        self.names.insert(placeholder.clone(), attribute.to_string());
        placeholder
    }

    /// Bind a value under `:label`, returning the placeholder.
    ///
    /// A label already bound to an equal value shares its placeholder. A label
    /// bound to a different value gets a fresh `:label_N`, so an earlier binding
    /// is never overwritten.
    pub fn bind_value(&mut self, label: &str, value: Value) -> String {
        let mut placeholder = format!(":{}", label);
        let mut suffix = 0;
        while let Some(bound) = self.values.get(&placeholder) {
            if *bound == value {
                return placeholder;
            }
            suffix += 1;
            placeholder = format!(":{}_{}", label, suffix);
        }
        self.values.insert(placeholder.clone(), value);
        placeholder
    }

    /// Resolve a name placeholder.
    pub fn name(&self, placeholder: &str) -> Result<&str, StoreError> {
        self.names
            .get(placeholder)
            .map(String::as_str)
            .ok_or_else(|| {
                StoreError::InvalidExpression(format!("unbound name placeholder '{}'", placeholder))
            })
    }

    /// Resolve a value placeholder.
    pub fn value(&self, placeholder: &str) -> Result<&Value, StoreError> {
        self.values.get(placeholder).ok_or_else(|| {
            StoreError::InvalidExpression(format!("unbound value placeholder '{}'", placeholder))
        })
    }

    /// Name placeholder bindings.
    pub fn names(&self) -> &BTreeMap<String, String> {
        &self.names
    }

    /// Value placeholder bindings.
    pub fn values(&self) -> &BTreeMap<String, Value> {
        &self.values
    }
}

// ========== Key conditions ==========

/// Comparison allowed on a sort key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyComparison {
    /// `#sk = :v`
    Equals,
    /// `begins_with(#sk, :v)`
    BeginsWith,
}

/// One clause of a key condition, by placeholder.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyClause {
    /// Comparison applied to the key attribute.
    pub comparison: KeyComparison,
    /// Name placeholder.
    pub name: String,
    /// Value placeholder.
    pub value: String,
}

impl KeyClause {
    fn render(&self) -> String {
        match self.comparison {
            KeyComparison::Equals => format!("{} = {}", self.name, self.value),
            KeyComparison::BeginsWith => format!("begins_with({}, {})", self.name, self.value),
        }
    }
}

/// Narrowing condition on an index's partition key and optional sort key.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyCondition {
    partition: KeyClause,
    sort: Option<KeyClause>,
    attributes: ExpressionAttributes,
}

impl KeyCondition {
    /// Partition key equality: `#attribute = :attribute`.
    pub fn partition(attribute: &str, value: impl Into<Value>) -> Self {
        let mut attributes = ExpressionAttributes::new();
        let name = attributes.bind_name(attribute);
        let value = attributes.bind_value(attribute, value.into());
        Self {
            partition: KeyClause {
                comparison: KeyComparison::Equals,
                name,
                value,
            },
            sort: None,
            attributes,
        }
    }

    /// Add a sort key clause.
    pub fn with_sort(
        mut self,
        comparison: KeyComparison,
        attribute: &str,
        value: impl Into<Value>,
    ) -> Self {
        let name = self.attributes.bind_name(attribute);
        let value = self.attributes.bind_value(attribute, value.into());
        self.sort = Some(KeyClause {
            comparison,
            name,
            value,
        });
        self
    }

    /// The partition clause.
    pub fn partition_clause(&self) -> &KeyClause {
        &self.partition
    }

    /// The sort clause, if any.
    pub fn sort_clause(&self) -> Option<&KeyClause> {
        self.sort.as_ref()
    }

    /// Placeholder bindings.
    pub fn attributes(&self) -> &ExpressionAttributes {
        &self.attributes
    }

    /// Resolved partition attribute name and value.
    pub fn resolved_partition(&self) -> Result<(&str, &Value), StoreError> {
        Ok((
            self.attributes.name(&self.partition.name)?,
            self.attributes.value(&self.partition.value)?,
        ))
    }

    /// Resolved sort comparison, attribute name and value.
    pub fn resolved_sort(&self) -> Result<Option<(KeyComparison, &str, &Value)>, StoreError> {
        match &self.sort {
            Some(clause) => Ok(Some((
                clause.comparison,
                self.attributes.name(&clause.name)?,
                self.attributes.value(&clause.value)?,
            ))),
            None => Ok(None),
        }
    }

    /// Render in the store's expression syntax.
    pub fn expression(&self) -> String {
        match &self.sort {
            Some(sort) => format!("{} AND {}", self.partition.render(), sort.render()),
            None => self.partition.render(),
        }
    }
}

impl fmt::Display for KeyCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.expression())
    }
}

// ========== Filter expressions ==========

/// How filter conditions combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    /// Every condition must hold.
    And,
    /// At least one condition must hold.
    Or,
}

/// Filter test applied to one attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterFunction {
    /// `#a = :v`
    Equals,
    /// `contains(#a, :v)`: substring for strings, membership for lists.
    Contains,
    /// `#a >= :v`
    AtLeast,
}

/// One filter condition, by placeholder.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterCondition {
    /// Test to apply.
    pub function: FilterFunction,
    /// Name placeholder.
    pub name: String,
    /// Value placeholder.
    pub value: String,
}

impl FilterCondition {
    fn render(&self) -> String {
        match self.function {
            FilterFunction::Equals => format!("{} = {}", self.name, self.value),
            FilterFunction::Contains => format!("contains({}, {})", self.name, self.value),
            FilterFunction::AtLeast => format!("{} >= {}", self.name, self.value),
        }
    }
}

/// Post-fetch filter: conditions combined under one combinator.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterExpression {
    combinator: Combinator,
    conditions: Vec<FilterCondition>,
    attributes: ExpressionAttributes,
}

impl FilterExpression {
    /// Empty conjunctive filter.
    pub fn all() -> Self {
        Self::with_combinator(Combinator::And)
    }

    /// Empty disjunctive filter.
    pub fn any() -> Self {
        Self::with_combinator(Combinator::Or)
    }

    fn with_combinator(combinator: Combinator) -> Self {
        Self {
            combinator,
            conditions: Vec::new(),
            attributes: ExpressionAttributes::new(),
        }
    }

    /// Append a condition on `attribute`, binding `value` under `:label`.
    ///
    /// Conditions sharing a label and value share the placeholder; a different
    /// value under the same label binds a fresh one.
    pub fn with_condition(
        mut self,
        function: FilterFunction,
        attribute: &str,
        label: &str,
        value: Value,
    ) -> Self {
        let name = self.attributes.bind_name(attribute);
        let value = self.attributes.bind_value(label, value);
        self.conditions.push(FilterCondition {
            function,
            name,
            value,
        });
        self
    }

    /// How conditions combine.
    pub fn combinator(&self) -> Combinator {
        self.combinator
    }

    /// The conditions, in order.
    pub fn conditions(&self) -> &[FilterCondition] {
        &self.conditions
    }

    /// Placeholder bindings.
    pub fn attributes(&self) -> &ExpressionAttributes {
        &self.attributes
    }

    /// Check if the filter has no conditions.
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Render in the store's expression syntax.
    pub fn expression(&self) -> String {
        let joiner = match self.combinator {
            Combinator::And => " AND ",
            Combinator::Or => " OR ",
        };
        self.conditions
            .iter()
            .map(FilterCondition::render)
            .collect::<Vec<_>>()
            .join(joiner)
    }

    /// Evaluate against an item.
    ///
    /// An empty filter matches everything.
    pub fn matches(&self, item: &Item) -> Result<bool, StoreError> {
        if self.conditions.is_empty() {
            return Ok(true);
        }
        match self.combinator {
            Combinator::And => {
                for condition in &self.conditions {
                    if !self.evaluate(condition, item)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Combinator::Or => {
                for condition in &self.conditions {
                    if self.evaluate(condition, item)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
        }
    }

    fn evaluate(&self, condition: &FilterCondition, item: &Item) -> Result<bool, StoreError> {
        let attribute = self.attributes.name(&condition.name)?;
        let expected = self.attributes.value(&condition.value)?;

        // Missing attribute never matches
        let Some(actual) = item.get(attribute) else {
            return Ok(false);
        };

        Ok(match condition.function {
            FilterFunction::Equals => actual.loosely_equals(expected),
            FilterFunction::Contains => contains(actual, expected),
            FilterFunction::AtLeast => at_least(actual, expected),
        })
    }
}

impl fmt::Display for FilterExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.expression())
    }
}

fn contains(haystack: &Value, needle: &Value) -> bool {
    match (haystack, needle) {
        (Value::String(h), Value::String(n)) => h.contains(n.as_str()),
        (Value::List(items), n) => items.iter().any(|item| item.loosely_equals(n)),
        _ => false,
    }
}

fn at_least(actual: &Value, threshold: &Value) -> bool {
    match (actual, threshold) {
        (Value::String(a), Value::String(t)) => a >= t,
        _ => match (actual.as_f64(), threshold.as_f64()) {
            (Some(a), Some(t)) => a >= t,
            _ => false,
        },
    }
}

// ========== Update expressions ==========

/// One update action, by placeholder.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateAction {
    /// `SET #a = :v`
    Set {
        /// Name placeholder.
        name: String,
        /// Value placeholder.
        value: String,
    },
    /// `ADD #a :n`: atomic numeric increment; a missing attribute starts at zero.
    Add {
        /// Name placeholder.
        name: String,
        /// Value placeholder.
        value: String,
    },
}

/// Existence precondition checked atomically with the update.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateCondition {
    /// `attribute_exists(#a)`
    AttributeExists(String),
    /// `attribute_not_exists(#a)`
    AttributeNotExists(String),
}

/// SET/ADD update with an optional existence condition.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateExpression {
    actions: Vec<UpdateAction>,
    condition: Option<UpdateCondition>,
    attributes: ExpressionAttributes,
}

impl UpdateExpression {
    /// Create an empty update.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an attribute to a value.
    pub fn set(mut self, attribute: &str, value: impl Into<Value>) -> Self {
        let name = self.attributes.bind_name(attribute);
        let value = self.attributes.bind_value(attribute, value.into());
        self.actions.push(UpdateAction::Set { name, value });
        self
    }

    /// Atomically add `delta` to a numeric attribute.
    pub fn add(mut self, attribute: &str, delta: impl Into<Value>) -> Self {
        let name = self.attributes.bind_name(attribute);
        let value = self.attributes.bind_value(attribute, delta.into());
        self.actions.push(UpdateAction::Add { name, value });
        self
    }

    /// Require the attribute to exist on the current item.
    pub fn require_exists(mut self, attribute: &str) -> Self {
        let name = self.attributes.bind_name(attribute);
        self.condition = Some(UpdateCondition::AttributeExists(name));
        self
    }

    /// Require the attribute to be absent on the current item.
    pub fn require_absent(mut self, attribute: &str) -> Self {
        let name = self.attributes.bind_name(attribute);
        self.condition = Some(UpdateCondition::AttributeNotExists(name));
        self
    }

    /// The actions, in order.
    pub fn actions(&self) -> &[UpdateAction] {
        &self.actions
    }

    /// The precondition, if any.
    pub fn condition(&self) -> Option<&UpdateCondition> {
        self.condition.as_ref()
    }

    /// Placeholder bindings.
    pub fn attributes(&self) -> &ExpressionAttributes {
        &self.attributes
    }

    /// Render in the store's expression syntax.
    pub fn expression(&self) -> String {
        let sets: Vec<String> = self
            .actions
            .iter()
            .filter_map(|a| match a {
                UpdateAction::Set { name, value } => Some(format!("{} = {}", name, value)),
                UpdateAction::Add { .. } => None,
            })
            .collect();
        let adds: Vec<String> = self
            .actions
            .iter()
            .filter_map(|a| match a {
                UpdateAction::Add { name, value } => Some(format!("{} {}", name, value)),
                UpdateAction::Set { .. } => None,
            })
            .collect();

        let mut parts = Vec::new();
        if !sets.is_empty() {
            parts.push(format!("SET {}", sets.join(", ")));
        }
        if !adds.is_empty() {
            parts.push(format!("ADD {}", adds.join(", ")));
        }
        parts.join(" ")
    }

    /// Apply to the current item (or, when absent, a fresh item holding only `base`).
    ///
    /// `protected` names attributes that may not be modified (the primary key).
    pub fn apply(
        &self,
        current: Option<Item>,
        base: Item,
        protected: &[&str],
    ) -> Result<Item, StoreError> {
        if self.actions.is_empty() {
            return Err(StoreError::InvalidExpression(
                "update has no actions".to_string(),
            ));
        }

        if let Some(condition) = &self.condition {
            let holds = match condition {
                UpdateCondition::AttributeExists(name) => {
                    let attribute = self.attributes.name(name)?;
                    current.as_ref().is_some_and(|i| i.contains_key(attribute))
                }
                UpdateCondition::AttributeNotExists(name) => {
                    let attribute = self.attributes.name(name)?;
                    !current.as_ref().is_some_and(|i| i.contains_key(attribute))
                }
            };
            if !holds {
                return Err(StoreError::ConditionalCheckFailed);
            }
        }

        let mut touched = Vec::with_capacity(self.actions.len());
        for action in &self.actions {
            let (UpdateAction::Set { name, .. } | UpdateAction::Add { name, .. }) = action;
            let attribute = self.attributes.name(name)?;
            if touched.contains(&attribute) {
                return Err(StoreError::InvalidExpression(format!(
                    "two actions update '{}'",
                    attribute
                )));
            }
            touched.push(attribute);
        }

        let mut item = current.unwrap_or(base);

        for action in &self.actions {
            let (name, value) = match action {
                UpdateAction::Set { name, value } | UpdateAction::Add { name, value } => {
                    (name, value)
                }
            };
            let attribute = self.attributes.name(name)?;
            if protected.contains(&attribute) {
                return Err(StoreError::InvalidExpression(format!(
                    "cannot update key attribute '{}'",
                    attribute
                )));
            }
            let value = self.attributes.value(value)?;

            match action {
                UpdateAction::Set { .. } => {
                    item.insert(attribute.to_string(), value.clone());
                }
                UpdateAction::Add { .. } => {
                    let sum = add_numbers(attribute, item.get(attribute), value)?;
                    item.insert(attribute.to_string(), sum);
                }
            }
        }

        Ok(item)
    }
}

impl fmt::Display for UpdateExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.expression())
    }
}

fn add_numbers(attribute: &str, current: Option<&Value>, delta: &Value) -> Result<Value, StoreError> {
    if !delta.is_number() {
        return Err(StoreError::InvalidExpression(format!(
            "ADD on '{}' needs a number, got {}",
            attribute,
            delta.type_name()
        )));
    }
    match (current, delta) {
        (None, d) => Ok(d.clone()),
        (Some(Value::Int(a)), Value::Int(b)) => a.checked_add(*b).map(Value::Int).ok_or_else(|| {
            StoreError::InvalidExpression(format!("ADD on '{}' overflows", attribute))
        }),
        (Some(c), d) => match (c.as_f64(), d.as_f64()) {
            (Some(a), Some(b)) => Ok(Value::Float(a + b)),
            _ => Err(StoreError::InvalidExpression(format!(
                "ADD on '{}' needs a numeric attribute, got {}",
                attribute,
                c.type_name()
            ))),
        },
    }
}
