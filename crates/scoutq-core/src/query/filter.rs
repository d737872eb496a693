//! Filter expression construction.
//!
//! Residual predicates become one conjunctive filter. Name placeholders are
//! `#<field>` and value placeholders `:<label>`, so the same predicates always
//! render the same expression.

use super::predicate::{Operator, Predicate};
use crate::store::{FilterExpression, FilterFunction};
use crate::value::Value;

/// Value label for the free-text query.
pub const TEXT_QUERY_LABEL: &str = "query";

/// AND together the residual predicates. `None` when there is nothing to filter.
pub fn build_filter(residual: &[Predicate]) -> Option<FilterExpression> {
    if residual.is_empty() {
        return None;
    }

    Some(residual.iter().fold(FilterExpression::all(), |filter, predicate| {
        let attribute = predicate.attribute();
        filter.with_condition(
            filter_function(predicate.operator()),
            attribute.field(),
            attribute.label(),
            predicate.value().clone(),
        )
    }))
}

/// OR together `contains(field, :query)` over each field. `None` without fields.
pub fn text_filter(fields: &[String], query: &str) -> Option<FilterExpression> {
    if fields.is_empty() {
        return None;
    }

    Some(fields.iter().fold(FilterExpression::any(), |filter, field| {
        filter.with_condition(
            FilterFunction::Contains,
            field,
            TEXT_QUERY_LABEL,
            Value::String(query.to_string()),
        )
    }))
}

fn filter_function(operator: Operator) -> FilterFunction {
    match operator {
        Operator::Equals => FilterFunction::Equals,
        Operator::Prefix => FilterFunction::Contains,
        Operator::AtLeast => FilterFunction::AtLeast,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Item;

    #[test]
    fn test_empty_residual_has_no_filter() {
        assert!(build_filter(&[]).is_none());
    }

    #[test]
    fn test_conjunctive_rendering() {
        let residual = vec![
            Predicate::sub_category("Q").unwrap(),
            Predicate::region("West").unwrap(),
            Predicate::gpa_min(3.0).unwrap(),
        ];
        let filter = build_filter(&residual).unwrap();

        assert_eq!(
            filter.expression(),
            "contains(#subCategory, :subCategory) AND #region = :region AND #gpa >= :gpaMin"
        );
        assert_eq!(filter.attributes().names().get("#gpa").map(String::as_str), Some("gpa"));
        assert_eq!(filter.attributes().values().get(":gpaMin"), Some(&Value::Float(3.0)));
    }

    #[test]
    fn test_stable_output_and_input_untouched() {
        let residual = vec![Predicate::cohort(2026).unwrap()];
        let before = residual.clone();
        assert_eq!(build_filter(&residual), build_filter(&residual));
        assert_eq!(residual, before);
    }

    #[test]
    fn test_filter_evaluates_against_items() {
        let filter = build_filter(&[
            Predicate::region("West").unwrap(),
            Predicate::height_min(70.0).unwrap(),
        ])
        .unwrap();

        let mut item = Item::new();
        item.insert("region".into(), Value::from("West"));
        item.insert("height".into(), Value::from(72));
        assert!(filter.matches(&item).unwrap());

        item.insert("height".into(), Value::from(68));
        assert!(!filter.matches(&item).unwrap());
    }

    #[test]
    fn test_text_filter() {
        let fields = vec!["firstName".to_string(), "bio".to_string()];
        let filter = text_filter(&fields, "Smith").unwrap();
        assert_eq!(
            filter.expression(),
            "contains(#firstName, :query) OR contains(#bio, :query)"
        );

        let mut item = Item::new();
        item.insert("bio".into(), Value::from("Coached by Ann Smith"));
        assert!(filter.matches(&item).unwrap());

        assert!(text_filter(&[], "Smith").is_none());
    }
}
