//! Heuristic semantic role of a column.
//!
//! The hint combines name tokens, numeric-ness and cardinality. It is a
//! best-effort guess meant to steer an agent, never an authoritative
//! classification.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Name fragments that mark a column as a likely identifier.
const IDENTIFIER_TOKENS: [&str; 4] = ["id", "_id", "key", "_key"];

/// Semantic role guessed for a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoleHint {
    /// Near-unique values under an id/key-like name
    Identifier,
    /// Numeric values with high cardinality
    Measure,
    /// Low-cardinality grouping attribute
    Dimension,
}

impl fmt::Display for RoleHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RoleHint::Identifier => "identifier",
            RoleHint::Measure => "measure",
            RoleHint::Dimension => "dimension",
        };
        f.write_str(name)
    }
}

/// Guesses the role of a column from its sample statistics.
///
/// Rules are applied in order; the first match wins:
/// 1. id/key-like name and `distinct >= 90%` of non-null values: identifier
/// 2. numeric and `distinct > max(5, 50%)`: measure
/// 3. `distinct <= max(50, 70%)`: dimension
///
/// No hint is produced for columns without non-null values.
pub fn classify_role(
    column_name: &str,
    non_null_count: usize,
    distinct_count: usize,
    is_numeric: bool,
) -> Option<RoleHint> {
    if non_null_count == 0 {
        return None;
    }

    let non_null = non_null_count as f64;
    let distinct = distinct_count as f64;
    let name = column_name.to_lowercase();

    if IDENTIFIER_TOKENS.iter().any(|t| name.contains(t)) && distinct >= 0.9 * non_null {
        return Some(RoleHint::Identifier);
    }

    if is_numeric && distinct > f64::max(5.0, 0.5 * non_null) {
        return Some(RoleHint::Measure);
    }

    if distinct <= f64::max(50.0, 0.7 * non_null) {
        return Some(RoleHint::Dimension);
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_by_name_and_cardinality() {
        assert_eq!(
            classify_role("CUSTOMER_ID", 10, 10, true),
            Some(RoleHint::Identifier)
        );
        assert_eq!(
            classify_role("order_key", 100, 95, false),
            Some(RoleHint::Identifier)
        );
    }

    #[test]
    fn test_id_name_with_repeats_is_not_identifier() {
        // 5 distinct out of 10 fails the 90% rule and falls through
        assert_eq!(
            classify_role("CUSTOMER_ID", 10, 5, true),
            Some(RoleHint::Dimension)
        );
    }

    #[test]
    fn test_measure() {
        assert_eq!(classify_role("AMOUNT", 10, 6, true), Some(RoleHint::Measure));
        // exactly at the threshold is not enough
        assert_eq!(classify_role("AMOUNT", 10, 5, true), Some(RoleHint::Dimension));
    }

    #[test]
    fn test_dimension_for_low_cardinality_text() {
        assert_eq!(classify_role("STATUS", 10, 3, false), Some(RoleHint::Dimension));
    }

    #[test]
    fn test_high_cardinality_text_has_no_hint() {
        assert_eq!(classify_role("COMMENT", 100, 90, false), None);
    }

    #[test]
    fn test_no_values_no_hint() {
        assert_eq!(classify_role("CUSTOMER_ID", 0, 0, false), None);
    }

    #[test]
    fn test_serialized_names() {
        assert_eq!(
            serde_json::to_value(RoleHint::Identifier).unwrap(),
            serde_json::json!("identifier")
        );
        assert_eq!(RoleHint::Measure.to_string(), "measure");
    }
}
