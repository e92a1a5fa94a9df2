//! Runtime value-kind classification and type frequency counting.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::value::SampleValue;

/// Kind of a non-null sample value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    Integer,
    Float,
    Boolean,
    Text,
    Other,
}

impl ValueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueKind::Integer => "integer",
            ValueKind::Float => "float",
            ValueKind::Boolean => "boolean",
            ValueKind::Text => "text",
            ValueKind::Other => "other",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classifies a value. Nulls are never classified and return `None`.
pub fn classify(value: &SampleValue) -> Option<ValueKind> {
    match value {
        SampleValue::Null => None,
        SampleValue::Integer(_) => Some(ValueKind::Integer),
        SampleValue::Float(_) => Some(ValueKind::Float),
        SampleValue::Boolean(_) => Some(ValueKind::Boolean),
        SampleValue::Text(_) => Some(ValueKind::Text),
        SampleValue::Other(_) => Some(ValueKind::Other),
    }
}

/// Occurrence counts per value kind, remembering first-seen order.
#[derive(Debug, Clone, Default)]
pub struct TypeFrequency {
    // (kind, count) in first-seen order; at most five entries
    counts: Vec<(ValueKind, usize)>,
}

impl TypeFrequency {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts the kinds of all non-null values.
    pub fn from_values<'a>(values: impl IntoIterator<Item = &'a SampleValue>) -> Self {
        let mut frequency = Self::new();
        for value in values {
            frequency.observe(value);
        }
        frequency
    }

    /// Records one value; nulls are ignored.
    pub fn observe(&mut self, value: &SampleValue) {
        let Some(kind) = classify(value) else {
            return;
        };
        match self.counts.iter_mut().find(|(k, _)| *k == kind) {
            Some((_, count)) => *count += 1,
            None => self.counts.push((kind, 1)),
        }
    }

    pub fn total(&self) -> usize {
        self.counts.iter().map(|(_, c)| c).sum()
    }

    /// Observed kinds by descending count; ties keep first-seen order.
    pub fn ordered(&self) -> Vec<ValueKind> {
        let mut counts = self.counts.clone();
        // stable sort keeps insertion order among equal counts
        counts.sort_by(|a, b| b.1.cmp(&a.1));
        counts.into_iter().map(|(kind, _)| kind).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_is_total() {
        assert_eq!(classify(&SampleValue::Null), None);
        assert_eq!(classify(&SampleValue::Integer(1)), Some(ValueKind::Integer));
        assert_eq!(classify(&SampleValue::Float(1.0)), Some(ValueKind::Float));
        assert_eq!(classify(&SampleValue::Boolean(false)), Some(ValueKind::Boolean));
        assert_eq!(classify(&SampleValue::Text("a".into())), Some(ValueKind::Text));
        assert_eq!(
            classify(&SampleValue::Other(serde_json::json!({"a": 1}))),
            Some(ValueKind::Other)
        );
    }

    #[test]
    fn test_ordered_by_descending_count() {
        let values = vec![
            SampleValue::Text("a".into()),
            SampleValue::Integer(1),
            SampleValue::Integer(2),
            SampleValue::Null,
        ];
        let freq = TypeFrequency::from_values(&values);
        assert_eq!(freq.ordered(), vec![ValueKind::Integer, ValueKind::Text]);
        assert_eq!(freq.total(), 3);
    }

    #[test]
    fn test_ties_keep_first_seen_order() {
        let values = vec![
            SampleValue::Float(1.5),
            SampleValue::Boolean(true),
            SampleValue::Text("x".into()),
            SampleValue::Text("y".into()),
            SampleValue::Boolean(false),
            SampleValue::Float(2.5),
        ];
        let freq = TypeFrequency::from_values(&values);
        assert_eq!(
            freq.ordered(),
            vec![ValueKind::Float, ValueKind::Boolean, ValueKind::Text]
        );
    }

    #[test]
    fn test_all_null_is_empty() {
        let values = vec![SampleValue::Null, SampleValue::Null];
        let freq = TypeFrequency::from_values(&values);
        assert_eq!(freq.total(), 0);
        assert!(freq.ordered().is_empty());
    }

    #[test]
    fn test_kind_serializes_lowercase() {
        assert_eq!(
            serde_json::to_value(ValueKind::Integer).unwrap(),
            serde_json::json!("integer")
        );
        assert_eq!(ValueKind::Text.to_string(), "text");
    }
}
