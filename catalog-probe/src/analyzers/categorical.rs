//! Frequency profile for low-cardinality columns.

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::value::SampleValue;

/// Columns with at most this many distinct values always get a categorical profile.
pub const MAX_CATEGORICAL_UNIQUE: usize = 50;

/// Default number of entries reported in `top_values`.
pub const DEFAULT_TOP_VALUES: usize = 20;

/// One ranked value of a categorical profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopValue {
    pub value: SampleValue,
    pub count: usize,
    /// `count / total_sampled`
    pub fraction: f64,
}

/// Frequency profile of the non-null values in a sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoricalSummary {
    /// Number of non-null values counted
    pub total_sampled: usize,
    pub unique_values: usize,
    pub top_values: Vec<TopValue>,
    /// Fraction held by the most frequent value
    pub concentration: Option<f64>,
}

/// Whether a column with `unique` distinct values out of `non_null` qualifies
/// for categorical treatment.
pub fn is_categorical(unique: usize, non_null: usize) -> bool {
    unique <= MAX_CATEGORICAL_UNIQUE || unique <= non_null / 2
}

/// Builds the categorical profile of the non-null `values`.
///
/// Values are grouped by exact equality, so `1` and `"1"` are different
/// categories. Entries are ranked by descending count and then by ascending
/// string form. Returns `None` for an empty input or when the column has too
/// many distinct values.
pub fn summarize_categorical<'a>(
    values: impl IntoIterator<Item = &'a SampleValue>,
    top_n: usize,
) -> Option<CategoricalSummary> {
    let mut counts: HashMap<&SampleValue, usize> = HashMap::new();
    let mut total = 0usize;
    for value in values.into_iter().filter(|v| !v.is_null()) {
        *counts.entry(value).or_insert(0) += 1;
        total += 1;
    }

    if total == 0 {
        return None;
    }

    let unique_values = counts.len();
    if !is_categorical(unique_values, total) {
        return None;
    }

    let mut ranked: Vec<(&SampleValue, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| tie_break(a.0, b.0)));

    let top_values: Vec<TopValue> = ranked
        .into_iter()
        .take(top_n)
        .map(|(value, count)| TopValue {
            value: value.clone(),
            count,
            fraction: count as f64 / total as f64,
        })
        .collect();
    let concentration = top_values.first().map(|top| top.fraction);

    Some(CategoricalSummary {
        total_sampled: total,
        unique_values,
        top_values,
        concentration,
    })
}

fn tie_break(a: &SampleValue, b: &SampleValue) -> Ordering {
    a.display_form()
        .cmp(&b.display_form())
        .then_with(|| a.variant_rank().cmp(&b.variant_rank()))
}
