//! Sample-based column profiling.
//!
//! The [`ColumnProfiler`] turns the values of one sampled column into a
//! [`ColumnProfile`] in a single orchestration step:
//!
//! - split nulls from non-null values and count both
//! - classify non-null values and order the observed kinds by frequency
//! - collect distinct example values in first-seen order
//! - summarize the numeric-coercible subset (quartiles, IQR fences)
//! - summarize frequencies for low-cardinality columns
//! - guess a semantic role from name and cardinality
//!
//! Profiling is pure CPU work over an in-memory sample. It never fails: empty
//! or all-null input yields zero counts and absent summaries.
//!
//! # Example
//!
//! ```rust
//! use catalog_probe::analyzers::{ColumnProfiler, RoleHint, SampleValue};
//!
//! let values: Vec<SampleValue> = (1..=10).map(SampleValue::Integer).collect();
//! let profile = ColumnProfiler::new().profile("CUSTOMER_ID", &values);
//!
//! assert_eq!(profile.non_null_count, 10);
//! assert_eq!(profile.role_hint, Some(RoleHint::Identifier));
//! ```

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use super::categorical::{summarize_categorical, CategoricalSummary, DEFAULT_TOP_VALUES};
use super::numeric::{summarize_numeric, NumericSummary};
use super::role::{classify_role, RoleHint};
use super::types::{TypeFrequency, ValueKind};
use super::value::{Sample, SampleValue};
use crate::limits::RowCap;

/// Default cap on distinct example values in a profile.
pub const DEFAULT_MAX_EXAMPLES: usize = 20;

/// Configuration for the column profiler
#[derive(Debug, Clone)]
pub struct ProfilerConfig {
    /// Maximum number of distinct example values reported
    pub max_examples: usize,
    /// Maximum number of ranked entries in the categorical summary
    pub top_values: usize,
}

impl Default for ProfilerConfig {
    fn default() -> Self {
        Self {
            max_examples: DEFAULT_MAX_EXAMPLES,
            top_values: DEFAULT_TOP_VALUES,
        }
    }
}

/// Request metadata attached to a profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileMeta {
    /// Rows in the sample the profile was computed from
    pub sample_rows: usize,
    pub truncated: bool,
    #[serde(flatten)]
    pub cap: RowCap,
}

/// Complete column profile result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnProfile {
    pub column: String,
    /// Observed value kinds, most frequent first
    pub types: Vec<ValueKind>,
    pub total_count: usize,
    pub null_count: usize,
    pub non_null_count: usize,
    /// Distinct non-null values in the sample
    pub distinct_sampled: usize,
    pub example_values: Vec<SampleValue>,
    pub numeric_summary: Option<NumericSummary>,
    pub categorical_summary: Option<CategoricalSummary>,
    pub role_hint: Option<RoleHint>,
    pub meta: ProfileMeta,
}

/// Builder for ColumnProfiler
pub struct ColumnProfilerBuilder {
    config: ProfilerConfig,
}

impl ColumnProfilerBuilder {
    /// Set the maximum number of example values
    pub fn max_examples(mut self, max_examples: usize) -> Self {
        self.config.max_examples = max_examples;
        self
    }

    /// Set the number of ranked categorical entries
    pub fn top_values(mut self, top_values: usize) -> Self {
        self.config.top_values = top_values;
        self
    }

    /// Build the ColumnProfiler
    pub fn build(self) -> ColumnProfiler {
        ColumnProfiler {
            config: self.config,
        }
    }
}

/// Profiles sampled columns.
#[derive(Debug, Clone, Default)]
pub struct ColumnProfiler {
    config: ProfilerConfig,
}

impl ColumnProfiler {
    /// Create a new builder for ColumnProfiler
    pub fn builder() -> ColumnProfilerBuilder {
        ColumnProfilerBuilder {
            config: ProfilerConfig::default(),
        }
    }

    /// Create a ColumnProfiler with default configuration
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn config(&self) -> &ProfilerConfig {
        &self.config
    }

    /// Profiles an ordered list of values for `column`.
    pub fn profile(&self, column: &str, values: &[SampleValue]) -> ColumnProfile {
        let refs: Vec<&SampleValue> = values.iter().collect();
        self.profile_values(column, &refs)
    }

    /// Profiles one column of a sample.
    ///
    /// A column that the sample does not contain is profiled as empty.
    #[instrument(skip(self, sample), fields(rows = sample.row_count()))]
    pub fn profile_sample(&self, sample: &Sample, column: &str) -> ColumnProfile {
        let values = match sample.column_index(column) {
            Some(index) => sample.column_values(index),
            None => {
                if !sample.columns.is_empty() {
                    warn!(column, "Column not present in sample; profiling as empty");
                }
                Vec::new()
            }
        };

        let mut profile = self.profile_values(column, &values);
        profile.meta.sample_rows = sample.row_count();
        profile.meta.truncated = sample.truncated;
        profile
    }

    /// Profiles every column of a sample, in column order.
    pub fn profile_columns(&self, sample: &Sample) -> Vec<ColumnProfile> {
        sample
            .columns
            .iter()
            .map(|column| self.profile_sample(sample, column))
            .collect()
    }

    fn profile_values(&self, column: &str, values: &[&SampleValue]) -> ColumnProfile {
        let total_count = values.len();
        let non_null: Vec<&SampleValue> = values.iter().copied().filter(|v| !v.is_null()).collect();
        let non_null_count = non_null.len();
        let null_count = total_count - non_null_count;

        let types = TypeFrequency::from_values(non_null.iter().copied()).ordered();

        let mut seen: HashSet<&SampleValue> = HashSet::with_capacity(non_null_count);
        let mut example_values = Vec::new();
        for value in &non_null {
            if seen.insert(*value) && example_values.len() < self.config.max_examples {
                example_values.push((*value).clone());
            }
        }
        let distinct_sampled = seen.len();

        let numeric_summary: Option<NumericSummary> = summarize_numeric(non_null.iter().copied());
        let categorical_summary =
            summarize_categorical(non_null.iter().copied(), self.config.top_values);
        let role_hint = classify_role(
            column,
            non_null_count,
            distinct_sampled,
            numeric_summary.is_some(),
        );

        debug!(
            column,
            total_count,
            null_count,
            distinct_sampled,
            role = ?role_hint,
            "Profiled column"
        );

        ColumnProfile {
            column: column.to_string(),
            types,
            total_count,
            null_count,
            non_null_count,
            distinct_sampled,
            example_values,
            numeric_summary,
            categorical_summary,
            role_hint,
            meta: ProfileMeta {
                sample_rows: total_count,
                ..ProfileMeta::default()
            },
        }
    }
}
