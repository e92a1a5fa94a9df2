//! Lightweight schema inference over a row sample.
//!
//! This is the cheap sibling of the column profiler: per column it only
//! reports observed kinds, counts and a handful of example values, so callers
//! can see what an asset looks like before paying for full profiling.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::types::{TypeFrequency, ValueKind};
use super::value::{Sample, SampleValue};
use crate::limits::RowCap;

/// Default cap on example values per column.
pub const DEFAULT_SCHEMA_EXAMPLES: usize = 5;

/// Summary of one column in a sampled asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSummary {
    pub name: String,
    /// Observed value kinds, most frequent first
    pub types: Vec<ValueKind>,
    pub nonnull_count: usize,
    pub total_count: usize,
    /// Distinct non-null values in first-seen order
    pub example_values: Vec<SampleValue>,
}

/// Sample-level metadata of a schema summary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaMeta {
    pub row_count: usize,
    pub truncated: bool,
    #[serde(flatten)]
    pub cap: RowCap,
}

/// Per-column summaries of one asset sample.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaSummary {
    pub columns: Vec<ColumnSummary>,
    pub meta: SchemaMeta,
}

/// Infers column summaries from row samples.
#[derive(Debug, Clone)]
pub struct SchemaInferrer {
    max_examples: usize,
}

impl Default for SchemaInferrer {
    fn default() -> Self {
        Self {
            max_examples: DEFAULT_SCHEMA_EXAMPLES,
        }
    }
}

impl SchemaInferrer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_examples(mut self, max_examples: usize) -> Self {
        self.max_examples = max_examples;
        self
    }

    /// Summarizes every column of `sample`.
    pub fn infer(&self, sample: &Sample) -> SchemaSummary {
        let columns: Vec<ColumnSummary> = sample
            .columns
            .iter()
            .enumerate()
            .map(|(index, name)| self.summarize_column(name, sample.column_values(index)))
            .collect();

        debug!(
            columns = columns.len(),
            rows = sample.row_count(),
            "Inferred schema from sample"
        );

        SchemaSummary {
            columns,
            meta: SchemaMeta {
                row_count: sample.row_count(),
                truncated: sample.truncated,
                cap: RowCap::default(),
            },
        }
    }

    fn summarize_column(&self, name: &str, values: Vec<&SampleValue>) -> ColumnSummary {
        let total_count = values.len();
        let mut frequency = TypeFrequency::new();
        let mut seen: HashSet<&SampleValue> = HashSet::new();
        let mut example_values = Vec::new();

        for value in values.into_iter().filter(|v| !v.is_null()) {
            frequency.observe(value);
            if example_values.len() < self.max_examples && seen.insert(value) {
                example_values.push(value.clone());
            }
        }

        ColumnSummary {
            name: name.to_string(),
            types: frequency.ordered(),
            nonnull_count: frequency.total(),
            total_count,
            example_values,
        }
    }
}

/// Convenience wrapper around [`SchemaInferrer::infer`] with default settings.
pub fn infer_schema(sample: &Sample) -> SchemaSummary {
    SchemaInferrer::new().infer(sample)
}
