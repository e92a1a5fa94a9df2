//! Sample-based profiling and schema inference.
//!
//! Everything in this module is synchronous and operates on a [`Sample`] that
//! has already been fetched from the catalog:
//!
//! - [`types`]: value-kind classification and frequency counting
//! - [`numeric`]: quartiles, IQR fences and outlier counts
//! - [`categorical`]: ranked frequency profiles for low-cardinality columns
//! - [`role`]: identifier / measure / dimension heuristics
//! - [`profiler`]: the [`ColumnProfiler`] that combines all of the above
//! - [`schema`]: the cheaper per-column [`SchemaInferrer`]

pub mod categorical;
pub mod numeric;
pub mod profiler;
pub mod role;
pub mod schema;
pub mod types;
pub mod value;

pub use categorical::{summarize_categorical, CategoricalSummary, TopValue};
pub use numeric::{percentile, summarize_numeric, NumericSummary};
pub use profiler::{ColumnProfile, ColumnProfiler, ColumnProfilerBuilder, ProfileMeta, ProfilerConfig};
pub use role::{classify_role, RoleHint};
pub use schema::{infer_schema, ColumnSummary, SchemaInferrer, SchemaMeta, SchemaSummary};
pub use types::{classify, TypeFrequency, ValueKind};
pub use value::{Sample, SampleValue};
