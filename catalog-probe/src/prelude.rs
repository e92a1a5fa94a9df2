//! Prelude for commonly used types and traits in catalog-probe.

pub use crate::analyzers::{
    ColumnProfile, ColumnProfiler, RoleHint, Sample, SampleValue, SchemaInferrer, SchemaSummary,
};
pub use crate::catalog::{AssetRef, CatalogError, CatalogProvider, MockCatalog, RelationalQuery};
pub use crate::config::ProbeConfig;
pub use crate::error::{ProbeError, Result};
pub use crate::logging::LogConfig;
pub use crate::tools::CatalogService;
