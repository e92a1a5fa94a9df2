//! # catalog-probe
//!
//! Catalog exploration and sample-based column profiling for tool-calling
//! agents.
//!
//! The crate exposes a remote data catalog (spaces and tabular assets) through
//! a small set of operations on [`tools::CatalogService`]: listing spaces and
//! assets, previewing rows, running filtered and paged queries, and computing
//! lightweight statistical profiles of columns.
//!
//! ## Layout
//!
//! - [`analyzers`]: the synchronous profiling and schema-inference engine
//! - [`catalog`]: the [`catalog::CatalogProvider`] seam with an HTTP client
//!   and an in-memory mock
//! - [`tools`]: the agent-facing operations, row caps and metadata cache
//! - [`config`], [`logging`], [`security`], [`error`]: ambient plumbing
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use catalog_probe::prelude::*;
//!
//! # async fn example() -> catalog_probe::error::Result<()> {
//! let service = CatalogService::from_config(ProbeConfig::mock())?;
//!
//! let profile = service
//!     .profile_column("MOCK_SALES", "SALES_ORDERS", "AMOUNT", 500)
//!     .await?;
//! println!("{}", serde_json::to_string_pretty(&profile)?);
//! # Ok(())
//! # }
//! ```
//!
//! Profiling works on any in-memory [`analyzers::Sample`] as well, without a
//! catalog:
//!
//! ```rust
//! use catalog_probe::analyzers::{infer_schema, Sample, SampleValue};
//!
//! let sample = Sample::single_column("STATUS", ["OPEN", "CLOSED", "OPEN"].map(SampleValue::from));
//! let schema = infer_schema(&sample);
//! assert_eq!(schema.columns[0].nonnull_count, 3);
//! ```

pub mod analyzers;
pub mod cache;
pub mod catalog;
pub mod config;
pub mod error;
pub mod limits;
pub mod logging;
pub mod prelude;
pub mod security;
pub mod tools;
