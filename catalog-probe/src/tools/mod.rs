//! Agent-facing catalog operations.
//!
//! [`CatalogService`] owns the catalog provider, the metadata cache and the
//! analyzers. Every operation validates its arguments, talks to the provider
//! and returns a serializable response; row-returning operations clamp the
//! requested row count to the configured cap and report it in their metadata.

use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;
use tracing::info;

use crate::analyzers::{ColumnProfiler, SchemaInferrer};
use crate::cache::{CacheStats, TtlCache};
use crate::catalog::{Asset, CatalogClient, CatalogProvider, MockCatalog, Space};
use crate::config::ProbeConfig;
use crate::error::Result;
use crate::limits::RowCap;
use crate::logging::LogConfig;

mod catalog;
mod data;
mod diagnostics;
mod profile;

pub use catalog::{
    AssetBrief, AssetMetadata, AssetsResponse, ColumnMatch, ColumnSearchResponse, ColumnSource,
    ColumnsResponse, ScanStats, SearchResponse, SpaceSummary, SpacesResponse,
};
pub use data::RowsResponse;
pub use diagnostics::{
    CacheSettings, CheckResult, CurrentUser, Diagnostics, RowCaps, TenantInfo, UserIdentity,
};
pub use profile::{ProfileResponse, SchemaResponse};

pub const DEFAULT_PREVIEW_TOP: usize = 20;
pub const DEFAULT_QUERY_TOP: usize = 100;
pub const DEFAULT_SCHEMA_TOP: usize = 50;
pub const DEFAULT_PROFILE_TOP: usize = 1000;
pub const DEFAULT_SEARCH_LIMIT: usize = 50;
pub const DEFAULT_SUMMARY_ASSETS: usize = 20;
pub const DEFAULT_MAX_SPACES: usize = 20;
pub const DEFAULT_MAX_ASSETS_PER_SPACE: usize = 50;

/// Metadata cached between calls.
#[derive(Debug, Clone)]
enum Cached {
    Spaces(Vec<Space>),
    Assets(Vec<Asset>),
    Asset(Asset),
    Columns(ColumnsResponse),
}

/// Row-request metadata echoed by row-returning operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowMeta {
    /// Row count actually requested from the catalog
    pub top: usize,
    #[serde(skip_serializing_if = "is_zero")]
    pub skip: usize,
    #[serde(flatten)]
    pub cap: RowCap,
}

impl RowMeta {
    fn new(cap: RowCap) -> Self {
        Self {
            top: cap.effective_top,
            skip: 0,
            cap,
        }
    }
}

fn is_zero(value: &usize) -> bool {
    *value == 0
}

/// Request-dispatch layer over a catalog provider.
pub struct CatalogService {
    provider: Arc<dyn CatalogProvider>,
    config: ProbeConfig,
    cache: Mutex<TtlCache<Cached>>,
    profiler: ColumnProfiler,
    schema: SchemaInferrer,
    log: LogConfig,
}

impl std::fmt::Debug for CatalogService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogService")
            .field("backend", &self.provider.backend())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl CatalogService {
    /// Creates a service over an explicit provider.
    pub fn new(provider: Arc<dyn CatalogProvider>, config: ProbeConfig) -> Self {
        let cache = TtlCache::new(config.cache_ttl(), config.cache_max_entries());
        Self {
            provider,
            config,
            cache: Mutex::new(cache),
            profiler: ColumnProfiler::new(),
            schema: SchemaInferrer::new(),
            log: LogConfig::default(),
        }
    }

    /// Creates a service with the backend selected by configuration:
    /// the mock catalog in mock mode, the HTTP client otherwise.
    ///
    /// # Errors
    ///
    /// Fails when the HTTP client cannot be configured.
    pub fn from_config(config: ProbeConfig) -> Result<Self> {
        let provider: Arc<dyn CatalogProvider> = if config.mock_mode() {
            info!("Using mock catalog");
            Arc::new(MockCatalog::new())
        } else {
            Arc::new(CatalogClient::new(&config)?)
        };
        Ok(Self::new(provider, config))
    }

    pub fn with_profiler(mut self, profiler: ColumnProfiler) -> Self {
        self.profiler = profiler;
        self
    }

    pub fn with_log_config(mut self, log: LogConfig) -> Self {
        self.log = log;
        self
    }

    pub fn config(&self) -> &ProbeConfig {
        &self.config
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.lock_cache().stats()
    }

    /// Drops all cached metadata.
    pub fn clear_cache(&self) {
        self.lock_cache().clear();
    }

    fn lock_cache(&self) -> MutexGuard<'_, TtlCache<Cached>> {
        // the cache holds plain data, so a poisoned lock is still consistent
        self.cache.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn cache_get(&self, key: &str) -> Option<Cached> {
        self.lock_cache().get(key)
    }

    fn cache_set(&self, key: String, value: Cached) {
        self.lock_cache().set(key, value);
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    pub fn mock_service() -> (Arc<MockCatalog>, CatalogService) {
        let catalog = Arc::new(MockCatalog::new());
        let service = CatalogService::new(catalog.clone(), ProbeConfig::mock());
        (catalog, service)
    }
}
