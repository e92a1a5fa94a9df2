use async_trait::async_trait;
use tracing::debug;

use super::error::CatalogResult;
use super::types::{Asset, AssetRef, ColumnInfo, RelationalQuery, Space};
use crate::analyzers::Sample;

/// Read access to a remote data catalog.
///
/// Implemented by the HTTP [`CatalogClient`](super::CatalogClient) and by the
/// in-memory [`MockCatalog`](super::MockCatalog), so the service layer and its
/// tests never depend on a concrete backend.
///
/// # Example
///
/// ```rust,ignore
/// use catalog_probe::catalog::{AssetRef, CatalogProvider, MockCatalog};
///
/// let catalog = MockCatalog::new();
/// let target = AssetRef::new("MOCK_SALES", "SALES_ORDERS");
/// let sample = catalog.fetch_sample(&target, None, 50).await?;
/// assert!(!sample.truncated);
/// ```
#[async_trait]
pub trait CatalogProvider: Send + Sync {
    /// Short name of the backend, reported by diagnostics.
    fn backend(&self) -> &'static str;

    /// Cheap reachability check.
    async fn ping(&self) -> CatalogResult<()>;

    async fn list_spaces(&self) -> CatalogResult<Vec<Space>>;

    async fn list_space_assets(&self, space_id: &str) -> CatalogResult<Vec<Asset>>;

    /// Catalog entry of one asset.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` when the space has no such asset.
    async fn get_catalog_asset(&self, target: &AssetRef) -> CatalogResult<Asset>;

    /// Column definitions from the asset's relational metadata document.
    async fn get_relational_metadata(&self, target: &AssetRef) -> CatalogResult<Vec<ColumnInfo>>;

    /// Runs a relational row request. `truncated` on the result is always false;
    /// truncation detection is done by [`fetch_page`](Self::fetch_page).
    async fn query_relational(
        &self,
        target: &AssetRef,
        query: &RelationalQuery,
    ) -> CatalogResult<Sample>;

    /// Fetches at most `query.top` rows and reports whether more existed.
    ///
    /// One extra row is requested and trimmed, so `truncated` is exact without
    /// a separate count request.
    async fn fetch_page(&self, target: &AssetRef, query: &RelationalQuery) -> CatalogResult<Sample> {
        let cap = query.top;
        let mut probe = query.clone();
        probe.top = cap.saturating_add(1);

        let mut sample = self.query_relational(target, &probe).await?;
        sample.truncate_rows(cap);

        debug!(
            asset = %target,
            rows = sample.row_count(),
            truncated = sample.truncated,
            "Fetched page"
        );
        Ok(sample)
    }

    /// Fetches up to `row_cap` rows, optionally restricted to `columns`.
    async fn fetch_sample(
        &self,
        target: &AssetRef,
        columns: Option<&[String]>,
        row_cap: usize,
    ) -> CatalogResult<Sample> {
        let mut query = RelationalQuery::new(row_cap);
        if let Some(columns) = columns {
            query.select = columns.to_vec();
        }
        self.fetch_page(target, &query).await
    }
}
