use serde::Serialize;
use tracing::instrument;

use super::{CatalogService, RowMeta};
use crate::analyzers::{Sample, SampleValue};
use crate::catalog::{AssetRef, RelationalQuery};
use crate::error::Result;
use crate::limits::RowCap;
use crate::log_catalog_op;
use crate::logging::truncate_field;

/// Rows returned by preview and query operations.
#[derive(Debug, Clone, Serialize)]
pub struct RowsResponse {
    pub space_id: String,
    pub asset_id: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<SampleValue>>,
    pub row_count: usize,
    /// More rows matched than were returned
    pub truncated: bool,
    pub meta: RowMeta,
}

impl RowsResponse {
    fn new(target: &AssetRef, sample: Sample, meta: RowMeta) -> Self {
        Self {
            space_id: target.space_id.clone(),
            asset_id: target.asset_name.clone(),
            row_count: sample.row_count(),
            truncated: sample.truncated,
            columns: sample.columns,
            rows: sample.rows,
            meta,
        }
    }
}

impl CatalogService {
    /// First rows of an asset, capped by the preview row limit.
    #[instrument(skip(self))]
    pub async fn preview_asset(&self, space_id: &str, asset_name: &str, top: usize) -> Result<RowsResponse> {
        let target = AssetRef::new(space_id, asset_name);
        target.validate()?;
        let cap = RowCap::resolve(top, self.config.max_rows_preview())?;

        let sample = self
            .provider
            .fetch_page(&target, &RelationalQuery::new(cap.effective_top))
            .await?;

        Ok(RowsResponse::new(&target, sample, RowMeta::new(cap)))
    }

    /// Filtered, projected and paged rows of an asset.
    ///
    /// `query.top` is clamped to the query row limit; filter and order-by
    /// expressions are passed to the catalog unchanged.
    #[instrument(skip(self, query), fields(top = query.top, skip = query.skip))]
    pub async fn query_relational(
        &self,
        space_id: &str,
        asset_name: &str,
        query: RelationalQuery,
    ) -> Result<RowsResponse> {
        let target = AssetRef::new(space_id, asset_name);
        target.validate()?;
        query.validate()?;
        let cap = RowCap::resolve(query.top, self.config.max_rows_query())?;

        if let Some(filter) = &query.filter {
            log_catalog_op!(
                self.log,
                asset = %target,
                filter = %truncate_field(filter, self.log.max_field_length),
                "Relational query"
            );
        }

        let mut capped = query;
        capped.top = cap.effective_top;
        let sample = self.provider.fetch_page(&target, &capped).await?;

        let meta = RowMeta {
            top: cap.effective_top,
            skip: capped.skip,
            cap,
        };
        Ok(RowsResponse::new(&target, sample, meta))
    }
}
