use std::collections::BTreeMap;

use futures::future::join_all;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use super::{CatalogService, Cached};
use crate::catalog::{Asset, AssetRef, ColumnInfo, Space};
use crate::error::{ProbeError, Result};
use crate::security::InputSecurity;

#[derive(Debug, Clone, Serialize)]
pub struct SpacesResponse {
    pub count: usize,
    pub spaces: Vec<Space>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AssetsResponse {
    pub space_id: String,
    pub count: usize,
    pub assets: Vec<Asset>,
}

/// Identity fields of an asset, without the raw payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssetBrief {
    pub space_id: String,
    pub id: String,
    pub name: String,
    pub asset_type: String,
}

impl From<&Asset> for AssetBrief {
    fn from(asset: &Asset) -> Self {
        Self {
            space_id: asset.space_id.clone(),
            id: asset.id.clone(),
            name: asset.name.clone(),
            asset_type: asset.asset_type.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SpaceSummary {
    pub space_id: String,
    pub total_assets: usize,
    /// Asset count per asset type
    pub asset_types: BTreeMap<String, usize>,
    pub assets: Vec<AssetBrief>,
    /// More assets exist than are listed
    pub truncated: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub space_id: Option<String>,
    pub count: usize,
    pub matches: Vec<AssetBrief>,
    pub truncated: bool,
    pub spaces_scanned: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct AssetMetadata {
    pub space_id: String,
    pub asset_id: String,
    pub name: String,
    pub asset_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub supports_relational: bool,
    pub supports_analytical: bool,
    pub raw: Value,
}

/// Where a column list came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnSource {
    /// The asset's relational metadata document
    RelationalMetadata,
    /// Headers of a one-row preview; types are unknown
    SampleInference,
}

#[derive(Debug, Clone, Serialize)]
pub struct ColumnsResponse {
    pub space_id: String,
    pub asset_id: String,
    pub source: ColumnSource,
    pub count: usize,
    pub columns: Vec<ColumnInfo>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ColumnMatch {
    pub space_id: String,
    pub asset_id: String,
    pub asset_name: String,
    pub matched_columns: Vec<String>,
    pub source: ColumnSource,
}

/// Bookkeeping of a multi-asset column scan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanStats {
    pub spaces_scanned: usize,
    pub assets_scanned: usize,
    /// Assets without relational consumption, not inspected
    pub assets_skipped: usize,
    /// Spaces or assets whose listing failed
    pub errors: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ColumnSearchResponse {
    pub column: String,
    pub count: usize,
    pub matches: Vec<ColumnMatch>,
    /// The result limit stopped the scan early
    pub truncated: bool,
    pub scan: ScanStats,
}

impl CatalogService {
    /// Lists all spaces visible to the configured credentials.
    #[instrument(skip(self))]
    pub async fn list_spaces(&self) -> Result<SpacesResponse> {
        let spaces = self.cached_spaces().await?;
        Ok(SpacesResponse {
            count: spaces.len(),
            spaces,
        })
    }

    /// Lists the assets of one space.
    #[instrument(skip(self))]
    pub async fn list_assets(&self, space_id: &str) -> Result<AssetsResponse> {
        InputSecurity::validate_identifier(space_id, "space")?;
        let assets = self.cached_assets(space_id).await?;
        Ok(AssetsResponse {
            space_id: space_id.to_string(),
            count: assets.len(),
            assets,
        })
    }

    /// Counts a space's assets by type and lists the first `max_assets`.
    #[instrument(skip(self))]
    pub async fn space_summary(&self, space_id: &str, max_assets: usize) -> Result<SpaceSummary> {
        InputSecurity::validate_identifier(space_id, "space")?;
        let assets = self.cached_assets(space_id).await?;

        let mut asset_types = BTreeMap::new();
        for asset in &assets {
            *asset_types.entry(asset.asset_type.clone()).or_insert(0) += 1;
        }

        Ok(SpaceSummary {
            space_id: space_id.to_string(),
            total_assets: assets.len(),
            asset_types,
            assets: assets.iter().take(max_assets).map(AssetBrief::from).collect(),
            truncated: assets.len() > max_assets,
        })
    }

    /// Finds assets whose id, name or description contains `query`.
    ///
    /// Without a space, every visible space is searched. Spaces whose listing
    /// fails are skipped with a warning.
    #[instrument(skip(self))]
    pub async fn search_assets(
        &self,
        query: &str,
        space_id: Option<&str>,
        limit: usize,
    ) -> Result<SearchResponse> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ProbeError::invalid_argument("search query cannot be empty"));
        }

        let space_ids: Vec<String> = match space_id {
            Some(space) => {
                InputSecurity::validate_identifier(space, "space")?;
                vec![space.to_string()]
            }
            None => self
                .cached_spaces()
                .await?
                .into_iter()
                .map(|s| s.id)
                .collect(),
        };

        let listings = join_all(space_ids.iter().map(|s| self.cached_assets(s))).await;

        let mut matches = Vec::new();
        let mut spaces_scanned = 0;
        for (space, listing) in space_ids.iter().zip(listings) {
            match listing {
                Ok(assets) => {
                    spaces_scanned += 1;
                    matches.extend(assets.iter().filter(|a| a.matches(query)).map(AssetBrief::from));
                }
                Err(e) if space_id.is_some() => return Err(e),
                Err(e) => warn!(space = %space, error = %e, "Skipping space in asset search"),
            }
        }

        let truncated = matches.len() > limit;
        matches.truncate(limit);

        Ok(SearchResponse {
            query: query.to_string(),
            space_id: space_id.map(str::to_string),
            count: matches.len(),
            matches,
            truncated,
            spaces_scanned,
        })
    }

    /// Catalog entry of one asset with its consumption capabilities.
    #[instrument(skip(self))]
    pub async fn get_asset_metadata(&self, space_id: &str, asset_name: &str) -> Result<AssetMetadata> {
        let target = AssetRef::new(space_id, asset_name);
        target.validate()?;
        let asset = self.cached_asset(&target).await?;

        Ok(AssetMetadata {
            space_id: asset.space_id.clone(),
            asset_id: asset.id.clone(),
            name: asset.name.clone(),
            asset_type: asset.asset_type.clone(),
            description: asset.description.clone(),
            supports_relational: asset.supports_relational(),
            supports_analytical: asset.supports_analytical(),
            raw: asset.raw,
        })
    }

    /// Column list of an asset.
    ///
    /// The relational metadata document is preferred. When it cannot be read
    /// the headers of a one-row preview are returned with unknown types.
    #[instrument(skip(self))]
    pub async fn list_columns(&self, space_id: &str, asset_name: &str) -> Result<ColumnsResponse> {
        let target = AssetRef::new(space_id, asset_name);
        target.validate()?;

        let key = format!("columns:{target}");
        if let Some(Cached::Columns(columns)) = self.cache_get(&key) {
            return Ok(columns);
        }

        let (source, columns) = match self.provider.get_relational_metadata(&target).await {
            Ok(columns) => (ColumnSource::RelationalMetadata, columns),
            Err(e) => {
                debug!(asset = %target, error = %e, "Metadata unavailable, inferring columns from a preview row");
                let sample = self.provider.fetch_sample(&target, None, 1).await?;
                let columns = sample
                    .columns
                    .into_iter()
                    .map(|name| ColumnInfo::new(name, "unknown"))
                    .collect();
                (ColumnSource::SampleInference, columns)
            }
        };

        let response = ColumnsResponse {
            space_id: target.space_id.clone(),
            asset_id: target.asset_name.clone(),
            source,
            count: columns.len(),
            columns,
        };
        self.cache_set(key, Cached::Columns(response.clone()));
        Ok(response)
    }

    /// Scans assets for columns whose name contains `column`, ignoring case.
    ///
    /// At most `max_spaces` spaces and `max_assets_per_space` assets per space
    /// are inspected; the scan stops once `limit` matches are found.
    #[instrument(skip(self))]
    pub async fn find_assets_by_column(
        &self,
        column: &str,
        space_id: Option<&str>,
        limit: usize,
        max_spaces: usize,
        max_assets_per_space: usize,
    ) -> Result<ColumnSearchResponse> {
        let needle = column.trim().to_lowercase();
        if needle.is_empty() {
            return Err(ProbeError::invalid_argument("column name cannot be empty"));
        }
        if limit == 0 {
            return Err(ProbeError::invalid_argument("limit must be at least 1"));
        }

        let space_ids: Vec<String> = match space_id {
            Some(space) => {
                InputSecurity::validate_identifier(space, "space")?;
                vec![space.to_string()]
            }
            None => self
                .cached_spaces()
                .await?
                .into_iter()
                .take(max_spaces)
                .map(|s| s.id)
                .collect(),
        };

        let mut scan = ScanStats::default();
        let mut matches = Vec::new();
        let mut truncated = false;

        'spaces: for space in &space_ids {
            let assets = match self.cached_assets(space).await {
                Ok(assets) => assets,
                Err(e) if space_id.is_some() => return Err(e),
                Err(e) => {
                    warn!(space = %space, error = %e, "Skipping space in column search");
                    scan.errors += 1;
                    continue;
                }
            };
            scan.spaces_scanned += 1;

            for asset in assets.iter().take(max_assets_per_space) {
                if !asset.supports_relational() {
                    scan.assets_skipped += 1;
                    continue;
                }
                if matches.len() >= limit {
                    truncated = true;
                    break 'spaces;
                }

                scan.assets_scanned += 1;
                let columns = match self.list_columns(space, &asset.id).await {
                    Ok(columns) => columns,
                    Err(e) => {
                        warn!(space = %space, asset = %asset.id, error = %e, "Skipping asset in column search");
                        scan.errors += 1;
                        continue;
                    }
                };

                let matched_columns: Vec<String> = columns
                    .columns
                    .iter()
                    .filter(|c| c.name.to_lowercase().contains(&needle))
                    .map(|c| c.name.clone())
                    .collect();

                if !matched_columns.is_empty() {
                    matches.push(ColumnMatch {
                        space_id: space.clone(),
                        asset_id: asset.id.clone(),
                        asset_name: asset.name.clone(),
                        matched_columns,
                        source: columns.source,
                    });
                }
            }
        }

        Ok(ColumnSearchResponse {
            column: column.trim().to_string(),
            count: matches.len(),
            matches,
            truncated,
            scan,
        })
    }

    pub(super) async fn cached_spaces(&self) -> Result<Vec<Space>> {
        if let Some(Cached::Spaces(spaces)) = self.cache_get("spaces") {
            return Ok(spaces);
        }
        let spaces = self.provider.list_spaces().await?;
        self.cache_set("spaces".to_string(), Cached::Spaces(spaces.clone()));
        Ok(spaces)
    }

    pub(super) async fn cached_assets(&self, space_id: &str) -> Result<Vec<Asset>> {
        let key = format!("assets:{space_id}");
        if let Some(Cached::Assets(assets)) = self.cache_get(&key) {
            return Ok(assets);
        }
        let assets = self.provider.list_space_assets(space_id).await?;
        self.cache_set(key, Cached::Assets(assets.clone()));
        Ok(assets)
    }

    async fn cached_asset(&self, target: &AssetRef) -> Result<Asset> {
        let key = format!("asset:{target}");
        if let Some(Cached::Asset(asset)) = self.cache_get(&key) {
            return Ok(asset);
        }
        let asset = self.provider.get_catalog_asset(target).await?;
        self.cache_set(key, Cached::Asset(asset.clone()));
        Ok(asset)
    }
}
