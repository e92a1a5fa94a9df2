use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::json;
use tracing::warn;

use super::error::{CatalogError, CatalogResult};
use super::provider::CatalogProvider;
use super::types::{Asset, AssetRef, ColumnInfo, RelationalQuery, Space};
use crate::analyzers::{Sample, SampleValue};

const STATUSES: [&str; 4] = ["OPEN", "SHIPPED", "CLOSED", "CANCELLED"];
const REGIONS: [&str; 4] = ["EMEA", "APJ", "NA", "LATAM"];
const COUNTRIES: [&str; 5] = ["DE", "US", "FR", "JP", "BR"];
const DEPARTMENTS: [&str; 5] = ["Finance", "Sales", "Engineering", "Support", "Marketing"];

#[derive(Debug, Clone)]
struct MockAsset {
    asset: Asset,
    columns: Vec<ColumnInfo>,
    rows: Option<Sample>,
}

#[derive(Debug, Clone)]
struct MockSpace {
    space: Space,
    assets: Vec<MockAsset>,
}

/// Deterministic in-memory catalog.
///
/// Serves two demo spaces by default. Row requests honour `$select`, `$skip`
/// and `$top`; filter and order-by expressions are ignored.
#[derive(Debug)]
pub struct MockCatalog {
    spaces: Vec<MockSpace>,
    unreachable: AtomicBool,
    metadata_calls: AtomicUsize,
    row_calls: AtomicUsize,
}

impl Default for MockCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl MockCatalog {
    /// Catalog with the demo spaces `MOCK_SALES` and `MOCK_HR`.
    pub fn new() -> Self {
        Self::empty()
            .with_space(
                Space::new("MOCK_SALES", "Mock Sales")
                    .with_description("Demo sales space with orders and customers"),
            )
            .with_asset(
                relational("MOCK_SALES", "SALES_ORDERS", "View")
                    .with_name("Sales Orders")
                    .with_description("Order headers with status, region and amount"),
                vec![
                    ColumnInfo::new("ORDER_ID", "Edm.Int64").key(),
                    ColumnInfo::new("CUSTOMER_ID", "Edm.Int64"),
                    ColumnInfo::new("STATUS", "Edm.String"),
                    ColumnInfo::new("AMOUNT", "Edm.Decimal"),
                    ColumnInfo::new("REGION", "Edm.String"),
                    ColumnInfo::new("ORDER_DATE", "Edm.Date"),
                ],
                sales_orders(),
            )
            .with_asset(
                relational("MOCK_SALES", "CUSTOMERS", "Table")
                    .with_name("Customers")
                    .with_description("Customer master data"),
                Vec::new(),
                customers(),
            )
            .with_unqueryable_asset(
                Asset::new("MOCK_SALES", "REVENUE_CUBE", "AnalyticalModel")
                    .with_name("Revenue Cube")
                    .with_description("Revenue by region and quarter")
                    .with_raw(json!({
                        "supportsRelationalConsumption": false,
                        "supportsAnalyticalQueries": true
                    })),
            )
            .with_space(Space::new("MOCK_HR", "Mock HR").with_description("Demo HR space"))
            .with_asset(
                relational("MOCK_HR", "EMPLOYEES", "Table")
                    .with_name("Employees")
                    .with_description("Employee master data with department and salary"),
                vec![
                    ColumnInfo::new("EMPLOYEE_ID", "Edm.Int64").key(),
                    ColumnInfo::new("NAME", "Edm.String"),
                    ColumnInfo::new("DEPARTMENT", "Edm.String"),
                    ColumnInfo::new("SALARY", "Edm.Double"),
                    ColumnInfo::new("MANAGER_ID", "Edm.Int64"),
                ],
                employees(),
            )
    }

    /// Catalog without any space.
    pub fn empty() -> Self {
        Self {
            spaces: Vec::new(),
            unreachable: AtomicBool::new(false),
            metadata_calls: AtomicUsize::new(0),
            row_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_space(mut self, space: Space) -> Self {
        self.spaces.push(MockSpace {
            space,
            assets: Vec::new(),
        });
        self
    }

    /// Adds a queryable asset. Its space is created when missing.
    ///
    /// An empty `columns` list makes metadata requests fail, which exercises
    /// the sample-inference fallback.
    pub fn with_asset(mut self, asset: Asset, columns: Vec<ColumnInfo>, rows: Sample) -> Self {
        self.space_entry(&asset.space_id).assets.push(MockAsset {
            asset,
            columns,
            rows: Some(rows),
        });
        self
    }

    /// Adds an asset that has no relational representation.
    pub fn with_unqueryable_asset(mut self, asset: Asset) -> Self {
        self.space_entry(&asset.space_id).assets.push(MockAsset {
            asset,
            columns: Vec::new(),
            rows: None,
        });
        self
    }

    /// Makes every request fail with a network error.
    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }

    /// Number of catalog listing and metadata requests served so far.
    pub fn metadata_calls(&self) -> usize {
        self.metadata_calls.load(Ordering::SeqCst)
    }

    /// Number of row requests served so far.
    pub fn row_calls(&self) -> usize {
        self.row_calls.load(Ordering::SeqCst)
    }

    fn space_entry(&mut self, space_id: &str) -> &mut MockSpace {
        let index = match self.spaces.iter().position(|s| s.space.id == space_id) {
            Some(index) => index,
            None => {
                self.spaces.push(MockSpace {
                    space: Space::new(space_id, space_id),
                    assets: Vec::new(),
                });
                self.spaces.len() - 1
            }
        };
        &mut self.spaces[index]
    }

    fn check_reachable(&self) -> CatalogResult<()> {
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(CatalogError::Network {
                message: "mock catalog is unreachable".to_string(),
            });
        }
        Ok(())
    }

    fn find_space(&self, space_id: &str) -> CatalogResult<&MockSpace> {
        self.spaces
            .iter()
            .find(|s| s.space.id == space_id)
            .ok_or_else(|| CatalogError::NotFound {
                resource: format!("space '{space_id}'"),
            })
    }

    fn find_asset(&self, target: &AssetRef) -> CatalogResult<&MockAsset> {
        self.find_space(&target.space_id)?
            .assets
            .iter()
            .find(|a| a.asset.id == target.asset_name)
            .ok_or_else(|| CatalogError::NotFound {
                resource: format!("asset '{target}'"),
            })
    }
}

#[async_trait]
impl CatalogProvider for MockCatalog {
    fn backend(&self) -> &'static str {
        "mock"
    }

    async fn ping(&self) -> CatalogResult<()> {
        self.check_reachable()
    }

    async fn list_spaces(&self) -> CatalogResult<Vec<Space>> {
        self.check_reachable()?;
        self.metadata_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.spaces.iter().map(|s| s.space.clone()).collect())
    }

    async fn list_space_assets(&self, space_id: &str) -> CatalogResult<Vec<Asset>> {
        self.check_reachable()?;
        self.metadata_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .find_space(space_id)?
            .assets
            .iter()
            .map(|a| a.asset.clone())
            .collect())
    }

    async fn get_catalog_asset(&self, target: &AssetRef) -> CatalogResult<Asset> {
        self.check_reachable()?;
        self.metadata_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.find_asset(target)?.asset.clone())
    }

    async fn get_relational_metadata(&self, target: &AssetRef) -> CatalogResult<Vec<ColumnInfo>> {
        self.check_reachable()?;
        self.metadata_calls.fetch_add(1, Ordering::SeqCst);
        let entry = self.find_asset(target)?;
        if entry.columns.is_empty() {
            return Err(CatalogError::Metadata {
                message: format!("no relational metadata for '{target}'"),
            });
        }
        Ok(entry.columns.clone())
    }

    async fn query_relational(
        &self,
        target: &AssetRef,
        query: &RelationalQuery,
    ) -> CatalogResult<Sample> {
        self.check_reachable()?;
        self.row_calls.fetch_add(1, Ordering::SeqCst);

        let entry = self.find_asset(target)?;
        let data = entry
            .rows
            .as_ref()
            .ok_or_else(|| CatalogError::InvalidRequest {
                message: format!("asset '{target}' does not support relational consumption"),
            })?;

        if query.filter.is_some() || query.order_by.is_some() {
            warn!(
                asset = %target,
                filter = ?query.filter,
                order_by = ?query.order_by,
                "Mock catalog ignores filter and order-by expressions"
            );
        }

        let indices: Vec<usize> = if query.select.is_empty() {
            (0..data.columns.len()).collect()
        } else {
            query
                .select
                .iter()
                .map(|column| {
                    data.column_index(column)
                        .ok_or_else(|| CatalogError::InvalidRequest {
                            message: format!("unknown column '{column}' in $select"),
                        })
                })
                .collect::<CatalogResult<_>>()?
        };

        let columns = indices.iter().map(|&i| data.columns[i].clone()).collect();
        let rows = data
            .rows
            .iter()
            .skip(query.skip)
            .take(query.top)
            .map(|row| {
                indices
                    .iter()
                    .filter_map(|&i| row.get(i).cloned())
                    .collect()
            })
            .collect();

        Ok(Sample::new(columns, rows))
    }
}

fn relational(space_id: &str, id: &str, asset_type: &str) -> Asset {
    Asset::new(space_id, id, asset_type).with_raw(json!({
        "supportsRelationalConsumption": true,
        "supportsAnalyticalQueries": false
    }))
}

fn columns(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

/// 60 orders over 15 customers. Every 17th amount is missing and the last
/// order is an outlier.
fn sales_orders() -> Sample {
    let rows = (1..=60i64)
        .map(|i| {
            let amount = if i % 17 == 0 {
                SampleValue::Null
            } else if i == 60 {
                SampleValue::Float(9999.0)
            } else {
                SampleValue::Float(((i * 37) % 500) as f64 + 0.5 * (i % 2) as f64)
            };
            vec![
                SampleValue::Integer(1000 + i),
                SampleValue::Integer(100 + (i * 7) % 15),
                SampleValue::from(STATUSES[(i % 4) as usize]),
                amount,
                SampleValue::from(REGIONS[(i % 4 + i / 20) as usize % 4]),
                SampleValue::Text(format!("2024-{:02}-{:02}", 1 + i % 12, 1 + i % 28)),
            ]
        })
        .collect();

    Sample::new(
        columns(&["ORDER_ID", "CUSTOMER_ID", "STATUS", "AMOUNT", "REGION", "ORDER_DATE"]),
        rows,
    )
}

fn customers() -> Sample {
    let rows = (0..15i64)
        .map(|i| {
            vec![
                SampleValue::Integer(100 + i),
                SampleValue::Text(format!("Customer {}", i + 1)),
                SampleValue::from(COUNTRIES[(i % 5) as usize]),
                SampleValue::from(if i % 3 == 0 { "ENTERPRISE" } else { "SMB" }),
            ]
        })
        .collect();

    Sample::new(columns(&["CUSTOMER_ID", "NAME", "COUNTRY", "SEGMENT"]), rows)
}

/// 40 employees. The first five have no manager.
fn employees() -> Sample {
    let rows = (1..=40i64)
        .map(|i| {
            let manager = if i <= 5 {
                SampleValue::Null
            } else {
                SampleValue::Integer(1 + i % 5)
            };
            vec![
                SampleValue::Integer(i),
                SampleValue::Text(format!("Employee {i}")),
                SampleValue::from(DEPARTMENTS[(i % 5) as usize]),
                SampleValue::Float(40000.0 + (i * 1250) as f64),
                manager,
            ]
        })
        .collect();

    Sample::new(
        columns(&["EMPLOYEE_ID", "NAME", "DEPARTMENT", "SALARY", "MANAGER_ID"]),
        rows,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_demo_catalog_layout() {
        let catalog = MockCatalog::new();
        let spaces = catalog.list_spaces().await.unwrap();
        let ids: Vec<&str> = spaces.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["MOCK_SALES", "MOCK_HR"]);

        let assets = catalog.list_space_assets("MOCK_SALES").await.unwrap();
        assert_eq!(assets.len(), 3);
        assert!(assets[0].supports_relational());
        assert!(!assets[2].supports_relational());
        assert!(assets[2].supports_analytical());
    }

    #[tokio::test]
    async fn test_query_applies_select_skip_top() {
        let catalog = MockCatalog::new();
        let target = AssetRef::new("MOCK_SALES", "SALES_ORDERS");
        let query = RelationalQuery::new(3)
            .with_select(["status", "ORDER_ID"])
            .with_skip(2);

        let sample = catalog.query_relational(&target, &query).await.unwrap();
        assert_eq!(sample.columns, vec!["STATUS", "ORDER_ID"]);
        assert_eq!(sample.row_count(), 3);
        assert_eq!(sample.rows[0][1], SampleValue::Integer(1003));
    }

    #[tokio::test]
    async fn test_fetch_sample_detects_truncation() {
        let catalog = MockCatalog::new();
        let target = AssetRef::new("MOCK_HR", "EMPLOYEES");

        let capped = catalog.fetch_sample(&target, None, 10).await.unwrap();
        assert_eq!(capped.row_count(), 10);
        assert!(capped.truncated);

        let exact = catalog.fetch_sample(&target, None, 40).await.unwrap();
        assert_eq!(exact.row_count(), 40);
        assert!(!exact.truncated);
    }

    #[tokio::test]
    async fn test_errors() {
        let catalog = MockCatalog::new();
        assert!(matches!(
            catalog.list_space_assets("NOPE").await,
            Err(CatalogError::NotFound { .. })
        ));

        let cube = AssetRef::new("MOCK_SALES", "REVENUE_CUBE");
        assert!(matches!(
            catalog.query_relational(&cube, &RelationalQuery::new(5)).await,
            Err(CatalogError::InvalidRequest { .. })
        ));

        let orders = AssetRef::new("MOCK_SALES", "SALES_ORDERS");
        let bad_select = RelationalQuery::new(5).with_select(["MISSING"]);
        assert!(matches!(
            catalog.query_relational(&orders, &bad_select).await,
            Err(CatalogError::InvalidRequest { .. })
        ));

        catalog.set_unreachable(true);
        assert!(matches!(
            catalog.ping().await,
            Err(CatalogError::Network { .. })
        ));
    }

    #[tokio::test]
    async fn test_missing_metadata_for_customers() {
        let catalog = MockCatalog::new();
        let target = AssetRef::new("MOCK_SALES", "CUSTOMERS");
        assert!(matches!(
            catalog.get_relational_metadata(&target).await,
            Err(CatalogError::Metadata { .. })
        ));
    }
}
