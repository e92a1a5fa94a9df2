use serde::Serialize;
use tracing::instrument;

use super::CatalogService;
use crate::analyzers::{ColumnProfile, SchemaSummary};
use crate::catalog::AssetRef;
use crate::error::Result;
use crate::limits::RowCap;
use crate::log_profiling;
use crate::security::InputSecurity;

/// Inferred schema of a sampled asset.
#[derive(Debug, Clone, Serialize)]
pub struct SchemaResponse {
    pub space_id: String,
    pub asset_id: String,
    #[serde(flatten)]
    pub schema: SchemaSummary,
}

/// Profile of one sampled column.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileResponse {
    pub space_id: String,
    pub asset_id: String,
    #[serde(flatten)]
    pub profile: ColumnProfile,
}

impl CatalogService {
    /// Quick per-column summary over a capped preview of the asset.
    #[instrument(skip(self))]
    pub async fn describe_asset_schema(
        &self,
        space_id: &str,
        asset_name: &str,
        top: usize,
    ) -> Result<SchemaResponse> {
        let target = AssetRef::new(space_id, asset_name);
        target.validate()?;
        let cap = RowCap::resolve(top, self.config.max_rows_preview())?;

        let sample = self
            .provider
            .fetch_sample(&target, None, cap.effective_top)
            .await?;
        let mut schema = self.schema.infer(&sample);
        schema.meta.cap = cap;

        Ok(SchemaResponse {
            space_id: target.space_id,
            asset_id: target.asset_name,
            schema,
        })
    }

    /// Full profile of one column over a capped single-column sample.
    ///
    /// # Errors
    ///
    /// Fails when the sample cannot be fetched, for example because the
    /// column does not exist. An empty or all-null sample is not an error.
    #[instrument(skip(self))]
    pub async fn profile_column(
        &self,
        space_id: &str,
        asset_name: &str,
        column: &str,
        top: usize,
    ) -> Result<ProfileResponse> {
        let target = AssetRef::new(space_id, asset_name);
        target.validate()?;
        InputSecurity::validate_identifier(column, "column")?;
        let cap = RowCap::resolve(top, self.config.max_rows_profile())?;

        let columns = [column.to_string()];
        let sample = self
            .provider
            .fetch_sample(&target, Some(&columns), cap.effective_top)
            .await?;

        let mut profile = self.profiler.profile_sample(&sample, column);
        profile.meta.cap = cap;

        log_profiling!(
            self.log,
            asset = %target,
            column,
            sample_rows = profile.meta.sample_rows,
            truncated = profile.meta.truncated,
            role = ?profile.role_hint,
            "Profiled column"
        );

        Ok(ProfileResponse {
            space_id: target.space_id,
            asset_id: target.asset_name,
            profile,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::mock_service;
    use super::*;
    use crate::analyzers::{RoleHint, SampleValue, ValueKind};
    use crate::catalog::CatalogError;
    use crate::error::ProbeError;

    #[tokio::test]
    async fn test_describe_schema() {
        let (_, service) = mock_service();
        let result = service
            .describe_asset_schema("MOCK_SALES", "SALES_ORDERS", 10)
            .await
            .unwrap();

        assert_eq!(result.schema.columns.len(), 6);
        assert_eq!(result.schema.meta.row_count, 10);
        assert!(result.schema.meta.truncated);

        let order_id = &result.schema.columns[0];
        assert_eq!(order_id.name, "ORDER_ID");
        assert_eq!(order_id.types, vec![ValueKind::Integer]);
        assert_eq!(order_id.example_values.len(), 5);

        let json = serde_json::to_value(&result).unwrap();
        assert!(json["columns"].is_array());
        assert_eq!(json["meta"]["row_count"], 10);
        assert!(json.get("cap").is_none());
    }

    #[tokio::test]
    async fn test_describe_schema_reports_cap_in_meta() {
        let (_, service) = mock_service();
        let result = service
            .describe_asset_schema("MOCK_SALES", "SALES_ORDERS", 5000)
            .await
            .unwrap();

        let meta = &result.schema.meta;
        assert_eq!(meta.cap.requested_top, 5000);
        assert_eq!(meta.cap.effective_top, 200);
        assert!(meta.cap.cap_applied);

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["meta"]["cap_top"], 200);
        assert_eq!(json["meta"]["effective_top"], 200);
        assert_eq!(json["meta"]["cap_applied"], true);
    }

    #[tokio::test]
    async fn test_profile_identifier_column() {
        let (_, service) = mock_service();
        let result = service
            .profile_column("MOCK_HR", "EMPLOYEES", "EMPLOYEE_ID", 100)
            .await
            .unwrap();
        let profile = &result.profile;

        assert_eq!(profile.total_count, 40);
        assert_eq!(profile.distinct_sampled, 40);
        assert_eq!(profile.role_hint, Some(RoleHint::Identifier));
        assert!(!profile.meta.truncated);
        assert_eq!(profile.meta.cap.requested_top, 100);
        assert_eq!(profile.meta.cap.effective_top, 100);
    }

    #[tokio::test]
    async fn test_profile_dimension_column() {
        let (_, service) = mock_service();
        let result = service
            .profile_column("MOCK_SALES", "SALES_ORDERS", "STATUS", 1000)
            .await
            .unwrap();
        let profile = &result.profile;

        assert_eq!(profile.non_null_count, 60);
        let categorical = profile.categorical_summary.as_ref().unwrap();
        assert_eq!(categorical.unique_values, 4);
        assert_eq!(categorical.concentration, Some(0.25));
        // equal counts fall back to string order
        assert_eq!(categorical.top_values[0].value, SampleValue::from("CANCELLED"));
        assert_eq!(profile.role_hint, Some(RoleHint::Dimension));
    }

    #[tokio::test]
    async fn test_profile_nullable_measure() {
        let (_, service) = mock_service();
        let result = service
            .profile_column("MOCK_SALES", "SALES_ORDERS", "AMOUNT", 1000)
            .await
            .unwrap();
        let profile = &result.profile;

        assert_eq!(profile.null_count, 3);
        assert_eq!(profile.non_null_count, 57);
        let numeric = profile.numeric_summary.as_ref().unwrap();
        assert_eq!(numeric.max, 9999.0);
        assert!(numeric.outlier_count >= 1);
        assert_eq!(profile.role_hint, Some(RoleHint::Measure));
    }

    #[tokio::test]
    async fn test_profile_cap_and_truncation() {
        let (_, service) = mock_service();
        let result = service
            .profile_column("MOCK_SALES", "SALES_ORDERS", "REGION", 5000)
            .await
            .unwrap();
        let meta = &result.profile.meta;
        assert_eq!(meta.cap.effective_top, 1000);
        assert!(meta.cap.cap_applied);
        assert!(!meta.truncated);

        let small = service
            .profile_column("MOCK_SALES", "SALES_ORDERS", "REGION", 10)
            .await
            .unwrap();
        assert_eq!(small.profile.meta.sample_rows, 10);
        assert!(small.profile.meta.truncated);
    }

    #[tokio::test]
    async fn test_profile_unknown_column_is_upstream_failure() {
        let (_, service) = mock_service();
        let result = service
            .profile_column("MOCK_SALES", "SALES_ORDERS", "NOT_A_COLUMN", 10)
            .await;
        assert!(matches!(
            result,
            Err(ProbeError::Catalog(CatalogError::InvalidRequest { .. }))
        ));
    }

    #[tokio::test]
    async fn test_profile_response_shape() {
        let (_, service) = mock_service();
        let result = service
            .profile_column("MOCK_HR", "EMPLOYEES", "MANAGER_ID", 50)
            .await
            .unwrap();
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["column"], "MANAGER_ID");
        assert_eq!(json["null_count"], 5);
        assert_eq!(json["meta"]["cap_top"], 1000);
    }
}
