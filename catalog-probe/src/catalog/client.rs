use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Map, Value};
use tracing::{instrument, warn};

use super::auth::{ClientCredentials, TokenSource};
use super::error::{CatalogError, CatalogResult};
use super::metadata::parse_relational_metadata;
use super::provider::CatalogProvider;
use super::types::{Asset, AssetRef, ColumnInfo, RelationalQuery, Space};
use crate::analyzers::{Sample, SampleValue};
use crate::config::ProbeConfig;
use crate::log_catalog_op;
use crate::logging::{truncate_field, LogConfig};
use crate::security::InputSecurity;

const CATALOG_PATH: &str = "api/v1/dwc/catalog";
const RELATIONAL_PATH: &str = "api/v1/dwc/consumption/relational";

/// HTTP client for the tenant's catalog and relational consumption APIs.
#[derive(Clone)]
pub struct CatalogClient {
    tenant_url: String,
    client: Client,
    tokens: Arc<dyn TokenSource>,
    log: LogConfig,
}

impl std::fmt::Debug for CatalogClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogClient")
            .field("tenant_url", &self.tenant_url)
            .finish_non_exhaustive()
    }
}

impl CatalogClient {
    /// Creates a client from configuration, using the client-credentials grant.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Configuration` when the tenant URL or any OAuth
    /// setting is missing, or the HTTP client cannot be built.
    pub fn new(config: &ProbeConfig) -> CatalogResult<Self> {
        let tenant_url = config
            .tenant_url()
            .ok_or_else(|| CatalogError::Configuration {
                message: "DATASPHERE_TENANT_URL is not set".to_string(),
            })?;

        let (token_url, client_id, secret) = match (
            config.oauth_token_url(),
            config.client_id(),
            config.client_secret(),
        ) {
            (Some(url), Some(id), Some(secret)) if config.oauth_configured() => {
                (url, id, secret.clone())
            }
            _ => {
                return Err(CatalogError::Configuration {
                    message: "OAuth configuration is incomplete; set DATASPHERE_OAUTH_TOKEN_URL, \
                              DATASPHERE_CLIENT_ID and DATASPHERE_CLIENT_SECRET"
                        .to_string(),
                })
            }
        };

        let client = build_http_client(config.timeout(), config.verify_tls())?;
        let tokens = ClientCredentials::new(client.clone(), token_url, client_id, secret);

        Ok(Self {
            tenant_url: tenant_url.trim_end_matches('/').to_string(),
            client,
            tokens: Arc::new(tokens),
            log: LogConfig::default(),
        })
    }

    /// Creates a client with an explicit token source.
    pub fn with_token_source(
        tenant_url: impl Into<String>,
        timeout: Duration,
        tokens: Arc<dyn TokenSource>,
    ) -> CatalogResult<Self> {
        Ok(Self {
            tenant_url: tenant_url.into().trim_end_matches('/').to_string(),
            client: build_http_client(timeout, true)?,
            tokens,
            log: LogConfig::default(),
        })
    }

    pub fn with_log_config(mut self, log: LogConfig) -> Self {
        self.log = log;
        self
    }

    pub fn tenant_url(&self) -> &str {
        &self.tenant_url
    }

    fn spaces_url(&self) -> String {
        format!("{}/{}/spaces", self.tenant_url, CATALOG_PATH)
    }

    fn space_url(&self, space_id: &str) -> String {
        format!(
            "{}('{}')",
            self.spaces_url(),
            InputSecurity::escape_literal(space_id)
        )
    }

    fn relational_url(&self, target: &AssetRef) -> String {
        format!(
            "{}/{}/{}/{}",
            self.tenant_url, RELATIONAL_PATH, target.space_id, target.asset_name
        )
    }

    /// Sends an authenticated GET and returns the successful response.
    async fn get(&self, url: &str, query: &[(&str, String)]) -> CatalogResult<reqwest::Response> {
        let token = self.tokens.access_token().await?;

        log_catalog_op!(self.log, method = "GET", url, "Catalog request");

        let response = self
            .client
            .get(url)
            .bearer_auth(token.expose())
            .header("Accept", "application/json")
            .query(query)
            .send()
            .await
            .map_err(|e| CatalogError::Network {
                message: e.to_string(),
            })?;

        if response.status().is_success() {
            Ok(response)
        } else {
            self.handle_error_response(url, response).await
        }
    }

    async fn get_json(&self, url: &str, query: &[(&str, String)]) -> CatalogResult<Value> {
        self.get(url, query)
            .await?
            .json::<Value>()
            .await
            .map_err(|e| CatalogError::Serialization {
                message: e.to_string(),
            })
    }

    /// Convert an error response to a CatalogError.
    async fn handle_error_response<T>(
        &self,
        url: &str,
        response: reqwest::Response,
    ) -> CatalogResult<T> {
        let status = response.status();
        let retry_after = response
            .headers()
            .get("Retry-After")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok());

        let body = response.text().await.unwrap_or_default();
        warn!(
            status = status.as_u16(),
            url,
            body = %truncate_field(&body, self.log.max_field_length),
            "Catalog request failed"
        );

        match status.as_u16() {
            401 | 403 => Err(CatalogError::Authentication { message: body }),
            404 => Err(CatalogError::NotFound {
                resource: url.to_string(),
            }),
            429 => Err(CatalogError::RateLimited {
                retry_after_secs: retry_after,
            }),
            400 => Err(CatalogError::InvalidRequest { message: body }),
            status => Err(CatalogError::ServerError {
                status,
                message: body,
            }),
        }
    }
}

#[async_trait]
impl CatalogProvider for CatalogClient {
    fn backend(&self) -> &'static str {
        "http"
    }

    async fn ping(&self) -> CatalogResult<()> {
        self.get(&self.spaces_url(), &[("$top", "1".to_string())])
            .await
            .map(|_| ())
    }

    #[instrument(skip(self))]
    async fn list_spaces(&self) -> CatalogResult<Vec<Space>> {
        let body = self.get_json(&self.spaces_url(), &[]).await?;
        Ok(odata_values(body)?
            .into_iter()
            .filter_map(Space::from_json)
            .collect())
    }

    #[instrument(skip(self))]
    async fn list_space_assets(&self, space_id: &str) -> CatalogResult<Vec<Asset>> {
        let url = format!("{}/assets", self.space_url(space_id));
        let body = self.get_json(&url, &[]).await?;
        Ok(odata_values(body)?
            .into_iter()
            .filter_map(|raw| Asset::from_json(space_id, raw))
            .collect())
    }

    #[instrument(skip(self), fields(asset = %target))]
    async fn get_catalog_asset(&self, target: &AssetRef) -> CatalogResult<Asset> {
        let url = format!(
            "{}/assets('{}')",
            self.space_url(&target.space_id),
            InputSecurity::escape_literal(&target.asset_name)
        );
        let body = self.get_json(&url, &[]).await?;
        Asset::from_json(&target.space_id, body).ok_or_else(|| CatalogError::NotFound {
            resource: format!("asset '{target}'"),
        })
    }

    #[instrument(skip(self), fields(asset = %target))]
    async fn get_relational_metadata(&self, target: &AssetRef) -> CatalogResult<Vec<ColumnInfo>> {
        let url = format!("{}/$metadata", self.relational_url(target));
        let document = self
            .get(&url, &[])
            .await?
            .text()
            .await
            .map_err(|e| CatalogError::Serialization {
                message: e.to_string(),
            })?;
        parse_relational_metadata(&document)
    }

    #[instrument(skip(self, query), fields(asset = %target, top = query.top))]
    async fn query_relational(
        &self,
        target: &AssetRef,
        query: &RelationalQuery,
    ) -> CatalogResult<Sample> {
        // the entity set of a relational asset carries the asset's own name
        let url = format!("{}/{}", self.relational_url(target), target.asset_name);
        let body = self.get_json(&url, &query.to_query_pairs()).await?;
        Ok(records_to_sample(&query.select, odata_values(body)?))
    }
}

fn build_http_client(timeout: Duration, verify_tls: bool) -> CatalogResult<Client> {
    Client::builder()
        .timeout(timeout)
        .danger_accept_invalid_certs(!verify_tls)
        .build()
        .map_err(|e| CatalogError::Configuration {
            message: format!("Failed to create HTTP client: {}", e),
        })
}

/// Unwraps the `value` array of an OData collection response.
///
/// A bare JSON array is accepted as well.
fn odata_values(body: Value) -> CatalogResult<Vec<Value>> {
    match body {
        Value::Array(items) => Ok(items),
        Value::Object(mut map) => match map.remove("value") {
            Some(Value::Array(items)) => Ok(items),
            _ => Err(CatalogError::Serialization {
                message: "response has no 'value' array".to_string(),
            }),
        },
        _ => Err(CatalogError::Serialization {
            message: "expected a JSON object or array".to_string(),
        }),
    }
}

fn is_annotation(key: &str) -> bool {
    key.starts_with("@odata") || key.starts_with("__")
}

/// Converts keyed records into a column-aligned sample.
///
/// Columns follow `select` when given, otherwise the first-seen key order
/// across all records. Annotation keys such as `@odata.etag` are dropped and
/// a key missing from a record becomes null.
pub(crate) fn records_to_sample(select: &[String], records: Vec<Value>) -> Sample {
    let objects: Vec<Map<String, Value>> = records
        .into_iter()
        .filter_map(|record| match record {
            Value::Object(map) => Some(map),
            _ => None,
        })
        .collect();

    let columns: Vec<String> = if select.is_empty() {
        let mut columns: Vec<String> = Vec::new();
        for key in objects.iter().flat_map(|o| o.keys()) {
            if !is_annotation(key) && !columns.contains(key) {
                columns.push(key.clone());
            }
        }
        columns
    } else {
        select.to_vec()
    };

    let rows = objects
        .into_iter()
        .map(|mut object| {
            columns
                .iter()
                .map(|column| object.remove(column).map(SampleValue::from).unwrap_or_default())
                .collect()
        })
        .collect();

    Sample::new(columns, rows)
}
