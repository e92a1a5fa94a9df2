use std::time::Instant;

use chrono::{DateTime, Utc};
use reqwest::Url;
use serde::Serialize;
use tracing::{debug, info, instrument};

use super::CatalogService;
use crate::cache::CacheStats;
use crate::config::ProbeConfig;
use crate::error::ProbeError;

/// Outcome of one diagnostic step.
#[derive(Debug, Clone, Serialize)]
pub struct CheckResult {
    pub name: &'static str,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    pub elapsed_ms: u64,
}

impl CheckResult {
    fn passed(name: &'static str, detail: Option<String>, started: Instant) -> Self {
        Self {
            name,
            ok: true,
            detail,
            elapsed_ms: started.elapsed().as_millis() as u64,
        }
    }

    fn failed(name: &'static str, error: &dyn std::fmt::Display, started: Instant) -> Self {
        Self {
            name,
            ok: false,
            detail: Some(error.to_string()),
            elapsed_ms: started.elapsed().as_millis() as u64,
        }
    }
}

/// Connectivity report.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostics {
    pub timestamp: DateTime<Utc>,
    pub ok: bool,
    pub backend: &'static str,
    pub mock_mode: bool,
    pub checks: Vec<CheckResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache: Option<CacheStats>,
}

impl Diagnostics {
    /// Report for a service that could not be constructed at all.
    pub fn init_failure(config: &ProbeConfig, error: &ProbeError) -> Self {
        Self {
            timestamp: Utc::now(),
            ok: false,
            backend: if config.mock_mode() { "mock" } else { "http" },
            mock_mode: config.mock_mode(),
            checks: vec![CheckResult::failed("client_init", error, Instant::now())],
            cache: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RowCaps {
    pub preview: usize,
    pub query: usize,
    pub profile: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct CacheSettings {
    pub ttl_seconds: u64,
    pub max_entries: usize,
}

/// Non-secret view of the active configuration.
#[derive(Debug, Clone, Serialize)]
pub struct TenantInfo {
    pub tenant_url: Option<String>,
    pub tenant_host: Option<String>,
    pub oauth_token_host: Option<String>,
    pub client_id_configured: bool,
    pub client_secret_configured: bool,
    pub oauth_configured: bool,
    pub mock_mode: bool,
    pub verify_tls: bool,
    pub timeout_seconds: u64,
    pub row_caps: RowCaps,
    pub cache: CacheSettings,
}

impl TenantInfo {
    pub fn from_config(config: &ProbeConfig) -> Self {
        Self {
            tenant_url: config.tenant_url().map(str::to_string),
            tenant_host: config.tenant_url().and_then(host_of),
            oauth_token_host: config.oauth_token_url().and_then(host_of),
            client_id_configured: config.client_id().is_some(),
            client_secret_configured: config.client_secret().is_some_and(|s| !s.is_empty()),
            oauth_configured: config.oauth_configured(),
            mock_mode: config.mock_mode(),
            verify_tls: config.verify_tls(),
            timeout_seconds: config.timeout().as_secs(),
            row_caps: RowCaps {
                preview: config.max_rows_preview(),
                query: config.max_rows_query(),
                profile: config.max_rows_profile(),
            },
            cache: CacheSettings {
                ttl_seconds: config.cache_ttl().as_secs(),
                max_entries: config.cache_max_entries(),
            },
        }
    }
}

/// Identity behind the catalog credentials, as far as it can be known.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserIdentity {
    pub user_known: bool,
    pub source: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant_host: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrentUser {
    pub mock_mode: bool,
    pub user: UserIdentity,
}

impl CurrentUser {
    /// Mock mode answers with a synthetic technical user. Client-credentials
    /// tokens name a client rather than a person, so live mode reports the
    /// user as unknown.
    pub fn from_config(config: &ProbeConfig) -> Self {
        let tenant_host = config.tenant_url().and_then(host_of);
        let user = if config.mock_mode() {
            UserIdentity {
                user_known: true,
                source: "mock-mode",
                user_name: Some(MOCK_USER_NAME.to_string()),
                display_name: Some(MOCK_DISPLAY_NAME.to_string()),
                tenant_host,
            }
        } else {
            UserIdentity {
                user_known: false,
                source: "client-credentials",
                user_name: None,
                display_name: None,
                tenant_host,
            }
        };
        Self {
            mock_mode: config.mock_mode(),
            user,
        }
    }
}

const MOCK_USER_NAME: &str = "MOCK_TECHNICAL_USER";
const MOCK_DISPLAY_NAME: &str = "Mock Technical User";

fn host_of(url: &str) -> Option<String> {
    Url::parse(url).ok()?.host_str().map(str::to_string)
}

impl CatalogService {
    /// Runs connectivity checks against the catalog.
    ///
    /// Never fails: every problem is reported as a failed check.
    #[instrument(skip(self))]
    pub async fn diagnostics(&self) -> Diagnostics {
        let mut checks = vec![CheckResult::passed(
            "client_init",
            Some(format!("backend={}", self.provider.backend())),
            Instant::now(),
        )];

        let started = Instant::now();
        checks.push(match self.provider.ping().await {
            Ok(()) => CheckResult::passed("ping", None, started),
            Err(e) => CheckResult::failed("ping", &e, started),
        });

        // bypass the cache so the check reflects the live catalog
        let started = Instant::now();
        checks.push(match self.provider.list_spaces().await {
            Ok(spaces) => {
                CheckResult::passed("list_spaces", Some(format!("{} spaces", spaces.len())), started)
            }
            Err(e) => CheckResult::failed("list_spaces", &e, started),
        });

        let ok = checks.iter().all(|c| c.ok);
        info!(ok, backend = self.provider.backend(), "Diagnostics complete");

        Diagnostics {
            timestamp: Utc::now(),
            ok,
            backend: self.provider.backend(),
            mock_mode: self.config.mock_mode(),
            checks,
            cache: Some(self.cache_stats()),
        }
    }

    /// Describes the tenant and configuration without exposing secrets.
    pub fn tenant_info(&self) -> TenantInfo {
        TenantInfo::from_config(&self.config)
    }

    /// Reports who the catalog sees behind the configured credentials.
    pub fn current_user(&self) -> CurrentUser {
        let user = CurrentUser::from_config(&self.config);
        debug!(known = user.user.user_known, source = user.user.source, "Resolved current user");
        user
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::mock_service;
    use super::*;

    #[tokio::test]
    async fn test_diagnostics_healthy_mock() {
        let (_, service) = mock_service();
        let report = service.diagnostics().await;
        assert!(report.ok);
        assert_eq!(report.backend, "mock");
        let names: Vec<&str> = report.checks.iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["client_init", "ping", "list_spaces"]);
        assert_eq!(report.checks[2].detail.as_deref(), Some("2 spaces"));
        assert!(report.cache.unwrap().enabled);
    }

    #[tokio::test]
    async fn test_diagnostics_unreachable() {
        let (catalog, service) = mock_service();
        catalog.set_unreachable(true);
        let report = service.diagnostics().await;
        assert!(!report.ok);
        assert!(report.checks[0].ok);
        assert!(!report.checks[1].ok);
        assert!(!report.checks[2].ok);
    }

    #[test]
    fn test_init_failure_report() {
        let config = ProbeConfig::default();
        let error = ProbeError::configuration("DATASPHERE_TENANT_URL is not set");
        let report = Diagnostics::init_failure(&config, &error);
        assert!(!report.ok);
        assert_eq!(report.checks[0].name, "client_init");
        assert!(report.checks[0]
            .detail
            .as_deref()
            .unwrap()
            .contains("DATASPHERE_TENANT_URL"));
    }

    #[test]
    fn test_current_user_in_mock_mode() {
        let (_, service) = mock_service();
        let current = service.current_user();
        assert!(current.mock_mode);
        assert!(current.user.user_known);
        assert_eq!(current.user.source, "mock-mode");
        assert_eq!(current.user.user_name.as_deref(), Some("MOCK_TECHNICAL_USER"));

        let json = serde_json::to_value(&current).unwrap();
        assert_eq!(json["mock_mode"], true);
        assert_eq!(json["user"]["user_known"], true);
        assert_eq!(json["user"]["source"], "mock-mode");
    }

    #[test]
    fn test_current_user_with_client_credentials() {
        let config = ProbeConfig::default()
            .with_tenant_url("https://acme.eu10.hcs.cloud.sap")
            .with_oauth("https://acme.authentication.eu10.hana.ondemand.com/oauth/token", "client-xyz", "top-secret");
        let current = CurrentUser::from_config(&config);

        assert!(!current.mock_mode);
        assert!(!current.user.user_known);
        assert_eq!(current.user.source, "client-credentials");
        assert_eq!(current.user.tenant_host.as_deref(), Some("acme.eu10.hcs.cloud.sap"));

        let json = serde_json::to_string(&current).unwrap();
        assert!(!json.contains("user_name"));
        assert!(!json.contains("client-xyz"));
        assert!(!json.contains("top-secret"));
    }

    #[test]
    fn test_tenant_info_hides_secrets() {
        let config = ProbeConfig::default()
            .with_tenant_url("https://acme.eu10.hcs.cloud.sap/")
            .with_oauth("https://acme.authentication.eu10.hana.ondemand.com/oauth/token", "client-xyz", "top-secret");
        let info = TenantInfo::from_config(&config);

        assert_eq!(info.tenant_host.as_deref(), Some("acme.eu10.hcs.cloud.sap"));
        assert_eq!(
            info.oauth_token_host.as_deref(),
            Some("acme.authentication.eu10.hana.ondemand.com")
        );
        assert!(info.oauth_configured);
        assert!(info.client_secret_configured);

        let json = serde_json::to_string(&info).unwrap();
        assert!(!json.contains("top-secret"));
        assert!(!json.contains("client-xyz"));
    }
}
