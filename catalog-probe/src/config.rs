//! Environment-driven configuration.
//!
//! All settings come from `DATASPHERE_*` variables. [`ProbeConfig::from_lookup`]
//! takes the variable source as a function so tests can supply a map instead
//! of mutating the process environment.

use std::time::Duration;

use crate::error::{ProbeError, Result};
use crate::security::SecureString;

pub const ENV_TENANT_URL: &str = "DATASPHERE_TENANT_URL";
pub const ENV_OAUTH_TOKEN_URL: &str = "DATASPHERE_OAUTH_TOKEN_URL";
pub const ENV_OAUTH_CLIENT_ID: &str = "DATASPHERE_OAUTH_CLIENT_ID";
pub const ENV_CLIENT_ID: &str = "DATASPHERE_CLIENT_ID";
pub const ENV_OAUTH_CLIENT_SECRET: &str = "DATASPHERE_OAUTH_CLIENT_SECRET";
pub const ENV_CLIENT_SECRET: &str = "DATASPHERE_CLIENT_SECRET";
pub const ENV_VERIFY_TLS: &str = "DATASPHERE_VERIFY_TLS";
pub const ENV_MOCK_MODE: &str = "DATASPHERE_MOCK_MODE";
pub const ENV_HTTP_TIMEOUT_SECONDS: &str = "DATASPHERE_HTTP_TIMEOUT_SECONDS";
pub const ENV_MAX_ROWS_PREVIEW: &str = "DATASPHERE_MAX_ROWS_PREVIEW";
pub const ENV_MAX_ROWS_QUERY: &str = "DATASPHERE_MAX_ROWS_QUERY";
pub const ENV_MAX_ROWS_PROFILE: &str = "DATASPHERE_MAX_ROWS_PROFILE";
pub const ENV_CACHE_TTL_SECONDS: &str = "DATASPHERE_CACHE_TTL_SECONDS";
pub const ENV_CACHE_MAX_ENTRIES: &str = "DATASPHERE_CACHE_MAX_ENTRIES";

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MAX_ROWS_PREVIEW: usize = 200;
const DEFAULT_MAX_ROWS_QUERY: usize = 1000;
const DEFAULT_MAX_ROWS_PROFILE: usize = 1000;
const DEFAULT_CACHE_TTL_SECS: u64 = 60;
const DEFAULT_CACHE_MAX_ENTRIES: usize = 128;

/// Settings for reaching a catalog tenant and bounding the work done per call.
#[derive(Debug, Clone)]
pub struct ProbeConfig {
    tenant_url: Option<String>,
    oauth_token_url: Option<String>,
    client_id: Option<String>,
    client_secret: Option<SecureString>,
    verify_tls: bool,
    mock_mode: bool,
    timeout: Duration,
    max_rows_preview: usize,
    max_rows_query: usize,
    max_rows_profile: usize,
    cache_ttl: Duration,
    cache_max_entries: usize,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            tenant_url: None,
            oauth_token_url: None,
            client_id: None,
            client_secret: None,
            verify_tls: true,
            mock_mode: false,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_rows_preview: DEFAULT_MAX_ROWS_PREVIEW,
            max_rows_query: DEFAULT_MAX_ROWS_QUERY,
            max_rows_profile: DEFAULT_MAX_ROWS_PROFILE,
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
            cache_max_entries: DEFAULT_CACHE_MAX_ENTRIES,
        }
    }
}

impl ProbeConfig {
    /// Configuration that serves the built-in mock catalog.
    pub fn mock() -> Self {
        Self::default().with_mock_mode(true)
    }

    /// Loads configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration from an arbitrary variable source.
    ///
    /// Empty values are treated as unset. Malformed numbers are rejected
    /// rather than silently replaced by defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let defaults = Self::default();

        Ok(Self {
            tenant_url: get(ENV_TENANT_URL).map(|u| u.trim_end_matches('/').to_string()),
            oauth_token_url: get(ENV_OAUTH_TOKEN_URL),
            client_id: get(ENV_OAUTH_CLIENT_ID).or_else(|| get(ENV_CLIENT_ID)),
            client_secret: get(ENV_OAUTH_CLIENT_SECRET)
                .or_else(|| get(ENV_CLIENT_SECRET))
                .map(SecureString::from),
            verify_tls: get(ENV_VERIFY_TLS)
                .map(|v| parse_bool(&v))
                .unwrap_or(defaults.verify_tls),
            mock_mode: get(ENV_MOCK_MODE)
                .map(|v| parse_bool(&v))
                .unwrap_or(defaults.mock_mode),
            timeout: Duration::from_secs(parse_number(
                ENV_HTTP_TIMEOUT_SECONDS,
                get(ENV_HTTP_TIMEOUT_SECONDS),
                DEFAULT_TIMEOUT_SECS,
            )?),
            max_rows_preview: parse_number(
                ENV_MAX_ROWS_PREVIEW,
                get(ENV_MAX_ROWS_PREVIEW),
                DEFAULT_MAX_ROWS_PREVIEW,
            )?,
            max_rows_query: parse_number(
                ENV_MAX_ROWS_QUERY,
                get(ENV_MAX_ROWS_QUERY),
                DEFAULT_MAX_ROWS_QUERY,
            )?,
            max_rows_profile: parse_number(
                ENV_MAX_ROWS_PROFILE,
                get(ENV_MAX_ROWS_PROFILE),
                DEFAULT_MAX_ROWS_PROFILE,
            )?,
            cache_ttl: Duration::from_secs(parse_number(
                ENV_CACHE_TTL_SECONDS,
                get(ENV_CACHE_TTL_SECONDS),
                DEFAULT_CACHE_TTL_SECS,
            )?),
            cache_max_entries: parse_number(
                ENV_CACHE_MAX_ENTRIES,
                get(ENV_CACHE_MAX_ENTRIES),
                DEFAULT_CACHE_MAX_ENTRIES,
            )?,
        })
    }

    pub fn with_tenant_url(mut self, url: impl Into<String>) -> Self {
        self.tenant_url = Some(url.into().trim_end_matches('/').to_string());
        self
    }

    /// Set the OAuth client-credentials triple.
    pub fn with_oauth(
        mut self,
        token_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        self.oauth_token_url = Some(token_url.into());
        self.client_id = Some(client_id.into());
        self.client_secret = Some(SecureString::new(client_secret.into()));
        self
    }

    pub fn with_verify_tls(mut self, verify: bool) -> Self {
        self.verify_tls = verify;
        self
    }

    pub fn with_mock_mode(mut self, mock: bool) -> Self {
        self.mock_mode = mock;
        self
    }

    /// Set the HTTP request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the row caps for preview/schema, query and profile calls.
    pub fn with_row_caps(mut self, preview: usize, query: usize, profile: usize) -> Self {
        self.max_rows_preview = preview;
        self.max_rows_query = query;
        self.max_rows_profile = profile;
        self
    }

    /// Set the metadata cache TTL and capacity. Either being zero disables it.
    pub fn with_cache(mut self, ttl: Duration, max_entries: usize) -> Self {
        self.cache_ttl = ttl;
        self.cache_max_entries = max_entries;
        self
    }

    pub fn tenant_url(&self) -> Option<&str> {
        self.tenant_url.as_deref()
    }

    pub fn oauth_token_url(&self) -> Option<&str> {
        self.oauth_token_url.as_deref()
    }

    pub fn client_id(&self) -> Option<&str> {
        self.client_id.as_deref()
    }

    /// Get the client secret.
    ///
    /// # Security
    /// Use `expose()` only at the point of sending it; never log it.
    pub fn client_secret(&self) -> Option<&SecureString> {
        self.client_secret.as_ref()
    }

    pub fn verify_tls(&self) -> bool {
        self.verify_tls
    }

    pub fn mock_mode(&self) -> bool {
        self.mock_mode
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn max_rows_preview(&self) -> usize {
        self.max_rows_preview
    }

    pub fn max_rows_query(&self) -> usize {
        self.max_rows_query
    }

    pub fn max_rows_profile(&self) -> usize {
        self.max_rows_profile
    }

    pub fn cache_ttl(&self) -> Duration {
        self.cache_ttl
    }

    pub fn cache_max_entries(&self) -> usize {
        self.cache_max_entries
    }

    /// True when token URL, client id and client secret are all present.
    pub fn oauth_configured(&self) -> bool {
        self.oauth_token_url.is_some()
            && self.client_id.is_some()
            && self.client_secret.as_ref().is_some_and(|s| !s.is_empty())
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn parse_number<T: std::str::FromStr>(key: &str, value: Option<String>, default: T) -> Result<T> {
    match value {
        None => Ok(default),
        Some(raw) => raw.parse().map_err(|_| {
            ProbeError::configuration(format!("{key} must be a non-negative integer, got '{raw}'"))
        }),
    }
}
