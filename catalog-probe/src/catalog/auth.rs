use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

use super::error::{CatalogError, CatalogResult};
use crate::security::SecureString;

/// Tokens are refreshed this long before the server-reported expiry.
const EXPIRY_MARGIN: Duration = Duration::from_secs(30);

/// Lifetime assumed when the token response omits `expires_in`.
const DEFAULT_TOKEN_LIFETIME: Duration = Duration::from_secs(300);

/// Supplies bearer tokens for catalog requests.
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn access_token(&self) -> CatalogResult<SecureString>;
}

/// A fixed token, for tenants fronted by a pre-authenticated proxy and for tests.
#[derive(Debug, Clone)]
pub struct StaticToken(SecureString);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(SecureString::new(token.into()))
    }
}

#[async_trait]
impl TokenSource for StaticToken {
    async fn access_token(&self) -> CatalogResult<SecureString> {
        Ok(self.0.clone())
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    expires_in: Option<u64>,
}

struct CachedToken {
    token: SecureString,
    refresh_at: Instant,
}

/// OAuth2 client-credentials grant with an in-memory token cache.
pub struct ClientCredentials {
    client: Client,
    token_url: String,
    client_id: String,
    client_secret: SecureString,
    cached: RwLock<Option<CachedToken>>,
}

impl std::fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("token_url", &self.token_url)
            .field("client_id", &self.client_id)
            .finish_non_exhaustive()
    }
}

impl ClientCredentials {
    pub fn new(
        client: Client,
        token_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: SecureString,
    ) -> Self {
        Self {
            client,
            token_url: token_url.into(),
            client_id: client_id.into(),
            client_secret,
            cached: RwLock::new(None),
        }
    }

    /// Drops the cached token so the next request fetches a fresh one.
    pub async fn invalidate(&self) {
        *self.cached.write().await = None;
    }

    #[instrument(skip(self), fields(token_url = %self.token_url))]
    async fn fetch_token(&self) -> CatalogResult<CachedToken> {
        let response = self
            .client
            .post(&self.token_url)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.expose()),
            ])
            .send()
            .await
            .map_err(|e| CatalogError::Network {
                message: format!("token request failed: {e}"),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CatalogError::Authentication {
                message: format!("token endpoint returned {}: {}", status.as_u16(), body),
            });
        }

        let parsed: TokenResponse =
            response
                .json()
                .await
                .map_err(|e| CatalogError::Serialization {
                    message: format!("invalid token response: {e}"),
                })?;

        let token = parsed
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| CatalogError::Authentication {
                message: "token response did not contain access_token".to_string(),
            })?;

        let lifetime = parsed
            .expires_in
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TOKEN_LIFETIME);
        debug!(expires_in_secs = lifetime.as_secs(), "Obtained access token");

        Ok(CachedToken {
            token: SecureString::new(token),
            refresh_at: Instant::now() + lifetime.saturating_sub(EXPIRY_MARGIN),
        })
    }
}

#[async_trait]
impl TokenSource for ClientCredentials {
    async fn access_token(&self) -> CatalogResult<SecureString> {
        {
            let cached = self.cached.read().await;
            if let Some(entry) = cached.as_ref() {
                if Instant::now() < entry.refresh_at {
                    return Ok(entry.token.clone());
                }
            }
        }

        let mut cached = self.cached.write().await;
        // another task may have refreshed while we waited for the lock
        if let Some(entry) = cached.as_ref() {
            if Instant::now() < entry.refresh_at {
                return Ok(entry.token.clone());
            }
        }

        let fresh = self.fetch_token().await?;
        let token = fresh.token.clone();
        *cached = Some(fresh);
        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_token() {
        let source = StaticToken::new("abc");
        assert_eq!(source.access_token().await.unwrap().expose(), "abc");
    }

    #[tokio::test]
    async fn test_token_is_cached() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/oauth/token")
            .match_body(mockito::Matcher::UrlEncoded(
                "grant_type".into(),
                "client_credentials".into(),
            ))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"access_token":"tok-1","expires_in":3600}"#)
            .expect(1)
            .create_async()
            .await;

        let source = ClientCredentials::new(
            Client::new(),
            format!("{}/oauth/token", server.url()),
            "client",
            SecureString::new("secret"),
        );

        assert_eq!(source.access_token().await.unwrap().expose(), "tok-1");
        assert_eq!(source.access_token().await.unwrap().expose(), "tok-1");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_rejected_credentials() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/oauth/token")
            .with_status(401)
            .with_body("invalid_client")
            .create_async()
            .await;

        let source = ClientCredentials::new(
            Client::new(),
            format!("{}/oauth/token", server.url()),
            "client",
            SecureString::new("wrong"),
        );

        match source.access_token().await {
            Err(CatalogError::Authentication { message }) => {
                assert!(message.contains("invalid_client"))
            }
            other => panic!("expected authentication error, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_missing_access_token() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/oauth/token")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"token_type":"bearer"}"#)
            .create_async()
            .await;

        let source = ClientCredentials::new(
            Client::new(),
            format!("{}/oauth/token", server.url()),
            "client",
            SecureString::new("secret"),
        );
        assert!(matches!(
            source.access_token().await,
            Err(CatalogError::Authentication { .. })
        ));
    }
}
