//! Keycloak (OIDC) authentication
//!
//! Tokens come from the realm's OpenID Connect token endpoint using the
//! password grant and are cached on the authenticator. Before each request
//! the cached pair is checked against its `exp` claims:
//!
//! 1. no cached token: log in
//! 2. access token still valid: reuse it
//! 3. access token expired, refresh token valid: refresh (errors propagate)
//! 4. both expired: log in again

use super::{base_url_or_default, jwt, Authenticator};
use crate::api::http::{DetailedResponse, LazyTransport, Transport};
use crate::api::request::{Request, RequestBuilder};
use crate::error::{AuthenticationError, Error, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Method;
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Keycloak server used when none is configured
pub const DEFAULT_KEYCLOAK_BASE_URL: &str = "http://localhost:8080";

const TOKEN_PATH: &str = "/realms/{realm}/protocol/openid-connect/token";

#[derive(Deserialize)]
struct OidcTokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: String,
    #[serde(default)]
    expires_in: i64,
}

#[derive(Deserialize)]
struct OidcErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

#[derive(Clone)]
struct CachedToken {
    access_token: String,
    refresh_token: String,
    /// As reported by the server; validity decisions use the JWT claims
    expires_at: DateTime<Utc>,
}

impl From<OidcTokenResponse> for CachedToken {
    fn from(response: OidcTokenResponse) -> Self {
        Self {
            access_token: response.access_token,
            refresh_token: response.refresh_token,
            expires_at: Utc::now() + Duration::seconds(response.expires_in),
        }
    }
}

/// Talks to one Keycloak server's token endpoint
struct TokenClient {
    base_url: String,
    transport: Arc<dyn Transport>,
}

impl TokenClient {
    async fn request_token(&self, realm: &str, form: &[(&str, &str)]) -> Result<CachedToken> {
        let mut builder = RequestBuilder::new(Method::POST);
        builder.resolve_request_url(&self.base_url, TOKEN_PATH, &[("realm", realm)])?;
        let token_url = builder.url().map(|u| u.to_string()).unwrap_or_default();

        let body = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(form)
            .finish();
        builder
            .add_header(CONTENT_TYPE.as_str(), "application/x-www-form-urlencoded")
            .add_header(ACCEPT.as_str(), "application/json")
            .set_body_bytes(body.into_bytes());

        let response = self.transport.send(builder.build()?).await?;

        if !response.status.is_success() {
            let detailed = DetailedResponse::raw(response);
            let message = match serde_json::from_slice::<OidcErrorResponse>(&detailed.raw_result) {
                Ok(OidcErrorResponse {
                    error,
                    error_description: Some(description),
                }) => format!("{}: {}", error, description),
                Ok(OidcErrorResponse { error, .. }) => error,
                Err(_) if !detailed.raw_result.is_empty() => detailed.raw_text(),
                Err(_) => format!(
                    "unexpected status code {} received from token server {}",
                    detailed.status_code.as_u16(),
                    token_url
                ),
            };
            return Err(AuthenticationError::new(detailed, message).into());
        }

        let token: OidcTokenResponse =
            serde_json::from_slice(&response.body).map_err(Error::Decode)?;
        Ok(token.into())
    }
}

#[derive(Default)]
struct Session {
    client: Option<TokenClient>,
    token: Option<CachedToken>,
}

pub struct KeycloakAuthenticator {
    keycloak_base_url: Option<String>,
    realm: String,
    client_id: String,
    client_secret: String,
    username: String,
    password: String,
    base_url: Option<String>,
    transport: LazyTransport,
    session: Mutex<Session>,
}

impl KeycloakAuthenticator {
    pub fn new(
        realm: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            keycloak_base_url: None,
            realm: realm.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            username: username.into(),
            password: password.into(),
            base_url: None,
            transport: LazyTransport::new(false),
            session: Mutex::new(Session::default()),
        }
    }

    /// Keycloak server issuing the tokens
    #[must_use]
    pub fn with_keycloak_base_url(mut self, url: impl Into<String>) -> Self {
        self.keycloak_base_url = Some(url.into());
        self
    }

    /// ManageIQ API the tokens are used against
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Skip TLS certificate verification on the token endpoint
    #[must_use]
    pub fn with_insecure(mut self, insecure: bool) -> Self {
        self.transport = LazyTransport::new(insecure);
        self
    }

    #[must_use]
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = LazyTransport::with(transport);
        self
    }

    pub fn keycloak_base_url(&self) -> &str {
        match self.keycloak_base_url.as_deref() {
            Some(url) if !url.is_empty() => url,
            _ => DEFAULT_KEYCLOAK_BASE_URL,
        }
    }

    /// When the cached access token expires, as reported by Keycloak
    pub async fn token_expires_at(&self) -> Option<DateTime<Utc>> {
        self.session.lock().await.token.as_ref().map(|t| t.expires_at)
    }

    /// Drop the cached token so the next call logs in again
    pub async fn clear_token(&self) {
        self.session.lock().await.token = None;
    }

    async fn login(&self, client: &TokenClient) -> Result<CachedToken> {
        client
            .request_token(
                &self.realm,
                &[
                    ("grant_type", "password"),
                    ("client_id", &self.client_id),
                    ("client_secret", &self.client_secret),
                    ("username", &self.username),
                    ("password", &self.password),
                    ("scope", "openid"),
                ],
            )
            .await
    }

    async fn refresh(&self, client: &TokenClient, refresh_token: &str) -> Result<CachedToken> {
        client
            .request_token(
                &self.realm,
                &[
                    ("grant_type", "refresh_token"),
                    ("refresh_token", refresh_token),
                    ("client_id", &self.client_id),
                    ("client_secret", &self.client_secret),
                ],
            )
            .await
    }

    /// Current access token, logging in or refreshing as needed
    async fn access_token(&self) -> Result<String> {
        let mut session = self.session.lock().await;
        let Session { client, token } = &mut *session;

        let transport = self.transport.get()?;
        let client = client.get_or_insert_with(|| TokenClient {
            base_url: self.keycloak_base_url().to_string(),
            transport,
        });

        let next = match token.as_ref() {
            None => {
                tracing::debug!("No cached token, logging in to realm {}", self.realm);
                self.login(client).await?
            }
            Some(cached) if jwt::is_valid(&cached.access_token) => {
                return Ok(cached.access_token.clone());
            }
            Some(cached) if jwt::is_valid(&cached.refresh_token) => {
                tracing::debug!("Access token expired, refreshing");
                self.refresh(client, &cached.refresh_token).await?
            }
            Some(_) => {
                tracing::debug!("Refresh token expired, logging in again");
                self.login(client).await?
            }
        };

        let access_token = next.access_token.clone();
        *token = Some(next);
        Ok(access_token)
    }
}

#[async_trait]
impl Authenticator for KeycloakAuthenticator {
    async fn authenticate(&self, request: &mut Request) -> Result<()> {
        self.validate()?;
        let access_token = self.access_token().await?;
        request.set_sensitive_header(AUTHORIZATION, &format!("Bearer {}", access_token))
    }

    fn validate(&self) -> Result<()> {
        if self.realm.is_empty()
            || self.client_id.is_empty()
            || self.client_secret.is_empty()
            || self.username.is_empty()
            || self.password.is_empty()
        {
            return Err(Error::config(
                "realm, client id, client secret, username or password can't be empty",
            ));
        }
        Ok(())
    }

    fn base_url(&self) -> &str {
        base_url_or_default(&self.base_url)
    }
}

impl fmt::Debug for KeycloakAuthenticator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeycloakAuthenticator")
            .field("keycloak_base_url", &self.keycloak_base_url())
            .field("realm", &self.realm)
            .field("client_id", &self.client_id)
            .field("username", &self.username)
            .field("base_url", &self.base_url())
            .finish_non_exhaustive()
    }
}
