//! Username/password authentication
//!
//! Each call exchanges the credentials for a fresh token at `{base}/auth` and
//! sends it as `X-Auth-Token`. Nothing is cached between calls.

use super::{base_url_or_default, Authenticator};
use crate::api::http::{DetailedResponse, LazyTransport, Transport};
use crate::api::request::{Request, RequestBuilder};
use crate::error::{AuthenticationError, Error, Result};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::header::{HeaderName, AUTHORIZATION};
use reqwest::Method;
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;

const AUTH_TOKEN_HEADER: &str = "x-auth-token";

/// Body of a successful `GET /auth`
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TokenResponse {
    #[serde(rename = "auth_token", default)]
    pub access_token: String,
    #[serde(default)]
    pub token_ttl: i64,
    #[serde(default)]
    pub expires_on: String,
}

impl fmt::Debug for TokenResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenResponse")
            .field("has_access_token", &!self.access_token.is_empty())
            .field("token_ttl", &self.token_ttl)
            .field("expires_on", &self.expires_on)
            .finish()
    }
}

pub struct BasicAuthenticator {
    username: String,
    password: String,
    base_url: Option<String>,
    transport: LazyTransport,
}

impl BasicAuthenticator {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            base_url: None,
            transport: LazyTransport::new(false),
        }
    }

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

    /// Exchange the credentials for a token.
    ///
    /// An undecodable success body yields an empty token rather than an error.
    pub async fn get_token(&self) -> Result<TokenResponse> {
        let mut builder = RequestBuilder::new(Method::GET);
        builder.resolve_request_url(self.base_url(), "/auth", &[])?;
        let token_url = builder.url().map(|u| u.to_string()).unwrap_or_default();
        let mut request = builder.build()?;

        let credentials = STANDARD.encode(format!("{}:{}", self.username, self.password));
        request.set_sensitive_header(AUTHORIZATION, &format!("Basic {}", credentials))?;

        tracing::debug!("Requesting auth token from {}", token_url);
        let response = self.transport.get()?.send(request).await?;

        if !response.status.is_success() {
            let detailed = DetailedResponse::raw(response);
            let mut message = detailed.raw_text();
            if message.is_empty() {
                message = format!(
                    "unexpected status code {} received from token server {}",
                    detailed.status_code.as_u16(),
                    token_url
                );
            }
            return Err(AuthenticationError::new(detailed, message).into());
        }

        match serde_json::from_slice::<TokenResponse>(&response.body) {
            Ok(token) => Ok(token),
            Err(e) => {
                tracing::warn!("Ignoring undecodable token response: {}", e);
                Ok(TokenResponse::default())
            }
        }
    }
}

#[async_trait]
impl Authenticator for BasicAuthenticator {
    async fn authenticate(&self, request: &mut Request) -> Result<()> {
        self.validate()?;
        let token = self.get_token().await?;
        request.set_sensitive_header(HeaderName::from_static(AUTH_TOKEN_HEADER), &token.access_token)
    }

    fn validate(&self) -> Result<()> {
        if self.username.is_empty() || self.password.is_empty() {
            return Err(Error::config("username or password can't be empty"));
        }
        Ok(())
    }

    fn base_url(&self) -> &str {
        base_url_or_default(&self.base_url)
    }
}

impl fmt::Debug for BasicAuthenticator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicAuthenticator")
            .field("username", &self.username)
            .field("base_url", &self.base_url())
            .finish()
    }
}
