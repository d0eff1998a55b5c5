//! Authentication
//!
//! Every request is passed through an [`Authenticator`] before it is sent.
//! Three schemes are provided:
//!
//! - [`basic`] - username/password exchanged for an `X-Auth-Token` on every call
//! - [`bearer`] - a static bearer token
//! - [`keycloak`] - OIDC password grant against Keycloak with a cached,
//!   expiry-aware token

pub mod basic;
pub mod bearer;
pub mod jwt;
pub mod keycloak;

use super::request::Request;
use crate::error::Result;
use async_trait::async_trait;

pub use basic::{BasicAuthenticator, TokenResponse};
pub use bearer::BearerAuthenticator;
pub use keycloak::KeycloakAuthenticator;

/// API base URL used when none is configured
pub const DEFAULT_BASE_URL: &str = "https://127.0.0.1:8443/api";

/// Attaches credentials to outgoing requests
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Add credentials to `request`
    async fn authenticate(&self, request: &mut Request) -> Result<()>;

    /// Check that every required credential is present
    fn validate(&self) -> Result<()>;

    /// Base URL of the API this authenticator talks to
    fn base_url(&self) -> &str;
}

/// Configured base URL, or the default when unset
pub(crate) fn base_url_or_default(base_url: &Option<String>) -> &str {
    match base_url.as_deref() {
        Some(url) if !url.is_empty() => url,
        _ => DEFAULT_BASE_URL,
    }
}
