//! Static bearer token authentication

use super::{base_url_or_default, Authenticator};
use crate::api::request::Request;
use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use std::fmt;

pub struct BearerAuthenticator {
    token: String,
    base_url: Option<String>,
}

impl BearerAuthenticator {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            base_url: None,
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }
}

#[async_trait]
impl Authenticator for BearerAuthenticator {
    async fn authenticate(&self, request: &mut Request) -> Result<()> {
        self.validate()?;
        request.set_sensitive_header(AUTHORIZATION, &format!("Bearer {}", self.token))
    }

    fn validate(&self) -> Result<()> {
        if self.token.is_empty() {
            return Err(Error::config("token can't be empty"));
        }
        Ok(())
    }

    fn base_url(&self) -> &str {
        base_url_or_default(&self.base_url)
    }
}

impl fmt::Debug for BearerAuthenticator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BearerAuthenticator")
            .field("base_url", &self.base_url())
            .finish_non_exhaustive()
    }
}
