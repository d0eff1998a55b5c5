//! ManageIQ Client
//!
//! Main client for talking to the ManageIQ REST API, combining an
//! [`Authenticator`] with a [`Transport`].

use super::auth::Authenticator;
use super::http::{DetailedResponse, HttpResponse, HttpTransport, Transport};
use super::request::{Request, RequestBuilder};
use crate::error::{Error, Result};
use reqwest::header::{HeaderValue, ACCEPT};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

const ACCEPT_JSON: &str = "application/json; charset=utf-8";

/// Client construction options
#[derive(Debug, Clone, Default)]
pub struct ClientParams {
    /// Skip TLS certificate verification
    pub insecure: bool,
}

/// Error body shapes returned by the API
#[derive(Debug, Default, Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    #[allow(dead_code)]
    code: Option<i64>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    #[allow(dead_code)]
    data: Option<Value>,
    #[serde(default)]
    error: Option<ErrorDetail>,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    message: Option<String>,
}

impl ErrorResponse {
    fn into_message(self) -> Option<String> {
        self.message
            .or_else(|| self.error.and_then(|e| e.message))
            .filter(|m| !m.is_empty())
    }
}

/// Main ManageIQ client
#[derive(Clone)]
pub struct Client {
    authenticator: Arc<dyn Authenticator>,
    transport: Arc<dyn Transport>,
}

impl Client {
    /// Create a new client that sends through a reqwest transport
    pub fn new(authenticator: Arc<dyn Authenticator>, params: ClientParams) -> Result<Self> {
        let transport = HttpTransport::new(params.insecure)?;
        Ok(Self::with_transport(authenticator, Arc::new(transport)))
    }

    /// Create a client on top of a custom transport
    pub fn with_transport(authenticator: Arc<dyn Authenticator>, transport: Arc<dyn Transport>) -> Self {
        Self {
            authenticator,
            transport,
        }
    }

    pub fn authenticator(&self) -> &Arc<dyn Authenticator> {
        &self.authenticator
    }

    /// Base URL requests are resolved against
    pub fn base_url(&self) -> &str {
        self.authenticator.base_url()
    }

    /// Start a request resolved against the authenticator's base URL
    pub fn request(
        &self,
        method: Method,
        path: &str,
        path_params: &[(&str, &str)],
    ) -> Result<RequestBuilder> {
        let mut builder = RequestBuilder::new(method);
        builder.resolve_request_url(self.base_url(), path, path_params)?;
        Ok(builder)
    }

    /// Send `request` and return the raw body without decoding it
    pub async fn send(&self, request: Request) -> Result<DetailedResponse> {
        let response = self.dispatch(request).await?;
        Ok(DetailedResponse::raw(response))
    }

    /// Send `request` and decode the JSON body into `T`
    pub async fn send_request<T: DeserializeOwned>(&self, request: Request) -> Result<DetailedResponse<T>> {
        let response = self.dispatch(request).await?;
        let result = serde_json::from_slice(&response.body).map_err(Error::Decode)?;

        Ok(DetailedResponse {
            status_code: response.status,
            headers: response.headers,
            result: Some(result),
            raw_result: response.body,
        })
    }

    /// Authenticate, send, and classify the response status
    async fn dispatch(&self, mut request: Request) -> Result<HttpResponse> {
        self.authenticator.authenticate(&mut request).await?;
        request
            .headers_mut()
            .insert(ACCEPT, HeaderValue::from_static(ACCEPT_JSON));

        let response = self.transport.send(request).await?;
        let status = response.status;

        if status.is_success() || status.is_redirection() {
            return Ok(response);
        }

        let message = serde_json::from_slice::<ErrorResponse>(&response.body)
            .ok()
            .and_then(ErrorResponse::into_message)
            .unwrap_or_else(|| format!("unknown error, status code: {}", status.as_u16()));

        Err(Error::RemoteApi { status, message })
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.base_url())
            .finish_non_exhaustive()
    }
}
