//! HTTP transport for ManageIQ API calls

use super::request::Request;
use crate::error::{Error, Result};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::HeaderMap;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

/// Whole-request deadline applied by [`HttpTransport`]
pub const CLIENT_TIMEOUT: Duration = Duration::from_secs(60);

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

/// Sanitize response body for logging
/// Truncates long responses and strips control characters
pub(crate) fn sanitize_for_log(body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    let truncated = if text.len() > MAX_LOG_BODY_LENGTH {
        let mut end = MAX_LOG_BODY_LENGTH;
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... [truncated, {} bytes total]", &text[..end], body.len())
    } else {
        text.into_owned()
    };

    truncated.replace(|c: char| !c.is_ascii_graphic() && c != ' ', "")
}

/// A response whose body has been read in full
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Status, headers and body of a completed call.
///
/// `raw_result` always holds the body exactly as received. `result` holds
/// the decoded body when decoding was requested and succeeded.
#[derive(Debug, Clone)]
pub struct DetailedResponse<T = Value> {
    pub status_code: StatusCode,
    pub headers: HeaderMap,
    pub result: Option<T>,
    pub raw_result: Bytes,
}

impl DetailedResponse {
    /// Response envelope without a decoded result
    pub fn raw(response: HttpResponse) -> Self {
        Self {
            status_code: response.status,
            headers: response.headers,
            result: None,
            raw_result: response.body,
        }
    }
}

impl<T> DetailedResponse<T> {
    /// Raw body as text, lossily decoded
    pub fn raw_text(&self) -> String {
        String::from_utf8_lossy(&self.raw_result).into_owned()
    }
}

/// Something that can put a [`Request`] on the wire
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: Request) -> Result<HttpResponse>;
}

/// reqwest-backed transport
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Create a new transport.
    ///
    /// `insecure` disables TLS certificate verification.
    pub fn new(insecure: bool) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("manageiq-rs/", env!("CARGO_PKG_VERSION")))
            .timeout(CLIENT_TIMEOUT)
            .danger_accept_invalid_certs(insecure)
            .build()
            .map_err(|e| Error::config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    /// Wrap an already configured reqwest client
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }

    async fn execute(&self, mut request: Request) -> Result<HttpResponse> {
        let mut builder = self
            .client
            .request(request.method().clone(), request.url().clone())
            .headers(request.headers().clone());

        if let Some(timeout) = request.timeout() {
            builder = builder.timeout(timeout.min(CLIENT_TIMEOUT));
        }
        if let Some(form) = request.take_form() {
            builder = builder.multipart(form);
        } else if let Some(body) = request.take_body() {
            builder = builder.body(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?;

        tracing::debug!("{} {} -> {}", request.method(), request.url(), status);
        if !status.is_success() {
            tracing::debug!("Error body: {}", sanitize_for_log(&body));
        }

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: Request) -> Result<HttpResponse> {
        tracing::debug!("{} {}", request.method(), request.url());

        match request.cancellation().cloned() {
            Some(token) => {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => {
                        tracing::debug!("Request cancelled");
                        Err(Error::Cancelled)
                    }
                    result = self.execute(request) => result,
                }
            }
            None => self.execute(request).await,
        }
    }
}

/// Transport created on first use and shared afterwards
pub(crate) struct LazyTransport {
    insecure: bool,
    cell: OnceLock<Arc<dyn Transport>>,
}

impl LazyTransport {
    pub(crate) fn new(insecure: bool) -> Self {
        Self {
            insecure,
            cell: OnceLock::new(),
        }
    }

    pub(crate) fn with(transport: Arc<dyn Transport>) -> Self {
        let cell = OnceLock::new();
        let _ = cell.set(transport);
        Self {
            insecure: false,
            cell,
        }
    }

    pub(crate) fn get(&self) -> Result<Arc<dyn Transport>> {
        if let Some(transport) = self.cell.get() {
            return Ok(Arc::clone(transport));
        }
        let transport: Arc<dyn Transport> = Arc::new(HttpTransport::new(self.insecure)?);
        Ok(Arc::clone(self.cell.get_or_init(|| transport)))
    }
}
