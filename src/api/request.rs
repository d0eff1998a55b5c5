//! Request building
//!
//! [`RequestBuilder`] resolves a base URL plus a templated path into a full
//! URL, collects headers, query parameters and a body, and produces a
//! transport-ready [`Request`].

use crate::error::{Error, Result};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Method};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use url::Url;

const ERRORMSG_SERVICE_URL_MISSING: &str = "service base URL is empty";
const ERRORMSG_URL_UNRESOLVED: &str = "request URL has not been resolved";

/// Contents of one multi-part form entry
#[derive(Debug, Clone)]
pub enum FormContents {
    Bytes(Vec<u8>),
    Text(String),
    /// Read from disk when the request is built
    File(PathBuf),
}

/// One multi-part form entry
#[derive(Debug, Clone)]
pub struct FormData {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub contents: FormContents,
}

/// Builder for a single API request
#[derive(Debug)]
pub struct RequestBuilder {
    method: Method,
    url: Option<Url>,
    headers: Vec<(String, String)>,
    query: BTreeMap<String, Vec<String>>,
    form: BTreeMap<String, Vec<FormData>>,
    body: Option<Body>,
    timeout: Option<Duration>,
    cancellation: Option<CancellationToken>,
}

impl RequestBuilder {
    /// Start a new request with the given method
    pub fn new(method: Method) -> Self {
        Self {
            method,
            url: None,
            headers: Vec::new(),
            query: BTreeMap::new(),
            form: BTreeMap::new(),
            body: None,
            timeout: None,
            cancellation: None,
        }
    }

    /// The resolved URL, if [`resolve_request_url`](Self::resolve_request_url) succeeded
    pub fn url(&self) -> Option<&Url> {
        self.url.as_ref()
    }

    /// Resolve `path` against `service_url` and store the result.
    ///
    /// Every `{name}` in `path` is replaced by the percent-encoded value of
    /// `name` in `path_params`. The base and the path are joined with exactly
    /// one `/` between them.
    pub fn resolve_request_url(
        &mut self,
        service_url: &str,
        path: &str,
        path_params: &[(&str, &str)],
    ) -> Result<&mut Self> {
        if service_url.is_empty() {
            return Err(Error::url(ERRORMSG_SERVICE_URL_MISSING));
        }

        let mut url_string = service_url.to_string();

        if !path.is_empty() {
            let mut path = path.to_string();
            for (name, value) in path_params {
                if value.is_empty() {
                    return Err(Error::url(format!("path parameter '{}' is empty", name)));
                }
                let reference = format!("{{{}}}", name);
                path = path.replace(&reference, &urlencoding::encode(value));
            }

            if let Some(name) = unresolved_placeholder(&path) {
                return Err(Error::url(format!("path parameter '{}' is missing", name)));
            }

            url_string = format!(
                "{}/{}",
                service_url.trim_end_matches('/'),
                path.trim_start_matches('/')
            );
        }

        let url = Url::parse(&url_string)
            .map_err(|e| Error::url(format!("error parsing service base URL: {}", e)))?;

        self.url = Some(url);
        Ok(self)
    }

    /// Set a header, replacing any earlier value of the same name
    pub fn add_header(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        let name = name.into();
        self.headers.retain(|(existing, _)| !existing.eq_ignore_ascii_case(&name));
        self.headers.push((name, value.into()));
        self
    }

    /// Add a query parameter; repeated names accumulate
    pub fn add_query(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.query.entry(name.into()).or_default().push(value.into());
        self
    }

    /// Add every pair in `queries`
    pub fn add_queries<K, V>(&mut self, queries: impl IntoIterator<Item = (K, V)>) -> &mut Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        for (name, value) in queries {
            self.add_query(name, value);
        }
        self
    }

    /// Register a multi-part form entry.
    ///
    /// With an empty `file_name` and [`FormContents::File`], the file name is
    /// taken from the last component of the path.
    pub fn add_form_data(
        &mut self,
        field_name: impl Into<String>,
        file_name: &str,
        content_type: &str,
        contents: FormContents,
    ) -> &mut Self {
        let mut file_name = (!file_name.is_empty()).then(|| file_name.to_string());
        if file_name.is_none() {
            if let FormContents::File(path) = &contents {
                file_name = path
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned());
            }
        }

        self.form.entry(field_name.into()).or_default().push(FormData {
            file_name,
            content_type: (!content_type.is_empty()).then(|| content_type.to_string()),
            contents,
        });
        self
    }

    /// Serialize `content` as the JSON request body
    pub fn set_body_content_json<T: Serialize + ?Sized>(&mut self, content: &T) -> Result<&mut Self> {
        let bytes = serde_json::to_vec(content).map_err(Error::Serialization)?;
        self.body = Some(Body::from(bytes));
        Ok(self.add_header(CONTENT_TYPE.as_str(), "application/json"))
    }

    /// Use raw bytes as the request body
    pub fn set_body_bytes(&mut self, bytes: impl Into<bytes::Bytes>) -> &mut Self {
        self.body = Some(Body::from(bytes.into()));
        self
    }

    /// Use a streamed body, e.g. a `tokio::fs::File` or [`reqwest::Body::wrap_stream`]
    pub fn set_body_stream(&mut self, body: impl Into<Body>) -> &mut Self {
        self.body = Some(body.into());
        self
    }

    /// Attach a token that aborts the request when cancelled
    pub fn with_cancellation(&mut self, token: CancellationToken) -> &mut Self {
        self.cancellation = Some(token);
        self
    }

    /// Attach a deadline for this request only
    pub fn with_timeout(&mut self, timeout: Duration) -> &mut Self {
        self.timeout = Some(timeout);
        self
    }

    /// Produce the transport-ready request
    pub fn build(self) -> Result<Request> {
        let Some(mut url) = self.url else {
            return Err(Error::url(ERRORMSG_URL_UNRESOLVED));
        };

        let mut headers = HeaderMap::new();
        for (name, value) in &self.headers {
            let header_name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| Error::invalid_request(format!("header name '{}': {}", name, e)))?;
            let header_value = HeaderValue::from_str(value)
                .map_err(|e| Error::invalid_request(format!("header '{}': {}", name, e)))?;
            headers.insert(header_name, header_value);
        }

        if !self.query.is_empty() {
            let mut query: BTreeMap<String, Vec<String>> = BTreeMap::new();
            for (name, value) in url.query_pairs() {
                query.entry(name.into_owned()).or_default().push(value.into_owned());
            }
            for (name, values) in self.query {
                query.entry(name).or_default().extend(values);
            }

            url.set_query(None);
            let mut pairs = url.query_pairs_mut();
            for (name, values) in &query {
                for value in values {
                    pairs.append_pair(name, value);
                }
            }
        }

        let form = if self.form.is_empty() {
            None
        } else {
            Some(build_form(self.form)?)
        };

        Ok(Request {
            method: self.method,
            url,
            headers,
            body: if form.is_some() { None } else { self.body },
            form,
            timeout: self.timeout,
            cancellation: self.cancellation,
        })
    }
}

fn build_form(entries: BTreeMap<String, Vec<FormData>>) -> Result<Form> {
    let mut form = Form::new();
    for (field_name, parts) in entries {
        for data in parts {
            let bytes = match data.contents {
                FormContents::Bytes(bytes) => bytes,
                FormContents::Text(text) => text.into_bytes(),
                FormContents::File(path) => std::fs::read(&path)?,
            };

            let mut part = Part::bytes(bytes);
            if let Some(file_name) = data.file_name {
                part = part.file_name(file_name);
            }
            if let Some(content_type) = data.content_type {
                part = part.mime_str(&content_type).map_err(|e| {
                    Error::invalid_request(format!("content type '{}': {}", content_type, e))
                })?;
            }
            form = form.part(field_name.clone(), part);
        }
    }
    Ok(form)
}

/// Name of the first `{name}` placeholder left in `path`
fn unresolved_placeholder(path: &str) -> Option<&str> {
    let start = path.find('{')?;
    let rest = &path[start + 1..];
    let end = rest.find('}')?;
    Some(&rest[..end])
}

/// A fully resolved request, ready for a [`Transport`](super::http::Transport)
#[derive(Debug)]
pub struct Request {
    method: Method,
    url: Url,
    headers: HeaderMap,
    body: Option<Body>,
    form: Option<Form>,
    timeout: Option<Duration>,
    cancellation: Option<CancellationToken>,
}

impl Request {
    /// A bare request with no headers or body
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            body: None,
            form: None,
            timeout: None,
            cancellation: None,
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Header value as a string, if present and valid UTF-8
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Set a header, replacing any earlier value
    pub fn set_header(&mut self, name: HeaderName, value: &str) -> Result<()> {
        let value = HeaderValue::from_str(value)
            .map_err(|e| Error::invalid_request(format!("header '{}': {}", name, e)))?;
        self.headers.insert(name, value);
        Ok(())
    }

    /// Set a header whose value must never show up in debug output
    pub fn set_sensitive_header(&mut self, name: HeaderName, value: &str) -> Result<()> {
        let mut value = HeaderValue::from_str(value)
            .map_err(|e| Error::invalid_request(format!("header '{}': {}", name, e)))?;
        value.set_sensitive(true);
        self.headers.insert(name, value);
        Ok(())
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn cancellation(&self) -> Option<&CancellationToken> {
        self.cancellation.as_ref()
    }

    pub fn has_body(&self) -> bool {
        self.body.is_some() || self.form.is_some()
    }

    /// Move the raw body out of the request
    pub fn take_body(&mut self) -> Option<Body> {
        self.body.take()
    }

    /// Move the multi-part form out of the request
    pub fn take_form(&mut self) -> Option<Form> {
        self.form.take()
    }
}
