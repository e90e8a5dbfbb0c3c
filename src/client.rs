//! HTTP access to the OpenCode Server.
//!
//! Tool handlers only describe the call they want as an [`ApiRequest`];
//! anything implementing [`Backend`] carries it out. [`ApiClient`] is the
//! real implementation over `reqwest`.

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::{Method, Url};
use serde_json::Value;
use thiserror::Error;

use crate::config::ClientConfig;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("API error [{status}]: {body}")]
    Status { status: u16, body: String },
    #[error("invalid server URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("invalid path segment {0:?}")]
    InvalidSegment(String),
}

/// A single backend call: method, path segments, query pairs and optional
/// JSON body.
///
/// Segments are kept unencoded; [`ApiClient`] percent-encodes each one as it
/// builds the URL, so a value containing `/`, `?` or `#` stays inside its
/// segment.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub segments: Vec<String>,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl ApiRequest {
    /// `route` is a fixed API path such as `/session/status`.
    fn new(method: Method, route: &str) -> Self {
        Self {
            method,
            segments: route
                .split('/')
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn get(route: &str) -> Self {
        Self::new(Method::GET, route)
    }

    pub fn post(route: &str, body: Value) -> Self {
        Self {
            body: Some(body),
            ..Self::new(Method::POST, route)
        }
    }

    pub fn delete(route: &str) -> Self {
        Self::new(Method::DELETE, route)
    }

    /// Append one path segment taken verbatim from a caller-supplied value.
    pub fn segment(mut self, value: impl Into<String>) -> Self {
        self.segments.push(value.into());
        self
    }

    /// Unencoded path, for logs and assertions.
    pub fn path(&self) -> String {
        format!("/{}", self.segments.join("/"))
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }
}

/// Something that can execute an [`ApiRequest`] and hand back the raw
/// response body.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn send(&self, request: &ApiRequest) -> Result<String, ClientError>;
}

/// `reqwest`-backed client for the OpenCode Server API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: Url,
    credentials: Option<(String, String)>,
    http: reqwest::Client,
}

impl ApiClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let raw = config.base_url();
        let base_url = Url::parse(&raw).map_err(|e| ClientError::InvalidUrl {
            url: raw.clone(),
            reason: e.to_string(),
        })?;

        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        let credentials = config
            .credentials()
            .map(|(user, pass)| (user.to_string(), pass.to_string()));

        Ok(Self {
            base_url,
            credentials,
            http,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `.` and `..` are refused rather than resolved against the route.
    fn url(&self, request: &ApiRequest) -> Result<Url, ClientError> {
        if let Some(seg) = request.segments.iter().find(|s| is_dot_segment(s)) {
            return Err(ClientError::InvalidSegment(seg.clone()));
        }
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ClientError::InvalidUrl {
                url: self.base_url.to_string(),
                reason: "cannot be a base URL".into(),
            })?
            .pop_if_empty()
            .extend(&request.segments);
        Ok(url)
    }
}

pub fn is_dot_segment(segment: &str) -> bool {
    matches!(segment, "." | "..")
}

#[async_trait]
impl Backend for ApiClient {
    async fn send(&self, request: &ApiRequest) -> Result<String, ClientError> {
        let url = self.url(request)?;
        let mut builder = self
            .http
            .request(request.method.clone(), url)
            .header(ACCEPT, "application/json");

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        if let Some((user, pass)) = &self.credentials {
            builder = builder.basic_auth(user, Some(pass));
        }

        tracing::debug!(method = %request.method, path = %request.path(), "backend request");
        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if status.is_client_error() || status.is_server_error() {
            return Err(ClientError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }
}
