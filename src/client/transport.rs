//! Transport seam used by the client
//!
//! A transport takes a serialized request body and returns the raw reply, or a
//! connection-level failure. `HttpTransport` is the default, built on reqwest.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use thiserror::Error;

use crate::config::ClientConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportReply {
    pub status: u16,
    pub status_message: String,
    pub body: String,
}

impl TransportReply {
    pub fn new(status: u16, status_message: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            status,
            status_message: status_message.into(),
            body: body.into(),
        }
    }

    /// Informational and 2xx statuses count as success.
    pub fn is_success(&self) -> bool {
        matches!(self.status / 100, 1 | 2)
    }
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("{0}")]
    Connect(String),
    #[error("invalid header {name}")]
    InvalidHeader { name: String },
}

#[async_trait]
pub trait Transport: Send + Sync {
    fn endpoint(&self) -> Option<&str>;

    fn set_endpoint(&mut self, endpoint: &str);

    /// Header lookup is case-insensitive.
    fn header(&self, name: &str) -> Option<&str>;

    fn set_headers(&mut self, headers: &[(&str, &str)]) -> Result<(), TransportError>;

    async fn post(&mut self, body: String) -> Result<TransportReply, TransportError>;
}

#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: Option<String>,
    headers: HeaderMap,
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpTransport {
    pub fn new() -> Self {
        Self::with_client(reqwest::Client::new())
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client,
            endpoint: None,
            headers: HeaderMap::new(),
        }
    }

    /// Applies the configured endpoint, timeout and user agent.
    pub fn from_config(config: &ClientConfig) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|err| TransportError::Connect(err.to_string()))?;

        let mut transport = Self::with_client(client);
        transport.set_endpoint(&config.server_url);
        if let Some(user_agent) = config.user_agent.as_deref() {
            transport.set_headers(&[("User-Agent", user_agent)])?;
        }
        Ok(transport)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    fn endpoint(&self) -> Option<&str> {
        self.endpoint.as_deref()
    }

    fn set_endpoint(&mut self, endpoint: &str) {
        self.endpoint = Some(endpoint.to_string());
    }

    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(name)
            .and_then(|value| value.to_str().ok())
    }

    fn set_headers(&mut self, headers: &[(&str, &str)]) -> Result<(), TransportError> {
        for (name, value) in headers {
            let invalid = || TransportError::InvalidHeader {
                name: name.to_string(),
            };
            let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| invalid())?;
            let header_value = HeaderValue::from_str(value).map_err(|_| invalid())?;
            self.headers.insert(header_name, header_value);
        }
        Ok(())
    }

    async fn post(&mut self, body: String) -> Result<TransportReply, TransportError> {
        let endpoint = self
            .endpoint
            .as_deref()
            .ok_or_else(|| TransportError::Connect("no endpoint configured".to_string()))?;

        let response = self
            .client
            .post(endpoint)
            .headers(self.headers.clone())
            .body(body)
            .send()
            .await
            .map_err(|err| TransportError::Connect(err.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| TransportError::Connect(err.to_string()))?;

        Ok(TransportReply::new(
            status.as_u16(),
            status.canonical_reason().unwrap_or_default(),
            body,
        ))
    }
}
