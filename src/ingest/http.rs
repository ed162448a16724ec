//! Axum glue for receiving JSON-RPC requests over HTTP
//!
//! `HttpRequest` extracts a request from a POST body and keeps the headers it
//! arrived with; `rpc::Response` renders as a JSON body with a charset header.

use axum::{
    body::Bytes,
    extract::FromRequest,
    http::{header, HeaderMap},
    response::IntoResponse,
};

use crate::errors::JsonRpcError;
use crate::rpc::{Request, Response};

#[derive(Debug, Clone)]
pub struct HttpRequest {
    request: Request,
    headers: Vec<(String, String)>,
}

impl HttpRequest {
    pub fn from_parts(headers: &HeaderMap, body: &[u8]) -> Result<Self, JsonRpcError> {
        if body.is_empty() {
            return Err(JsonRpcError::Ingest("unable to read HTTP POST data"));
        }
        let raw = std::str::from_utf8(body)
            .map_err(|_| JsonRpcError::malformed_request("Failed to parse request"))?;

        let mut request = Request::default();
        request.load_json(raw)?;

        let headers = headers
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (display_header_name(name.as_str()), value.to_string()))
            })
            .collect();

        Ok(Self { request, headers })
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    pub fn into_request(self) -> Request {
        self.request
    }

    pub fn raw_request(&self) -> &str {
        self.request.raw_json().unwrap_or_default()
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Headers as `Name: value` lines followed by the raw JSON body.
    pub fn full_request(&self) -> String {
        let mut full = String::new();
        for (name, value) in &self.headers {
            full.push_str(name);
            full.push_str(": ");
            full.push_str(value);
            full.push('\n');
        }
        full.push_str(self.raw_request());
        full
    }
}

fn display_header_name(name: &str) -> String {
    name.split('-')
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => {
                    let mut word = first.to_ascii_uppercase().to_string();
                    word.push_str(&chars.as_str().to_ascii_lowercase());
                    word
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join("-")
}

impl<S> FromRequest<S> for HttpRequest
where
    S: Send + Sync,
{
    type Rejection = JsonRpcError;

    async fn from_request(req: axum::extract::Request, state: &S) -> Result<Self, Self::Rejection> {
        let headers = req.headers().clone();
        let body = Bytes::from_request(req, state)
            .await
            .map_err(|_| JsonRpcError::Ingest("unable to read HTTP POST data"))?;
        Self::from_parts(&headers, &body)
    }
}

impl IntoResponse for Response {
    fn into_response(self) -> axum::response::Response {
        let content_type = format!(
            "application/json; charset={}",
            self.encoding().to_ascii_lowercase()
        );
        ([(header::CONTENT_TYPE, content_type)], self.save_json()).into_response()
    }
}
