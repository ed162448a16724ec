//! Server-side request ingestion
//!
//! Adapters that read raw JSON from standard input or an HTTP request body and
//! feed it into `Request::load_json`.

pub mod http;
pub mod stdin;

pub use http::HttpRequest;
