use std::io::{self, Read};

use crate::errors::JsonRpcError;
use crate::rpc::Request;

/// Reads the whole stream and parses it as a request. The raw text stays
/// available through [`Request::raw_json`].
pub fn read_request<R: Read>(mut reader: R) -> Result<Request, JsonRpcError> {
    let mut raw = String::new();
    reader.read_to_string(&mut raw)?;
    if raw.trim().is_empty() {
        return Err(JsonRpcError::Ingest("no request data on input stream"));
    }

    let mut request = Request::default();
    request.load_json(&raw)?;
    Ok(request)
}

pub fn from_stdin() -> Result<Request, JsonRpcError> {
    read_request(io::stdin().lock())
}
