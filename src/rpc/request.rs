//! Outbound JSON-RPC request envelope
//!
//! Holds the method, parameters and correlation id of a single call, validates
//! method names and encodes the canonical JSON-RPC 2.0 request shape.

use std::{
    fmt,
    sync::{
        atomic::{AtomicU64, Ordering},
        OnceLock,
    },
};

use chrono::Utc;
use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::errors::{Fault, JsonRpcError};
use crate::rpc::{DEFAULT_ENCODING, JSONRPC_VERSION};

static ID_SEQUENCE: AtomicU64 = AtomicU64::new(0);

fn method_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9_.:/]+$").expect("method name pattern"))
}

pub fn is_valid_method_name(method: &str) -> bool {
    method_pattern().is_match(method)
}

/// Time based token, suffixed with a per-process sequence so two ids generated
/// within the same microsecond still differ.
pub fn generate_id() -> String {
    let now = Utc::now();
    let sequence = ID_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    format!(
        "{:08x}{:05x}{:x}",
        now.timestamp(),
        now.timestamp_subsec_micros(),
        sequence
    )
}

/// Call parameters, either positional or named.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Params {
    Positional(Vec<Value>),
    Named(Map<String, Value>),
}

impl Default for Params {
    fn default() -> Self {
        Self::Positional(Vec::new())
    }
}

impl Params {
    /// Adopts arrays and objects verbatim, wraps anything else as a single
    /// positional parameter.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Array(values) => Self::Positional(values),
            Value::Object(map) => Self::Named(map),
            other => Self::Positional(vec![other]),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Positional(values) => values.len(),
            Self::Named(map) => map.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Appends a value. Named parameters receive the next free integer key.
    pub fn push(&mut self, value: Value) {
        match self {
            Self::Positional(values) => values.push(value),
            Self::Named(map) => {
                let next = map
                    .keys()
                    .filter_map(|key| key.parse::<u64>().ok())
                    .max()
                    .map_or(0, |max| max + 1);
                map.insert(next.to_string(), value);
            }
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Self::Positional(values) => Value::Array(values.clone()),
            Self::Named(map) => Value::Object(map.clone()),
        }
    }
}

#[derive(Serialize)]
struct RequestEnvelope<'a> {
    jsonrpc: &'static str,
    method: Option<&'a str>,
    id: &'a str,
    #[serde(skip_serializing_if = "params_absent")]
    params: &'a Params,
}

fn params_absent(params: &&Params) -> bool {
    params.is_empty()
}

#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    encoding: String,
    method: Option<String>,
    id: String,
    params: Params,
    raw: Option<String>,
    fault: Option<Fault>,
}

impl Default for Request {
    fn default() -> Self {
        Self {
            encoding: DEFAULT_ENCODING.to_string(),
            method: None,
            id: generate_id(),
            params: Params::default(),
            raw: None,
            fault: None,
        }
    }
}

impl Request {
    /// Builds a request with a freshly generated id. An invalid `method` leaves
    /// the method unset and records a fault, see [`Request::fault`]. A `null`
    /// argument counts as no params.
    pub fn new(method: &str, params: Option<Value>) -> Self {
        let mut request = Self::default();
        request.set_method(method);
        if let Some(params) = params.filter(|params| !params.is_null()) {
            request.set_params([params]);
        }
        request
    }

    pub fn encoding(&self) -> &str {
        &self.encoding
    }

    pub fn set_encoding(&mut self, encoding: impl Into<String>) -> &mut Self {
        self.encoding = encoding.into();
        self
    }

    /// Returns `false` and records a fault instead of failing when `method`
    /// contains characters outside `[A-Za-z0-9_.:/]`.
    pub fn set_method(&mut self, method: &str) -> bool {
        if !is_valid_method_name(method) {
            self.fault = Some(Fault::invalid_method(method, &self.encoding));
            return false;
        }

        self.method = Some(method.to_string());
        true
    }

    pub fn method(&self) -> Option<&str> {
        self.method.as_deref()
    }

    pub fn fault(&self) -> Option<&Fault> {
        self.fault.as_ref()
    }

    /// `None` generates a new id.
    pub fn set_id(&mut self, id: Option<String>) -> &mut Self {
        self.id = id.unwrap_or_else(generate_id);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn add_param(&mut self, value: Value) {
        self.params.push(value);
    }

    /// With no arguments this is a no-op. A single array or object argument
    /// becomes the parameter list verbatim; otherwise the arguments themselves
    /// are the positional parameters, in order.
    pub fn set_params<I>(&mut self, args: I)
    where
        I: IntoIterator<Item = Value>,
    {
        let mut args: Vec<Value> = args.into_iter().collect();
        match args.len() {
            0 => {}
            1 if args[0].is_array() || args[0].is_object() => {
                self.params = Params::from_value(args.remove(0));
            }
            _ => self.params = Params::Positional(args),
        }
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Raw text retained by the last successful [`Request::load_json`].
    pub fn raw_json(&self) -> Option<&str> {
        self.raw.as_deref()
    }

    /// Populates the request from incoming JSON text. The method is taken as
    /// sent, without name validation, and a numeric method becomes its decimal
    /// text; an `id` is adopted when present.
    pub fn load_json(&mut self, raw: &str) -> Result<(), JsonRpcError> {
        let parsed: Value = serde_json::from_str(raw)
            .map_err(|_| JsonRpcError::malformed_request("Failed to parse request"))?;

        let method = match parsed.get("method") {
            Some(Value::String(method)) if !method.is_empty() => method.clone(),
            Some(Value::Number(method)) => method.to_string(),
            None | Some(Value::Null) | Some(Value::String(_)) => {
                return Err(JsonRpcError::invalid_request(
                    "Invalid request. No method passed",
                ))
            }
            Some(_) => {
                return Err(JsonRpcError::invalid_request(
                    "Invalid request. method must be a string",
                ))
            }
        };
        self.method = Some(method);

        match parsed.get("id") {
            Some(Value::String(id)) => self.id = id.clone(),
            Some(Value::Number(id)) => self.id = id.to_string(),
            _ => {}
        }

        if let Some(params) = parsed.get("params").filter(|params| !is_empty_value(params)) {
            self.params = Params::from_value(params.clone());
        }

        self.raw = Some(raw.to_string());
        Ok(())
    }

    /// Encodes `jsonrpc`, `method`, `id` and, when non-empty, `params`, in that order.
    pub fn save_json(&self) -> String {
        let envelope = RequestEnvelope {
            jsonrpc: JSONRPC_VERSION,
            method: self.method.as_deref(),
            id: &self.id,
            params: &self.params,
        };
        serde_json::to_string(&envelope).expect("json-rpc request serialization")
    }
}

fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Array(values) => values.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.save_json())
    }
}
