//! JSON-RPC envelope types
//!
//! Request construction and validation, and response correlation by id.

pub mod request;
pub mod response;

pub use request::{Params, Request};
pub use response::{Response, ResultType};

pub const JSONRPC_VERSION: &str = "2.0";
pub const DEFAULT_ENCODING: &str = "UTF-8";
