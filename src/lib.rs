pub mod client;
pub mod config;
pub mod errors;
pub mod ingest;
pub mod logging;
pub mod rpc;

pub use client::{Client, HttpTransport, ServerProxy, Transport};
pub use errors::{Fault, JsonRpcError};
pub use rpc::{Params, Request, Response, ResultType};
