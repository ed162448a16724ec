//! JSON-RPC client orchestration
//!
//! Builds a request per call, hands it to the transport, validates the reply
//! against the request id and surfaces the decoded body.

#[cfg(test)]
pub(crate) mod mock;
pub mod proxy;
pub mod transport;

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Instant,
};

use serde_json::Value;
use tracing::{debug, warn};

use crate::errors::JsonRpcError;
use crate::logging;
use crate::rpc::{Request, Response, ResultType};

pub use proxy::ServerProxy;
pub use transport::{HttpTransport, Transport, TransportError, TransportReply};

pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";
pub const DEFAULT_USER_AGENT: &str = concat!("jsonrpc-proxy-client/", env!("CARGO_PKG_VERSION"));

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Exchanges on one client are serialized by the transport lock; the last
/// request and response slots are overwritten by every call.
pub struct Client {
    server_address: String,
    transport: tokio::sync::Mutex<Option<Box<dyn Transport>>>,
    result_type: ResultType,
    last_request: Mutex<Option<Request>>,
    last_response: Mutex<Option<Response>>,
    proxy_cache: Mutex<HashMap<String, Arc<ServerProxy>>>,
}

impl Client {
    /// An [`HttpTransport`] is built on the first call.
    pub fn new(server_address: impl Into<String>) -> Self {
        Self::build(server_address.into(), None)
    }

    pub fn with_transport(
        server_address: impl Into<String>,
        transport: impl Transport + 'static,
    ) -> Self {
        Self::build(server_address.into(), Some(Box::new(transport)))
    }

    fn build(server_address: String, transport: Option<Box<dyn Transport>>) -> Self {
        Self {
            server_address,
            transport: tokio::sync::Mutex::new(transport),
            result_type: ResultType::default(),
            last_request: Mutex::new(None),
            last_response: Mutex::new(None),
            proxy_cache: Mutex::new(HashMap::new()),
        }
    }

    /// Sets the reply shape. Applied before the client is shared, since
    /// `proxy()` needs it behind an `Arc`.
    pub fn with_result_type(mut self, result_type: ResultType) -> Self {
        self.result_type = result_type;
        self
    }

    pub fn result_type(&self) -> ResultType {
        self.result_type
    }

    pub fn server_address(&self) -> &str {
        &self.server_address
    }

    pub async fn set_transport(&self, transport: impl Transport + 'static) {
        *self.transport.lock().await = Some(Box::new(transport));
    }

    pub fn last_request(&self) -> Option<Request> {
        lock(&self.last_request).clone()
    }

    pub fn last_response(&self) -> Option<Response> {
        lock(&self.last_response).clone()
    }

    /// Returns the cached proxy for `namespace`, creating it on first use.
    pub fn proxy(self: &Arc<Self>, namespace: &str) -> Arc<ServerProxy> {
        lock(&self.proxy_cache)
            .entry(namespace.to_string())
            .or_insert_with(|| Arc::new(ServerProxy::new(Arc::downgrade(self), namespace)))
            .clone()
    }

    /// Calls `method` and returns the whole decoded reply body.
    pub async fn call(&self, method: &str, params: Option<Value>) -> Result<Value, JsonRpcError> {
        let request = Request::new(method, params);
        if let Some(fault) = request.fault() {
            return Err(JsonRpcError::InvalidMethod(fault.clone()));
        }

        let response = self.do_request(request, None).await?;
        Ok(response.into_return_value().unwrap_or(Value::Null))
    }

    /// Sends `request` and loads the reply into `response`, or into a new
    /// [`Response`] when none is supplied. Either way the response is seeded
    /// with the request id before parsing.
    pub async fn do_request(
        &self,
        request: Request,
        response: Option<Response>,
    ) -> Result<Response, JsonRpcError> {
        let started_at = Instant::now();
        let method = request.method().unwrap_or_default().to_string();
        *lock(&self.last_request) = Some(request.clone());

        let mut transport_slot = self.transport.lock().await;
        let transport = transport_slot
            .get_or_insert_with(|| Box::new(HttpTransport::new()) as Box<dyn Transport>);

        if transport.endpoint().is_none() {
            transport.set_endpoint(&self.server_address);
        }
        let target = transport
            .endpoint()
            .unwrap_or(self.server_address.as_str())
            .to_string();

        transport
            .set_headers(&[
                ("Content-Type", JSON_CONTENT_TYPE),
                ("Accept", "application/json"),
            ])
            .map_err(|err| transport_failure(&target, err))?;
        if transport.header("user-agent").is_none() {
            transport
                .set_headers(&[("User-Agent", DEFAULT_USER_AGENT)])
                .map_err(|err| transport_failure(&target, err))?;
        }

        debug!(
            method = %method,
            id = %request.id(),
            endpoint = %target,
            "dispatching json-rpc request"
        );

        let reply = match transport.post(request.save_json()).await {
            Ok(reply) => reply,
            Err(err) => {
                logging::call_summary(&method, request.id(), None, started_at);
                warn!(endpoint = %target, error = %err, "json-rpc transport failed");
                return Err(transport_failure(&target, err));
            }
        };
        drop(transport_slot);

        logging::call_summary(&method, request.id(), Some(reply.status), started_at);

        if !reply.is_success() {
            warn!(
                endpoint = %target,
                status = reply.status,
                "json-rpc endpoint returned a non-success status"
            );
            return Err(JsonRpcError::HttpStatus {
                status: reply.status,
                message: reply.status_message,
            });
        }

        let mut response = response.unwrap_or_else(|| Response::new(request.id(), None));
        response.set_id(request.id());
        let loaded = response.load_json(&reply.body, self.result_type);
        *lock(&self.last_response) = Some(response.clone());
        loaded?;

        Ok(response)
    }
}

fn transport_failure(target: &str, err: TransportError) -> JsonRpcError {
    match err {
        TransportError::Connect(message) => JsonRpcError::Connection {
            target: target.to_string(),
            message,
        },
        TransportError::InvalidHeader { name } => JsonRpcError::InvalidHeader { name },
    }
}
