//! Namespace chaining over a [`Client`]
//!
//! A proxy node accumulates dotted namespace segments so that `users.create`
//! can be reached as `root.child("users").invoke("create", args)`. Child nodes
//! are memoized, so navigating to the same name twice yields the same node.

use std::{
    collections::HashMap,
    fmt,
    sync::{Arc, Mutex, Weak},
};

use serde_json::Value;

use super::{lock, Client};
use crate::errors::JsonRpcError;

pub struct ServerProxy {
    client: Weak<Client>,
    namespace: String,
    children: Mutex<HashMap<String, Arc<ServerProxy>>>,
}

impl ServerProxy {
    pub(crate) fn new(client: Weak<Client>, namespace: impl Into<String>) -> Self {
        Self {
            client,
            namespace: namespace.into(),
            children: Mutex::new(HashMap::new()),
        }
    }

    /// Empty for the root node.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn qualify(&self, name: &str) -> String {
        format!("{}.{}", self.namespace, name)
            .trim_start_matches('.')
            .to_string()
    }

    pub fn child(&self, name: &str) -> Arc<ServerProxy> {
        let namespace = self.qualify(name);
        lock(&self.children)
            .entry(namespace)
            .or_insert_with_key(|namespace| {
                Arc::new(ServerProxy::new(self.client.clone(), namespace.as_str()))
            })
            .clone()
    }

    /// Follows each dot-separated segment of `path` through [`ServerProxy::child`].
    pub fn path(self: &Arc<Self>, path: &str) -> Arc<ServerProxy> {
        path.split('.')
            .filter(|segment| !segment.is_empty())
            .fold(Arc::clone(self), |node, segment| node.child(segment))
    }

    /// Calls `method` in this namespace. Only the first argument is forwarded
    /// as the call parameters; any further arguments are dropped.
    pub async fn invoke<I>(&self, method: &str, args: I) -> Result<Value, JsonRpcError>
    where
        I: IntoIterator<Item = Value>,
    {
        let params = args.into_iter().next();
        let client = self.client.upgrade().ok_or(JsonRpcError::ClientReleased)?;
        client.call(&self.qualify(method), params).await
    }
}

impl fmt::Debug for ServerProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerProxy")
            .field("namespace", &self.namespace)
            .finish_non_exhaustive()
    }
}
