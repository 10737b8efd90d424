//! # RPC
//!
//! Named synchronous operations between subsystems (`block.propose`).
//!
//! Requests and responses travel as JSON values so that handlers and callers
//! only share the request/response types, never each other's crates.

use crate::error::BusError;
use crate::DEFAULT_RPC_TIMEOUT;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

/// Server-side handler for one RPC method.
#[async_trait]
pub trait RpcHandler: Send + Sync {
    async fn handle(&self, request: Value) -> Result<Value, BusError>;
}

/// Caller side of the RPC gateway.
#[async_trait]
pub trait RpcClient: Send + Sync {
    /// Invoke `method`, bounded by the gateway's call timeout.
    async fn call(&self, method: &str, request: Value) -> Result<Value, BusError>;
}

/// In-process RPC registry.
pub struct RpcServer {
    handlers: RwLock<HashMap<String, Arc<dyn RpcHandler>>>,
    timeout: Duration,
}

impl RpcServer {
    #[must_use]
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_RPC_TIMEOUT)
    }

    #[must_use]
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            handlers: RwLock::new(HashMap::new()),
            timeout,
        }
    }

    /// Register the handler for `method`. A method has at most one handler.
    pub fn register(&self, method: &str, handler: Arc<dyn RpcHandler>) -> Result<(), BusError> {
        let mut handlers = self
            .handlers
            .write()
            .map_err(|_| BusError::Transport("handler table poisoned".to_string()))?;

        if handlers.contains_key(method) {
            return Err(BusError::HandlerExists(method.to_string()));
        }
        handlers.insert(method.to_string(), handler);
        debug!(method, "RPC handler registered");
        Ok(())
    }

    /// Whether a handler is registered for `method`.
    #[must_use]
    pub fn is_registered(&self, method: &str) -> bool {
        self.handlers
            .read()
            .map(|handlers| handlers.contains_key(method))
            .unwrap_or(false)
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn handler(&self, method: &str) -> Result<Arc<dyn RpcHandler>, BusError> {
        let handlers = self
            .handlers
            .read()
            .map_err(|_| BusError::Transport("handler table poisoned".to_string()))?;
        handlers
            .get(method)
            .cloned()
            .ok_or_else(|| BusError::NoHandler(method.to_string()))
    }
}

impl Default for RpcServer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RpcClient for RpcServer {
    async fn call(&self, method: &str, request: Value) -> Result<Value, BusError> {
        let handler = self.handler(method)?;
        let request_id = Uuid::new_v4();
        debug!(method, %request_id, "RPC call");

        match tokio::time::timeout(self.timeout, handler.handle(request)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(method, %request_id, timeout_ms = self.timeout.as_millis() as u64, "RPC call timed out");
                Err(BusError::Timeout {
                    method: method.to_string(),
                    timeout_ms: self.timeout.as_millis() as u64,
                })
            }
        }
    }
}

/// Typed convenience over [`RpcClient::call`].
pub async fn call_typed<C, Req, Resp>(client: &C, method: &str, request: &Req) -> Result<Resp, BusError>
where
    C: RpcClient + ?Sized,
    Req: Serialize + Sync,
    Resp: DeserializeOwned,
{
    let request = serde_json::to_value(request)?;
    let response = client.call(method, request).await?;
    Ok(serde_json::from_value(response)?)
}
