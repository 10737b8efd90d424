//! Test doubles for crates that publish to the bus or call RPC methods.

use crate::error::BusError;
use crate::events::{BusPayload, Envelope};
use crate::publisher::MessagePublisher;
use crate::rpc::RpcClient;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Mutex;

/// Publisher that records every envelope.
#[derive(Default)]
pub struct RecordingPublisher {
    published: Mutex<Vec<Envelope>>,
}

impl RecordingPublisher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn published(&self) -> Vec<Envelope> {
        self.published
            .lock()
            .map(|p| p.clone())
            .unwrap_or_default()
    }

    /// Envelopes published under one topic.
    #[must_use]
    pub fn on_topic(&self, topic: &str) -> Vec<Envelope> {
        self.published()
            .into_iter()
            .filter(|e| e.topic == topic)
            .collect()
    }

    #[must_use]
    pub fn count(&self) -> usize {
        self.published.lock().map(|p| p.len()).unwrap_or(0)
    }
}

#[async_trait]
impl MessagePublisher for RecordingPublisher {
    async fn publish(
        &self,
        exchange: &str,
        topic: &str,
        payload: BusPayload,
    ) -> Result<(), BusError> {
        if let Ok(mut published) = self.published.lock() {
            published.push(Envelope {
                exchange: exchange.to_string(),
                topic: topic.to_string(),
                payload,
            });
        }
        Ok(())
    }
}

/// Publisher whose every publish fails with a transport error.
#[derive(Default)]
pub struct FailingPublisher;

#[async_trait]
impl MessagePublisher for FailingPublisher {
    async fn publish(
        &self,
        _exchange: &str,
        _topic: &str,
        _payload: BusPayload,
    ) -> Result<(), BusError> {
        Err(BusError::Transport("connection refused".to_string()))
    }
}

/// RPC client that records calls and answers with a fixed result.
pub struct RecordingRpcClient {
    calls: Mutex<Vec<(String, Value)>>,
    response: Result<Value, BusError>,
}

impl RecordingRpcClient {
    /// Client answering every call with `Value::Null`.
    #[must_use]
    pub fn new() -> Self {
        Self::responding(Ok(Value::Null))
    }

    #[must_use]
    pub fn responding(response: Result<Value, BusError>) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            response,
        }
    }

    #[must_use]
    pub fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

impl Default for RecordingRpcClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RpcClient for RecordingRpcClient {
    async fn call(&self, method: &str, request: Value) -> Result<Value, BusError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((method.to_string(), request));
        }
        self.response.clone()
    }
}
