//! Typed server-side dispatch for the stub wire protocol.
//!
//! The generated stubs send `POST <endpoint>` with a JSON body
//! `{ "id": "<function id>", "args": [...] }` and treat the JSON response as
//! the function's result. `Dispatcher` is the Rust counterpart of the
//! generated SDK: an explicit map from id to handler, built once and only
//! read afterwards.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::transform::IdentifierRegistry;

/// Errors that can occur while dispatching a call.
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("malformed request body: {0}")]
    MalformedRequest(#[from] serde_json::Error),
    #[error("unknown server function: {0}")]
    UnknownFunction(String),
    #[error("server function {id} failed: {source}")]
    Failed {
        id: String,
        #[source]
        source: anyhow::Error,
    },
}

/// Request body sent by a generated stub.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BffRequest {
    pub id: String,
    #[serde(default)]
    pub args: Vec<Value>,
}

impl BffRequest {
    pub fn new(id: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            id: id.into(),
            args,
        }
    }

    /// Parse a request from raw JSON bytes.
    pub fn from_slice(body: &[u8]) -> Result<Self, DispatchError> {
        Ok(serde_json::from_slice(body)?)
    }
}

/// A server function implementation. Arguments arrive positionally, unchecked.
pub type Handler = Box<dyn Fn(Vec<Value>) -> anyhow::Result<Value> + Send + Sync>;

/// Maps function ids to handlers.
#[derive(Default)]
pub struct Dispatcher {
    handlers: HashMap<String, Handler>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler. Returns false (and keeps the existing handler) if
    /// the id is already taken, matching the registry's first-wins rule.
    pub fn register<F>(&mut self, id: impl Into<String>, handler: F) -> bool
    where
        F: Fn(Vec<Value>) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        let id = id.into();
        if self.handlers.contains_key(&id) {
            tracing::warn!(%id, "handler already registered; keeping the first");
            return false;
        }
        self.handlers.insert(id, Box::new(handler));
        true
    }

    pub fn contains(&self, id: &str) -> bool {
        self.handlers.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Invoke a handler by id.
    pub fn invoke(&self, id: &str, args: Vec<Value>) -> Result<Value, DispatchError> {
        let handler = self
            .handlers
            .get(id)
            .ok_or_else(|| DispatchError::UnknownFunction(id.to_string()))?;
        tracing::debug!(%id, args = args.len(), "dispatching server function");
        handler(args).map_err(|source| DispatchError::Failed {
            id: id.to_string(),
            source,
        })
    }

    /// Handle a raw request body and return the JSON response value.
    pub fn handle(&self, body: &[u8]) -> Result<Value, DispatchError> {
        let request = BffRequest::from_slice(body)?;
        self.invoke(&request.id, request.args)
    }

    /// Ids captured during a pass that have no handler here.
    pub fn missing<'r>(&self, registry: &'r IdentifierRegistry) -> Vec<&'r str> {
        registry
            .records()
            .map(|r| r.id.as_str())
            .filter(|id| !self.contains(id))
            .collect()
    }
}
