//! The dispatch RPC contract to a render node.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::model::Id;
use crate::Result;

/// What the assignment loop hands a worker once a command is bound:
/// inherited and own arguments/environment already flattened.
#[derive(Debug, Clone)]
pub struct DispatchRequest {
    pub command_id: Id,
    pub runner: String,
    pub arguments: HashMap<String, String>,
    pub environment: HashMap<String, String>,
    pub validation_expression: Option<String>,
    pub timeout_seconds: Option<u64>,
}

/// Abstraction over the worker daemon's HTTP surface, so the assignment loop
/// never depends on a concrete transport. The production implementation is
/// an HTTP POST (via `reqwest`) to the render node's `host:port`; tests use
/// an in-memory fake.
#[async_trait]
pub trait WorkerClient: Send + Sync {
    /// Fire-and-forget dispatch; the worker reports terminal status later
    /// through the status-callback path, not as this call's return value.
    /// An `Err` here means the RPC itself failed (`WorkerUnavailable`), not
    /// that the command failed.
    async fn dispatch(&self, host: &str, port: u16, request: DispatchRequest) -> Result<()>;

    /// Best-effort kill request for a cancelled RUNNING command.
    async fn kill(&self, host: &str, port: u16, command_id: Id) -> Result<()>;
}

/// `reqwest`-backed implementation talking to the worker daemon's HTTP API.
pub struct HttpWorkerClient {
    client: reqwest::Client,
}

impl HttpWorkerClient {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for HttpWorkerClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WorkerClient for HttpWorkerClient {
    async fn dispatch(&self, host: &str, port: u16, request: DispatchRequest) -> Result<()> {
        let url = format!("http://{host}:{port}/commands");
        self.client
            .post(&url)
            .json(&DispatchRequestWire::from(&request))
            .send()
            .await
            .map_err(|e| crate::DispatchError::WorkerUnavailable(e.to_string()))?
            .error_for_status()
            .map_err(|e| crate::DispatchError::WorkerUnavailable(e.to_string()))?;
        Ok(())
    }

    async fn kill(&self, host: &str, port: u16, command_id: Id) -> Result<()> {
        let url = format!("http://{host}:{port}/commands/{command_id}/kill");
        self.client
            .post(&url)
            .send()
            .await
            .map_err(|e| crate::DispatchError::WorkerUnavailable(e.to_string()))?;
        Ok(())
    }
}

#[derive(serde::Serialize)]
struct DispatchRequestWire {
    #[serde(rename = "commandId")]
    command_id: Id,
    runner: String,
    arguments: HashMap<String, String>,
    environment: HashMap<String, String>,
    #[serde(rename = "validationExpression")]
    validation_expression: Option<String>,
    timeout: Option<u64>,
}

impl From<&DispatchRequest> for DispatchRequestWire {
    fn from(r: &DispatchRequest) -> Self {
        Self {
            command_id: r.command_id,
            runner: r.runner.clone(),
            arguments: r.arguments.clone(),
            environment: r.environment.clone(),
            validation_expression: r.validation_expression.clone(),
            timeout: r.timeout_seconds,
        }
    }
}
