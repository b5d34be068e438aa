//! Blocking facade over the async client
//!
//! For callers that are not running inside a cooperative scheduler: owns a
//! private tokio runtime and blocks the calling thread, translating the same
//! error taxonomy one to one.

use super::ToolClient;
use crate::config::WorkerConfig;
use crate::error::{WireError, WireResult};
use crate::types::{Arguments, ContentBlock, ToolDescriptor};
use std::time::Duration;
use tokio::runtime::Runtime;

/// Blocking client for one worker connection
///
/// Construction spawns the worker; dropping the value stops it on every exit
/// path. Call [`close`](Self::close) instead of relying on drop when shutdown
/// errors matter. Must be used from outside an async runtime.
pub struct BlockingToolClient {
    runtime: Runtime,
    client: Option<ToolClient>,
}

impl BlockingToolClient {
    /// Spawn the configured worker and connect to it
    pub fn connect(config: WorkerConfig) -> WireResult<Self> {
        let runtime = Runtime::new().map_err(|e| WireError::Io(e.to_string()))?;
        let client = runtime.block_on(ToolClient::connect(config))?;
        Ok(Self {
            runtime,
            client: Some(client),
        })
    }

    /// List the worker's tool descriptors
    pub fn list_tools(&self) -> WireResult<Vec<ToolDescriptor>> {
        self.runtime.block_on(self.client()?.list_tools())
    }

    /// Call a tool with the session's default deadline
    pub fn call_tool(&self, name: &str, arguments: Arguments) -> WireResult<Vec<ContentBlock>> {
        self.runtime.block_on(self.client()?.call_tool(name, arguments))
    }

    /// Call a tool with an explicit deadline
    pub fn call_tool_with_timeout(
        &self,
        name: &str,
        arguments: Arguments,
        deadline: Duration,
    ) -> WireResult<Vec<ContentBlock>> {
        self.runtime
            .block_on(self.client()?.call_tool_with_timeout(name, arguments, deadline))
    }

    /// Stop the worker and surface any teardown error
    pub fn close(mut self) -> WireResult<()> {
        self.shutdown()
    }

    fn client(&self) -> WireResult<&ToolClient> {
        self.client.as_ref().ok_or(WireError::ProcessNotRunning)
    }

    fn shutdown(&mut self) -> WireResult<()> {
        if let Some(client) = self.client.take() {
            self.runtime.block_on(client.close())?;
        }
        Ok(())
    }
}

impl Drop for BlockingToolClient {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            tracing::warn!(error = %e, "failed to stop worker during drop");
        }
    }
}
