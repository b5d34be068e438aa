//! Client-side protocol session
//!
//! Multiplexes many logical calls over one worker connection: a monotonic
//! correlation counter, a pending-call table resolved by a single background
//! receiver, per-call deadlines, and teardown that always stops the worker.
//!
//! # Example
//!
//! ```rust,ignore
//! use toolwire_core::{ToolClient, WorkerConfig};
//!
//! let client = ToolClient::connect(WorkerConfig::new("search-worker")).await?;
//! let tools = client.list_tools().await?;
//! let content = client.call_tool("web_search", arguments).await?;
//! client.close().await?;
//! ```

mod blocking;
mod receiver;

pub use blocking::BlockingToolClient;

use crate::codec;
use crate::config::WorkerConfig;
use crate::error::{WireError, WireResult};
use crate::process::WorkerProcess;
use crate::protocol::{CallId, CallToolResult, Envelope, ListToolsResult, Request};
use crate::types::{Arguments, ContentBlock, ToolDescriptor};
use dashmap::DashMap;
use serde_json::Value;
use std::sync::Mutex as StdMutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio::time::timeout;

/// Pending-call table: correlation id to the single-use handle that resumes
/// the awaiting caller. Entries are removed exactly once, by the receiver, a
/// stream-failure drain, or timeout expiry; whichever removes first wins and
/// the others find nothing to do.
pub(crate) type PendingCalls = Arc<DashMap<CallId, oneshot::Sender<WireResult<Value>>>>;

/// Concurrent client for one worker connection
pub struct ToolClient {
    /// Worker handle, used for sending requests and for stop
    process: Arc<Mutex<WorkerProcess>>,
    /// Calls awaiting their response
    pending: PendingCalls,
    /// Correlation id counter
    next_id: AtomicU64,
    /// Default per-call deadline
    request_timeout: Duration,
    /// Cleared once the session is closed or the response stream dies
    running: Arc<AtomicBool>,
    /// Background response receiver task handle
    receiver_handle: StdMutex<Option<JoinHandle<()>>>,
}

impl ToolClient {
    /// Spawn the configured worker and start the response receiver
    pub async fn connect(config: WorkerConfig) -> WireResult<Self> {
        let request_timeout = config.request_timeout;

        let mut process = WorkerProcess::new(config);
        process.start()?;
        let stdout = process
            .take_stdout()
            .ok_or_else(|| WireError::protocol_violation("worker stdout already claimed"))?;

        let pending: PendingCalls = Arc::new(DashMap::new());
        let running = Arc::new(AtomicBool::new(true));
        let receiver_handle = tokio::spawn(receiver::read_responses(
            stdout,
            Arc::clone(&pending),
            Arc::clone(&running),
        ));

        Ok(Self {
            process: Arc::new(Mutex::new(process)),
            pending,
            next_id: AtomicU64::new(1),
            request_timeout,
            running,
            receiver_handle: StdMutex::new(Some(receiver_handle)),
        })
    }

    /// List the worker's tool descriptors
    pub async fn list_tools(&self) -> WireResult<Vec<ToolDescriptor>> {
        let id = self.next_call_id();
        let value = self
            .roundtrip(Request::list_tools(id), self.request_timeout)
            .await?;
        let result: ListToolsResult = serde_json::from_value(value)?;
        Ok(result.tools)
    }

    /// Call a tool with the session's default deadline
    pub async fn call_tool(
        &self,
        name: &str,
        arguments: Arguments,
    ) -> WireResult<Vec<ContentBlock>> {
        self.call_tool_with_timeout(name, arguments, self.request_timeout)
            .await
    }

    /// Call a tool with an explicit deadline
    ///
    /// Fails with `Remote` when the worker reports failure, `Timeout` when no
    /// matching response arrives in time (a response arriving later is
    /// discarded as stale), and `ProtocolViolation` when the stream closes or
    /// corrupts before a response.
    pub async fn call_tool_with_timeout(
        &self,
        name: &str,
        arguments: Arguments,
        deadline: Duration,
    ) -> WireResult<Vec<ContentBlock>> {
        let id = self.next_call_id();
        let value = self
            .roundtrip(Request::call_tool(id, name, arguments), deadline)
            .await?;
        let result: CallToolResult = serde_json::from_value(value)?;
        Ok(result.content)
    }

    /// Whether the session is still live
    pub fn is_connected(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Stop the worker and tear down the receiver
    ///
    /// Safe to call more than once. The worker gets a graceful stop (stdin
    /// closed, bounded wait) and is killed if it lingers.
    pub async fn close(&self) -> WireResult<()> {
        self.running.store(false, Ordering::SeqCst);

        {
            let mut process = self.process.lock().await;
            process.stop().await?;
        }

        let handle = {
            let mut guard = self
                .receiver_handle
                .lock()
                .map_err(|_| WireError::protocol_violation("receiver handle lock poisoned"))?;
            guard.take()
        };
        if let Some(handle) = handle {
            let _ = handle.await;
        }

        Ok(())
    }

    /// Send one request and suspend until the receiver resolves it or the
    /// deadline passes
    async fn roundtrip(&self, request: Request, deadline: Duration) -> WireResult<Value> {
        if !self.running.load(Ordering::SeqCst) {
            return Err(WireError::ProcessNotRunning);
        }

        let id = request.id;
        let line = codec::encode(&Envelope::Request(request))?;

        let (sender, response) = oneshot::channel();
        self.pending.insert(id, sender);

        {
            let mut process = self.process.lock().await;
            if let Err(e) = process.write_line(&line).await {
                self.pending.remove(&id);
                return Err(match e {
                    WireError::ProcessNotRunning => WireError::ProcessNotRunning,
                    other => {
                        WireError::protocol_violation(format!("failed to send request: {other}"))
                    }
                });
            }
        }

        match timeout(deadline, response).await {
            Ok(Ok(outcome)) => outcome,
            // Receiver gone without resolving us: torn down mid-call.
            Ok(Err(_)) => Err(WireError::protocol_violation(
                "response receiver dropped the call",
            )),
            Err(_) => {
                // Withdraw the pending entry; a response that shows up later
                // finds no entry and is discarded by the receiver.
                self.pending.remove(&id);
                Err(WireError::Timeout { elapsed: deadline })
            }
        }
    }

    fn next_call_id(&self) -> CallId {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }
}

impl Drop for ToolClient {
    fn drop(&mut self) {
        // The worker itself is reaped by kill_on_drop; just stop the receiver.
        self.running.store(false, Ordering::SeqCst);
        if let Ok(mut guard) = self.receiver_handle.lock() {
            if let Some(handle) = guard.take() {
                handle.abort();
            }
        }
    }
}
