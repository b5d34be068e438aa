//! Worker-side runtime: the serving half of the protocol
//!
//! Reads framed requests from its input stream, dispatches tool invocations
//! concurrently, and funnels every response through a single writer so
//! envelopes never interleave on the output stream. Every accepted request
//! yields exactly one response, or the runtime has terminated.

use crate::codec;
use crate::error::{WireError, WireResult};
use crate::protocol::{CallToolResult, Envelope, ListToolsResult, Request, RequestBody, Response};
use crate::registry::ToolRegistry;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// How many completed responses may queue behind the writer before dispatch
/// tasks feel backpressure.
const RESPONSE_QUEUE_DEPTH: usize = 64;

/// Serves a registry's tools over a framed request/response stream
pub struct WorkerRuntime {
    registry: Arc<ToolRegistry>,
}

impl WorkerRuntime {
    /// Create a runtime serving the given registry
    pub fn new(registry: ToolRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
        }
    }

    /// Serve requests over this process's stdio until stdin closes
    ///
    /// Returns `Ok(())` on clean input-stream closure. An unrecoverable fault
    /// on the output stream is an error; binaries should exit non-zero on it.
    pub async fn run_stdio(&self) -> WireResult<()> {
        let stdin = BufReader::new(tokio::io::stdin());
        let stdout = tokio::io::stdout();
        self.run(stdin, stdout).await
    }

    /// Serve requests from `reader` until end of input
    ///
    /// Malformed input lines are logged and skipped; only stream closure or an
    /// I/O fault ends the loop. In-flight dispatches finish and flush their
    /// responses before this returns.
    pub async fn run<R, W>(&self, mut reader: R, writer: W) -> WireResult<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (response_tx, response_rx) = mpsc::channel::<Response>(RESPONSE_QUEUE_DEPTH);
        let writer_task = tokio::spawn(write_responses(writer, response_rx));

        loop {
            match codec::read_envelope(&mut reader).await {
                Ok(None) => {
                    debug!("input stream closed, shutting down");
                    break;
                }
                Ok(Some(Envelope::Request(request))) => {
                    self.dispatch(request, response_tx.clone()).await;
                }
                Ok(Some(Envelope::Response(response))) => {
                    warn!(id = response.id, "ignoring response envelope on the request stream");
                }
                Err(WireError::MalformedMessage(message)) => {
                    warn!(error = %message, "skipping malformed request line");
                }
                Err(e) => {
                    // Reader faults other than framing mean the stream is gone.
                    drop(response_tx);
                    let _ = writer_task.await;
                    return Err(e);
                }
            }
        }

        // Close our sender; the writer drains once the last dispatch finishes.
        drop(response_tx);
        match writer_task.await {
            Ok(result) => result,
            Err(e) => Err(WireError::Io(format!("response writer panicked: {e}"))),
        }
    }

    async fn dispatch(&self, request: Request, response_tx: mpsc::Sender<Response>) {
        match request.body {
            RequestBody::ListTools => {
                // Descriptor listing bypasses invoke; no handler runs.
                let response = match serde_json::to_value(ListToolsResult {
                    tools: self.registry.descriptors(),
                }) {
                    Ok(value) => Response::success(request.id, value),
                    Err(e) => Response::failure(
                        request.id,
                        WireError::Serialization(e.to_string()).to_descriptor(),
                    ),
                };
                if response_tx.send(response).await.is_err() {
                    warn!(id = request.id, "response writer gone before reply could be queued");
                }
            }
            RequestBody::CallTool { name, arguments } => {
                let registry = Arc::clone(&self.registry);
                let id = request.id;
                // Handlers may block on I/O; dispatch concurrently so slow
                // calls do not hold up independent ones behind them.
                tokio::spawn(async move {
                    let response = match registry.invoke(&name, &arguments).await {
                        Ok(content) => match serde_json::to_value(CallToolResult { content }) {
                            Ok(value) => Response::success(id, value),
                            Err(e) => Response::failure(
                                id,
                                WireError::Serialization(e.to_string()).to_descriptor(),
                            ),
                        },
                        Err(e) => {
                            debug!(tool = %name, error = %e, "tool invocation failed");
                            Response::failure(id, e.to_descriptor())
                        }
                    };
                    if response_tx.send(response).await.is_err() {
                        warn!(id, "worker shutting down before response could be written");
                    }
                });
            }
        }
    }
}

// Sole owner of the output stream: each envelope is encoded and written whole,
// one per line, so concurrent dispatches can never interleave mid-message.
async fn write_responses<W>(mut writer: W, mut response_rx: mpsc::Receiver<Response>) -> WireResult<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(response) = response_rx.recv().await {
        let line = codec::encode(&Envelope::Response(response))?;
        writer.write_all(line.as_bytes()).await?;
        writer.flush().await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::FailureKind;
    use crate::tool::Tool;
    use crate::types::{Arguments, ContentBlock, ParamSpec};
    use async_trait::async_trait;
    use serde_json::json;
    use std::time::Duration;
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, DuplexStream};

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }

        fn description(&self) -> &str {
            "Echo text back"
        }

        fn parameters(&self) -> Vec<ParamSpec> {
            vec![ParamSpec::string("text", "Text to echo")]
        }

        async fn execute(&self, arguments: &Arguments) -> WireResult<Vec<ContentBlock>> {
            let text = arguments
                .get("text")
                .and_then(|v| v.as_str())
                .unwrap_or_default();
            Ok(vec![ContentBlock::text(text)])
        }
    }

    struct DelayEchoTool;

    #[async_trait]
    impl Tool for DelayEchoTool {
        fn name(&self) -> &str {
            "delay_echo"
        }

        fn description(&self) -> &str {
            "Echo text back after a delay"
        }

        fn parameters(&self) -> Vec<ParamSpec> {
            vec![
                ParamSpec::string("text", "Text to echo"),
                ParamSpec::integer("delay_ms", "Delay before echoing"),
            ]
        }

        async fn execute(&self, arguments: &Arguments) -> WireResult<Vec<ContentBlock>> {
            let delay = arguments
                .get("delay_ms")
                .and_then(|v| v.as_u64())
                .unwrap_or_default();
            tokio::time::sleep(Duration::from_millis(delay)).await;
            let text = arguments
                .get("text")
                .and_then(|v| v.as_str())
                .unwrap_or_default();
            Ok(vec![ContentBlock::text(text)])
        }
    }

    struct Harness {
        requests: DuplexStream,
        responses: tokio::io::BufReader<DuplexStream>,
        runtime: tokio::task::JoinHandle<WireResult<()>>,
    }

    fn start_worker() -> Harness {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool)).unwrap();
        registry.register(Arc::new(DelayEchoTool)).unwrap();
        start_worker_with(registry)
    }

    fn start_worker_with(registry: ToolRegistry) -> Harness {
        let (requests, worker_input) = tokio::io::duplex(4096);
        let (worker_output, responses) = tokio::io::duplex(4096);

        let runtime = tokio::spawn(async move {
            WorkerRuntime::new(registry)
                .run(tokio::io::BufReader::new(worker_input), worker_output)
                .await
        });

        Harness {
            requests,
            responses: tokio::io::BufReader::new(responses),
            runtime,
        }
    }

    impl Harness {
        async fn send(&mut self, line: &str) {
            self.requests.write_all(line.as_bytes()).await.unwrap();
            self.requests.write_all(b"\n").await.unwrap();
        }

        async fn recv(&mut self) -> Response {
            let mut line = String::new();
            self.responses.read_line(&mut line).await.unwrap();
            match codec::decode(&line).unwrap() {
                Envelope::Response(response) => response,
                Envelope::Request(_) => panic!("worker emitted a request"),
            }
        }

        async fn shutdown(mut self) -> WireResult<()> {
            self.requests.shutdown().await.unwrap();
            drop(self.requests);
            self.runtime.await.unwrap()
        }
    }

    #[tokio::test]
    async fn test_echo_round_trip() {
        let mut harness = start_worker();

        harness
            .send(r#"{"id":1,"kind":"call_tool","name":"echo","arguments":{"text":"hi"}}"#)
            .await;
        let response = harness.recv().await;

        assert_eq!(response.id, 1);
        let result: CallToolResult =
            serde_json::from_value(response.into_result().unwrap()).unwrap();
        assert_eq!(result.content, vec![ContentBlock::text("hi")]);

        harness.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_list_tools_in_registration_order() {
        let mut harness = start_worker();

        harness.send(r#"{"id":2,"kind":"list_tools"}"#).await;
        let response = harness.recv().await;

        let result: ListToolsResult =
            serde_json::from_value(response.into_result().unwrap()).unwrap();
        let names: Vec<String> = result.tools.into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["echo".to_string(), "delay_echo".to_string()]);

        harness.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_unknown_tool_yields_failure_response() {
        let mut harness = start_worker();

        harness
            .send(r#"{"id":3,"kind":"call_tool","name":"nope","arguments":{}}"#)
            .await;
        let response = harness.recv().await;

        assert_eq!(response.id, 3);
        let descriptor = response.into_result().unwrap_err();
        assert_eq!(descriptor.kind, FailureKind::UnknownTool);

        harness.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_invalid_arguments_yield_failure_response() {
        let mut harness = start_worker();

        harness
            .send(r#"{"id":4,"kind":"call_tool","name":"echo","arguments":{}}"#)
            .await;
        let response = harness.recv().await;

        let descriptor = response.into_result().unwrap_err();
        assert_eq!(descriptor.kind, FailureKind::InvalidArguments);

        harness.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_malformed_line_is_skipped() {
        let mut harness = start_worker();

        harness.send("this is not an envelope").await;
        harness
            .send(r#"{"id":5,"kind":"call_tool","name":"echo","arguments":{"text":"still here"}}"#)
            .await;

        // The bad line produced no response; the next valid request is served.
        let response = harness.recv().await;
        assert_eq!(response.id, 5);
        assert!(response.is_success());

        harness.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_slow_call_does_not_block_fast_call() {
        let mut harness = start_worker();

        harness
            .send(
                r#"{"id":6,"kind":"call_tool","name":"delay_echo","arguments":{"text":"slow","delay_ms":300}}"#,
            )
            .await;
        harness
            .send(r#"{"id":7,"kind":"call_tool","name":"echo","arguments":{"text":"fast"}}"#)
            .await;

        // Out-of-order delivery: the fast call's response arrives first.
        let first = harness.recv().await;
        let second = harness.recv().await;
        assert_eq!(first.id, 7);
        assert_eq!(second.id, 6);

        harness.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_every_request_gets_exactly_one_response() {
        let mut harness = start_worker();

        for id in 10..13 {
            harness
                .send(&format!(
                    r#"{{"id":{id},"kind":"call_tool","name":"echo","arguments":{{"text":"x"}}}}"#
                ))
                .await;
        }

        let mut ids: Vec<u64> = Vec::new();
        for _ in 0..3 {
            ids.push(harness.recv().await.id);
        }
        ids.sort_unstable();
        assert_eq!(ids, vec![10, 11, 12]);

        harness.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_clean_shutdown_on_input_closure() {
        let harness = start_worker();
        // No requests at all: closing the input ends the run loop cleanly.
        harness.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_in_flight_dispatch_flushes_before_shutdown() {
        let mut harness = start_worker();

        harness
            .send(
                r#"{"id":8,"kind":"call_tool","name":"delay_echo","arguments":{"text":"late","delay_ms":100}}"#,
            )
            .await;
        harness.requests.shutdown().await.unwrap();

        // The response for the in-flight call still arrives after EOF.
        let response = harness.recv().await;
        assert_eq!(response.id, 8);
        assert!(response.is_success());

        harness.runtime.await.unwrap().unwrap();
    }
}
