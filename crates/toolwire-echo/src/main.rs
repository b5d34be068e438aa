//! Diagnostic worker
//!
//! Serves tiny tools over stdio for smoke-testing protocol sessions without a
//! real backend: `echo` answers immediately, `delay_echo` answers after a
//! configurable pause, and `terminate` ends the process without replying,
//! which is useful for drilling client behavior on worker death.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use toolwire_core::error::WireResult;
use toolwire_core::registry::ToolRegistry;
use toolwire_core::tool::Tool;
use toolwire_core::types::{Arguments, ContentBlock, ParamSpec};
use toolwire_core::worker::WorkerRuntime;

struct EchoTool;

#[async_trait]
impl Tool for EchoTool {
    fn name(&self) -> &str {
        "echo"
    }

    fn description(&self) -> &str {
        "Echo the given text back as a single text block"
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
        "Echo the given text back after a delay"
    }

    fn parameters(&self) -> Vec<ParamSpec> {
        vec![
            ParamSpec::string("text", "Text to echo"),
            ParamSpec::integer("delay_ms", "Milliseconds to wait before answering (0-60000)")
                .optional()
                .with_default(100)
                .with_range(0.0, 60_000.0),
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

struct TerminateTool;

#[async_trait]
impl Tool for TerminateTool {
    fn name(&self) -> &str {
        "terminate"
    }

    fn description(&self) -> &str {
        "Exit the worker immediately without answering"
    }

    fn parameters(&self) -> Vec<ParamSpec> {
        Vec::new()
    }

    async fn execute(&self, _arguments: &Arguments) -> WireResult<Vec<ContentBlock>> {
        // Simulates a worker dying mid-call: no response is ever written.
        std::process::exit(1);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(EchoTool))?;
    registry.register(Arc::new(DelayEchoTool))?;
    registry.register(Arc::new(TerminateTool))?;

    WorkerRuntime::new(registry).run_stdio().await?;
    Ok(())
}
