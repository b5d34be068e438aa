//! Search worker entry point
//!
//! stdout carries protocol frames; diagnostics go to stderr.

use anyhow::Context;
use std::sync::Arc;
use toolwire_core::registry::ToolRegistry;
use toolwire_core::worker::WorkerRuntime;
use toolwire_search::backend::GoogleSearchBackend;
use toolwire_search::tool::WebSearchTool;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
    dotenv::dotenv().ok();

    let backend = GoogleSearchBackend::from_env().context("search backend configuration")?;

    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(WebSearchTool::new(Arc::new(backend))))?;

    // Exits cleanly when the supervising client closes our stdin; an
    // unrecoverable fault on stdout propagates as a non-zero exit.
    WorkerRuntime::new(registry)
        .run_stdio()
        .await
        .context("worker runtime failed")?;
    Ok(())
}
