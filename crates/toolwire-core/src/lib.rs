//! Tool-invocation protocol layer
//!
//! Lets a calling process invoke named, schema-described tools implemented by
//! an independent worker process over a line-oriented stdio transport, with
//! request/response correlation, per-call timeouts, and both awaitable and
//! blocking call styles.
//!
//! ## Components
//!
//! - [`protocol`] / [`codec`]: envelope types and newline-delimited JSON framing
//! - [`registry`] / [`tool`]: the worker-side tool table with schema validation
//! - [`worker`]: the serving loop a worker binary runs over its stdio
//! - [`process`]: supervision of the worker subprocess
//! - [`client`]: the calling side, async and blocking
//!
//! ## Example
//!
//! ```rust,ignore
//! use toolwire_core::{ToolClient, WorkerConfig};
//!
//! let config = WorkerConfig::new("search-worker").env("GOOGLE_API_KEY", key);
//! let client = ToolClient::connect(config).await?;
//! let content = client.call_tool("web_search", arguments).await?;
//! client.close().await?;
//! ```

pub mod client;
pub mod codec;
pub mod config;
pub mod error;
pub mod process;
pub mod protocol;
pub mod registry;
pub mod tool;
pub mod types;
pub mod worker;

pub use client::{BlockingToolClient, ToolClient};
pub use config::WorkerConfig;
pub use error::{WireError, WireResult};
pub use process::{Liveness, WorkerProcess};
pub use protocol::{
    CallId, CallToolResult, Envelope, FailureDescriptor, FailureKind, ListToolsResult, Request,
    RequestBody, Response,
};
pub use registry::ToolRegistry;
pub use tool::Tool;
pub use types::{Arguments, ContentBlock, ParamKind, ParamSpec, ToolDescriptor};
pub use worker::WorkerRuntime;
