//! The tool contract implemented by worker-side handlers

use crate::error::WireResult;
use crate::types::{Arguments, ContentBlock, ParamSpec, ToolDescriptor};
use async_trait::async_trait;

/// A named, schema-described capability served by a worker
///
/// Handlers only see arguments that already passed validation against the
/// declared parameters, with defaults filled in. A handler that talks to a
/// remote dependency owns its own bounded retry policy; the registry and the
/// runtime never retry on its behalf.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique name within a registry, lowercase with underscores
    fn name(&self) -> &str;

    /// Description included in the advertised descriptor
    fn description(&self) -> &str;

    /// Declared input parameters, checked before `execute` runs
    fn parameters(&self) -> Vec<ParamSpec>;

    /// Run the tool and produce ordered content blocks
    ///
    /// Errors returned here never crash the worker; they are converted into a
    /// failure descriptor on the response envelope.
    async fn execute(&self, arguments: &Arguments) -> WireResult<Vec<ContentBlock>>;

    /// The descriptor advertised for this tool
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new(self.name(), self.description(), &self.parameters())
    }
}
