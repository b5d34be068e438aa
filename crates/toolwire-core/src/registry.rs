//! Tool registry: name to handler, with schema validation up front
//!
//! An explicit instance handed to the worker runtime at construction; there is
//! no process-wide registry.

use crate::error::{WireError, WireResult};
use crate::tool::Tool;
use crate::types::{Arguments, ContentBlock, ParamKind, ParamSpec, ToolDescriptor};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Registry of the tools one worker serves
pub struct ToolRegistry {
    // Registration order drives descriptor listing.
    tools: Vec<Arc<dyn Tool>>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            tools: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Register a tool
    ///
    /// Fails with `DuplicateTool` if a tool with the same name already exists.
    pub fn register(&mut self, tool: Arc<dyn Tool>) -> WireResult<()> {
        let name = tool.name().to_string();
        if self.index.contains_key(&name) {
            return Err(WireError::DuplicateTool(name));
        }
        self.index.insert(name, self.tools.len());
        self.tools.push(tool);
        Ok(())
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.index.get(name).map(|&i| &self.tools[i])
    }

    /// Check if a tool is registered
    pub fn has_tool(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Descriptors of all registered tools, in registration order
    pub fn descriptors(&self) -> Vec<ToolDescriptor> {
        self.tools.iter().map(|t| t.descriptor()).collect()
    }

    /// Number of registered tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Validate arguments against the named tool's parameters and run it
    ///
    /// Fails with `UnknownTool` if the name is not registered and with
    /// `InvalidArguments` if required parameters are missing or fail their
    /// declared constraints; the handler does not run in either case.
    pub async fn invoke(
        &self,
        name: &str,
        arguments: &Arguments,
    ) -> WireResult<Vec<ContentBlock>> {
        let tool = self
            .get(name)
            .ok_or_else(|| WireError::UnknownTool(name.to_string()))?;

        let mut arguments = arguments.clone();
        check_arguments(&tool.parameters(), &mut arguments)?;

        tool.execute(&arguments).await
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// Checks presence, type, and range, and fills in declared defaults so the
// handler sees a complete argument map.
fn check_arguments(params: &[ParamSpec], arguments: &mut Arguments) -> WireResult<()> {
    for param in params {
        let value = match arguments.get(&param.name) {
            Some(value) => value,
            None => {
                if param.required {
                    return Err(WireError::invalid_arguments(format!(
                        "missing required parameter '{}'",
                        param.name
                    )));
                }
                if let Some(default) = &param.default {
                    arguments.insert(param.name.clone(), default.clone());
                }
                continue;
            }
        };

        if !kind_matches(param.kind, value) {
            return Err(WireError::invalid_arguments(format!(
                "parameter '{}' must be a {}",
                param.name, param.kind
            )));
        }

        if let Some(n) = value.as_f64() {
            if let Some(minimum) = param.minimum {
                if n < minimum {
                    return Err(WireError::invalid_arguments(format!(
                        "parameter '{}' must be at least {}",
                        param.name, minimum
                    )));
                }
            }
            if let Some(maximum) = param.maximum {
                if n > maximum {
                    return Err(WireError::invalid_arguments(format!(
                        "parameter '{}' must be at most {}",
                        param.name, maximum
                    )));
                }
            }
        }
    }
    Ok(())
}

fn kind_matches(kind: ParamKind, value: &Value) -> bool {
    match kind {
        ParamKind::String => value.is_string(),
        ParamKind::Integer => value.is_i64() || value.is_u64(),
        ParamKind::Number => value.is_number(),
        ParamKind::Boolean => value.is_boolean(),
    }
}
