//! Error taxonomy for the protocol layer

use crate::protocol::{FailureDescriptor, FailureKind};
use thiserror::Error;

/// Result type alias for protocol-layer operations
pub type WireResult<T> = Result<T, WireError>;

/// Errors surfaced by the protocol layer
///
/// Worker-side framing faults on individual messages are recovered locally by
/// skipping the message; everything else propagates as one of these.
#[derive(Debug, Error, Clone)]
pub enum WireError {
    /// The worker executable could not be started
    #[error("failed to spawn worker '{command}': {message}")]
    SpawnFailed { command: String, message: String },

    /// I/O was attempted against a worker that is not running
    #[error("worker process is not running")]
    ProcessNotRunning,

    /// A single message failed to parse or was missing required fields
    #[error("malformed message: {0}")]
    MalformedMessage(String),

    /// A tool with the same name is already registered
    #[error("tool already registered: {0}")]
    DuplicateTool(String),

    /// No tool with this name is registered
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    /// Arguments failed validation against the tool's declared parameters
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    /// The worker reported a failure for this call
    #[error("worker reported failure: {0}")]
    Remote(FailureDescriptor),

    /// No matching response arrived within the deadline
    #[error("no response within {elapsed:?}")]
    Timeout { elapsed: std::time::Duration },

    /// The stream closed or was corrupted while a call was outstanding
    #[error("protocol violation: {0}")]
    ProtocolViolation(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(String),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl WireError {
    /// Create a new SpawnFailed error
    pub fn spawn_failed(command: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SpawnFailed {
            command: command.into(),
            message: message.into(),
        }
    }

    /// Create a new MalformedMessage error
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedMessage(message.into())
    }

    /// Create a new InvalidArguments error
    pub fn invalid_arguments(message: impl Into<String>) -> Self {
        Self::InvalidArguments(message.into())
    }

    /// Create a new ProtocolViolation error
    pub fn protocol_violation(message: impl Into<String>) -> Self {
        Self::ProtocolViolation(message.into())
    }

    /// Create a handler failure, reported to the caller as a failure descriptor
    pub fn handler(message: impl Into<String>) -> Self {
        Self::Remote(FailureDescriptor::new(FailureKind::HandlerFailed, message))
    }

    /// Render this error as the failure descriptor a worker puts on the wire
    pub fn to_descriptor(&self) -> FailureDescriptor {
        match self {
            Self::UnknownTool(name) => {
                FailureDescriptor::new(FailureKind::UnknownTool, format!("unknown tool: {name}"))
            }
            Self::InvalidArguments(message) => {
                FailureDescriptor::new(FailureKind::InvalidArguments, message.clone())
            }
            Self::Remote(descriptor) => descriptor.clone(),
            other => FailureDescriptor::new(FailureKind::HandlerFailed, other.to_string()),
        }
    }
}

impl From<std::io::Error> for WireError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for WireError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
