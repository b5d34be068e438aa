//! Wire protocol message types
//!
//! One envelope per newline-delimited JSON line. Requests flow to the worker
//! on its stdin, responses come back on its stdout, and every response echoes
//! the correlation id of the request that produced it.

use crate::types::{Arguments, ContentBlock, ToolDescriptor};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Correlation token linking a request to its eventual response.
///
/// Assigned by the client from a monotonic counter; unique per in-flight call.
pub type CallId = u64;

/// A single protocol message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Envelope {
    /// Request message (client to worker)
    Request(Request),
    /// Response message (worker to client)
    Response(Response),
}

impl Envelope {
    /// Get the correlation id of the message
    pub fn id(&self) -> CallId {
        match self {
            Self::Request(req) => req.id,
            Self::Response(res) => res.id,
        }
    }

    /// Check if this is a response
    pub fn is_response(&self) -> bool {
        matches!(self, Self::Response(_))
    }

    /// Check if this is a request
    pub fn is_request(&self) -> bool {
        matches!(self, Self::Request(_))
    }
}

/// Request envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    /// Correlation id, echoed back on the response
    pub id: CallId,
    /// The requested operation
    #[serde(flatten)]
    pub body: RequestBody,
}

/// The operations a worker understands
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RequestBody {
    /// Enumerate the worker's tool descriptors
    ListTools,
    /// Invoke one named tool
    CallTool {
        /// Tool name
        name: String,
        /// Tool arguments, validated against the descriptor before dispatch
        arguments: Arguments,
    },
}

impl Request {
    /// Create a descriptor-listing request
    pub fn list_tools(id: CallId) -> Self {
        Self {
            id,
            body: RequestBody::ListTools,
        }
    }

    /// Create a tool-invocation request
    pub fn call_tool(id: CallId, name: impl Into<String>, arguments: Arguments) -> Self {
        Self {
            id,
            body: RequestBody::CallTool {
                name: name.into(),
                arguments,
            },
        }
    }
}

/// Response envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// Correlation id of the originating request
    pub id: CallId,
    /// Result (present on success)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Failure descriptor (present on failure)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<FailureDescriptor>,
}

impl Response {
    /// Create a success response
    pub fn success(id: CallId, result: Value) -> Self {
        Self {
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Create a failure response
    pub fn failure(id: CallId, error: FailureDescriptor) -> Self {
        Self {
            id,
            result: None,
            error: Some(error),
        }
    }

    /// Check if this is a success response
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Get the result, consuming the response
    pub fn into_result(self) -> Result<Value, FailureDescriptor> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(self.result.unwrap_or(Value::Null)),
        }
    }
}

/// Failure reported by the worker for one call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureDescriptor {
    /// What went wrong, coarsely
    pub kind: FailureKind,
    /// Human-readable detail
    pub message: String,
}

impl FailureDescriptor {
    /// Create a new failure descriptor
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for FailureDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)
    }
}

/// Failure categories a worker can report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The requested tool is not registered
    UnknownTool,
    /// Arguments failed validation against the descriptor
    InvalidArguments,
    /// The handler ran and reported an error
    HandlerFailed,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::UnknownTool => "unknown_tool",
            Self::InvalidArguments => "invalid_arguments",
            Self::HandlerFailed => "handler_failed",
        };
        write!(f, "{}", s)
    }
}

/// Success payload of a `list_tools` request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListToolsResult {
    /// Descriptors in registration order
    pub tools: Vec<ToolDescriptor>,
}

/// Success payload of a `call_tool` request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallToolResult {
    /// Ordered content blocks produced by the handler
    pub content: Vec<ContentBlock>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_call_tool_serialization() {
        let mut arguments = Arguments::new();
        arguments.insert("query".to_string(), json!("rust async"));
        let req = Request::call_tool(7, "web_search", arguments);
        let line = serde_json::to_string(&req).unwrap();

        assert!(line.contains("\"id\":7"));
        assert!(line.contains("\"kind\":\"call_tool\""));
        assert!(line.contains("\"name\":\"web_search\""));
        assert!(line.contains("rust async"));
    }

    #[test]
    fn test_list_tools_serialization() {
        let req = Request::list_tools(1);
        let line = serde_json::to_string(&req).unwrap();

        assert!(line.contains("\"kind\":\"list_tools\""));
        assert!(!line.contains("arguments"));
    }

    #[test]
    fn test_response_success() {
        let res = Response::success(3, json!({"content": []}));

        assert!(res.is_success());
        let value = res.into_result().unwrap();
        assert_eq!(value["content"], json!([]));
    }

    #[test]
    fn test_response_failure() {
        let res = Response::failure(
            3,
            FailureDescriptor::new(FailureKind::UnknownTool, "unknown tool: nope"),
        );

        assert!(!res.is_success());
        let err = res.into_result().unwrap_err();
        assert_eq!(err.kind, FailureKind::UnknownTool);
    }

    #[test]
    fn test_parse_envelope() {
        let req: Envelope =
            serde_json::from_str(r#"{"id":1,"kind":"call_tool","name":"echo","arguments":{}}"#)
                .unwrap();
        assert!(req.is_request());
        assert_eq!(req.id(), 1);

        let res: Envelope = serde_json::from_str(r#"{"id":1,"result":{"content":[]}}"#).unwrap();
        assert!(res.is_response());
    }

    #[test]
    fn test_request_round_trip() {
        let mut arguments = Arguments::new();
        arguments.insert("num_results".to_string(), json!(3));
        let original = Request::call_tool(42, "web_search", arguments);

        let line = serde_json::to_string(&original).unwrap();
        let parsed: Request = serde_json::from_str(&line).unwrap();
        assert_eq!(parsed, original);
    }

    #[test]
    fn test_call_tool_requires_arguments_field() {
        let result: Result<Request, _> =
            serde_json::from_str(r#"{"id":1,"kind":"call_tool","name":"echo"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_failure_kind_wire_names() {
        let json = serde_json::to_string(&FailureKind::InvalidArguments).unwrap();
        assert_eq!(json, "\"invalid_arguments\"");
    }
}
