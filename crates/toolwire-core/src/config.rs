//! Worker spawn and session configuration

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Helper function for default request timeout
fn default_request_timeout() -> Duration {
    Duration::from_secs(60)
}

/// Helper function for default stop grace period
fn default_grace_period() -> Duration {
    Duration::from_secs(5)
}

/// Configuration for spawning and talking to one worker process
///
/// The command, arguments, and environment are opaque strings supplied by the
/// caller; this layer only passes them through to the platform process API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Executable to spawn
    pub command: String,
    /// Command arguments
    #[serde(default)]
    pub args: Vec<String>,
    /// Environment variables for the worker
    #[serde(default)]
    pub env: HashMap<String, String>,
    /// Default deadline for a single call
    #[serde(default = "default_request_timeout", with = "humantime_serde")]
    pub request_timeout: Duration,
    /// How long `stop` waits for a clean exit before killing the worker
    #[serde(default = "default_grace_period", with = "humantime_serde")]
    pub grace_period: Duration,
}

impl WorkerConfig {
    /// Create a config for the given executable with default timeouts
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            args: Vec::new(),
            env: HashMap::new(),
            request_timeout: default_request_timeout(),
            grace_period: default_grace_period(),
        }
    }

    /// Append a command argument
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Set an environment variable for the worker
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Override the default per-call deadline
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Override the stop grace period
    pub fn with_grace_period(mut self, grace: Duration) -> Self {
        self.grace_period = grace;
        self
    }
}
