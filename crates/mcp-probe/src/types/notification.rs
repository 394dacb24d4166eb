//! Server-to-client notifications the probe understands.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Method name of the client's post-handshake notification.
pub const INITIALIZED_NOTIFICATION: &str = "notifications/initialized";

/// Method name of server log notifications.
pub const LOG_MESSAGE_NOTIFICATION: &str = "notifications/message";

/// Log message notification params (server → client).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogMessageParams {
    /// Log level.
    pub level: LogLevel,
    /// Optional logger name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logger: Option<String>,
    /// Log message data.
    pub data: Value,
}

/// Log levels for MCP logging (RFC 5424 severities).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Debug level.
    Debug,
    /// Info level.
    Info,
    /// Notice level.
    Notice,
    /// Warning level.
    Warning,
    /// Error level.
    Error,
    /// Critical level.
    Critical,
    /// Alert level.
    Alert,
    /// Emergency level.
    Emergency,
}
