//! MCP capability and initialization types.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// MCP protocol version the probe requests by default.
pub const MCP_VERSION: &str = "2024-11-05";

/// Client name sent in `clientInfo`.
pub const CLIENT_NAME: &str = "mcp-probe";

/// Client version sent in `clientInfo`.
pub const CLIENT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Implementation info for server or client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Implementation {
    /// Name of the implementation.
    pub name: String,
    /// Version string.
    pub version: String,
}

/// Client capabilities sent during initialization.
///
/// The probe declares none, so this always serializes to `{}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientCapabilities {}

/// Server capabilities advertised in the `initialize` result.
///
/// Only `resources` is inspected; the other groups are kept as raw JSON.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerCapabilities {
    /// Resources capability.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<ResourcesCapability>,
    /// Tools capability.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<Value>,
    /// Prompts capability.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompts: Option<Value>,
    /// Logging capability.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logging: Option<Value>,
}

/// Resources capability.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourcesCapability {
    /// Resource subscriptions supported.
    #[serde(default)]
    pub subscribe: bool,
    /// `notifications/resources/list_changed` supported.
    #[serde(default)]
    pub list_changed: bool,
}

/// Initialize request parameters sent by the probe.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeParams {
    /// Requested protocol version.
    pub protocol_version: String,
    /// Client capabilities.
    pub capabilities: ClientCapabilities,
    /// Client implementation info.
    pub client_info: Implementation,
}

/// Initialize response result returned by the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeResult {
    /// Negotiated protocol version.
    pub protocol_version: String,
    /// Server capabilities.
    #[serde(default)]
    pub capabilities: ServerCapabilities,
    /// Server implementation info.
    pub server_info: Implementation,
    /// Optional instructions for the client.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
}

impl InitializeParams {
    /// Build initialize params with an empty capability set.
    pub fn new(
        protocol_version: impl Into<String>,
        client_name: impl Into<String>,
        client_version: impl Into<String>,
    ) -> Self {
        Self {
            protocol_version: protocol_version.into(),
            capabilities: ClientCapabilities::default(),
            client_info: Implementation {
                name: client_name.into(),
                version: client_version.into(),
            },
        }
    }
}

impl Default for InitializeParams {
    fn default() -> Self {
        Self::new(MCP_VERSION, CLIENT_NAME, CLIENT_VERSION)
    }
}

impl ServerCapabilities {
    /// Capabilities of a server that only exposes resources.
    pub fn resources_only() -> Self {
        Self {
            resources: Some(ResourcesCapability::default()),
            ..Self::default()
        }
    }
}
