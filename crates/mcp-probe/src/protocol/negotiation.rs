//! Inspection of the server's handshake and resource-list responses.

use serde_json::Value;

use crate::types::{Implementation, InitializeResult, ResourceListResult};

/// What the server told us in its `initialize` result.
#[derive(Debug, Clone)]
pub struct ServerHandshake {
    /// Server implementation info.
    pub server_info: Implementation,
    /// Protocol version the server answered with.
    pub protocol_version: String,
    /// Whether the server advertised the resources capability.
    pub has_resources: bool,
}

impl ServerHandshake {
    /// Parse an `initialize` result. Returns `None` if it is not well formed.
    pub fn from_result(result: &Value, requested_version: &str) -> Option<Self> {
        let parsed: InitializeResult = match serde_json::from_value(result.clone()) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("Malformed initialize result: {e}");
                return None;
            }
        };

        if parsed.protocol_version != requested_version {
            tracing::warn!(
                "Requested protocol version {}, server answered {}",
                requested_version,
                parsed.protocol_version
            );
        }

        tracing::info!(
            "Server identified as {} v{} (protocol {})",
            parsed.server_info.name,
            parsed.server_info.version,
            parsed.protocol_version
        );

        Some(Self {
            has_resources: parsed.capabilities.resources.is_some(),
            server_info: parsed.server_info,
            protocol_version: parsed.protocol_version,
        })
    }

    /// One-line description for the report.
    pub fn summary(&self) -> String {
        format!(
            "{} v{} (protocol {}, resources capability: {})",
            self.server_info.name,
            self.server_info.version,
            self.protocol_version,
            if self.has_resources { "yes" } else { "no" }
        )
    }
}

/// Number of resources in a `resources/list` result, if it is well formed.
pub fn count_resources(result: &Value) -> Option<usize> {
    serde_json::from_value::<ResourceListResult>(result.clone())
        .map(|r| r.resources.len())
        .ok()
}
