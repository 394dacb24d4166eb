//! Classification of lines the server writes to stdout.

use serde_json::Value;

use crate::protocol::{
    count_resources, Scenario, ServerHandshake, INITIALIZE_METHOD, RESOURCES_LIST_METHOD,
};
use crate::report::Transcript;
use crate::types::{JsonRpcMessage, LogLevel, LogMessageParams, RequestId, LOG_MESSAGE_NOTIFICATION};

/// Record one stdout line and react to what it contains.
///
/// Returns the id of the response the line carries, if it is a response.
pub(crate) fn observe_line(
    line: &str,
    scenario: &Scenario,
    requested_version: &str,
    transcript: &mut Transcript,
) -> Option<RequestId> {
    transcript.push_stdout(line);

    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }

    let message: JsonRpcMessage = match serde_json::from_str(trimmed) {
        Ok(message) => message,
        Err(e) => {
            tracing::debug!("Non JSON-RPC output line ({e}): {trimmed}");
            return None;
        }
    };

    match message {
        JsonRpcMessage::Response(response) => {
            let method = scenario.method_for(&response.id).unwrap_or("unknown request");
            transcript.record_received(method, trimmed.to_string());
            match method {
                INITIALIZE_METHOD => {
                    if let Some(handshake) =
                        ServerHandshake::from_result(&response.result, requested_version)
                    {
                        transcript.server = Some(handshake.summary());
                    }
                }
                RESOURCES_LIST_METHOD => {
                    transcript.resource_count = count_resources(&response.result);
                }
                _ => {}
            }
            Some(response.id)
        }
        JsonRpcMessage::Error(error) => {
            let method = scenario.method_for(&error.id).unwrap_or("unknown request");
            transcript.record_received(method, trimmed.to_string());
            transcript.note(format!(
                "{method} failed with error {}: {}",
                error.error.code, error.error.message
            ));
            Some(error.id)
        }
        JsonRpcMessage::Notification(notification) => {
            if notification.method == LOG_MESSAGE_NOTIFICATION {
                forward_server_log(notification.params.as_ref());
            } else {
                tracing::debug!("Server notification: {}", notification.method);
            }
            None
        }
        JsonRpcMessage::Request(request) => {
            transcript.note(format!(
                "server sent request `{}` (id {}); the probe does not answer server requests",
                request.method, request.id
            ));
            None
        }
    }
}

/// Re-emit a `notifications/message` through the probe's own log.
fn forward_server_log(params: Option<&Value>) {
    let Some(params) = params
        .and_then(|p| serde_json::from_value::<LogMessageParams>(p.clone()).ok())
    else {
        tracing::debug!("Unreadable server log notification");
        return;
    };
    let logger = params.logger.as_deref().unwrap_or("server");
    let data = &params.data;
    match params.level {
        LogLevel::Debug => tracing::debug!(target: "mcp_probe::server", logger, "{data}"),
        LogLevel::Info | LogLevel::Notice => {
            tracing::info!(target: "mcp_probe::server", logger, "{data}")
        }
        LogLevel::Warning => tracing::warn!(target: "mcp_probe::server", logger, "{data}"),
        LogLevel::Error | LogLevel::Critical | LogLevel::Alert | LogLevel::Emergency => {
            tracing::error!(target: "mcp_probe::server", logger, "{data}")
        }
    }
}
