//! Scriptable stand-in for an MCP server, used by the integration tests.
//!
//! Usage: `mcp-probe-mock-server <behavior>`
//!
//! Behaviors:
//!   notebooks  answer the handshake and list one notebook resource
//!   empty      answer the handshake with no resources
//!   strict     reject resources/list until the handshake is complete
//!   no-exit    like `notebooks`, but ignore EOF on stdin and keep running
//!   init-only  answer initialize, never answer resources/list
//!   silent     read nothing, write nothing, never exit
//!   exit       exit immediately without output

use std::io::{BufRead, BufReader, Write};
use std::time::Duration;

use serde_json::{json, Value};

use mcp_probe::types::{
    error_codes, Implementation, InitializeResult, JsonRpcError, JsonRpcMessage,
    JsonRpcNotification, JsonRpcResponse, LogLevel, LogMessageParams, RequestId,
    ResourceDefinition, ResourceListResult, ServerCapabilities, INITIALIZED_NOTIFICATION,
    LOG_MESSAGE_NOTIFICATION, MCP_VERSION,
};

/// Error code servers commonly use for requests before the handshake.
const NOT_INITIALIZED: i32 = -32002;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Behavior {
    Notebooks,
    Empty,
    Strict,
    NoExit,
    InitOnly,
}

fn main() {
    let mode = std::env::args().nth(1).unwrap_or_else(|| "notebooks".to_string());
    let behavior = match mode.as_str() {
        "notebooks" => Behavior::Notebooks,
        "empty" => Behavior::Empty,
        "strict" => Behavior::Strict,
        "no-exit" => Behavior::NoExit,
        "init-only" => Behavior::InitOnly,
        "silent" => sleep_forever(),
        "exit" => return,
        other => {
            eprintln!("unknown behavior: {other}");
            std::process::exit(2);
        }
    };

    eprintln!("mock server ready ({mode})");
    serve(behavior);

    if behavior == Behavior::NoExit {
        sleep_forever();
    }
}

fn sleep_forever() -> ! {
    loop {
        std::thread::sleep(Duration::from_secs(3600));
    }
}

fn serve(behavior: Behavior) {
    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();
    let mut initialized = false;
    let mut handshake_done = false;

    for line in BufReader::new(stdin.lock()).lines() {
        let Ok(line) = line else { break };
        if line.trim().is_empty() {
            continue;
        }

        let message: JsonRpcMessage = match serde_json::from_str(&line) {
            Ok(message) => message,
            Err(_) => {
                let error = JsonRpcError::new(
                    RequestId::Null,
                    error_codes::PARSE_ERROR,
                    "Parse error".to_string(),
                );
                write_line(&mut stdout, &error);
                continue;
            }
        };

        match message {
            JsonRpcMessage::Request(request) => {
                eprintln!("received: {}", request.method);
                if behavior == Behavior::InitOnly && request.method != "initialize" {
                    continue;
                }
                let reply = match request.method.as_str() {
                    "initialize" => {
                        initialized = true;
                        Ok(initialize_result())
                    }
                    "resources/list" if behavior == Behavior::Strict && !handshake_done => {
                        Err((NOT_INITIALIZED, "Server not initialized"))
                    }
                    "resources/list" => {
                        if behavior != Behavior::Empty {
                            let log = JsonRpcNotification::new(
                                LOG_MESSAGE_NOTIFICATION,
                                serde_json::to_value(LogMessageParams {
                                    level: LogLevel::Info,
                                    logger: Some("mock".to_string()),
                                    data: json!("listing"),
                                })
                                .ok(),
                            );
                            write_line(&mut stdout, &log);
                        }
                        Ok(resource_list(behavior))
                    }
                    _ => Err((error_codes::METHOD_NOT_FOUND, "Method not found")),
                };
                match reply {
                    Ok(result) => {
                        write_line(&mut stdout, &JsonRpcResponse::new(request.id, result))
                    }
                    Err((code, message)) => write_line(
                        &mut stdout,
                        &JsonRpcError::new(request.id, code, message.to_string()),
                    ),
                }
            }
            JsonRpcMessage::Notification(notification) => {
                eprintln!("received: {}", notification.method);
                if notification.method == INITIALIZED_NOTIFICATION && initialized {
                    handshake_done = true;
                }
            }
            _ => {}
        }
    }
}

fn initialize_result() -> Value {
    let result = InitializeResult {
        protocol_version: MCP_VERSION.to_string(),
        capabilities: ServerCapabilities::resources_only(),
        server_info: Implementation {
            name: "mock-server".to_string(),
            version: "0.0.1".to_string(),
        },
        instructions: None,
    };
    serde_json::to_value(result).unwrap_or(Value::Null)
}

fn resource_list(behavior: Behavior) -> Value {
    let resources = if behavior == Behavior::Empty {
        Vec::new()
    } else {
        vec![ResourceDefinition {
            uri: "notebook://research".to_string(),
            name: "Research notebooks".to_string(),
            description: None,
            mime_type: Some("application/json".to_string()),
        }]
    };
    serde_json::to_value(ResourceListResult {
        resources,
        next_cursor: None,
    })
    .unwrap_or(Value::Null)
}

fn write_line<T: serde::Serialize>(stdout: &mut std::io::Stdout, value: &T) {
    if let Ok(line) = serde_json::to_string(value) {
        let mut out = stdout.lock();
        let _ = writeln!(out, "{line}");
        let _ = out.flush();
    }
}
