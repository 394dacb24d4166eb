//! Probe scenarios: the ordered messages to send and the success predicate.

use serde::{Deserialize, Serialize};

use crate::config::ProbeConfig;
use crate::types::{
    InitializeParams, JsonRpcNotification, JsonRpcRequest, ProbeResult, RequestId,
    INITIALIZED_NOTIFICATION,
};

/// Method name of the handshake request.
pub const INITIALIZE_METHOD: &str = "initialize";

/// Method name of the resource query.
pub const RESOURCES_LIST_METHOD: &str = "resources/list";

/// Which message sequence a run sends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ScenarioKind {
    /// initialize, notifications/initialized, resources/list.
    #[default]
    Handshake,
    /// resources/list with no handshake. Many servers reject this.
    LegacyList,
}

/// How the runner reads the child's output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ReadMode {
    /// Wait for each request's response before sending the next message.
    #[default]
    Interactive,
    /// Write everything, close stdin, read stdout to EOF.
    Batch,
}

impl std::fmt::Display for ScenarioKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScenarioKind::Handshake => write!(f, "handshake"),
            ScenarioKind::LegacyList => write!(f, "legacy-list"),
        }
    }
}

impl std::fmt::Display for ReadMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReadMode::Interactive => write!(f, "interactive"),
            ReadMode::Batch => write!(f, "batch"),
        }
    }
}

/// Hands out request ids: 1, 2, 3, ...
#[derive(Debug)]
pub struct IdSequence {
    next: i64,
}

impl IdSequence {
    /// Start a fresh sequence at 1.
    pub fn new() -> Self {
        Self { next: 1 }
    }

    /// Take the next id.
    pub fn next_id(&mut self) -> RequestId {
        let id = self.next;
        self.next += 1;
        RequestId::Number(id)
    }
}

impl Default for IdSequence {
    fn default() -> Self {
        Self::new()
    }
}

/// One record written to the child's stdin.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ProbeMessage {
    /// Expects exactly one correlated response.
    Request(JsonRpcRequest),
    /// Fire and forget.
    Notification(JsonRpcNotification),
}

impl ProbeMessage {
    /// Method name.
    pub fn method(&self) -> &str {
        match self {
            ProbeMessage::Request(r) => &r.method,
            ProbeMessage::Notification(n) => &n.method,
        }
    }

    /// Request id, `None` for notifications.
    pub fn id(&self) -> Option<&RequestId> {
        match self {
            ProbeMessage::Request(r) => Some(&r.id),
            ProbeMessage::Notification(_) => None,
        }
    }

    /// Serialize to a single JSON line (without the trailing newline).
    pub fn to_line(&self) -> ProbeResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// A parameterized exchange: messages, read mode, and keywords.
#[derive(Debug, Clone)]
pub struct Scenario {
    /// Which built-in sequence this is.
    pub kind: ScenarioKind,
    /// How output is read back.
    pub read_mode: ReadMode,
    /// Messages in send order.
    pub messages: Vec<ProbeMessage>,
    /// Lowercased success keywords.
    keywords: Vec<String>,
}

impl Scenario {
    /// The canonical three-step exchange.
    pub fn handshake(params: InitializeParams, keywords: &[String]) -> ProbeResult<Self> {
        let mut ids = IdSequence::new();
        let messages = vec![
            ProbeMessage::Request(JsonRpcRequest::new(
                ids.next_id(),
                INITIALIZE_METHOD,
                Some(serde_json::to_value(params)?),
            )),
            ProbeMessage::Notification(JsonRpcNotification::new(INITIALIZED_NOTIFICATION, None)),
            ProbeMessage::Request(JsonRpcRequest::new(
                ids.next_id(),
                RESOURCES_LIST_METHOD,
                None,
            )),
        ];
        Ok(Self::with_messages(ScenarioKind::Handshake, messages, keywords))
    }

    /// `resources/list` on its own, without a handshake.
    pub fn legacy_list(keywords: &[String]) -> Self {
        let mut ids = IdSequence::new();
        let messages = vec![ProbeMessage::Request(JsonRpcRequest::new(
            ids.next_id(),
            RESOURCES_LIST_METHOD,
            None,
        ))];
        Self::with_messages(ScenarioKind::LegacyList, messages, keywords)
    }

    /// Build the scenario a configuration asks for.
    pub fn from_config(config: &ProbeConfig) -> ProbeResult<Self> {
        let probe = &config.probe;
        let scenario = match probe.scenario {
            ScenarioKind::Handshake => {
                let params = InitializeParams::new(
                    probe.protocol_version.clone(),
                    probe.client_name.clone(),
                    probe.client_version.clone(),
                );
                Self::handshake(params, &probe.keywords)?
            }
            ScenarioKind::LegacyList => {
                tracing::warn!(
                    "legacy-list skips the initialize handshake; servers may reject resources/list"
                );
                Self::legacy_list(&probe.keywords)
            }
        };
        Ok(scenario.read_mode(probe.read_mode))
    }

    fn with_messages(kind: ScenarioKind, messages: Vec<ProbeMessage>, keywords: &[String]) -> Self {
        Self {
            kind,
            read_mode: ReadMode::default(),
            messages,
            keywords: keywords
                .iter()
                .map(|k| k.trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
        }
    }

    /// Set the read mode.
    pub fn read_mode(mut self, mode: ReadMode) -> Self {
        self.read_mode = mode;
        self
    }

    /// The normalized keywords.
    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    /// First keyword found in `output`, compared case-insensitively.
    pub fn matched_keyword(&self, output: &str) -> Option<&str> {
        let haystack = output.to_lowercase();
        self.keywords
            .iter()
            .find(|k| haystack.contains(k.as_str()))
            .map(String::as_str)
    }

    /// Method name of the request with this id, if it was sent by this scenario.
    pub fn method_for(&self, id: &RequestId) -> Option<&str> {
        self.messages
            .iter()
            .find(|m| m.id() == Some(id))
            .map(ProbeMessage::method)
    }
}
