//! Configuration file loading, defaults, and command-line overrides.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::protocol::{ReadMode, ScenarioKind};
use crate::types::{ProbeError, ProbeResult, CLIENT_NAME, CLIENT_VERSION, MCP_VERSION};

/// Environment variable naming a config file.
pub const CONFIG_ENV_VAR: &str = "MCP_PROBE_CONFIG";

/// Config file picked up from the working directory when nothing else is given.
pub const DEFAULT_CONFIG_FILE: &str = "mcp-probe.toml";

/// Default report file, relative to the working directory.
pub const DEFAULT_REPORT_FILE: &str = "probe_report.txt";

const DEFAULT_TIMEOUT_SECS: u64 = 15;
const DEFAULT_SETTLE_MS: u64 = 2000;
const DEFAULT_SHUTDOWN_GRACE_MS: u64 = 1000;

/// Top-level probe configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// How to launch the server under test.
    pub server: ServerSection,
    /// How to drive the exchange.
    pub probe: ProbeSection,
    /// Where to write the transcript.
    pub report: ReportSection,
}

/// `[server]` table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    /// Executable to launch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    /// Arguments passed to the executable.
    pub args: Vec<String>,
    /// Extra environment variables for the child.
    pub env: BTreeMap<String, String>,
    /// Working directory for the child.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<PathBuf>,
}

/// `[probe]` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeSection {
    /// Which message sequence to send.
    pub scenario: ScenarioKind,
    /// How output is read back.
    pub read_mode: ReadMode,
    /// Bound on the whole exchange.
    pub timeout_secs: u64,
    /// Pause between launch and the first write.
    pub settle_ms: u64,
    /// Pause between consecutive writes.
    pub message_delay_ms: u64,
    /// How long a finished child may take to exit before it is killed.
    pub shutdown_grace_ms: u64,
    /// Case-insensitive substrings that mark a successful run.
    pub keywords: Vec<String>,
    /// Protocol version sent in `initialize`.
    pub protocol_version: String,
    /// `clientInfo.name` sent in `initialize`.
    pub client_name: String,
    /// `clientInfo.version` sent in `initialize`.
    pub client_version: String,
}

/// `[report]` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportSection {
    /// Report file path.
    pub path: PathBuf,
}

impl Default for ProbeSection {
    fn default() -> Self {
        Self {
            scenario: ScenarioKind::default(),
            read_mode: ReadMode::default(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            settle_ms: DEFAULT_SETTLE_MS,
            message_delay_ms: 0,
            shutdown_grace_ms: DEFAULT_SHUTDOWN_GRACE_MS,
            keywords: vec!["notebook".to_string(), "resources".to_string()],
            protocol_version: MCP_VERSION.to_string(),
            client_name: CLIENT_NAME.to_string(),
            client_version: CLIENT_VERSION.to_string(),
        }
    }
}

impl Default for ReportSection {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_REPORT_FILE),
        }
    }
}

impl ProbeConfig {
    /// Check the invariants the runner relies on.
    pub fn validate(&self) -> ProbeResult<()> {
        match self.server.command.as_deref() {
            None => {
                return Err(ProbeError::Config(
                    "no server command given (use `-- <COMMAND>` or [server].command)".to_string(),
                ))
            }
            Some(c) if c.trim().is_empty() => {
                return Err(ProbeError::Config("server command is empty".to_string()))
            }
            Some(_) => {}
        }
        if self.probe.timeout_secs == 0 {
            return Err(ProbeError::Config(
                "timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.probe.keywords.iter().all(|k| k.trim().is_empty()) {
            return Err(ProbeError::Config(
                "at least one non-empty keyword is required".to_string(),
            ));
        }
        Ok(())
    }

    /// Bound on the whole exchange.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.probe.timeout_secs)
    }

    /// Pause between launch and the first write.
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.probe.settle_ms)
    }

    /// Pause between consecutive writes.
    pub fn message_delay(&self) -> Duration {
        Duration::from_millis(self.probe.message_delay_ms)
    }

    /// Grace period for a finished child to exit on its own.
    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.probe.shutdown_grace_ms)
    }

    /// Render the effective configuration as TOML.
    pub fn to_toml_string(&self) -> ProbeResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

/// Values given on the command line; `None` keeps the configured value.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    /// Command and arguments (`-- <COMMAND> [ARGS]...`).
    pub command: Vec<String>,
    /// Extra environment variables.
    pub env: Vec<(String, String)>,
    /// Working directory for the child.
    pub working_dir: Option<PathBuf>,
    /// Scenario override.
    pub scenario: Option<ScenarioKind>,
    /// Read mode override.
    pub read_mode: Option<ReadMode>,
    /// Timeout override, in seconds.
    pub timeout_secs: Option<u64>,
    /// Settle delay override, in milliseconds.
    pub settle_ms: Option<u64>,
    /// Inter-message delay override, in milliseconds.
    pub message_delay_ms: Option<u64>,
    /// Keyword list override; replaces the configured list when non-empty.
    pub keywords: Vec<String>,
    /// Report path override.
    pub report_path: Option<PathBuf>,
}

impl ConfigOverrides {
    /// Apply the overrides on top of a loaded configuration.
    pub fn apply(self, config: &mut ProbeConfig) {
        let mut command = self.command.into_iter();
        if let Some(program) = command.next() {
            config.server.command = Some(program);
            config.server.args = command.collect();
        }
        config.server.env.extend(self.env);
        if let Some(dir) = self.working_dir {
            config.server.working_dir = Some(dir);
        }
        if let Some(scenario) = self.scenario {
            config.probe.scenario = scenario;
        }
        if let Some(read_mode) = self.read_mode {
            config.probe.read_mode = read_mode;
        }
        if let Some(timeout) = self.timeout_secs {
            config.probe.timeout_secs = timeout;
        }
        if let Some(settle) = self.settle_ms {
            config.probe.settle_ms = settle;
        }
        if let Some(delay) = self.message_delay_ms {
            config.probe.message_delay_ms = delay;
        }
        if !self.keywords.is_empty() {
            config.probe.keywords = self.keywords;
        }
        if let Some(path) = self.report_path {
            config.report.path = path;
        }
    }
}

/// Load a configuration file.
pub fn load_config(path: &Path) -> ProbeResult<ProbeConfig> {
    let raw = std::fs::read_to_string(path).map_err(|e| {
        ProbeError::Config(format!("cannot read config {}: {e}", path.display()))
    })?;
    let config: ProbeConfig = toml::from_str(&raw)?;
    tracing::debug!("Loaded config from {}", path.display());
    Ok(config)
}

/// Pick the config file to use: explicit path, then `$MCP_PROBE_CONFIG`,
/// then `mcp-probe.toml` in the working directory if it exists.
pub fn resolve_config_path(explicit: Option<&str>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(PathBuf::from(path));
    }
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.is_empty() {
            return Some(PathBuf::from(path));
        }
    }
    let local = PathBuf::from(DEFAULT_CONFIG_FILE);
    local.exists().then_some(local)
}

/// Parse a `KEY=VALUE` pair.
pub fn parse_env_pair(raw: &str) -> ProbeResult<(String, String)> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(ProbeError::Config(format!(
            "expected KEY=VALUE, got `{raw}`"
        ))),
    }
}
