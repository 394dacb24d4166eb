//! mcp-probe: entry point.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use mcp_probe::config::{load_config, parse_env_pair, resolve_config_path, ConfigOverrides};
use mcp_probe::protocol::{ReadMode, ScenarioKind};
use mcp_probe::report::write_report;
use mcp_probe::{ProbeConfig, ProbeRunner, Scenario};

/// Exit status for runs that did not succeed.
const EXIT_FAILURE: i32 = 1;

/// Exit status for problems that prevent a run.
const EXIT_USAGE: i32 = 2;

#[derive(Parser)]
#[command(
    name = "mcp-probe",
    about = "Handshake smoke test for MCP servers over stdio",
    version,
    args_conflicts_with_subcommands = true
)]
struct Cli {
    /// Configuration file path.
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(flatten)]
    run: RunArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Launch the server and run the probe (default).
    Run(RunArgs),

    /// Print the messages the probe would send, one JSON line each.
    Messages(RunArgs),

    /// Print the effective configuration as TOML.
    Config(RunArgs),
}

#[derive(Args, Debug, Clone, Default)]
struct RunArgs {
    /// Seconds to wait for the whole exchange.
    #[arg(long)]
    timeout: Option<u64>,

    /// Milliseconds to wait after launch before the first write.
    #[arg(long)]
    settle_ms: Option<u64>,

    /// Milliseconds to pause between consecutive writes.
    #[arg(long)]
    message_delay_ms: Option<u64>,

    /// Report file path.
    #[arg(long)]
    report: Option<PathBuf>,

    /// Message sequence to send.
    #[arg(long, value_enum)]
    scenario: Option<ScenarioKind>,

    /// How server output is read back.
    #[arg(long, value_enum)]
    read_mode: Option<ReadMode>,

    /// Success keyword (repeatable, case-insensitive).
    #[arg(long = "keyword")]
    keywords: Vec<String>,

    /// Extra environment variable for the server, as KEY=VALUE (repeatable).
    #[arg(long = "env", value_parser = parse_env)]
    env: Vec<(String, String)>,

    /// Working directory for the server.
    #[arg(long)]
    cwd: Option<PathBuf>,

    /// Server command and its arguments.
    #[arg(last = true)]
    command: Vec<String>,
}

impl From<RunArgs> for ConfigOverrides {
    fn from(args: RunArgs) -> Self {
        Self {
            command: args.command,
            env: args.env,
            working_dir: args.cwd,
            scenario: args.scenario,
            read_mode: args.read_mode,
            timeout_secs: args.timeout,
            settle_ms: args.settle_ms,
            message_delay_ms: args.message_delay_ms,
            keywords: args.keywords,
            report_path: args.report,
        }
    }
}

fn parse_env(raw: &str) -> Result<(String, String), String> {
    parse_env_pair(raw).map_err(|e| e.to_string())
}

fn build_config(config_path: Option<&str>, args: RunArgs) -> anyhow::Result<ProbeConfig> {
    let mut config = match resolve_config_path(config_path) {
        Some(path) => load_config(&path)?,
        None => ProbeConfig::default(),
    };
    ConfigOverrides::from(args).apply(&mut config);
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging; stdout is reserved for the verdict.
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let command = cli.command.unwrap_or(Commands::Run(cli.run));
    let args = match &command {
        Commands::Run(args) | Commands::Messages(args) | Commands::Config(args) => args.clone(),
    };

    let config = match build_config(cli.config.as_deref(), args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("mcp-probe: {e:#}");
            std::process::exit(EXIT_USAGE);
        }
    };

    match command {
        Commands::Config(_) => {
            print!("{}", config.to_toml_string()?);
        }

        Commands::Messages(_) => {
            let scenario = Scenario::from_config(&config)?;
            for message in &scenario.messages {
                println!("{}", message.to_line()?);
            }
        }

        Commands::Run(_) => {
            let runner = match ProbeRunner::new(config) {
                Ok(runner) => runner,
                Err(e) => {
                    eprintln!("mcp-probe: {e}");
                    std::process::exit(EXIT_USAGE);
                }
            };

            let transcript = runner.run().await;
            let report_path = &runner.config().report.path;
            if let Err(e) = write_report(report_path, &transcript).await {
                tracing::error!("Failed to write report {}: {e}", report_path.display());
            }

            match transcript.verdict() {
                Some(verdict) => {
                    println!("{}", verdict.console_word());
                    if !verdict.is_success() {
                        std::process::exit(EXIT_FAILURE);
                    }
                }
                None => {
                    println!("FAILURE");
                    std::process::exit(EXIT_FAILURE);
                }
            }
        }
    }

    Ok(())
}
