//! Configuration loading and resolution.

pub mod loader;

pub use loader::{
    load_config, parse_env_pair, resolve_config_path, ConfigOverrides, ProbeConfig,
    ProbeSection, ReportSection, ServerSection,
};
