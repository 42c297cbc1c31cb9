//! Command-line interface

use std::path::PathBuf;

use clap::Parser;

/// Tarot gateway - cached proxy for tarotapi.dev with pt-BR translation
#[derive(Parser, Debug)]
#[command(name = "tarot-gateway")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file (YAML)
    #[arg(short, long, env = "TAROT_GATEWAY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Port to listen on
    #[arg(short, long, env = "TAROT_GATEWAY_PORT")]
    pub port: Option<u16>,

    /// Host to bind to
    #[arg(long, env = "TAROT_GATEWAY_HOST")]
    pub host: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "TAROT_GATEWAY_LOG_LEVEL")]
    pub log_level: String,

    /// Log format (text, json)
    #[arg(long, env = "TAROT_GATEWAY_LOG_FORMAT")]
    pub log_format: Option<String>,

    /// Disable the periodic cache sweep task
    #[arg(long)]
    pub no_sweep: bool,
}
