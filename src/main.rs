//! livelog - Entry Point

use clap::Parser;
use livelog::config::CliOverrides;
use livelog::model::AppError;
use livelog::view::RunOptions;
use std::path::PathBuf;
use tracing::info;

/// livelog - live log stream viewer
#[derive(Parser, Debug)]
#[command(name = "livelog")]
#[command(version)]
#[command(about = "Terminal viewer for live compressed log streams")]
pub struct Args {
    /// Stream endpoint (e.g. ws://localhost:8000/ws)
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Client identifier sent on connect (random UUID if omitted)
    #[arg(long)]
    pub client_id: Option<String>,

    /// Message kind to display
    #[arg(long)]
    pub kind: Option<String>,

    /// Maximum buffered records (must be positive)
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub capacity: Option<u64>,

    /// Path to configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Run against the built-in demo producer instead of a server
    #[arg(long)]
    pub demo: bool,

    /// Disable colors
    #[arg(long)]
    pub no_color: bool,
}

impl Args {
    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            endpoint: self.endpoint.clone(),
            client_id: self.client_id.clone(),
            kind: self.kind.clone(),
            capacity: self
                .capacity
                .map(|n| usize::try_from(n).unwrap_or(usize::MAX)),
        }
    }
}

fn main() -> Result<(), AppError> {
    let args = Args::parse();

    // Defaults → Config File → Env Vars → CLI Args
    let config = {
        let config_file = livelog::config::load_config_with_precedence(args.config.clone())?;
        let merged = livelog::config::merge_config(config_file);
        let with_env = livelog::config::apply_env_overrides(merged);
        livelog::config::apply_cli_overrides(with_env, args.overrides())
    };

    livelog::logging::init(&config.log_file_path)?;

    info!(config = ?config, demo = args.demo, "Configuration loaded and resolved");

    livelog::view::run_with_config(
        &config,
        RunOptions {
            demo: args.demo,
            no_color: args.no_color,
        },
    )?;

    Ok(())
}
