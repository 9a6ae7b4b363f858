mod config;
mod normalize;
mod session;
mod store;

use std::io;
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::Level;
use tracing_subscriber::EnvFilter;

use crate::config::{Config, ConfigOverrides};
use crate::session::{RunContext, load_and_report, run_session};
use crate::store::WordStore;

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Interactive manager for an ordered list of words and phrases"
)]
struct Cli {
    /// Optional path to a configuration TOML file overriding defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Word file to load before the first command is read
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Refuse entries made only of ASCII letters and digits
    #[arg(long = "reject-alphanumeric")]
    reject_alphanumeric: bool,

    /// Keep at most this many bytes from each line read by `load`
    #[arg(long = "max-line-bytes")]
    max_line_bytes: Option<usize>,

    /// Do not print the command list when the session starts
    #[arg(short, long)]
    quiet: bool,

    /// Enable verbose logging
    #[arg(long)]
    verbose: bool,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    init_tracing(cli.verbose)?;

    let overrides = ConfigOverrides {
        reject_alphanumeric_only: cli.reject_alphanumeric.then_some(true),
        max_line_bytes: cli.max_line_bytes,
        show_guidance: cli.quiet.then_some(false),
        startup_file: cli.file.clone(),
    };

    let config = Config::load(cli.config.clone(), overrides)?;
    tracing::debug!("Resolved configuration: {:?}", config);

    let mut store = WordStore::with_options(config.store_options());
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    if let Some(path) = &config.startup_file {
        load_and_report(&mut store, path, &mut stdout)?;
    }

    let run_ctx = RunContext { config: &config };
    run_session(&mut store, stdin.lock(), &mut stdout, &run_ctx)?;

    tracing::debug!("Session ended with {} entries", store.len());
    Ok(())
}

fn init_tracing(verbose: bool) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let directives = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(log_filter(level, directives.as_deref()))
        .with_writer(io::stderr)
        .with_target(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|err| anyhow::anyhow!("Failed to set tracing subscriber: {err}"))
}

/// `level` applies unless `directives` (usually `RUST_LOG`) say otherwise.
fn log_filter(level: Level, directives: Option<&str>) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(level.into())
        .parse_lossy(directives.unwrap_or_default())
}
