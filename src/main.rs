// Entrypoint for the CLI application.
// - Keeps `main` small: resolve config, build the client, hand it to the
//   menu loop.
// - `--debug` turns on request logging (stderr); `RUST_LOG` overrides it.

use anyhow::Context;
use clap::Parser;
use snakekv_cli::config::{Config, Overrides};
use snakekv_cli::{ui::main_menu, KvClient};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "snakekv")]
#[command(about = "Interactive client for the SnakeKV key-value API")]
#[command(version)]
struct Cli {
    /// Enable detailed request logging
    #[arg(long)]
    debug: bool,

    /// API base URL (default: http://localhost:8080/api)
    #[arg(long)]
    base_url: Option<String>,

    /// Timeout in seconds for single-key operations
    #[arg(long)]
    timeout: Option<u64>,

    /// Timeout in seconds for batch save and delete-all
    #[arg(long)]
    batch_timeout: Option<u64>,

    /// Directory that receives exported files
    #[arg(long)]
    export_dir: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.debug { "info" } else { "error" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
    if cli.debug {
        println!("Debug mode enabled - detailed logging active");
    }

    let config = Config::load(Overrides {
        base_url: cli.base_url,
        timeout_secs: cli.timeout,
        batch_timeout_secs: cli.batch_timeout,
        export_dir: cli.export_dir,
    })
    .context("Loading configuration")?;

    let api = KvClient::from_config(&config).context("Failed to build HTTP client")?;

    // Blocks until the user exits.
    main_menu(&api, &config)?;
    Ok(())
}
