use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use volfetch::{commands, Config};

#[derive(Parser)]
#[clap(name = "volfetch")]
#[clap(about = "Resumable dataset downloads onto a persistent volume")]
#[clap(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// Configuration file (TOML)
    #[clap(long, global = true)]
    config: Option<PathBuf>,
    /// Override the volume root from the configuration
    #[clap(long, global = true)]
    root: Option<PathBuf>,
    /// Hide progress bars
    #[clap(short, long, global = true)]
    quiet: bool,
    /// Enable debug logging
    #[clap(short, long, global = true)]
    verbose: bool,
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download every configured job and extract archives
    Run,
    /// Download a single URL to a destination path
    Fetch {
        /// Source URL
        url: String,
        /// Destination file
        destination: PathBuf,
        /// Leave archives packed
        #[clap(long)]
        no_extract: bool,
    },
    /// Extract a downloaded archive
    Extract {
        /// Archive to extract
        archive: PathBuf,
        /// Target directory (default: the archive's directory)
        #[clap(long)]
        into: Option<PathBuf>,
    },
    /// Show configured jobs and their state on the volume
    Jobs,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "volfetch=debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(cli: &Cli) -> volfetch::Result<Config> {
    let config = Config::load(cli.config.as_deref())?;
    Ok(match &cli.root {
        Some(root) => config.with_volume_root(root.clone()),
        None => config,
    })
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match &cli.command {
        Commands::Run => {
            load_config(&cli).and_then(|config| commands::run::run_jobs(config, cli.quiet))
        }
        Commands::Fetch {
            url,
            destination,
            no_extract,
        } => load_config(&cli).and_then(|config| {
            commands::fetch::fetch_one(&config, url, destination, !no_extract, cli.quiet)
        }),
        Commands::Extract { archive, into } => {
            commands::extract::extract_archive(archive, into.as_deref())
        }
        Commands::Jobs => load_config(&cli).and_then(|config| commands::jobs::list_jobs(&config)),
    };

    if let Err(e) = result {
        tracing::error!(error = %e, "volfetch failed");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }

    Ok(())
}
