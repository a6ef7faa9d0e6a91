//! WikipediaBase main entry point
//!
//! Starts the query server. Exit status is 0 after a clean shutdown, 2 when
//! the port cannot be bound and 1 for any other startup failure.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use wikipediabase::config::{load_config_with_hash, Config};
use wikipediabase::evaluator::Evaluator;
use wikipediabase::fetcher::{build_fetcher, Fetcher};
use wikipediabase::server::Server;
use wikipediabase::Knowledgebase;

/// WikipediaBase: answers s-expression queries about Wikipedia articles
///
/// Listens for line-delimited queries such as
/// `(get "wikibase-person" "Bill Clinton" "BIRTH-DATE")` and answers each
/// with one typed s-expression.
#[derive(Parser, Debug)]
#[command(name = "wikipediabase")]
#[command(version)]
#[command(about = "Structured question answering over Wikipedia", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Port to listen on, overriding the configuration
    #[arg(short, long)]
    port: Option<u16>,

    /// Log per-query detail
    #[arg(long)]
    debug: bool,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_logging(cli.verbose, cli.debug);

    let config = match load(&cli) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{:#}", e);
            return ExitCode::from(1);
        }
    };

    let evaluator = match evaluator(&config) {
        Ok(evaluator) => evaluator,
        Err(e) => {
            tracing::error!("{:#}", e);
            return ExitCode::from(1);
        }
    };

    let server = match Server::bind(&config.server, evaluator).await {
        Ok(server) => server,
        Err(e) => {
            tracing::error!(
                "Cannot bind {}:{}: {}",
                config.server.host,
                config.server.port,
                e
            );
            return ExitCode::from(2);
        }
    };

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Cannot listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    match server.run_until(shutdown).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Server failed: {}", e);
            ExitCode::from(1)
        }
    }
}

/// Sets up the logging/tracing subscriber
///
/// `RUST_LOG` wins over the flags when set.
fn setup_logging(verbose: u8, debug: bool) {
    let level = if debug { verbose.max(1) } else { verbose };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match level {
        0 => EnvFilter::new("wikipediabase=info,warn"),
        1 => EnvFilter::new("wikipediabase=debug,info"),
        2 => EnvFilter::new("wikipediabase=trace,debug"),
        _ => EnvFilter::new("trace"),
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Reads the configuration file, if any, and applies command-line overrides
fn load(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load configuration {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => {
            tracing::info!("No configuration file given; using defaults");
            Config::default()
        }
    };

    if let Some(port) = cli.port {
        config.server.port = port;
    }
    Ok(config)
}

fn evaluator(config: &Config) -> anyhow::Result<Evaluator> {
    let fetcher = build_fetcher(config).context("Failed to set up the wiki fetcher")?;
    tracing::info!("Answering from {}", fetcher.base_url());
    let kb = Knowledgebase::new(config, fetcher);
    Ok(Evaluator::new(Arc::new(kb)))
}
