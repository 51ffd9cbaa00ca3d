//! 🚀 csvferry: the front door. Loads config, sets up logging, rings the ferry bell.
//!
//! 🎬 *[narrator voice]* "It all started with a simple main() function..."
//! 📦 Thin wrapper: everything interesting lives in the `csvferry` lib. 🦆

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use csvferry::EtlError;

/// ⛴️ Move `raw/input.csv` to `processed/output.csv`, cleaned and measured.
#[derive(Debug, Parser)]
#[command(name = "csvferry", version, about)]
struct Cli {
    /// 🔧 Optional TOML file layered over the environment variables.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,
}

/// 🚀 main(): where it all begins.
///
/// 🔧 Steps:
/// 1. Init tracing (default `info`, `RUST_LOG` wins)
/// 2. Parse args
/// 3. Load config
/// 4. Run the ferry
/// 5. On failure, read the wreckage report and exit 1
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let the_cli = Cli::parse();

    let result = run_the_ferry(&the_cli).await;

    if let Err(err) = result {
        error!("💀 error: {}", err);
        // -- 🧅 peel the onion, one layer at a time
        let mut the_vibes_are_giving_connection_issues = false;
        for cause in err.chain().skip(1) {
            error!("⚠️  cause: {}", cause);
            if cause
                .downcast_ref::<EtlError>()
                .is_some_and(EtlError::is_connection)
            {
                the_vibes_are_giving_connection_issues = true;
            }
        }

        if the_vibes_are_giving_connection_issues {
            error!(
                "🔧 hint: the object store isn't answering. Check that AWS_ENDPOINT_URL points \
                at something that is actually running. If it's LocalStack in Docker, \
                `docker ps` will tell you whether it's up. ☕"
            );
        }

        std::process::exit(1);
    }

    Ok(())
}

async fn run_the_ferry(cli: &Cli) -> Result<()> {
    let the_config = csvferry::app_config::load_config(cli.config.as_deref()).context(
        "💀 Couldn't load the configuration. Check AWS_ENDPOINT_URL and S3_BUCKET_NAME, \
        and if you passed --config, that the file exists and is valid TOML",
    )?;

    csvferry::run(the_config).await?;
    Ok(())
}
