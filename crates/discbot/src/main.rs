//! The `discbot` binary.
//!
//! ```text
//! discbot -t <token> [-o <ops>] [-p <extensions>] [-c <config>]
//! ```
//!
//! Flags override `DISCBOT_*`, `DISCORDTOKEN` and `TBOPS`, which override the
//! config file.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::error;

use discbot_runtime::{BotRuntime, ConfigError, ConsoleConnector, RuntimeError};

#[derive(Parser, Debug)]
#[command(name = "discbot", version, about = "Chat-bot host with operator commands and extensions")]
struct Cli {
    /// Gateway authentication token.
    #[arg(short = 't', long = "token")]
    token: Option<String>,

    /// Comma-separated list of operator user ids.
    #[arg(short = 'o', long = "operators")]
    operators: Option<String>,

    /// Comma-separated list of extensions to load (`path?arg?arg`).
    #[arg(short = 'p', long = "plugins")]
    plugins: Option<String>,

    /// Configuration file (TOML or YAML).
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Keeps the bundled extension linked into the catalog.
    std::hint::black_box(&discbot_ext_pong::PONG_UNIT);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if let Some(RuntimeError::Config(ConfigError::MissingField { field })) =
                e.downcast_ref::<RuntimeError>()
                && field == "token"
            {
                eprintln!("Usage: discbot -t <auth_token>");
            }
            error!(error = %e, "discbot exited with an error");
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let runtime = BotRuntime::builder()
        .config_file_opt(cli.config)
        .token(cli.token)
        .operators(cli.operators)
        .extensions(cli.plugins)
        .build()?;

    let connector = ConsoleConnector::stdio(runtime.config().console.clone());
    runtime.run(&connector).await?;
    Ok(())
}
