//! llm-sfn — serves the built-in tools over stdin/stdout
//!
//! Reads one JSON request per line from stdin and writes one JSON response
//! per line to stdout. Logs go to stderr.

use anyhow::{Context, Result};
use tokio::io::BufReader;
use tracing::info;
use tracing_subscriber::EnvFilter;

use llm_sfn_tools::config::{self, SfnConfig};

#[tokio::main]
async fn main() -> Result<()> {
    // Config is read first so its log level can apply; RUST_LOG overrides it.
    let config = match config::load_config() {
        Ok(config) => {
            init_logging(&config)?;
            config
        }
        Err(e) => {
            init_logging(&SfnConfig::default())?;
            return Err(e);
        }
    };

    info!("llm-sfn v{} starting...", env!("CARGO_PKG_VERSION"));

    let service = llm_sfn_tools::build_service(&config);

    let stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = tokio::io::stdout();
    service
        .run(stdin, &mut stdout)
        .await
        .context("Tool service failed")?;

    info!("llm-sfn stopped");
    Ok(())
}

fn init_logging(config: &SfnConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .context("Invalid log level")?;

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;
    Ok(())
}
