use anyhow::Result;
use clap::Parser;

use drivebook::{
    app::{load_config, load_config_from, AppState},
    cli::{handle_command, handle_local_command, Cli},
    utils::{init_logger, log_debug, log_warn},
};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Set up logging if verbose
    if cli.verbose {
        init_logger();
    }

    if handle_local_command(&cli.command)? {
        return Ok(());
    }

    // Load configuration
    let mut config = match &cli.config {
        Some(path) => load_config_from(path)?,
        None => load_config().unwrap_or_else(|e| {
            log_warn("CONFIG", format!("{:#}, using defaults", e));
            Default::default()
        }),
    };
    if let Some(base_url) = &cli.base_url {
        config.api.base_url = base_url.clone();
    }
    log_debug(format!("Using API at {}", config.api.base_url));

    let state = AppState::bootstrap(config).await?;
    let result = handle_command(&state, &cli.command, cli.config.as_deref()).await;

    // Session writes are queued; let them land before exiting
    state.shutdown().await;
    result
}
