//! pathfinder-server - answers motion searches for one client.
//!
//! Started by `pathfinder::ipc::Client::open`; exits when that client
//! disconnects.

use anyhow::{Context, Result};
use clap::Parser;

use pathfinder::config::ServerConfig;
use pathfinder::{ipc, logging};

fn main() -> Result<()> {
    let config = ServerConfig::parse();
    logging::init_tracing(config.log_filter.as_deref(), config.log_file.as_deref())?;

    tracing::info!(
        "Starting pathfinder-server v{} (pid {})",
        env!("CARGO_PKG_VERSION"),
        std::process::id()
    );

    // One connection answered in order needs no worker threads.
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to build tokio runtime")?;

    if let Err(e) = runtime.block_on(ipc::run(&config)) {
        tracing::error!("Server error: {:#}", e);
        return Err(e);
    }

    tracing::info!("pathfinder-server exited cleanly");
    Ok(())
}
