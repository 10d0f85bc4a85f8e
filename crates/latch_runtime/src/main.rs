//! Latch Engine Runtime
//!
//! Minimal binary that links engine crates and boots the game

use anyhow::Result;
use latch_services::{EngineFacade, ServiceConfig};
use tracing_subscriber;

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    tracing::info!("Latch Engine v{}", latch_core::VERSION);
    tracing::info!("Initializing services...");
    latch_services::init_services();

    let config = ServiceConfig::from_env();
    tracing::info!(host = %config.host, port = config.port, "simulation service configured");

    let facade = EngineFacade::new();
    tracing::info!(engine_version = facade.get_version(), "simulation engine ready");

    tracing::info!("Runtime initialized successfully");
    tracing::info!("Phase 0: Placeholder - transport/listener wiring is out of scope");

    Ok(())
}
