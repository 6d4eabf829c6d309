/// Trainflow: visual ML training workflows, run server-side
///
/// Main entry point for the trainflow server. Initializes configuration and
/// starts the HTTP server with workflow building and execution capabilities.

use trainflow::{config::Config, server::start_server};

/// Application entry point
///
/// The server provides:
/// - Model catalog and node library at /api/catalog and /api/library
/// - Workflow building and runs at /api/workflows/*
/// - Health check at /healthz
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration (defaults to 0.0.0.0:3005, training API on localhost:5000)
    let config = Config::default();

    start_server(config).await?;

    Ok(())
}
