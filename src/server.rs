/// Server setup and initialization
///
/// Wires together all components: model catalog, training client, execution
/// engine, session registry and HTTP routes. Provides the main application
/// factory function for creating the Axum app.

use crate::{
    api::workflows::{create_workflow_routes, AppState},
    catalog::ModelCatalog,
    config::Config,
    runtime::{engine::ExecutionEngine, executor::NodeExecutor},
    training::TrainingClient,
    workflow::registry::WorkflowRegistry,
};
use anyhow::Result;
use axum::{routing::get, Router};
use std::{path::PathBuf, sync::Arc};
use tokio::net::TcpListener;

/// Create the main Axum application with all routes
///
/// Loads the model catalog (built-in, or the file named by the config) and
/// builds the shared execution components.
pub async fn create_app(config: Config) -> Result<Router> {
    tracing::info!("📚 Loading model catalog");
    let catalog = match &config.catalog_path {
        Some(path) => {
            tracing::info!("📄 Using model catalog from {}", path);
            ModelCatalog::from_path(path).await?
        }
        None => ModelCatalog::builtin()?,
    };
    let catalog = Arc::new(catalog);
    tracing::debug!("📚 {} models available", catalog.list().len());

    tracing::info!("🔌 Training API at {}", config.training.base_url);
    let client = TrainingClient::new(config.training.base_url.clone());

    tracing::info!("⚙️ Initializing node executor and execution engine");
    let executor = Arc::new(NodeExecutor::new(client, Arc::clone(&catalog)));
    let engine = ExecutionEngine::new(executor);

    let app_state = AppState {
        registry: Arc::new(WorkflowRegistry::new()),
        engine,
        catalog,
        download_dir: PathBuf::from(&config.training.download_dir),
    };

    tracing::info!("📡 Creating HTTP router with all endpoints");
    let app = Router::new()
        // Health check endpoint
        .route("/healthz", get(health_check))
        // Builder, run and download endpoints
        .merge(create_workflow_routes().with_state(app_state));

    tracing::info!("✅ Application initialized successfully");
    Ok(app)
}

/// Start the HTTP server with the given configuration
///
/// Creates the application and starts the Axum server on the configured address and port.
pub async fn start_server(config: Config) -> Result<()> {
    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_thread_ids(true)
        .with_level(true)
        .init();

    tracing::info!("Starting trainflow server...");

    let app = create_app(config.clone()).await?;

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&bind_addr).await?;

    tracing::info!("Server listening on http://{}", bind_addr);

    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}

/// Health check endpoint handler
async fn health_check() -> &'static str {
    "ok"
}
