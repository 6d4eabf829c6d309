/// HTTP API Layer
///
/// This module provides the REST API endpoints for building and running
/// workflows. It handles:
/// - Catalog and node library listings
/// - Workflow and graph editing operations
/// - Run triggering, cancellation and execution status
/// - Result and trained model downloads

// Workflow builder and run endpoints
pub mod workflows;

// Re-export router builders
pub use workflows::{create_workflow_routes, AppState};
