/// Trainflow: visual ML training workflows, run server-side
///
/// This library provides the workflow graph model, a dependency-ordered
/// sequential executor that drives a remote model-training API, and the REST
/// surface a workflow builder UI talks to.

// Core configuration and setup
pub mod config;

// Error taxonomy for node execution and training API calls
pub mod error;

// Read-only model catalog keyed by slug
pub mod catalog;

// Workflow management layer - graph types, editing operations and session registry
pub mod workflow;

// Remote training API client and request parameters
pub mod training;

// Runtime execution engine - ordering, node executors, run monitoring
pub mod runtime;

// HTTP API layer - REST endpoints for building and running workflows
pub mod api;

// Server setup and initialization
pub mod server;

// Re-export commonly used types for external consumers
pub use catalog::{ModelCatalog, ModelSpec};
pub use error::{ApiError, NodeError};
pub use runtime::{ExecutionEngine, ExecutionResult, RunMonitor, RunStatus};
pub use server::start_server;
pub use workflow::{DataType, Edge, Node, NodeConfig, Workflow};
