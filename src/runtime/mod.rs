/// Runtime Execution Engine
///
/// This module runs workflows:
/// - Ordering nodes by their dependencies (petgraph post-order DFS)
/// - Executing each node kind (dataset loading, training API calls, metrics)
/// - Tracking run status, node state and the execution log
/// - Sequential async orchestration with cancellation

// Sequential orchestrator
pub mod engine;

// Individual node execution handlers
pub mod executor;

// Live run state shared with the API
pub mod monitor;

// Dependency ordering
pub mod scheduler;

// Re-export main types
pub use engine::ExecutionEngine;
pub use executor::{ExecutionResult, Metric, NodeAnnotations, NodeExecutor};
pub use monitor::{ExecutionLogEntry, LogStatus, NodeStatus, RunMonitor, RunSnapshot, RunStatus};
pub use scheduler::{contains_cycle, execution_order};
