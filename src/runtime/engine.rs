/// Workflow orchestrator
///
/// Runs a workflow's nodes one at a time in dependency order, feeding each node
/// the output of its upstream node. The first failure stops the run; nodes that
/// already succeeded keep their state.

use crate::{
    error::NodeError,
    runtime::{
        executor::NodeExecutor,
        monitor::{ExecutionLogEntry, LogStatus, NodeStatus, RunMonitor, RunStatus},
        scheduler::{contains_cycle, execution_order},
    },
    workflow::types::{Payload, Workflow},
};
use std::{collections::HashMap, sync::Arc};
use tokio_util::sync::CancellationToken;

/// Sequential execution engine
///
/// Cheap to clone; the executor (and its HTTP client) is shared.
#[derive(Debug, Clone)]
pub struct ExecutionEngine {
    /// Node executor for handling individual node execution
    executor: Arc<NodeExecutor>,
}

impl ExecutionEngine {
    pub fn new(executor: Arc<NodeExecutor>) -> Self {
        Self { executor }
    }

    pub fn executor(&self) -> &NodeExecutor {
        &self.executor
    }

    /// Run a workflow to completion, recording progress on `monitor`
    ///
    /// Returns `Skipped` without touching the monitor when a run is already in
    /// flight or the workflow has no nodes.
    pub async fn run_workflow(&self, workflow: &Workflow, monitor: &RunMonitor) -> RunStatus {
        if workflow.nodes.is_empty() {
            tracing::debug!("⏭️ Workflow '{}' has no nodes; nothing to run", workflow.id);
            return RunStatus::Skipped;
        }
        let Some(token) = monitor.try_begin() else {
            tracing::warn!("⏸️ Workflow '{}' is already running", workflow.id);
            return RunStatus::Skipped;
        };
        self.run_claimed(workflow, monitor, token).await
    }

    /// Run a workflow on a monitor the caller already claimed with `try_begin`
    ///
    /// Releases the monitor when done.
    pub async fn run_claimed(
        &self,
        workflow: &Workflow,
        monitor: &RunMonitor,
        token: CancellationToken,
    ) -> RunStatus {
        let workflow_start_time = std::time::Instant::now();
        tracing::info!(
            "🚀 Starting workflow execution: '{}' ({} nodes, {} edges)",
            workflow.id,
            workflow.nodes.len(),
            workflow.edges.len()
        );

        monitor.reset(workflow.nodes.iter().map(|n| n.id.as_str()));

        if contains_cycle(&workflow.nodes, &workflow.edges) {
            tracing::warn!("🔁 Workflow '{}' contains a cycle; running in best-effort order", workflow.id);
            monitor.append_log(ExecutionLogEntry::run(
                LogStatus::Info,
                "Workflow contains a cycle; running in best-effort order",
            ));
        }

        let failure = self.execute_nodes(workflow, monitor, &token).await;

        let status = match failure {
            None => {
                tracing::info!(
                    "🎉 Workflow '{}' execution completed successfully in {:?}",
                    workflow.id,
                    workflow_start_time.elapsed()
                );
                monitor.append_log(ExecutionLogEntry::run(
                    LogStatus::Success,
                    "Workflow execution completed successfully",
                ));
                RunStatus::Success
            }
            Some(NodeError::Cancelled) => {
                tracing::warn!("🛑 Workflow '{}' execution cancelled", workflow.id);
                monitor.append_log(ExecutionLogEntry::run(LogStatus::Error, "Workflow execution cancelled"));
                RunStatus::Cancelled
            }
            Some(e) => {
                tracing::error!("❌ Workflow '{}' execution failed: {} [{}]", workflow.id, e, e.code());
                monitor.append_log(ExecutionLogEntry::run(
                    LogStatus::Error,
                    format!("Workflow execution failed: {}", e),
                ));
                RunStatus::Error
            }
        };

        monitor.set_status(status);
        monitor.finish();
        status
    }

    /// Execute nodes in order; returns the error that stopped the run, if any
    async fn execute_nodes(
        &self,
        workflow: &Workflow,
        monitor: &RunMonitor,
        token: &CancellationToken,
    ) -> Option<NodeError> {
        let order = execution_order(&workflow.nodes, &workflow.edges);
        let mut outputs: HashMap<&str, Payload> = HashMap::with_capacity(order.len());

        for (step_num, node_id) in order.iter().enumerate() {
            let Some(node) = workflow.node(node_id) else {
                continue;
            };
            tracing::info!(
                "📍 Step {}/{}: Executing node '{}' (kind: {:?})",
                step_num + 1,
                order.len(),
                node.id,
                node.kind()
            );

            // Only the first incoming edge feeds the node
            let mut incoming = workflow.incoming_edges(&node.id);
            let input = incoming.next().and_then(|edge| outputs.get(edge.source.as_str()));
            let ignored: Vec<&str> = incoming.map(|edge| edge.source.as_str()).collect();
            if !ignored.is_empty() {
                tracing::debug!("🔀 Node '{}' ignores input from {:?}", node.id, ignored);
            }

            monitor.append_log(ExecutionLogEntry::node(&node.id, &node.label, LogStatus::Executing, None));

            let result = tokio::select! {
                biased;
                _ = token.cancelled() => Err(NodeError::Cancelled),
                result = self.executor.execute_node(node, input, monitor) => result,
            };

            match result {
                Ok(result) => {
                    monitor.append_log(ExecutionLogEntry::node(&node.id, &node.label, LogStatus::Success, None));
                    outputs.insert(node.id.as_str(), result.payload);
                }
                Err(e) => {
                    // A cancelled executor never got to mark the node itself
                    monitor.set_node_status(&node.id, NodeStatus::Error);
                    monitor.append_log(ExecutionLogEntry::node(
                        &node.id,
                        &node.label,
                        LogStatus::Error,
                        Some(e.to_string()),
                    ));
                    return Some(e);
                }
            }
        }

        None
    }
}
