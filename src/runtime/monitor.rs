/// Run monitor: live status, per-node display state and the execution log
///
/// Written only by the orchestrator and the executors it drives; read by the API
/// while a run is in flight. Locks are never held across an `.await`.

use crate::runtime::executor::{Metric, NodeAnnotations};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, Ordering},
        Mutex, PoisonError, RwLock,
    },
};
use tokio_util::sync::CancellationToken;

/// Overall status of the latest run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    #[default]
    Ready,
    Running,
    Success,
    Error,
    Cancelled,
    /// Run request was a no-op (already running, or nothing to run)
    Skipped,
}

/// Visual status of a single node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeStatus {
    #[default]
    Ready,
    Executing,
    Success,
    Error,
}

/// Status recorded in an execution log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogStatus {
    Executing,
    Success,
    Error,
    Info,
}

/// One line of the execution log; appended, never mutated
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionLogEntry {
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_label: Option<String>,
    pub status: LogStatus,
    /// Run-level message (start/finish)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExecutionLogEntry {
    pub fn run(status: LogStatus, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            node_id: None,
            node_label: None,
            status,
            message: Some(message.into()),
            error: None,
        }
    }

    pub fn node(node_id: &str, node_label: &str, status: LogStatus, error: Option<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            node_id: Some(node_id.to_string()),
            node_label: Some(node_label.to_string()),
            status,
            message: None,
            error,
        }
    }
}

/// Display state of a node after (or during) a run
#[derive(Debug, Clone, Default, Serialize)]
pub struct NodeState {
    pub status: NodeStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub training_time: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub metrics: Vec<Metric>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
}

/// Point-in-time copy of the monitor, safe to serialize
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSnapshot {
    pub status: RunStatus,
    pub nodes: HashMap<String, NodeState>,
    pub log: Vec<ExecutionLogEntry>,
}

/// Shared run state for one workflow
#[derive(Debug, Default)]
pub struct RunMonitor {
    /// Re-entrancy guard; set for the whole duration of a run
    running: AtomicBool,
    state: RwLock<RunSnapshot>,
    cancel: Mutex<Option<CancellationToken>>,
}

impl RunMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the monitor for a new run and arm its cancellation token
    ///
    /// `None` if a run is already in flight. The caller owns the run until it
    /// calls `finish`.
    pub fn try_begin(&self) -> Option<CancellationToken> {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;
        let token = CancellationToken::new();
        *self.cancel.lock().unwrap_or_else(PoisonError::into_inner) = Some(token.clone());
        Some(token)
    }

    /// Release the guard and drop the run's cancellation token
    pub fn finish(&self) {
        self.cancel.lock().unwrap_or_else(PoisonError::into_inner).take();
        self.running.store(false, Ordering::Release);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Cancel the in-flight run; false when nothing is running
    pub fn cancel(&self) -> bool {
        match self.cancel.lock().unwrap_or_else(PoisonError::into_inner).as_ref() {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// Clear the previous run: fresh log, every node back to `ready`
    pub fn reset<'a>(&self, node_ids: impl IntoIterator<Item = &'a str>) {
        let mut state = self.write();
        state.status = RunStatus::Running;
        state.log = vec![ExecutionLogEntry::run(LogStatus::Info, "Workflow execution started")];
        state.nodes = node_ids
            .into_iter()
            .map(|id| (id.to_string(), NodeState::default()))
            .collect();
    }

    pub fn set_status(&self, status: RunStatus) {
        self.write().status = status;
    }

    pub fn set_node_status(&self, node_id: &str, status: NodeStatus) {
        self.write().nodes.entry(node_id.to_string()).or_default().status = status;
    }

    /// Mark a node successful and merge in what its executor produced
    pub fn complete_node(&self, node_id: &str, annotations: NodeAnnotations) {
        let mut state = self.write();
        let node = state.nodes.entry(node_id.to_string()).or_default();
        node.status = NodeStatus::Success;
        if annotations.label.is_some() {
            node.label = annotations.label;
        }
        if annotations.accuracy.is_some() {
            node.accuracy = annotations.accuracy;
        }
        if annotations.training_time.is_some() {
            node.training_time = annotations.training_time;
        }
        if !annotations.metrics.is_empty() {
            node.metrics = annotations.metrics;
        }
        if annotations.result.is_some() {
            node.result = annotations.result;
        }
    }

    pub fn append_log(&self, entry: ExecutionLogEntry) {
        self.write().log.push(entry);
    }

    pub fn snapshot(&self) -> RunSnapshot {
        self.state.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Result JSON recorded for a node by the latest run
    pub fn node_result(&self, node_id: &str) -> Option<Value> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .nodes
            .get(node_id)
            .and_then(|n| n.result.clone())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, RunSnapshot> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_rejects_a_second_run() {
        let monitor = RunMonitor::new();
        assert!(monitor.try_begin().is_some());
        assert!(monitor.try_begin().is_none());
        assert!(monitor.is_running());
        monitor.finish();
        assert!(!monitor.is_running());
        assert!(monitor.try_begin().is_some());
    }

    #[test]
    fn reset_clears_log_and_node_state() {
        let monitor = RunMonitor::new();
        monitor.reset(["a", "b"]);
        monitor.set_node_status("a", NodeStatus::Error);
        monitor.append_log(ExecutionLogEntry::node("a", "A", LogStatus::Error, Some("boom".into())));

        monitor.reset(["a", "b"]);
        let snap = monitor.snapshot();
        assert_eq!(snap.status, RunStatus::Running);
        assert_eq!(snap.log.len(), 1);
        assert_eq!(snap.log[0].status, LogStatus::Info);
        assert!(snap.nodes.values().all(|n| n.status == NodeStatus::Ready));
    }

    #[test]
    fn cancel_only_fires_during_a_run() {
        let monitor = RunMonitor::new();
        assert!(!monitor.cancel());

        let token = monitor.try_begin().unwrap();
        assert!(monitor.cancel());
        assert!(token.is_cancelled());

        monitor.finish();
        assert!(!monitor.cancel());
    }
}
