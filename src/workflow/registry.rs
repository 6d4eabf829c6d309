/// Workflow session registry using ArcSwap
///
/// Every workflow being edited lives in a session: its graph plus the monitor
/// of its latest run. The map of sessions is swapped atomically on create and
/// remove, so lookups never block; edits to one session take that session's
/// lock only.

use crate::{runtime::monitor::RunMonitor, workflow::types::Workflow};
use arc_swap::ArcSwap;
use std::{
    collections::HashMap,
    sync::{Arc, PoisonError, RwLock},
};

/// A workflow being edited, and the state of its latest run
#[derive(Debug)]
pub struct WorkflowSession {
    workflow: RwLock<Workflow>,
    pub monitor: RunMonitor,
}

impl WorkflowSession {
    pub fn new(workflow: Workflow) -> Self {
        Self {
            workflow: RwLock::new(workflow),
            monitor: RunMonitor::new(),
        }
    }

    pub fn id(&self) -> String {
        self.read(|wf| wf.id.clone())
    }

    /// Owned copy of the graph; runs execute against one of these
    pub fn snapshot(&self) -> Workflow {
        self.read(Workflow::clone)
    }

    /// Read the graph without cloning it
    pub fn read<T>(&self, f: impl FnOnce(&Workflow) -> T) -> T {
        f(&self.workflow.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Mutate the graph under the session's write lock
    pub fn edit<T>(&self, f: impl FnOnce(&mut Workflow) -> T) -> T {
        f(&mut self.workflow.write().unwrap_or_else(PoisonError::into_inner))
    }
}

/// Lock-free registry of live workflow sessions
#[derive(Debug, Default)]
pub struct WorkflowRegistry {
    /// Key: workflow id
    sessions: ArcSwap<HashMap<String, Arc<WorkflowSession>>>,
}

impl WorkflowRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a workflow and return its session
    ///
    /// An existing session with the same id is replaced.
    pub fn create(&self, workflow: Workflow) -> Arc<WorkflowSession> {
        let id = workflow.id.clone();
        let session = Arc::new(WorkflowSession::new(workflow));

        self.sessions.rcu(|current| {
            let mut next = (**current).clone();
            next.insert(id.clone(), Arc::clone(&session));
            next
        });

        tracing::info!("📋 Registered workflow session: {}", id);
        session
    }

    pub fn get(&self, workflow_id: &str) -> Option<Arc<WorkflowSession>> {
        self.sessions.load().get(workflow_id).cloned()
    }

    /// All sessions, sorted by workflow id
    pub fn list(&self) -> Vec<Arc<WorkflowSession>> {
        let sessions = self.sessions.load();
        let mut ids: Vec<&String> = sessions.keys().collect();
        ids.sort();
        ids.into_iter().filter_map(|id| sessions.get(id).cloned()).collect()
    }

    /// Drop a session; a run already in flight finishes on its own copy
    pub fn remove(&self, workflow_id: &str) -> bool {
        let previous = self.sessions.rcu(|current| {
            let mut next = (**current).clone();
            next.remove(workflow_id);
            next
        });

        let removed = previous.contains_key(workflow_id);
        if removed {
            tracing::info!("🗑️ Removed workflow session: {}", workflow_id);
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.sessions.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.load().is_empty()
    }
}
