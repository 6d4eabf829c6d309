/// Graph editing operations
///
/// These are the interactions the builder exposes: add a node from the library,
/// connect two nodes, reconfigure, delete, and lay out. Connections are checked
/// once, here; nothing re-validates an edge after it exists.

use crate::workflow::{
    compat::{is_compatible, resolve_edge_type},
    library::{self, NodeTemplate},
    types::{DataType, Edge, Node, NodeConfig, Position, Workflow},
};
use anyhow::Result;

impl Workflow {
    /// Build the starter pipeline: CSV Dataset → Data Preprocessor → ML Model → Model Results
    pub fn with_default_pipeline(id: impl Into<String>, name: impl Into<String>) -> Self {
        let mut workflow = Workflow::new(id, name);

        let steps = [
            ("data-1", "csv-dataset"),
            ("process-1", "data-preprocessor"),
            ("model-1", "ml-model"),
            ("output-1", "model-results"),
        ];
        for (index, (node_id, key)) in steps.iter().enumerate() {
            // Built-in keys always resolve
            if let Some(template) = library::template(key) {
                workflow.nodes.push(Node {
                    id: node_id.to_string(),
                    label: template.label.to_string(),
                    position: Position { x: 100.0 + 250.0 * index as f64, y: 250.0 },
                    config: template.config(),
                });
            }
        }

        // Default wiring carries fixed edge types rather than resolved ones
        workflow.edges = [
            ("e1-2", "data-1", "process-1", DataType::Csv),
            ("e2-3", "process-1", "model-1", DataType::ProcessedData),
            ("e3-4", "model-1", "output-1", DataType::Result),
        ]
        .into_iter()
        .map(|(id, source, target, data_type)| Edge {
            id: id.to_string(),
            source: source.to_string(),
            target: target.to_string(),
            data_type,
        })
        .collect();

        workflow
    }

    /// Add a node created from a library template and return it
    pub fn add_node(&mut self, template: &NodeTemplate, label: Option<String>) -> &Node {
        let node = Node {
            id: format!("node-{}", uuid::Uuid::new_v4()),
            label: label.unwrap_or_else(|| template.label.to_string()),
            position: self.next_position(),
            config: template.config(),
        };
        tracing::debug!("➕ Added node '{}' ({:?}) to workflow '{}'", node.id, node.kind(), self.id);
        self.nodes.push(node);
        &self.nodes[self.nodes.len() - 1]
    }

    /// Connect `source` to `target` and return the new edge
    ///
    /// Rejections are silent to the caller (`None`): unknown node, an existing
    /// edge for the same ordered pair, or incompatible data types.
    pub fn connect(&mut self, source: &str, target: &str) -> Option<Edge> {
        let (Some(source_node), Some(target_node)) = (self.node(source), self.node(target)) else {
            tracing::warn!("🔗 Ignoring connection with unknown endpoint: '{}' → '{}'", source, target);
            return None;
        };

        if self.edges.iter().any(|e| e.source == source && e.target == target) {
            tracing::debug!("🔗 Connection '{}' → '{}' already exists", source, target);
            return None;
        }

        let outputs = source_node.output_types();
        let inputs = target_node.input_types();
        if !is_compatible(outputs, inputs) {
            tracing::warn!("🚫 Invalid connection '{}' → '{}': data types not compatible", source, target);
            return None;
        }
        let data_type = resolve_edge_type(outputs, inputs)?;

        let edge = Edge {
            id: format!("edge-{}-{}", source, target),
            source: source.to_string(),
            target: target.to_string(),
            data_type,
        };
        tracing::debug!("🔗 Connected '{}' → '{}' as {}", source, target, data_type);
        self.edges.push(edge.clone());
        Some(edge)
    }

    /// Replace a node's label and/or configuration
    ///
    /// The configuration must keep the node's kind.
    pub fn update_node(&mut self, node_id: &str, label: Option<String>, config: Option<NodeConfig>) -> Result<&Node> {
        let node = self
            .node_mut(node_id)
            .ok_or_else(|| anyhow::anyhow!("Node not found: {}", node_id))?;

        if let Some(config) = config {
            if config.kind() != node.kind() {
                return Err(anyhow::anyhow!(
                    "Cannot change node '{}' from {:?} to {:?}",
                    node_id,
                    node.kind(),
                    config.kind()
                ));
            }
            node.config = config;
        }
        if let Some(label) = label {
            node.label = label;
        }
        Ok(node)
    }

    /// Remove a node and every edge touching it
    pub fn delete_node(&mut self, node_id: &str) -> bool {
        let before = self.nodes.len();
        self.nodes.retain(|n| n.id != node_id);
        if self.nodes.len() == before {
            return false;
        }
        self.edges.retain(|e| e.source != node_id && e.target != node_id);
        true
    }

    pub fn delete_edge(&mut self, edge_id: &str) -> bool {
        let before = self.edges.len();
        self.edges.retain(|e| e.id != edge_id);
        self.edges.len() != before
    }

    /// Lay nodes out left to right in list order
    pub fn arrange(&mut self) {
        for (index, node) in self.nodes.iter_mut().enumerate() {
            node.position = Position {
                x: 150.0 + 300.0 * index as f64,
                y: 300.0,
            };
        }
    }

    fn next_position(&self) -> Position {
        Position {
            x: 150.0 + 300.0 * self.nodes.len() as f64,
            y: 300.0,
        }
    }
}
