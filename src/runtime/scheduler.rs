/// Execution order scheduler
///
/// Orders workflow nodes so every node runs after its upstream dependencies.
/// The graph is walked backwards (target → source) with a post-order DFS, so a
/// node is emitted only once everything feeding it has been emitted.
///
/// Cyclic graphs still produce a total order: the walk restarts from any node
/// left unvisited and breaks the cycle wherever it lands.

use crate::workflow::types::{Edge, Node};
use petgraph::{
    algo::is_cyclic_directed,
    graph::{DiGraph, NodeIndex},
    visit::{DfsPostOrder, Reversed, VisitMap},
};
use std::collections::HashMap;

/// Build a petgraph view of the workflow; node weights are positions in `nodes`
fn build_graph(nodes: &[Node], edges: &[Edge]) -> DiGraph<usize, ()> {
    let mut graph = DiGraph::with_capacity(nodes.len(), edges.len());
    let mut index_of: HashMap<&str, NodeIndex> = HashMap::with_capacity(nodes.len());

    for (position, node) in nodes.iter().enumerate() {
        let index = graph.add_node(position);
        index_of.entry(node.id.as_str()).or_insert(index);
    }

    for edge in edges {
        match (index_of.get(edge.source.as_str()), index_of.get(edge.target.as_str())) {
            (Some(&from), Some(&to)) => {
                graph.add_edge(from, to, ());
            }
            _ => {
                tracing::warn!(
                    "⚠️ Ignoring edge '{}' with unknown endpoint: '{}' → '{}'",
                    edge.id,
                    edge.source,
                    edge.target
                );
            }
        }
    }

    graph
}

/// Compute the order in which nodes execute
///
/// Returns every node id exactly once. For acyclic graphs each edge's source
/// precedes its target; roots are taken in node-list order and dependencies in
/// edge-list order.
pub fn execution_order(nodes: &[Node], edges: &[Edge]) -> Vec<String> {
    let graph = build_graph(nodes, edges);
    let reversed = Reversed(&graph);

    let roots = graph.node_indices().filter(|&index| {
        graph
            .neighbors_directed(index, petgraph::Direction::Incoming)
            .next()
            .is_none()
    });

    let mut dfs = DfsPostOrder::empty(reversed);
    let mut order = Vec::with_capacity(nodes.len());

    // Roots first, then whatever a cycle kept out of reach
    let starts: Vec<NodeIndex> = roots.chain(graph.node_indices()).collect();
    for start in starts {
        if dfs.discovered.is_visited(&start) {
            continue;
        }
        dfs.move_to(start);
        while let Some(index) = dfs.next(reversed) {
            order.push(nodes[graph[index]].id.clone());
        }
    }

    tracing::debug!("📋 Execution order: {:?}", order);
    order
}

/// True when the workflow contains at least one directed cycle
pub fn contains_cycle(nodes: &[Node], edges: &[Edge]) -> bool {
    is_cyclic_directed(&build_graph(nodes, edges))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::types::{DataType, NodeConfig, OutputConfig, Position};

    fn node(id: &str) -> Node {
        Node {
            id: id.to_string(),
            label: id.to_uppercase(),
            position: Position::default(),
            config: NodeConfig::Output(OutputConfig::default()),
        }
    }

    fn edge(source: &str, target: &str) -> Edge {
        Edge {
            id: format!("{}-{}", source, target),
            source: source.to_string(),
            target: target.to_string(),
            data_type: DataType::Any,
        }
    }

    fn position(order: &[String], id: &str) -> usize {
        order.iter().position(|n| n == id).unwrap()
    }

    #[test]
    fn linear_chain_runs_in_sequence() {
        // Nodes listed out of order on purpose
        let nodes = vec![node("c"), node("a"), node("d"), node("b")];
        let edges = vec![edge("a", "b"), edge("b", "c"), edge("c", "d")];
        assert_eq!(execution_order(&nodes, &edges), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn every_edge_points_forward_in_a_dag() {
        let nodes: Vec<_> = ["out", "model", "prep", "csv", "json", "extra"]
            .into_iter()
            .map(node)
            .collect();
        let edges = vec![
            edge("prep", "model"),
            edge("csv", "prep"),
            edge("json", "model"),
            edge("model", "out"),
            edge("json", "out"),
        ];

        let order = execution_order(&nodes, &edges);
        assert_eq!(order.len(), nodes.len());
        for e in &edges {
            assert!(
                position(&order, &e.source) < position(&order, &e.target),
                "{} should precede {} in {:?}",
                e.source,
                e.target,
                order
            );
        }
        assert!(!contains_cycle(&nodes, &edges));
    }

    #[test]
    fn dependencies_are_resolved_in_edge_order() {
        let nodes = vec![node("r"), node("m"), node("p"), node("q")];

        let edges = vec![edge("p", "m"), edge("q", "m"), edge("r", "p"), edge("r", "q")];
        assert_eq!(execution_order(&nodes, &edges), vec!["r", "p", "q", "m"]);

        let edges = vec![edge("q", "m"), edge("p", "m"), edge("r", "p"), edge("r", "q")];
        assert_eq!(execution_order(&nodes, &edges), vec!["r", "q", "p", "m"]);
    }

    #[test]
    fn edges_to_unknown_nodes_are_ignored() {
        let nodes = vec![node("a"), node("b")];
        let edges = vec![edge("a", "b"), edge("b", "ghost"), edge("ghost", "a")];
        assert_eq!(execution_order(&nodes, &edges), vec!["a", "b"]);
        assert!(!contains_cycle(&nodes, &edges));
    }

    #[test]
    fn disconnected_components_are_each_ordered() {
        let nodes = vec![node("b2"), node("a1"), node("a2"), node("b1")];
        let edges = vec![edge("a1", "a2"), edge("b1", "b2")];
        // roots come first, the rest follow in node-list order
        assert_eq!(execution_order(&nodes, &edges), vec!["a1", "b1", "b2", "a2"]);
    }

    #[test]
    fn cycles_still_yield_a_permutation() {
        let nodes = vec![node("a"), node("b"), node("c"), node("d")];
        let edges = vec![edge("a", "b"), edge("b", "c"), edge("c", "b"), edge("d", "d")];

        let mut order = execution_order(&nodes, &edges);
        assert!(contains_cycle(&nodes, &edges));
        assert_eq!(order.len(), 4);
        order.sort();
        assert_eq!(order, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn fully_cyclic_graph_terminates() {
        let nodes = vec![node("a"), node("b"), node("c")];
        let edges = vec![edge("a", "b"), edge("b", "c"), edge("c", "a")];
        let order = execution_order(&nodes, &edges);
        // walk starts at "a" and pulls its dependencies in first
        assert_eq!(order, vec!["b", "c", "a"]);
    }

    #[test]
    fn empty_workflow_has_empty_order() {
        assert!(execution_order(&[], &[]).is_empty());
        assert!(!contains_cycle(&[], &[]));
    }
}
