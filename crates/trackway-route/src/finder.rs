use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::time::Instant;

use log::debug;
use serde::{Deserialize, Serialize};

use trackway_core::catalog::PinId;
use trackway_core::layout::InstanceId;

use crate::graph::{ConnectivityGraph, Edge, EdgeKind};

/// How a path entered and exited one instance. `None` marks an
/// uncommitted pin: the first record's entry and the last record's
/// exit, since start and end instances are chosen without naming a pin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Traversal {
    pub instance: InstanceId,
    pub entry: Option<PinId>,
    pub exit: Option<PinId>,
}

/// The outcome of a path query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathResult {
    pub success: bool,
    pub total_cost: f64,
    pub traversals: Vec<Traversal>,
}

impl PathResult {
    fn failure() -> Self {
        Self {
            success: false,
            total_cost: 0.0,
            traversals: Vec::new(),
        }
    }
}

/// Open-set entry ordered so `BinaryHeap` pops the cheapest node first.
struct OpenEntry {
    cost: f64,
    node: usize,
}

impl PartialEq for OpenEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OpenEntry {}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.node.cmp(&self.node))
    }
}

/// Cheapest path from any pin of `start` to any pin of `end`.
///
/// Same-instance queries are out of this algorithm's domain and report
/// failure; callers wanting "already there" semantics handle that case
/// themselves.
pub fn find_path(graph: &ConnectivityGraph, start: InstanceId, end: InstanceId) -> PathResult {
    find_path_with_deadline(graph, start, end, None)
}

/// `find_path` with an optional wall-clock deadline. When the deadline
/// passes mid-search, the search is abandoned and failure is reported.
pub fn find_path_with_deadline(
    graph: &ConnectivityGraph,
    start: InstanceId,
    end: InstanceId,
    deadline: Option<Instant>,
) -> PathResult {
    if start == end {
        return PathResult::failure();
    }
    let sources = graph.instance_nodes(start);
    let goals = graph.instance_nodes(end);
    if sources.is_empty() || goals.is_empty() {
        return PathResult::failure();
    }

    let n = graph.node_count();
    let mut dist = vec![f64::INFINITY; n];
    let mut parent: Vec<Option<Edge>> = vec![None; n];
    let mut settled = vec![false; n];
    let mut open = BinaryHeap::new();

    // The caller has not committed to an entry pin, so every node of
    // the start instance is a zero-cost source.
    for &source in &sources {
        dist[source] = 0.0;
        open.push(OpenEntry {
            cost: 0.0,
            node: source,
        });
    }

    // The search runs the open set dry instead of stopping at the
    // first settled goal; every settled goal is recorded and the
    // cheapest one wins (ties by discovery order).
    let mut settled_goals: Vec<(usize, f64)> = Vec::new();

    while let Some(OpenEntry { cost, node }) = open.pop() {
        if settled[node] {
            continue;
        }
        if let Some(deadline) = deadline {
            if Instant::now() >= deadline {
                debug!("path search from {} to {} hit its deadline", start, end);
                return PathResult::failure();
            }
        }
        settled[node] = true;
        if graph.node(node).key.instance == end {
            settled_goals.push((node, cost));
        }

        for edge in graph.edges_from(node) {
            // One visit to a piece may consume at most one internal
            // transition; a second internal edge of the same instance
            // requires leaving through an external edge first.
            if let Some(prev) = &parent[node] {
                if prev.kind == EdgeKind::Internal
                    && edge.kind == EdgeKind::Internal
                    && prev.instance == edge.instance
                {
                    continue;
                }
            }
            let next = cost + edge.cost;
            if !settled[edge.to] && next < dist[edge.to] {
                dist[edge.to] = next;
                parent[edge.to] = Some(*edge);
                open.push(OpenEntry {
                    cost: next,
                    node: edge.to,
                });
            }
        }
    }

    let mut best: Option<(usize, f64)> = None;
    for &(node, cost) in &settled_goals {
        if best.map_or(true, |(_, best_cost)| cost < best_cost) {
            best = Some((node, cost));
        }
    }
    let Some((goal, total_cost)) = best else {
        return PathResult::failure();
    };

    // Walk parent edges back to a source, then collapse consecutive
    // same-instance nodes into traversal records.
    let mut node_path = vec![goal];
    let mut current = goal;
    while let Some(edge) = &parent[current] {
        current = edge.from;
        node_path.push(current);
    }
    node_path.reverse();

    let mut traversals: Vec<Traversal> = Vec::new();
    for &index in &node_path {
        let key = graph.node(index).key;
        match traversals.last_mut() {
            Some(last) if last.instance == key.instance => last.exit = Some(key.pin),
            _ => traversals.push(Traversal {
                instance: key.instance,
                entry: Some(key.pin),
                exit: Some(key.pin),
            }),
        }
    }
    if let Some(first) = traversals.first_mut() {
        first.entry = None;
    }
    if let Some(last) = traversals.last_mut() {
        last.exit = None;
    }

    PathResult {
        success: true,
        total_cost,
        traversals,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trackway_core::catalog::{Catalog, PartType};
    use trackway_core::geometry::{Cell, Direction, Rotation};
    use trackway_core::layout::PlacedInstance;
    use trackway_core::occupancy::GridOccupancy;

    fn straight_catalog() -> Catalog {
        let mut catalog = Catalog::new();
        catalog
            .add_part(
                PartType::new("straight", 1, 1)
                    .with_pin(0, Direction::Left, Cell::new(0, 0))
                    .with_pin(1, Direction::Right, Cell::new(0, 0))
                    .with_transition(0, 1, 1.0)
                    .with_transition(1, 0, 1.0),
            )
            .unwrap();
        catalog
    }

    fn placed(id: u64, x: i32, y: i32) -> PlacedInstance {
        PlacedInstance {
            id,
            part: "straight".to_string(),
            position: Cell::new(x, y),
            rotation: Rotation::R0,
        }
    }

    fn graph_for(instances: &[PlacedInstance], catalog: &Catalog) -> ConnectivityGraph {
        let mut occupancy = GridOccupancy::new();
        occupancy.rebuild_all(instances, catalog);
        ConnectivityGraph::build(instances, catalog, &occupancy)
    }

    #[test]
    fn test_same_instance_query_fails() {
        let catalog = straight_catalog();
        let graph = graph_for(&[placed(1, 0, 0)], &catalog);
        assert!(!find_path(&graph, 1, 1).success);
    }

    #[test]
    fn test_unknown_instance_fails() {
        let catalog = straight_catalog();
        let graph = graph_for(&[placed(1, 0, 0)], &catalog);
        assert!(!find_path(&graph, 1, 42).success);
        assert!(!find_path(&graph, 42, 1).success);
    }

    #[test]
    fn test_adjacent_pair() {
        let catalog = straight_catalog();
        let graph = graph_for(&[placed(1, 0, 0), placed(2, 1, 0)], &catalog);
        let result = find_path(&graph, 1, 2);
        assert!(result.success);
        // External hop only: the goal settles at the entry pin.
        assert!((result.total_cost - 1.0).abs() < 1e-10);
        assert_eq!(result.traversals.len(), 2);
        assert_eq!(result.traversals[0].entry, None);
        assert_eq!(result.traversals[1].exit, None);
    }

    #[test]
    fn test_expired_deadline_fails() {
        let catalog = straight_catalog();
        let graph = graph_for(&[placed(1, 0, 0), placed(2, 1, 0)], &catalog);
        let result = find_path_with_deadline(&graph, 1, 2, Some(Instant::now()));
        assert!(!result.success);
    }
}
