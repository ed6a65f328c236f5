use std::collections::{HashMap, HashSet};

use log::debug;
use serde::{Deserialize, Serialize};

use trackway_core::catalog::Catalog;
use trackway_core::layout::{InstanceId, Layout, PlacedInstance};
use trackway_core::occupancy::GridOccupancy;
use trackway_core::resolve::{resolve_layout, PinRef, ResolvedPin};

/// How an edge came to exist: declared by the catalog inside one piece,
/// or discovered as a physical pin alignment between two pieces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EdgeKind {
    Internal,
    External,
}

/// A directed edge between two per-pin nodes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub from: usize,
    pub to: usize,
    pub cost: f64,
    pub kind: EdgeKind,
    /// Owning instance for internal edges, `None` for external ones.
    /// Kept explicit so the traversal constraint compares instance ids.
    pub instance: Option<InstanceId>,
}

/// One graph node per (instance, pin).
#[derive(Debug, Clone, Copy)]
pub struct Node {
    pub key: PinRef,
    pub resolved: ResolvedPin,
}

/// A disposable connectivity snapshot over the current placement:
/// rebuilt wholly before each query, never mutated incrementally.
/// Queries take `&self`, so concurrent read-only searches are safe.
#[derive(Debug, Default)]
pub struct ConnectivityGraph {
    nodes: Vec<Node>,
    index: HashMap<PinRef, usize>,
    adjacency: Vec<Vec<Edge>>,
}

impl ConnectivityGraph {
    /// Build the graph from a placement snapshot. Internal edges come
    /// from catalog transitions (directional; the reverse exists only if
    /// separately declared), external edges from resolved pin links
    /// (both directions, equal cost).
    pub fn build(
        instances: &[PlacedInstance],
        catalog: &Catalog,
        occupancy: &GridOccupancy,
    ) -> Self {
        let resolution = resolve_layout(instances, catalog, occupancy);

        let mut graph = Self::default();
        for resolved in resolution.pins {
            let key = PinRef::new(resolved.instance, resolved.pin);
            graph.index.insert(key, graph.nodes.len());
            graph.nodes.push(Node { key, resolved });
            graph.adjacency.push(Vec::new());
        }

        for instance in instances {
            let Some(part) = catalog.part(&instance.part) else {
                continue;
            };
            for t in &part.transitions {
                let entry = graph.index.get(&PinRef::new(instance.id, t.entry));
                let exit = graph.index.get(&PinRef::new(instance.id, t.exit));
                if let (Some(&from), Some(&to)) = (entry, exit) {
                    graph.adjacency[from].push(Edge {
                        from,
                        to,
                        cost: t.length,
                        kind: EdgeKind::Internal,
                        instance: Some(instance.id),
                    });
                }
            }
        }

        for link in &resolution.links {
            let (Some(&a), Some(&b)) = (graph.index.get(&link.a), graph.index.get(&link.b))
            else {
                continue;
            };
            for (from, to) in [(a, b), (b, a)] {
                graph.adjacency[from].push(Edge {
                    from,
                    to,
                    cost: link.cost,
                    kind: EdgeKind::External,
                    instance: None,
                });
            }
        }

        graph.dedup_edges();
        debug!(
            "connectivity graph built: {} nodes, {} edges",
            graph.node_count(),
            graph.edge_count()
        );
        graph
    }

    /// Build from a layout's current instances and occupancy.
    pub fn from_layout(layout: &Layout, catalog: &Catalog) -> Self {
        Self::build(layout.instances(), catalog, layout.occupancy())
    }

    /// Per source node, keep only the first edge registered to each
    /// destination. First wins, not cheapest: an explicit policy, since
    /// parallel edges between the same pin pair are a catalog anomaly
    /// rather than something to silently optimize over.
    fn dedup_edges(&mut self) {
        for edges in &mut self.adjacency {
            let mut seen = HashSet::new();
            edges.retain(|e| seen.insert(e.to));
        }
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.adjacency.iter().map(|e| e.len()).sum()
    }

    pub fn node(&self, index: usize) -> &Node {
        &self.nodes[index]
    }

    pub fn node_index(&self, key: PinRef) -> Option<usize> {
        self.index.get(&key).copied()
    }

    pub fn edges_from(&self, index: usize) -> &[Edge] {
        &self.adjacency[index]
    }

    /// Indices of every node belonging to an instance.
    pub fn instance_nodes(&self, instance: InstanceId) -> Vec<usize> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.key.instance == instance)
            .map(|(i, _)| i)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trackway_core::catalog::PartType;
    use trackway_core::geometry::{Cell, Direction, Rotation};

    fn straight() -> PartType {
        PartType::new("straight", 1, 1)
            .with_pin(0, Direction::Left, Cell::new(0, 0))
            .with_pin(1, Direction::Right, Cell::new(0, 0))
            .with_transition(0, 1, 1.0)
            .with_transition(1, 0, 1.0)
    }

    fn placed(id: InstanceId, x: i32, y: i32) -> PlacedInstance {
        PlacedInstance {
            id,
            part: "straight".to_string(),
            position: Cell::new(x, y),
            rotation: Rotation::R0,
        }
    }

    fn build(instances: &[PlacedInstance], catalog: &Catalog) -> ConnectivityGraph {
        let mut occupancy = GridOccupancy::new();
        occupancy.rebuild_all(instances, catalog);
        ConnectivityGraph::build(instances, catalog, &occupancy)
    }

    #[test]
    fn test_one_node_per_pin() {
        let mut catalog = Catalog::new();
        catalog.add_part(straight()).unwrap();
        let graph = build(&[placed(1, 0, 0), placed(2, 5, 5)], &catalog);
        assert_eq!(graph.node_count(), 4);
        assert_eq!(graph.instance_nodes(1).len(), 2);
        assert_eq!(graph.instance_nodes(2).len(), 2);
    }

    #[test]
    fn test_internal_edges_are_directional() {
        let mut catalog = Catalog::new();
        // Only 0->1 declared; no reverse.
        catalog
            .add_part(
                PartType::new("oneway", 1, 1)
                    .with_pin(0, Direction::Left, Cell::new(0, 0))
                    .with_pin(1, Direction::Right, Cell::new(0, 0))
                    .with_transition(0, 1, 1.0),
            )
            .unwrap();
        let mut instance = placed(1, 0, 0);
        instance.part = "oneway".to_string();
        let graph = build(&[instance], &catalog);

        let n0 = graph.node_index(PinRef::new(1, 0)).unwrap();
        let n1 = graph.node_index(PinRef::new(1, 1)).unwrap();
        assert_eq!(graph.edges_from(n0).len(), 1);
        assert_eq!(graph.edges_from(n0)[0].to, n1);
        assert!(graph.edges_from(n1).is_empty());
    }

    #[test]
    fn test_external_edges_are_symmetric() {
        let mut catalog = Catalog::new();
        catalog.add_part(straight()).unwrap();
        let graph = build(&[placed(1, 0, 0), placed(2, 1, 0)], &catalog);

        let a = graph.node_index(PinRef::new(1, 1)).unwrap();
        let b = graph.node_index(PinRef::new(2, 0)).unwrap();
        let forward = graph
            .edges_from(a)
            .iter()
            .find(|e| e.to == b && e.kind == EdgeKind::External)
            .expect("forward external edge");
        let backward = graph
            .edges_from(b)
            .iter()
            .find(|e| e.to == a && e.kind == EdgeKind::External)
            .expect("backward external edge");
        assert!(forward.cost > 0.0);
        assert!((forward.cost - backward.cost).abs() < 1e-10);
    }

    #[test]
    fn test_first_registered_edge_wins() {
        let mut catalog = Catalog::new();
        // Two parallel transitions for the same pin pair; the first
        // declared one survives dedup even though it is costlier.
        catalog
            .add_part(
                PartType::new("parallel", 1, 1)
                    .with_pin(0, Direction::Left, Cell::new(0, 0))
                    .with_pin(1, Direction::Right, Cell::new(0, 0))
                    .with_transition(0, 1, 5.0)
                    .with_transition(0, 1, 1.0),
            )
            .unwrap();
        let mut instance = placed(1, 0, 0);
        instance.part = "parallel".to_string();
        let graph = build(&[instance], &catalog);

        let n0 = graph.node_index(PinRef::new(1, 0)).unwrap();
        assert_eq!(graph.edges_from(n0).len(), 1);
        assert!((graph.edges_from(n0)[0].cost - 5.0).abs() < 1e-10);
    }

    #[test]
    fn test_unknown_part_has_no_nodes() {
        let mut catalog = Catalog::new();
        catalog.add_part(straight()).unwrap();
        let mut ghost = placed(9, 3, 3);
        ghost.part = "no_such_part".to_string();
        let graph = build(&[ghost, placed(1, 0, 0)], &catalog);
        assert_eq!(graph.node_count(), 2);
        assert!(graph.instance_nodes(9).is_empty());
    }
}
