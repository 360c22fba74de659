//! # Signal Graph
//!
//! The deterministic graph of signal sinks and sources.
//!
//! Edges run from the device consuming a signal to the node providing it,
//! which is the reverse of physical signal flow. Walking outgoing edges from
//! a display therefore enumerates every upstream option it can select, and
//! deleting a node takes exactly the edges that depended on it.
//!
//! In graph terms this makes displays the `sources` (nothing points at them)
//! and laptops, cameras and other origins the `sinks` (they point at
//! nothing).
//!
//! All data structures use `BTreeMap` for deterministic ordering.

use crate::{Activation, Edge, Node, NodeId, RouterError};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Cost of traversing one edge. Every edge is one physical switch.
pub const HOP_WEIGHT: u64 = 1;

// =============================================================================
// SIGNAL GRAPH
// =============================================================================

/// The signal-routing graph.
///
/// Built once per configuration load and replaced wholesale afterwards.
#[derive(Debug, Clone, Default)]
pub struct SignalGraph {
    /// Node storage: NodeId -> Node (with its outgoing edges)
    nodes: BTreeMap<NodeId, Node>,
}

impl SignalGraph {
    /// Create an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // -------------------------------------------------------------------------
    // Mutation
    // -------------------------------------------------------------------------

    /// Insert a node. Inserting an existing id is a no-op.
    ///
    /// Returns `true` if the node was new.
    pub fn insert(&mut self, id: NodeId) -> bool {
        if self.nodes.contains_key(&id) {
            return false;
        }
        self.nodes.insert(id.clone(), Node::new(id));
        true
    }

    /// Join `source -> target` with an optional activation.
    ///
    /// Both nodes must already exist. If the pair is already joined the
    /// existing edge is kept and `false` is returned.
    pub fn join(
        &mut self,
        source: &NodeId,
        target: &NodeId,
        activation: Option<Activation>,
    ) -> Result<bool, RouterError> {
        if !self.nodes.contains_key(target) {
            return Err(RouterError::NodeNotFound(target.clone()));
        }
        let node = self
            .nodes
            .get_mut(source)
            .ok_or_else(|| RouterError::NodeNotFound(source.clone()))?;

        if node.edges.contains_key(target) {
            return Ok(false);
        }
        node.edges.insert(
            target.clone(),
            Edge::new(node.id.clone(), target.clone(), activation),
        );
        Ok(true)
    }

    /// Remove a node, its outgoing edges and every edge pointing at it.
    pub fn delete(&mut self, id: &NodeId) -> Result<Node, RouterError> {
        let removed = self
            .nodes
            .remove(id)
            .ok_or_else(|| RouterError::NodeNotFound(id.clone()))?;

        for node in self.nodes.values_mut() {
            node.edges.remove(id);
        }

        Ok(removed)
    }

    // -------------------------------------------------------------------------
    // Lookup
    // -------------------------------------------------------------------------

    /// Check if the graph contains a node.
    #[must_use]
    pub fn contains(&self, id: &NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Get a node by id.
    pub fn node(&self, id: &NodeId) -> Result<&Node, RouterError> {
        self.nodes
            .get(id)
            .ok_or_else(|| RouterError::NodeNotFound(id.clone()))
    }

    /// All nodes in deterministic order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// All node ids in deterministic order.
    #[must_use]
    pub fn node_ids(&self) -> Vec<NodeId> {
        self.nodes.keys().cloned().collect()
    }

    /// Total number of nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Total number of edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.nodes.values().map(Node::outdegree).sum()
    }

    /// All edges in deterministic order (by source, then target).
    pub fn edges(&self) -> impl Iterator<Item = &Edge> + '_ {
        self.nodes.values().flat_map(|node| node.edges.values())
    }

    /// The edge `from -> to`, if present.
    #[must_use]
    pub fn edge(&self, from: &NodeId, to: &NodeId) -> Option<&Edge> {
        self.nodes.get(from)?.edge_to(to)
    }

    // -------------------------------------------------------------------------
    // Structural queries
    // -------------------------------------------------------------------------

    /// Edges leaving `id`.
    pub fn outgoing_edges(&self, id: &NodeId) -> Result<Vec<&Edge>, RouterError> {
        Ok(self.node(id)?.edges.values().collect())
    }

    /// Edges arriving at `id`, ordered by their source.
    pub fn incoming_edges(&self, id: &NodeId) -> Result<Vec<&Edge>, RouterError> {
        if !self.contains(id) {
            return Err(RouterError::NodeNotFound(id.clone()));
        }
        Ok(self.edges().filter(|edge| edge.target == *id).collect())
    }

    /// Number of edges in the whole graph whose target is `id`.
    pub fn indegree(&self, id: &NodeId) -> Result<usize, RouterError> {
        self.incoming_edges(id).map(|edges| edges.len())
    }

    /// Number of edges owned by `id`.
    pub fn outdegree(&self, id: &NodeId) -> Result<usize, RouterError> {
        self.node(id).map(Node::outdegree)
    }

    /// Nodes `id` points at.
    pub fn successors(&self, id: &NodeId) -> Result<Vec<NodeId>, RouterError> {
        Ok(self.node(id)?.edges.keys().cloned().collect())
    }

    /// Nodes pointing at `id`.
    pub fn predecessors(&self, id: &NodeId) -> Result<Vec<NodeId>, RouterError> {
        Ok(self
            .incoming_edges(id)?
            .into_iter()
            .map(|edge| edge.source.clone())
            .collect())
    }

    /// Nodes with indegree zero.
    ///
    /// With inverted edges these are the signal destinations (displays).
    #[must_use]
    pub fn sources(&self) -> Vec<NodeId> {
        let targeted: BTreeSet<&NodeId> = self.edges().map(|edge| &edge.target).collect();
        self.nodes
            .keys()
            .filter(|id| !targeted.contains(id))
            .cloned()
            .collect()
    }

    /// Nodes with outdegree zero.
    ///
    /// With inverted edges these are the signal origins (laptops, cameras).
    #[must_use]
    pub fn sinks(&self) -> Vec<NodeId> {
        self.nodes
            .values()
            .filter(|node| node.outdegree() == 0)
            .map(|node| node.id.clone())
            .collect()
    }

    // -------------------------------------------------------------------------
    // Shortest paths
    // -------------------------------------------------------------------------

    /// Single-source shortest paths from `from`, following stored edges.
    ///
    /// Dijkstra over `HOP_WEIGHT` edges. The frontier is drained in
    /// (distance, node id) order and a distance is only replaced by a
    /// strictly shorter one, so ties always resolve the same way.
    pub fn shortest_paths(&self, from: &NodeId) -> Result<Paths, RouterError> {
        if !self.contains(from) {
            return Err(RouterError::NodeNotFound(from.clone()));
        }

        let mut distance: BTreeMap<NodeId, u64> = BTreeMap::new();
        let mut predecessor: BTreeMap<NodeId, NodeId> = BTreeMap::new();
        let mut visited: BTreeSet<NodeId> = BTreeSet::new();

        distance.insert(from.clone(), 0);

        loop {
            // Unvisited node with minimum distance; ties go to the smallest id
            let current = distance
                .iter()
                .filter(|(id, _)| !visited.contains(*id))
                .min_by_key(|(_, d)| **d)
                .map(|(id, d)| (id.clone(), *d));

            let Some((current, current_distance)) = current else {
                break;
            };
            visited.insert(current.clone());

            let Some(node) = self.nodes.get(&current) else {
                continue;
            };

            for neighbor in node.edges.keys() {
                if visited.contains(neighbor) {
                    continue;
                }
                let candidate = current_distance.saturating_add(HOP_WEIGHT);
                let improves = distance
                    .get(neighbor)
                    .is_none_or(|&known| candidate < known);
                if improves {
                    distance.insert(neighbor.clone(), candidate);
                    predecessor.insert(neighbor.clone(), current.clone());
                }
            }
        }

        Ok(Paths {
            from: from.clone(),
            distance,
            predecessor,
        })
    }

    /// Shortest route carrying `source`'s signal to `target`.
    ///
    /// The path is ordered destination first, following stored edge
    /// direction: `route(Laptop_1, Display_1)` yields
    /// `[Display_1, Switcher_1__1, Laptop_1]`.
    pub fn route(&self, source: &NodeId, target: &NodeId) -> Result<Vec<NodeId>, RouterError> {
        if !self.contains(source) {
            return Err(RouterError::NodeNotFound(source.clone()));
        }
        self.shortest_paths(target)?
            .path_to(source)
            .ok_or_else(|| RouterError::NoRoute {
                from: source.clone(),
                to: target.clone(),
            })
    }

    /// Number of hops on the shortest route from `source` to `target`.
    pub fn distance(&self, source: &NodeId, target: &NodeId) -> Result<u64, RouterError> {
        if !self.contains(source) {
            return Err(RouterError::NodeNotFound(source.clone()));
        }
        self.shortest_paths(target)?
            .distance_to(source)
            .ok_or_else(|| RouterError::NoRoute {
                from: source.clone(),
                to: target.clone(),
            })
    }

    /// Edges traversed by a node path, in path order.
    ///
    /// Fails if two consecutive nodes are not joined.
    pub fn path_edges(&self, path: &[NodeId]) -> Result<Vec<&Edge>, RouterError> {
        path.windows(2)
            .map(|pair| {
                self.edge(&pair[0], &pair[1])
                    .ok_or_else(|| RouterError::NoRoute {
                        from: pair[1].clone(),
                        to: pair[0].clone(),
                    })
            })
            .collect()
    }
}

impl fmt::Display for SignalGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for node in self.nodes.values() {
            if node.edges.is_empty() {
                writeln!(f, "{}", node.id)?;
            }
            for edge in node.edges.values() {
                match &edge.activation {
                    Some(activation) => writeln!(f, "{} [{}]", edge, activation)?,
                    None => writeln!(f, "{}", edge)?,
                }
            }
        }
        Ok(())
    }
}

// =============================================================================
// PATHS
// =============================================================================

/// Result of a single-source shortest-path run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    from: NodeId,
    distance: BTreeMap<NodeId, u64>,
    predecessor: BTreeMap<NodeId, NodeId>,
}

impl Paths {
    /// The node the run started from.
    #[must_use]
    pub fn origin(&self) -> &NodeId {
        &self.from
    }

    /// Hops from the origin to `id`, or `None` if unreachable.
    #[must_use]
    pub fn distance_to(&self, id: &NodeId) -> Option<u64> {
        self.distance.get(id).copied()
    }

    /// Node preceding `id` on its shortest path.
    #[must_use]
    pub fn predecessor(&self, id: &NodeId) -> Option<&NodeId> {
        self.predecessor.get(id)
    }

    /// Whether `id` is reachable from the origin.
    #[must_use]
    pub fn reaches(&self, id: &NodeId) -> bool {
        self.distance.contains_key(id)
    }

    /// Nodes from the origin to `id`, both included.
    #[must_use]
    pub fn path_to(&self, id: &NodeId) -> Option<Vec<NodeId>> {
        if !self.reaches(id) {
            return None;
        }

        let mut path = vec![id.clone()];
        let mut current = id;
        while *current != self.from {
            current = self.predecessor.get(current)?;
            path.push(current.clone());
        }
        path.reverse();
        Some(path)
    }
}

// =============================================================================
// TESTS
// =============================================================================
