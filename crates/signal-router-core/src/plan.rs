//! # Route Planning
//!
//! Turns a connect request into the hops that have to be activated.
//!
//! - One planned path per `(source, target)` pair, ordered by source key
//!   and then by the order the targets were listed
//! - Hops within a path are in signal-flow order: the hop nearest the
//!   source first, the destination device last
//! - Each distinct edge appears once in `unique_hops`, so an upstream
//!   switch shared by several targets is issued once
//!
//! Planning is pure; executing hops is the router's job.

use crate::graph::SignalGraph;
use crate::{Edge, NodeId, RouterError};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

// =============================================================================
// CONNECT REQUEST
// =============================================================================

/// One destination or several.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Targets {
    /// A single destination.
    One(NodeId),
    /// Several destinations, in order.
    Many(Vec<NodeId>),
}

impl Targets {
    /// Destinations as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[NodeId] {
        match self {
            Self::One(target) => std::slice::from_ref(target),
            Self::Many(targets) => targets,
        }
    }
}

/// A `{ source => target | [targets] }` routing request.
///
/// Sources are keyed case-insensitively. Keys that only differ in case are
/// merged when deserializing, their targets appended in key order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ConnectRequest(pub BTreeMap<NodeId, Targets>);

impl<'de> Deserialize<'de> for ConnectRequest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = BTreeMap::<String, Targets>::deserialize(deserializer)?;
        Ok(raw.into_iter().fold(Self::new(), |request, (source, targets)| {
            request.route(&source, targets.as_slice().to_vec())
        }))
    }
}

impl ConnectRequest {
    /// Create an empty request.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Route `source` to each of `targets`.
    ///
    /// Calling this again for the same source appends targets.
    #[must_use]
    pub fn route<I, T>(mut self, source: &str, targets: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<NodeId>,
    {
        let source = NodeId::new(source);
        let mut all: Vec<NodeId> = self
            .0
            .remove(&source)
            .map(|existing| existing.as_slice().to_vec())
            .unwrap_or_default();
        all.extend(targets.into_iter().map(Into::into));
        self.0.insert(source, Targets::Many(all));
        self
    }

    /// Flattened `(source, target)` pairs, by source key then target order.
    #[must_use]
    pub fn pairs(&self) -> Vec<(NodeId, NodeId)> {
        self.0
            .iter()
            .flat_map(|(source, targets)| {
                targets
                    .as_slice()
                    .iter()
                    .map(move |target| (source.clone(), target.clone()))
            })
            .collect()
    }

    /// Whether the request names no routes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.values().all(|targets| targets.as_slice().is_empty())
    }
}

// =============================================================================
// PLAN
// =============================================================================

/// Index of a hop in `RoutePlan::unique_hops`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HopId(pub usize);

/// A resolved route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    /// Nodes from destination to source, as returned by `SignalGraph::route`.
    pub nodes: Vec<NodeId>,
    /// Hops to activate, in signal-flow order.
    pub hops: Vec<HopId>,
}

/// One requested `(source, target)` pair and how it resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedPath {
    pub source: NodeId,
    pub target: NodeId,
    pub route: Result<Route, RouterError>,
}

/// A node asked to select more than one upstream in the same request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conflict {
    pub node: NodeId,
    pub targets: Vec<NodeId>,
}

/// Every path of a connect request resolved against one graph snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoutePlan {
    paths: Vec<PlannedPath>,
    hops: Vec<Edge>,
}

impl RoutePlan {
    /// Resolve every pair of `request` against `graph`.
    ///
    /// Lookup and routing errors are recorded per path; they do not stop
    /// the remaining pairs from being planned.
    #[must_use]
    pub fn resolve(graph: &SignalGraph, request: &ConnectRequest) -> Self {
        let mut plan = Self::default();
        let mut index: BTreeMap<(NodeId, NodeId), HopId> = BTreeMap::new();

        for (source, target) in request.pairs() {
            let route = graph.route(&source, &target).and_then(|nodes| {
                let edges = graph.path_edges(&nodes)?;
                let hops = edges
                    .into_iter()
                    .rev()
                    .map(|edge| plan.intern(&mut index, edge))
                    .collect();
                Ok(Route { nodes, hops })
            });

            plan.paths.push(PlannedPath {
                source,
                target,
                route,
            });
        }

        plan
    }

    fn intern(&mut self, index: &mut BTreeMap<(NodeId, NodeId), HopId>, edge: &Edge) -> HopId {
        let key = (edge.source.clone(), edge.target.clone());
        *index.entry(key).or_insert_with(|| {
            self.hops.push(edge.clone());
            HopId(self.hops.len() - 1)
        })
    }

    /// Planned paths in `ConnectRequest::pairs` order.
    #[must_use]
    pub fn paths(&self) -> &[PlannedPath] {
        &self.paths
    }

    /// Distinct hops across all paths, in first-use order.
    #[must_use]
    pub fn unique_hops(&self) -> &[Edge] {
        &self.hops
    }

    /// Look up a hop.
    #[must_use]
    pub fn hop(&self, id: HopId) -> Option<&Edge> {
        self.hops.get(id.0)
    }

    /// Nodes that would be switched to more than one upstream.
    #[must_use]
    pub fn conflicts(&self) -> Vec<Conflict> {
        let mut by_node: BTreeMap<&NodeId, Vec<NodeId>> = BTreeMap::new();
        for hop in &self.hops {
            by_node
                .entry(&hop.source)
                .or_default()
                .push(hop.target.clone());
        }

        by_node
            .into_iter()
            .filter(|(_, targets)| targets.len() > 1)
            .map(|(node, targets)| Conflict {
                node: node.clone(),
                targets,
            })
            .collect()
    }
}

// =============================================================================
// TESTS
// =============================================================================
