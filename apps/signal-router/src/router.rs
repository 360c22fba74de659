//! # Router
//!
//! The facade the host talks to.
//!
//! - Holds the current `SignalGraph` as an immutable snapshot
//! - `on_update` rebuilds the graph from `connections` and swaps it in
//! - `connect` resolves a request against one snapshot and issues the hop
//!   activations through the supplied `DeviceContext`
//!
//! ## Status naming
//!
//! `inputs` lists the graph's sinks and `outputs` its sources. Because
//! edges point upstream, that makes `inputs` the signal origins (laptops,
//! cameras) and `outputs` the destinations (displays), which is what
//! dashboards expect from a router.

use crate::device::{DeviceContext, DeviceError};
use futures::future::join_all;
use serde::{Deserialize, Serialize, Serializer};
use signal_router_core::{
    ConnectRequest, Connections, Edge, NodeId, PlannedPath, RoutePlan, RouterError, SignalGraph,
};
use std::fmt::Display;
use std::sync::Arc;
use tokio::sync::{OnceCell, RwLock};

// =============================================================================
// STATUS
// =============================================================================

/// Read-only view published after every rebuild.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouterStatus {
    /// Every node id.
    pub nodes: Vec<NodeId>,
    /// Signal origins (graph sinks).
    pub inputs: Vec<NodeId>,
    /// Signal destinations (graph sources).
    pub outputs: Vec<NodeId>,
}

impl RouterStatus {
    /// Derive the status of a graph.
    #[must_use]
    pub fn from_graph(graph: &SignalGraph) -> Self {
        Self {
            nodes: graph.node_ids(),
            inputs: graph.sinks(),
            outputs: graph.sources(),
        }
    }
}

// =============================================================================
// REPORTS
// =============================================================================

fn serialize_display<T: Display, S: Serializer>(value: &T, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}

/// A hop whose activation failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedHop {
    /// The edge that could not be activated.
    pub edge: Edge,
    /// Why.
    #[serde(serialize_with = "serialize_display")]
    pub error: DeviceError,
}

/// How one requested path ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PathOutcome {
    /// Every hop was activated.
    Routed,
    /// At least one hop failed; the others were still issued.
    Failed { failed_hops: Vec<FailedHop> },
    /// The path could not be resolved; nothing was issued for it.
    Unroutable {
        #[serde(serialize_with = "serialize_display")]
        error: RouterError,
    },
}

/// Result of one `(source, target)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathReport {
    pub source: NodeId,
    pub target: NodeId,
    /// Resolved path, destination first. Empty when unroutable.
    pub nodes: Vec<NodeId>,
    pub outcome: PathOutcome,
}

impl PathReport {
    /// Whether the path was fully activated.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, PathOutcome::Routed)
    }
}

/// Aggregated result of a `connect` call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConnectReport {
    /// One entry per requested pair, by source key then target order.
    pub paths: Vec<PathReport>,
    /// Activations actually issued (shared hops count once).
    pub activations_issued: usize,
}

impl ConnectReport {
    /// Whether every requested path was fully activated.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.paths.iter().all(PathReport::is_success)
    }

    /// Paths that were not fully activated.
    pub fn failures(&self) -> impl Iterator<Item = &PathReport> {
        self.paths.iter().filter(|path| !path.is_success())
    }
}

// =============================================================================
// ROUTER
// =============================================================================

/// The signal router.
///
/// Owns the graph exclusively. Readers clone the `Arc` once per call, so a
/// reload during a `connect` never changes the graph that call is using.
#[derive(Debug, Default)]
pub struct Router {
    graph: RwLock<Arc<SignalGraph>>,
}

impl Router {
    /// Create a router with an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a router from a connections map.
    pub fn from_connections(connections: &Connections) -> Result<Self, RouterError> {
        let graph = SignalGraph::from_map(connections)?;
        Ok(Self {
            graph: RwLock::new(Arc::new(graph)),
        })
    }

    /// Rebuild the graph after a settings change.
    ///
    /// On error the previous graph stays in place.
    pub async fn on_update(&self, connections: &Connections) -> Result<RouterStatus, RouterError> {
        let graph = SignalGraph::from_map(connections).inspect_err(|e| {
            tracing::error!(error = %e, "connections rejected, keeping previous graph");
        })?;

        let status = RouterStatus::from_graph(&graph);
        *self.graph.write().await = Arc::new(graph);

        tracing::info!(
            nodes = status.nodes.len(),
            inputs = status.inputs.len(),
            outputs = status.outputs.len(),
            "signal graph loaded"
        );
        Ok(status)
    }

    /// The current graph snapshot.
    pub async fn snapshot(&self) -> Arc<SignalGraph> {
        Arc::clone(&*self.graph.read().await)
    }

    /// Status of the current graph.
    pub async fn status(&self) -> RouterStatus {
        let graph = self.snapshot().await;
        RouterStatus::from_graph(&graph)
    }

    /// Shortest path from `source` to `target`, destination first.
    pub async fn route(&self, source: &NodeId, target: &NodeId) -> Result<Vec<NodeId>, RouterError> {
        self.snapshot().await.route(source, target)
    }

    /// Route every `(source, target)` pair of `request` and activate it.
    ///
    /// Paths run concurrently; hops within a path run in signal-flow order.
    /// A hop shared by several paths is activated once and its outcome
    /// shared. Failures are logged and reported per path, never raised.
    pub async fn connect(&self, ctx: &dyn DeviceContext, request: &ConnectRequest) -> ConnectReport {
        let graph = self.snapshot().await;
        let plan = RoutePlan::resolve(&graph, request);

        for conflict in plan.conflicts() {
            tracing::warn!(
                node = %conflict.node,
                targets = ?conflict.targets.iter().map(NodeId::as_str).collect::<Vec<_>>(),
                "request selects several inputs on one node"
            );
        }

        let cells: Vec<OnceCell<Result<(), DeviceError>>> =
            plan.unique_hops().iter().map(|_| OnceCell::new()).collect();

        let paths = join_all(
            plan.paths()
                .iter()
                .map(|path| run_path(ctx, &plan, &cells, path)),
        )
        .await;

        let report = ConnectReport {
            paths,
            activations_issued: cells
                .iter()
                .zip(plan.unique_hops())
                .filter(|(cell, hop)| cell.initialized() && hop.activation.is_some())
                .count(),
        };

        let failed = report.failures().count();
        if failed == 0 {
            tracing::info!(
                paths = report.paths.len(),
                activations = report.activations_issued,
                "connect complete"
            );
        } else {
            tracing::warn!(
                paths = report.paths.len(),
                failed,
                activations = report.activations_issued,
                "connect finished with failures"
            );
        }

        report
    }
}

/// Activate the hops of one planned path in order.
async fn run_path(
    ctx: &dyn DeviceContext,
    plan: &RoutePlan,
    cells: &[OnceCell<Result<(), DeviceError>>],
    path: &PlannedPath,
) -> PathReport {
    let route = match &path.route {
        Ok(route) => route,
        Err(error) => {
            tracing::warn!(
                source = %path.source,
                target = %path.target,
                error = %error,
                "path not routed"
            );
            return PathReport {
                source: path.source.clone(),
                target: path.target.clone(),
                nodes: Vec::new(),
                outcome: PathOutcome::Unroutable {
                    error: error.clone(),
                },
            };
        }
    };

    let mut failed_hops = Vec::new();
    for hop_id in &route.hops {
        let (Some(hop), Some(cell)) = (plan.hop(*hop_id), cells.get(hop_id.0)) else {
            continue;
        };

        let outcome = cell.get_or_init(|| activate_hop(ctx, hop)).await;
        if let Err(error) = outcome {
            failed_hops.push(FailedHop {
                edge: hop.clone(),
                error: error.clone(),
            });
        }
    }

    if !failed_hops.is_empty() {
        tracing::warn!(
            source = %path.source,
            target = %path.target,
            failed = failed_hops.len(),
            "path partially activated"
        );
    }

    PathReport {
        source: path.source.clone(),
        target: path.target.clone(),
        nodes: route.nodes.clone(),
        outcome: if failed_hops.is_empty() {
            PathOutcome::Routed
        } else {
            PathOutcome::Failed { failed_hops }
        },
    }
}

/// Issue a single hop's activation, logging failures with edge context.
async fn activate_hop(ctx: &dyn DeviceContext, hop: &Edge) -> Result<(), DeviceError> {
    let Some(activation) = &hop.activation else {
        return Ok(());
    };

    tracing::debug!(edge = %hop, activation = %activation, "activating");
    ctx.activate(activation).await.inspect_err(|e| {
        tracing::error!(
            edge = %hop,
            activation = %activation,
            error = %e,
            "activation failed"
        );
    })
}

// =============================================================================
// TESTS
// =============================================================================
