//! # signal-router-core
//!
//! The deterministic signal-routing graph - THE LOGIC.
//!
//! This crate models AV signal paths as a directed graph built from a
//! declarative `connections` map, answers structural queries about it and
//! computes shortest routes between sources and destinations.
//!
//! ## Graph Model
//!
//! - Nodes are devices, device outputs (`matrix__output`) or plain sources
//! - Edges run from the consuming device to the signal it can select
//! - Each edge carries an `Activation`: the switch command to issue when a
//!   route passes through it
//!
//! ## Architectural Constraints
//!
//! - Has NO async, NO I/O: device commands are data, executed by the caller
//! - Is deterministic: `BTreeMap`/`BTreeSet` only, ties broken by node id
//! - Is rebuilt, never patched: a new `connections` map means a new graph

// =============================================================================
// MODULES
// =============================================================================

pub mod builder;
pub mod connections;
pub mod graph;
pub mod plan;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{Activation, DeviceId, Edge, Node, NodeId, Port, RouterError};

// =============================================================================
// RE-EXPORTS: Graph Engine
// =============================================================================

pub use connections::{
    Connections, Connectivity, MATRIX_OUTPUT_SEPARATOR, parse_matrix_output,
};
pub use graph::{HOP_WEIGHT, Paths, SignalGraph};
pub use plan::{Conflict, ConnectRequest, HopId, PlannedPath, Route, RoutePlan, Targets};
