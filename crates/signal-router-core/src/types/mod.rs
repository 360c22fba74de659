//! # Core Type Definitions
//!
//! This module contains all core types for the signal-routing graph:
//! - Identifiers (`NodeId`, `DeviceId`, `Port`)
//! - Edge activations (`Activation`)
//! - Graph elements (`Node`, `Edge`)
//! - Error types (`RouterError`)
//!
//! ## Determinism Guarantees
//!
//! All types in this module:
//! - Implement `Ord` for deterministic ordering in `BTreeMap`/`BTreeSet`
//! - Compare identifiers on a normalised key computed once at construction

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use thiserror::Error;

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Identifier of a vertex in the signal graph.
///
/// A `NodeId` keeps the label it was created with (for display and for
/// external consumers) and a normalised key (trimmed, ASCII lower-case) that
/// alone decides equality, ordering and hashing. `Display_1`, `display_1`
/// and ` DISPLAY_1 ` are the same node.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct NodeId {
    key: String,
    label: String,
}

impl NodeId {
    /// Create a node identifier, normalising it once.
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        let label = label.into().trim().to_string();
        let key = label.to_ascii_lowercase();
        Self { key, label }
    }

    /// The label as first written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.label
    }

    /// The normalised comparison key.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl PartialEq for NodeId {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for NodeId {}

impl PartialOrd for NodeId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for NodeId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key.cmp(&other.key)
    }
}

impl Hash for NodeId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&DeviceId> for NodeId {
    fn from(device: &DeviceId) -> Self {
        Self::new(device.as_str())
    }
}

impl From<NodeId> for String {
    fn from(id: NodeId) -> Self {
        id.label
    }
}

/// Name of a device exactly as written in the `connections` setting.
///
/// This is what activations use to address the device driver, so it is
/// never normalised.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(pub String);

impl DeviceId {
    /// Create a device identifier.
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the device name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DeviceId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// An input or output selector on a device.
///
/// Ordered connectivity lists produce 1-based `Index` ports; named inputs
/// that consist only of digits are read as indices as well.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Port {
    /// Numbered port.
    Index(u32),
    /// Named port (`hdmi`, `dvi_2`, ...).
    Name(String),
}

impl Port {
    /// Parse a port from its configuration spelling.
    ///
    /// Only canonical decimals (`"2"`, not `"02"`) become `Index`.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        let s = s.trim();
        if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(index) = s.parse::<u32>() {
                if index.to_string() == s {
                    return Self::Index(index);
                }
            }
        }
        Self::Name(s.to_string())
    }

    /// Key under which two spellings name the same physical port.
    ///
    /// `1`, `01` and `001` share a key, as do `HDMI` and `hdmi`.
    #[must_use]
    pub fn key(&self) -> String {
        match self {
            Self::Index(index) => index.to_string(),
            Self::Name(name) if !name.is_empty() && name.bytes().all(|b| b.is_ascii_digit()) => {
                let trimmed = name.trim_start_matches('0');
                if trimmed.is_empty() { "0" } else { trimmed }.to_string()
            }
            Self::Name(name) => name.to_ascii_lowercase(),
        }
    }

    /// Whether this is an empty name (invalid in configuration).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Name(name) if name.is_empty())
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(index) => write!(f, "{}", index),
            Self::Name(name) => f.write_str(name),
        }
    }
}

// =============================================================================
// ACTIVATION
// =============================================================================

/// The device-level action bound to an edge.
///
/// Activations are plain data. Executing one is the job of whatever device
/// context the router is handed at call time; the graph never talks to a
/// device itself.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Activation {
    /// Select `input` on `device` (`switch_to(input)`).
    SwitchTo { device: DeviceId, input: Port },
    /// Route matrix `input` to `output` on `device` (`switch({input => output})`).
    Switch {
        device: DeviceId,
        input: Port,
        output: Port,
    },
}

impl Activation {
    /// Device this activation is addressed to.
    #[must_use]
    pub fn device(&self) -> &DeviceId {
        match self {
            Self::SwitchTo { device, .. } | Self::Switch { device, .. } => device,
        }
    }

    /// The input port being selected.
    #[must_use]
    pub fn input(&self) -> &Port {
        match self {
            Self::SwitchTo { input, .. } | Self::Switch { input, .. } => input,
        }
    }
}

impl fmt::Display for Activation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SwitchTo { device, input } => write!(f, "{}.switch_to({})", device, input),
            Self::Switch {
                device,
                input,
                output,
            } => write!(f, "{}.switch({} => {})", device, input, output),
        }
    }
}

// =============================================================================
// EDGE
// =============================================================================

/// A directed connection from a signal sink towards one of its upstream
/// sources.
///
/// Direction is inverted relative to physical signal flow: `source` is the
/// node consuming the signal and `target` the node providing it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    /// Node that owns the edge (the downstream device).
    pub source: NodeId,
    /// Node the edge points at (the upstream signal).
    pub target: NodeId,
    /// Switch action performed when a route traverses this edge.
    pub activation: Option<Activation>,
}

impl Edge {
    /// Create a new edge.
    #[must_use]
    pub fn new(source: NodeId, target: NodeId, activation: Option<Activation>) -> Self {
        Self {
            source,
            target,
            activation,
        }
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.source, self.target)
    }
}

// =============================================================================
// NODE
// =============================================================================

/// A vertex of the signal graph with its outgoing edges.
///
/// Identity is the `id` alone; edges are keyed by target so iteration order
/// is deterministic.
#[derive(Debug, Clone)]
pub struct Node {
    /// The node identifier.
    pub id: NodeId,
    /// Outgoing edges keyed by target.
    pub edges: BTreeMap<NodeId, Edge>,
}

impl Node {
    /// Create a node with no edges.
    #[must_use]
    pub fn new(id: NodeId) -> Self {
        Self {
            id,
            edges: BTreeMap::new(),
        }
    }

    /// Number of outgoing edges.
    #[must_use]
    pub fn outdegree(&self) -> usize {
        self.edges.len()
    }

    /// Edge towards `target`, if any.
    #[must_use]
    pub fn edge_to(&self, target: &NodeId) -> Option<&Edge> {
        self.edges.get(target)
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Node {}

impl Hash for Node {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur while building or querying the signal graph.
///
/// - Configuration errors surface when the graph is built
/// - Lookup and routing errors surface from queries
/// - The CORE never panics; all errors are recoverable
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouterError {
    /// A `device__output` reference names a device with no connectivity entry.
    #[error("unknown matrix device '{device}' referenced by '{referenced_by}'")]
    UnknownMatrixDevice {
        device: String,
        referenced_by: String,
    },

    /// The `connections` setting is malformed.
    #[error("invalid connections: {0}")]
    InvalidConnections(String),

    /// The requested node is not part of the graph.
    #[error("no such node: {0}")]
    NodeNotFound(NodeId),

    /// No chain of edges joins the two nodes.
    #[error("no route from {from} to {to}")]
    NoRoute { from: NodeId, to: NodeId },

    /// An I/O error occurred while loading settings.
    #[error("I/O error: {0}")]
    IoError(String),

    /// Settings could not be parsed.
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

// =============================================================================
// TESTS
// =============================================================================
