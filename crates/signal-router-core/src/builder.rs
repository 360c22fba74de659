//! # Graph Construction
//!
//! Builds a `SignalGraph` from the `connections` setting.
//!
//! Every `(device, input, source)` entry becomes an edge `device -> source`
//! whose activation selects `input` on `device`. Sources written as
//! `matrix__output` are expanded into edges from that per-output node to
//! every input of the matrix, activated by routing that input to the
//! output. The matrix device's own node is removed afterwards, so every
//! vertex is a real sink, a real source or a single-hop pass-through.

use crate::connections::{Connections, parse_matrix_output};
use crate::graph::SignalGraph;
use crate::{Activation, NodeId, RouterError};
use std::collections::{BTreeMap, BTreeSet};

impl SignalGraph {
    /// Build a graph from a connectivity map.
    ///
    /// Fails on malformed maps and on `device__output` references to a
    /// device that has no connectivity entry. Never returns a partial graph.
    pub fn from_map(connections: &Connections) -> Result<Self, RouterError> {
        connections.validate()?;

        let mut builder = Builder {
            connections,
            graph: SignalGraph::new(),
            matrices: BTreeSet::new(),
            expanded: BTreeSet::new(),
            outputs: BTreeMap::new(),
        };

        for (device, connectivity) in connections.devices() {
            let device_node = NodeId::from(device);
            builder.graph.insert(device_node.clone());

            for (input, source) in connectivity.normalized() {
                let source_node = NodeId::new(source.as_str());
                builder.graph.insert(source_node.clone());

                let activation = Activation::SwitchTo {
                    device: device.clone(),
                    input,
                };
                builder.join(&device_node, &source_node, activation)?;
                builder.expand_matrix_outputs(&source)?;
            }
        }

        builder.finish()
    }
}

/// Construction state for one `from_map` call.
struct Builder<'a> {
    connections: &'a Connections,
    graph: SignalGraph,
    /// Matrix devices to prune once all entries are processed.
    matrices: BTreeSet<NodeId>,
    /// `matrix__output` nodes whose upstream edges already exist.
    expanded: BTreeSet<NodeId>,
    /// `(matrix, port key)` to the output node spelling first seen for it.
    outputs: BTreeMap<(NodeId, String), NodeId>,
}

impl Builder<'_> {
    fn join(
        &mut self,
        source: &NodeId,
        target: &NodeId,
        activation: Activation,
    ) -> Result<(), RouterError> {
        let added = self.graph.join(source, target, Some(activation))?;
        if !added {
            tracing::debug!(
                source = %source,
                target = %target,
                "duplicate connection ignored, keeping first input"
            );
        }
        Ok(())
    }

    /// Expand `source` if it names a matrix output, following chained
    /// matrices until only plain sources remain.
    fn expand_matrix_outputs(&mut self, source: &str) -> Result<(), RouterError> {
        let mut pending = vec![source.to_string()];

        while let Some(source) = pending.pop() {
            let Some((matrix, output)) = parse_matrix_output(&source) else {
                continue;
            };
            let output_node = NodeId::new(source.as_str());
            if !self.expanded.insert(output_node.clone()) {
                continue;
            }

            let (matrix_device, connectivity) =
                self.connections
                    .find(matrix)
                    .ok_or_else(|| RouterError::UnknownMatrixDevice {
                        device: matrix.to_string(),
                        referenced_by: source.clone(),
                    })?;
            let matrix_node = NodeId::from(matrix_device);
            let port = (matrix_node.clone(), output.key());
            if let Some(first) = self.outputs.insert(port, output_node.clone()) {
                return Err(RouterError::InvalidConnections(format!(
                    "'{}' and '{}' name the same output of matrix '{}'",
                    first, output_node, matrix_device
                )));
            }
            self.matrices.insert(matrix_node);

            for (input, upstream) in connectivity.normalized() {
                let upstream_node = NodeId::new(upstream.as_str());
                self.graph.insert(upstream_node.clone());

                let activation = Activation::Switch {
                    device: matrix_device.clone(),
                    input,
                    output: output.clone(),
                };
                self.join(&output_node, &upstream_node, activation)?;
                pending.push(upstream);
            }
        }

        Ok(())
    }

    /// Prune matrix placeholders and hand out the graph.
    fn finish(mut self) -> Result<SignalGraph, RouterError> {
        for matrix in &self.matrices {
            if !self.graph.contains(matrix) {
                continue;
            }
            // Matrices are only reachable through `matrix__output` nodes.
            if let Some(edge) = self.graph.incoming_edges(matrix)?.first() {
                return Err(RouterError::InvalidConnections(format!(
                    "matrix '{}' referenced directly by '{}'; use {}__<output>",
                    matrix, edge.source, matrix
                )));
            }
            self.graph.delete(matrix)?;
        }

        tracing::debug!(
            nodes = self.graph.node_count(),
            edges = self.graph.edge_count(),
            matrices = self.matrices.len(),
            "signal graph built"
        );

        Ok(self.graph)
    }
}

// =============================================================================
// TESTS
// =============================================================================
