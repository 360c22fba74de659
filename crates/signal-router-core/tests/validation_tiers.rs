//! # Validation Tier Tests (T0-T3)
//!
//! If ANY tier fails, the router graph is INVALID.
//!
//! ## Tiers
//! - T0: Construction from the connections map
//! - T1: Structural queries
//! - T2: Routing through the calibration room
//! - T3: Failure modes

use signal_router_core::{
    Activation, Connections, ConnectRequest, DeviceId, NodeId, Port, RoutePlan, RouterError,
    SignalGraph,
};
use std::collections::BTreeSet;

/// Two displays, each fed from its own output of a shared 2x2 matrix.
fn calibration_room() -> Connections {
    Connections::new()
        .with_inputs("Display_1", [("hdmi", "Switcher_1__1")])
        .with_inputs("Display_2", [("hdmi", "Switcher_1__2")])
        .with_ordered("Switcher_1", ["Laptop_1", "Laptop_2"])
}

fn ids(names: &[&str]) -> Vec<NodeId> {
    names.iter().map(|n| NodeId::new(*n)).collect()
}

fn id_set(names: &[&str]) -> BTreeSet<NodeId> {
    ids(names).into_iter().collect()
}

// =============================================================================
// TIER T0: CONSTRUCTION
// =============================================================================

mod t0_construction {
    use super::*;

    /// T0.1: Every referenced device and source becomes a node.
    #[test]
    fn all_endpoints_become_nodes() {
        let graph = SignalGraph::from_map(&calibration_room()).expect("build");

        assert_eq!(
            graph.node_ids().into_iter().collect::<BTreeSet<_>>(),
            id_set(&[
                "Display_1",
                "Display_2",
                "Switcher_1__1",
                "Switcher_1__2",
                "Laptop_1",
                "Laptop_2",
            ])
        );
    }

    /// T0.2: Matrix placeholders are pruned, their outputs remain.
    #[test]
    fn matrix_collapse() {
        let graph = SignalGraph::from_map(&calibration_room()).expect("build");

        assert!(!graph.contains(&NodeId::new("Switcher_1")));
        assert!(graph.contains(&NodeId::new("Switcher_1__1")));
        assert!(graph.contains(&NodeId::new("Switcher_1__2")));
    }

    /// T0.3: Edges reference nodes present in the graph.
    #[test]
    fn edges_are_closed_over_nodes() {
        let graph = SignalGraph::from_map(&calibration_room()).expect("build");

        for edge in graph.edges() {
            assert!(graph.contains(&edge.source), "dangling source {}", edge);
            assert!(graph.contains(&edge.target), "dangling target {}", edge);
        }
    }

    /// T0.4: Activations carry the device name exactly as configured.
    #[test]
    fn activations_address_devices() {
        let graph = SignalGraph::from_map(&calibration_room()).expect("build");

        let display = graph
            .edge(&NodeId::new("Display_2"), &NodeId::new("Switcher_1__2"))
            .expect("display edge");
        assert_eq!(
            display.activation,
            Some(Activation::SwitchTo {
                device: DeviceId::new("Display_2"),
                input: Port::Name("hdmi".into()),
            })
        );

        let matrix = graph
            .edge(&NodeId::new("Switcher_1__1"), &NodeId::new("Laptop_2"))
            .expect("matrix edge");
        assert_eq!(
            matrix.activation,
            Some(Activation::Switch {
                device: DeviceId::new("Switcher_1"),
                input: Port::Index(2),
                output: Port::Index(1),
            })
        );
    }

    /// T0.5: A device that is both a sink and an upstream source is legal.
    #[test]
    fn chained_devices() {
        let connections = Connections::new()
            .with_inputs("Projector", [("hdmi", "Scaler")])
            .with_ordered("Scaler", ["Laptop", "Camera"]);
        let graph = SignalGraph::from_map(&connections).expect("build");

        assert!(graph.contains(&NodeId::new("Scaler")));
        assert_eq!(
            graph
                .route(&NodeId::new("Camera"), &NodeId::new("Projector"))
                .expect("route"),
            ids(&["Projector", "Scaler", "Camera"])
        );
    }
}

// =============================================================================
// TIER T1: STRUCTURAL QUERIES
// =============================================================================

mod t1_structure {
    use super::*;

    /// T1.1: Displays are graph sources, laptops are graph sinks.
    #[test]
    fn sources_and_sinks() {
        let graph = SignalGraph::from_map(&calibration_room()).expect("build");

        assert_eq!(graph.sources(), ids(&["Display_1", "Display_2"]));
        assert_eq!(graph.sinks(), ids(&["Laptop_1", "Laptop_2"]));
    }

    /// T1.2: Degrees match edge counts.
    #[test]
    fn degrees() {
        let graph = SignalGraph::from_map(&calibration_room()).expect("build");

        let output = NodeId::new("Switcher_1__1");
        assert_eq!(graph.indegree(&output).expect("in"), 1);
        assert_eq!(graph.outdegree(&output).expect("out"), 2);

        let laptop = NodeId::new("Laptop_1");
        assert_eq!(graph.indegree(&laptop).expect("in"), 2);
        assert_eq!(graph.outdegree(&laptop).expect("out"), 0);

        for node in graph.nodes() {
            let incoming = graph.edges().filter(|e| e.target == node.id).count();
            assert_eq!(graph.indegree(&node.id).expect("in"), incoming);
            assert_eq!(graph.outdegree(&node.id).expect("out"), node.edges.len());
        }
    }

    /// T1.3: Lookups are case-insensitive.
    #[test]
    fn case_insensitive_lookup() {
        let graph = SignalGraph::from_map(&calibration_room()).expect("build");
        assert!(graph.contains(&NodeId::new("display_1")));
        assert_eq!(graph.outdegree(&NodeId::new("SWITCHER_1__2")).expect("out"), 2);
    }
}

// =============================================================================
// TIER T2: ROUTING
// =============================================================================

mod t2_routing {
    use super::*;

    /// T2.1: Laptop_1 reaches Display_1 through matrix output 1.
    #[test]
    fn laptop_to_display() {
        let graph = SignalGraph::from_map(&calibration_room()).expect("build");

        let path = graph
            .route(&NodeId::new("Laptop_1"), &NodeId::new("Display_1"))
            .expect("route");
        assert_eq!(path, ids(&["Display_1", "Switcher_1__1", "Laptop_1"]));
    }

    /// T2.2: The matrix can cross-connect either laptop to either display.
    #[test]
    fn cross_connection_goes_through_matrix() {
        let graph = SignalGraph::from_map(&calibration_room()).expect("build");

        let path = graph
            .route(&NodeId::new("Laptop_2"), &NodeId::new("Display_1"))
            .expect("route");
        assert_eq!(path, ids(&["Display_1", "Switcher_1__1", "Laptop_2"]));
        assert_eq!(path.len(), 3);
    }

    /// T2.3: Planning the calibration request yields matrix then display.
    #[test]
    fn plan_activations() {
        let graph = SignalGraph::from_map(&calibration_room()).expect("build");
        let request = ConnectRequest::new().route("Laptop_1", ["Display_1", "Display_2"]);
        let plan = RoutePlan::resolve(&graph, &request);

        let activations: Vec<String> = plan
            .unique_hops()
            .iter()
            .filter_map(|hop| hop.activation.as_ref())
            .map(|a| a.to_string())
            .collect();
        assert_eq!(
            activations,
            vec![
                "Switcher_1.switch(1 => 1)",
                "Display_1.switch_to(hdmi)",
                "Switcher_1.switch(1 => 2)",
                "Display_2.switch_to(hdmi)",
            ]
        );
    }
}

// =============================================================================
// TIER T3: FAILURE MODES
// =============================================================================

mod t3_failures {
    use super::*;

    /// T3.1: Disconnected endpoints report no route.
    #[test]
    fn no_route() {
        let connections = calibration_room().with_ordered("Display_3", ["Document_Camera"]);
        let graph = SignalGraph::from_map(&connections).expect("build");

        let result = graph.route(&NodeId::new("Laptop_1"), &NodeId::new("Display_3"));
        assert_eq!(
            result,
            Err(RouterError::NoRoute {
                from: NodeId::new("Laptop_1"),
                to: NodeId::new("Display_3"),
            })
        );
        assert_eq!(
            result.map_err(|e| e.to_string()),
            Err("no route from Laptop_1 to Display_3".to_string())
        );
    }

    /// T3.2: Unknown nodes are lookup errors, not empty results.
    #[test]
    fn unknown_node() {
        let graph = SignalGraph::from_map(&calibration_room()).expect("build");
        assert_eq!(
            graph.route(&NodeId::new("Laptop_9"), &NodeId::new("Display_1")),
            Err(RouterError::NodeNotFound(NodeId::new("Laptop_9")))
        );
    }

    /// T3.3: Dangling matrix references fail at build time.
    #[test]
    fn dangling_matrix_reference() {
        let connections = Connections::new().with_inputs("Display_1", [("hdmi", "Switcher_9__1")]);
        assert!(matches!(
            SignalGraph::from_map(&connections),
            Err(RouterError::UnknownMatrixDevice { .. })
        ));
    }
}
