//! # Router Integration Tests
//!
//! Drives `Router::connect` against a recording device context.

use async_trait::async_trait;
use signal_router::{DeviceContext, DeviceError, PathOutcome, Router};
use signal_router_core::{
    Activation, ConnectRequest, Connections, DeviceId, NodeId, Port, RouterError,
};
use std::collections::BTreeSet;
use std::time::Duration;
use tokio::sync::Mutex;

// =============================================================================
// FIXTURES
// =============================================================================

/// Records every activation it receives; fails for the listed devices.
#[derive(Default)]
struct RecordingContext {
    attempts: Mutex<Vec<Activation>>,
    failing: BTreeSet<String>,
    delay: Option<Duration>,
}

impl RecordingContext {
    fn failing(devices: &[&str]) -> Self {
        Self {
            failing: devices.iter().map(|d| d.to_string()).collect(),
            ..Self::default()
        }
    }

    fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    async fn attempts(&self) -> Vec<Activation> {
        self.attempts.lock().await.clone()
    }
}

#[async_trait]
impl DeviceContext for RecordingContext {
    async fn activate(&self, activation: &Activation) -> Result<(), DeviceError> {
        self.attempts.lock().await.push(activation.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.contains(activation.device().as_str()) {
            return Err(DeviceError::offline(activation.device().clone()));
        }
        Ok(())
    }
}

/// Two displays, each fed from its own output of a shared 2x2 matrix.
fn calibration_room() -> Connections {
    Connections::new()
        .with_inputs("Display_1", [("hdmi", "Switcher_1__1")])
        .with_inputs("Display_2", [("hdmi", "Switcher_1__2")])
        .with_ordered("Switcher_1", ["Laptop_1", "Laptop_2"])
}

/// Two displays fed by one scaler, so both routes share the scaler hop.
fn scaler_room() -> Connections {
    Connections::new()
        .with_inputs("Display_1", [("hdmi", "Scaler")])
        .with_inputs("Display_2", [("hdmi", "Scaler")])
        .with_inputs("Scaler", [("in", "Laptop_1")])
}

fn switch_to(device: &str, input: &str) -> Activation {
    Activation::SwitchTo {
        device: DeviceId::new(device),
        input: Port::Name(input.into()),
    }
}

fn matrix_switch(device: &str, input: u32, output: u32) -> Activation {
    Activation::Switch {
        device: DeviceId::new(device),
        input: Port::Index(input),
        output: Port::Index(output),
    }
}

// =============================================================================
// CONNECT
// =============================================================================

#[tokio::test]
async fn hops_are_issued_in_signal_flow_order() {
    let router = Router::from_connections(&calibration_room()).expect("router");
    let ctx = RecordingContext::default();

    let report = router
        .connect(&ctx, &ConnectRequest::new().route("Laptop_2", ["Display_1"]))
        .await;

    assert!(report.is_success());
    assert_eq!(
        report.paths[0].nodes,
        vec![
            NodeId::new("Display_1"),
            NodeId::new("Switcher_1__1"),
            NodeId::new("Laptop_2"),
        ]
    );
    assert_eq!(
        ctx.attempts().await,
        vec![
            matrix_switch("Switcher_1", 2, 1),
            switch_to("Display_1", "hdmi"),
        ]
    );
}

#[tokio::test]
async fn shared_hop_is_activated_once() {
    let router = Router::from_connections(&scaler_room()).expect("router");
    let ctx = RecordingContext::slow(Duration::from_millis(5));

    let report = router
        .connect(
            &ctx,
            &ConnectRequest::new().route("Laptop_1", ["Display_1", "Display_2"]),
        )
        .await;

    assert!(report.is_success());
    assert_eq!(report.activations_issued, 3);

    let attempts = ctx.attempts().await;
    let scaler = switch_to("Scaler", "in");
    assert_eq!(attempts.iter().filter(|a| **a == scaler).count(), 1);
    assert_eq!(attempts.len(), 3);
    assert_eq!(attempts[0], scaler);
}

#[tokio::test]
async fn failing_display_does_not_block_other_paths() {
    let router = Router::from_connections(&calibration_room()).expect("router");
    let ctx = RecordingContext::failing(&["Display_2"]);

    let report = router
        .connect(
            &ctx,
            &ConnectRequest::new().route("Laptop_1", ["Display_1", "Display_2"]),
        )
        .await;

    assert!(!report.is_success());
    assert!(report.paths[0].is_success());

    let failed: Vec<_> = report.failures().collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].target, NodeId::new("Display_2"));
    match &failed[0].outcome {
        PathOutcome::Failed { failed_hops } => {
            assert_eq!(failed_hops.len(), 1);
            assert_eq!(failed_hops[0].edge.source, NodeId::new("Display_2"));
            assert_eq!(failed_hops[0].error.device, DeviceId::new("Display_2"));
        }
        other => panic!("unexpected outcome: {:?}", other),
    }

    // The matrix still switched for Display_2 before the display failed.
    assert!(
        ctx.attempts()
            .await
            .contains(&matrix_switch("Switcher_1", 1, 2))
    );
}

#[tokio::test]
async fn shared_hop_failure_is_reported_on_every_path() {
    let router = Router::from_connections(&scaler_room()).expect("router");
    let ctx = RecordingContext::failing(&["Scaler"]);

    let report = router
        .connect(
            &ctx,
            &ConnectRequest::new().route("Laptop_1", ["Display_1", "Display_2"]),
        )
        .await;

    assert_eq!(report.failures().count(), 2);

    // Attempted once, and the display hops still ran.
    let attempts = ctx.attempts().await;
    assert_eq!(attempts.len(), 3);
    assert!(attempts.contains(&switch_to("Display_1", "hdmi")));
    assert!(attempts.contains(&switch_to("Display_2", "hdmi")));
}

#[tokio::test]
async fn unroutable_pairs_are_reported_not_raised() {
    let router = Router::from_connections(&calibration_room()).expect("router");
    let ctx = RecordingContext::default();

    let request = ConnectRequest::new()
        .route("Laptop_1", ["Display_1", "Laptop_2"])
        .route("Camera", ["Display_2"]);
    let report = router.connect(&ctx, &request).await;

    assert_eq!(report.paths.len(), 3);
    let outcomes: Vec<_> = report
        .paths
        .iter()
        .map(|p| (p.source.as_str().to_string(), p.target.as_str().to_string(), p.outcome.clone()))
        .collect();

    assert!(outcomes.iter().any(|(s, t, o)| s == "Camera"
        && t == "Display_2"
        && *o
            == PathOutcome::Unroutable {
                error: RouterError::NodeNotFound(NodeId::new("Camera"))
            }));
    assert!(outcomes.iter().any(|(s, t, o)| s == "Laptop_1"
        && t == "Laptop_2"
        && matches!(o, PathOutcome::Unroutable { error: RouterError::NoRoute { .. } })));
    assert!(outcomes.iter().any(|(s, t, o)| s == "Laptop_1"
        && t == "Display_1"
        && *o == PathOutcome::Routed));

    assert_eq!(ctx.attempts().await.len(), 2);
}

#[tokio::test]
async fn request_names_are_case_insensitive() {
    let router = Router::from_connections(&calibration_room()).expect("router");
    let ctx = RecordingContext::default();

    let report = router
        .connect(&ctx, &ConnectRequest::new().route("laptop_1", ["DISPLAY_1"]))
        .await;

    assert!(report.is_success());
    assert_eq!(report.activations_issued, 2);
}

#[tokio::test]
async fn empty_request_does_nothing() {
    let router = Router::from_connections(&calibration_room()).expect("router");
    let ctx = RecordingContext::default();

    let report = router.connect(&ctx, &ConnectRequest::new()).await;

    assert!(report.is_success());
    assert!(report.paths.is_empty());
    assert_eq!(report.activations_issued, 0);
    assert!(ctx.attempts().await.is_empty());
}

// =============================================================================
// RELOAD
// =============================================================================

#[tokio::test]
async fn reload_swaps_graph_without_touching_snapshots() {
    let router = Router::from_connections(&calibration_room()).expect("router");
    let before = router.snapshot().await;

    let status = router
        .on_update(&Connections::new().with_inputs("Projector", [("vga", "Pc")]))
        .await
        .expect("reload");

    assert_eq!(status.inputs, vec![NodeId::new("Pc")]);
    assert_eq!(status.outputs, vec![NodeId::new("Projector")]);
    assert_eq!(before.node_count(), 6);
    assert_eq!(router.snapshot().await.node_count(), 2);

    assert!(matches!(
        router
            .route(&NodeId::new("Laptop_1"), &NodeId::new("Display_1"))
            .await,
        Err(RouterError::NodeNotFound(_))
    ));
}

#[tokio::test]
async fn rejected_reload_reports_unknown_matrix() {
    let router = Router::from_connections(&calibration_room()).expect("router");

    let result = router
        .on_update(&Connections::new().with_inputs("Display_1", [("hdmi", "Matrix__3")]))
        .await;

    assert!(matches!(
        result,
        Err(RouterError::UnknownMatrixDevice { ref device, .. }) if device == "Matrix"
    ));
    assert_eq!(
        router
            .route(&NodeId::new("Laptop_1"), &NodeId::new("Display_1"))
            .await
            .expect("old graph still routes")
            .len(),
        3
    );
}
