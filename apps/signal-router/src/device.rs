//! # Device Context
//!
//! The seam between the router and the device drivers.
//!
//! The router never reaches into a global device registry. Each `connect`
//! call is handed a `DeviceContext` which resolves the device named by an
//! `Activation` and performs the switch.

use async_trait::async_trait;
use signal_router_core::{Activation, DeviceId};
use thiserror::Error;
use tokio::sync::Mutex;

// =============================================================================
// ERRORS
// =============================================================================

/// A device failed to perform an activation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("device {device}: {message}")]
pub struct DeviceError {
    /// The device that failed.
    pub device: DeviceId,
    /// What went wrong.
    pub message: String,
}

impl DeviceError {
    /// Create a device error.
    pub fn new(device: DeviceId, message: impl Into<String>) -> Self {
        Self {
            device,
            message: message.into(),
        }
    }

    /// The device is unreachable.
    pub fn offline(device: DeviceId) -> Self {
        Self::new(device, "offline")
    }

    /// The device refused the command.
    pub fn rejected(device: DeviceId, reason: impl Into<String>) -> Self {
        Self::new(device, format!("command rejected: {}", reason.into()))
    }
}

// =============================================================================
// CONTEXT TRAIT
// =============================================================================

/// Resolves devices and performs activations.
///
/// `activate` resolves once the device has accepted the command. Hops on
/// one path are awaited in order, so a driver that needs the upstream hop
/// to settle can delay its own completion.
#[async_trait]
pub trait DeviceContext: Send + Sync {
    /// Perform the switch described by `activation`.
    async fn activate(&self, activation: &Activation) -> Result<(), DeviceError>;
}

// =============================================================================
// DRY RUN
// =============================================================================

/// Logs activations instead of performing them.
#[derive(Debug, Default)]
pub struct DryRunContext {
    issued: Mutex<Vec<Activation>>,
}

impl DryRunContext {
    /// Create an empty dry-run context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Activations received so far, in issue order.
    pub async fn issued(&self) -> Vec<Activation> {
        self.issued.lock().await.clone()
    }
}

#[async_trait]
impl DeviceContext for DryRunContext {
    async fn activate(&self, activation: &Activation) -> Result<(), DeviceError> {
        tracing::info!(
            device = %activation.device(),
            activation = %activation,
            "dry run: activation not sent"
        );
        self.issued.lock().await.push(activation.clone());
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use signal_router_core::Port;

    #[tokio::test]
    async fn dry_run_records_in_order() {
        let ctx = DryRunContext::new();
        let first = Activation::Switch {
            device: DeviceId::new("Switcher_1"),
            input: Port::Index(1),
            output: Port::Index(2),
        };
        let second = Activation::SwitchTo {
            device: DeviceId::new("Display_2"),
            input: Port::Name("hdmi".into()),
        };

        ctx.activate(&first).await.expect("first");
        ctx.activate(&second).await.expect("second");

        assert_eq!(ctx.issued().await, vec![first, second]);
    }

    #[test]
    fn error_messages() {
        let err = DeviceError::offline(DeviceId::new("Projector"));
        assert_eq!(err.to_string(), "device Projector: offline");

        let err = DeviceError::rejected(DeviceId::new("Display_1"), "input locked");
        assert_eq!(
            err.to_string(),
            "device Display_1: command rejected: input locked"
        );
    }
}
