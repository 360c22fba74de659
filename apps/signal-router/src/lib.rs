//! # signal-router
//!
//! The async side of the router: the `Router` facade, the `DeviceContext`
//! seam the drivers implement, and settings loading.
//!
//! ```text
//! settings (connections) --> Router::on_update --> SignalGraph snapshot
//!                                                        |
//! ConnectRequest ----------> Router::connect ------------+--> DeviceContext
//! ```

pub mod device;
pub mod router;
pub mod settings;

pub use device::{DeviceContext, DeviceError, DryRunContext};
pub use router::{ConnectReport, FailedHop, PathOutcome, PathReport, Router, RouterStatus};
pub use settings::{CONFIG_ENV, DEFAULT_CONFIG_PATH, Settings, resolve_config_path};
