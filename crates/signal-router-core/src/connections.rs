//! # Connections Setting
//!
//! The declarative connectivity map the graph is built from.
//!
//! ```text
//! Display_1:  { hdmi: Switcher_1__1 }        # named inputs
//! Display_2:  { hdmi: Switcher_1__2 }
//! Switcher_1: [Laptop_1, Laptop_2]           # ordered inputs, 1-based
//! ```
//!
//! A source written as `<device>__<output>` denotes output `<output>` of the
//! matrix device `<device>`, which must have its own entry.

use crate::{DeviceId, Port, RouterError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Separator between a matrix device name and one of its outputs.
pub const MATRIX_OUTPUT_SEPARATOR: &str = "__";

/// Upstream wiring of a single device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Connectivity {
    /// Input name to upstream source.
    Inputs(BTreeMap<String, String>),
    /// Upstream sources in input order; position 1 is input 1.
    Ordered(Vec<String>),
}

impl Connectivity {
    /// Normalise to `(input, source)` pairs.
    ///
    /// Ordered lists get 1-based `Port::Index` inputs.
    #[must_use]
    pub fn normalized(&self) -> Vec<(Port, String)> {
        match self {
            Self::Inputs(inputs) => inputs
                .iter()
                .map(|(input, source)| (Port::parse(input), source.trim().to_string()))
                .collect(),
            Self::Ordered(sources) => sources
                .iter()
                .zip(1u32..)
                .map(|(source, index)| (Port::Index(index), source.trim().to_string()))
                .collect(),
        }
    }

    /// Number of declared inputs.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Inputs(inputs) => inputs.len(),
            Self::Ordered(sources) => sources.len(),
        }
    }

    /// Whether no inputs are declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The full `connections` setting: device name to its connectivity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Connections(pub BTreeMap<DeviceId, Connectivity>);

impl Connections {
    /// Create an empty setting.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a device with named inputs.
    #[must_use]
    pub fn with_inputs<I, K, V>(mut self, device: &str, inputs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let inputs = inputs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self.0
            .insert(DeviceId::new(device), Connectivity::Inputs(inputs));
        self
    }

    /// Add a device with ordered inputs.
    #[must_use]
    pub fn with_ordered<I, V>(mut self, device: &str, sources: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        let sources = sources.into_iter().map(Into::into).collect();
        self.0
            .insert(DeviceId::new(device), Connectivity::Ordered(sources));
        self
    }

    /// Iterate devices in deterministic order.
    pub fn devices(&self) -> impl Iterator<Item = (&DeviceId, &Connectivity)> {
        self.0.iter()
    }

    /// Find a device entry by name, ignoring case.
    #[must_use]
    pub fn find(&self, device: &str) -> Option<(&DeviceId, &Connectivity)> {
        self.0
            .iter()
            .find(|(id, _)| id.as_str().trim().eq_ignore_ascii_case(device.trim()))
    }

    /// Number of devices with a connectivity entry.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the setting is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Check structural well-formedness.
    ///
    /// Rejects empty device names, empty input names, empty sources, two
    /// entries that only differ in case and two spellings of one input
    /// (`1` and `01`) on the same device. Matrix references are checked
    /// during graph construction.
    pub fn validate(&self) -> Result<(), RouterError> {
        let mut seen: BTreeMap<String, &DeviceId> = BTreeMap::new();

        for (device, connectivity) in &self.0 {
            let key = device.as_str().trim().to_ascii_lowercase();
            if key.is_empty() {
                return Err(RouterError::InvalidConnections(
                    "device name must not be empty".to_string(),
                ));
            }
            if let Some(previous) = seen.insert(key, device) {
                return Err(RouterError::InvalidConnections(format!(
                    "devices '{}' and '{}' differ only in case",
                    previous, device
                )));
            }

            let mut ports: BTreeMap<String, Port> = BTreeMap::new();
            for (input, source) in connectivity.normalized() {
                if let Some(previous) = ports.insert(input.key(), input.clone()) {
                    return Err(RouterError::InvalidConnections(format!(
                        "device '{}' names one input twice ('{}' and '{}')",
                        device, previous, input
                    )));
                }
                if input.is_empty() {
                    return Err(RouterError::InvalidConnections(format!(
                        "device '{}' has an input with an empty name",
                        device
                    )));
                }
                if source.is_empty() {
                    return Err(RouterError::InvalidConnections(format!(
                        "device '{}' input '{}' has an empty source",
                        device, input
                    )));
                }
            }
        }

        Ok(())
    }
}

/// Split a `device__output` reference.
///
/// Uses the first separator. Returns `None` when there is no separator or
/// either side is empty.
#[must_use]
pub fn parse_matrix_output(source: &str) -> Option<(&str, Port)> {
    let (device, output) = source.split_once(MATRIX_OUTPUT_SEPARATOR)?;
    if device.trim().is_empty() || output.trim().is_empty() {
        return None;
    }
    Some((device.trim(), Port::parse(output)))
}

// =============================================================================
// TESTS
// =============================================================================
