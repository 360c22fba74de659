//! # Settings
//!
//! Loads the router settings file.
//!
//! ```toml
//! [connections]
//! Display_1 = { hdmi = "Switcher_1__1" }
//! Display_2 = { hdmi = "Switcher_1__2" }
//! Switcher_1 = ["Laptop_1", "Laptop_2"]
//! ```
//!
//! JSON files with the same shape (`{"connections": {...}}`) are accepted;
//! the format is picked by file extension.
//!
//! ## Configuration (Environment Variables)
//!
//! - `SIGNAL_ROUTER_CONFIG`: settings file path when `--config` is not given

use serde::{Deserialize, Serialize};
use signal_router_core::{Connections, RouterError};
use std::path::{Path, PathBuf};

/// Environment variable naming the settings file.
pub const CONFIG_ENV: &str = "SIGNAL_ROUTER_CONFIG";

/// Settings file used when nothing else is configured.
pub const DEFAULT_CONFIG_PATH: &str = "router.toml";

/// Maximum settings file size (4 MB).
const MAX_SETTINGS_FILE_SIZE: u64 = 4 * 1024 * 1024;

/// Router settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Device connectivity map the graph is built from.
    #[serde(default)]
    pub connections: Connections,
}

impl Settings {
    /// Parse TOML settings.
    pub fn from_toml_str(text: &str) -> Result<Self, RouterError> {
        toml::from_str(text).map_err(|e| RouterError::SerializationError(e.to_string()))
    }

    /// Parse JSON settings.
    pub fn from_json_str(text: &str) -> Result<Self, RouterError> {
        serde_json::from_str(text).map_err(|e| RouterError::SerializationError(e.to_string()))
    }

    /// Load settings from a `.toml` or `.json` file.
    pub fn load(path: &Path) -> Result<Self, RouterError> {
        let path = validate_file_path(path)?;
        validate_file_size(&path)?;

        let text = std::fs::read_to_string(&path).map_err(|e| {
            RouterError::IoError(format!("Cannot read '{}': {}", path.display(), e))
        })?;

        let settings = match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::from_json_str(&text)?,
            Some(ext) if ext.eq_ignore_ascii_case("toml") => Self::from_toml_str(&text)?,
            other => {
                return Err(RouterError::IoError(format!(
                    "Unsupported settings format '{}' (expected .toml or .json)",
                    other.unwrap_or("")
                )));
            }
        };

        tracing::debug!(
            path = %path.display(),
            devices = settings.connections.len(),
            "settings loaded"
        );
        Ok(settings)
    }
}

/// Resolve the settings path: explicit argument, then `SIGNAL_ROUTER_CONFIG`,
/// then `router.toml`.
pub fn resolve_config_path(explicit: Option<&Path>) -> PathBuf {
    explicit
        .map(Path::to_path_buf)
        .or_else(|| {
            std::env::var(CONFIG_ENV)
                .ok()
                .filter(|p| !p.is_empty())
                .map(PathBuf::from)
        })
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Canonicalize the path and make sure it is a regular file.
fn validate_file_path(path: &Path) -> Result<PathBuf, RouterError> {
    let canonical = path.canonicalize().map_err(|e| {
        RouterError::IoError(format!("Invalid settings path '{}': {}", path.display(), e))
    })?;

    if !canonical.is_file() {
        return Err(RouterError::IoError(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }

    Ok(canonical)
}

/// Reject oversized files before reading them.
fn validate_file_size(path: &Path) -> Result<(), RouterError> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| RouterError::IoError(format!("Cannot read file metadata: {}", e)))?;

    if metadata.len() > MAX_SETTINGS_FILE_SIZE {
        return Err(RouterError::IoError(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            MAX_SETTINGS_FILE_SIZE
        )));
    }
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================
