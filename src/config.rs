use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::data::export::DEFAULT_EXPORT_NAME;

/// Optional settings file looked up in the working directory.
pub const CONFIG_FILE: &str = "dashboard.json";

// ---------------------------------------------------------------------------
// Dashboard configuration
// ---------------------------------------------------------------------------

/// Tunables for the dashboard. Every field falls back to its default when
/// absent from the settings file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Table loaded at startup.
    pub data_path: PathBuf,
    /// Rows in the "highest value" chart.
    pub top_value_k: usize,
    /// Rows per sex in the sex chart.
    pub top_sex_k: usize,
    /// Rows per age bracket.
    pub top_bracket_k: usize,
    /// Rows in the raw-data preview.
    pub sample_rows: usize,
    /// File name suggested when exporting.
    pub export_file_name: String,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("dados_sus_processados.csv"),
            top_value_k: 10,
            top_sex_k: 5,
            top_bracket_k: 5,
            sample_rows: 20,
            export_file_name: DEFAULT_EXPORT_NAME.to_string(),
        }
    }
}

impl DashboardConfig {
    /// Read `path` if it exists. A missing file yields the defaults; a
    /// malformed one is logged and also yields the defaults.
    pub fn load_or_default(path: &Path) -> Self {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("No {} found, using defaults", path.display());
                return Self::default();
            }
            Err(e) => {
                log::warn!("Cannot read {}: {e}; using defaults", path.display());
                return Self::default();
            }
        };

        match serde_json::from_str(&text) {
            Ok(config) => {
                log::info!("Loaded settings from {}", path.display());
                config
            }
            Err(e) => {
                log::warn!("Ignoring malformed {}: {e}", path.display());
                Self::default()
            }
        }
    }
}
