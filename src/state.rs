use std::path::Path;

use crate::config::DashboardConfig;
use crate::data::error::LoadError;
use crate::data::loader::load_file;
use crate::data::model::AdmissionDataset;
use crate::data::query::available_codes;

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    pub config: DashboardConfig,

    /// Loaded dataset (None until a file loads successfully).
    pub dataset: Option<AdmissionDataset>,

    /// Sorted distinct codes of `dataset`, for the selector.
    pub codes: Vec<String>,

    /// Code shown in the detail panel.
    pub selected_code: Option<String>,

    /// Why the last load failed. Replaces the charts while set.
    pub load_error: Option<String>,

    /// Status message shown in the top bar.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(config: DashboardConfig) -> Self {
        Self {
            config,
            dataset: None,
            codes: Vec::new(),
            selected_code: None,
            load_error: None,
            status_message: None,
        }
    }

    /// Load the configured startup file.
    pub fn load_startup_file(&mut self) {
        let path = self.config.data_path.clone();
        self.load(&path);
    }

    /// Load `path`, replacing the current dataset on success.
    pub fn load(&mut self, path: &Path) {
        match load_file(path) {
            Ok(dataset) => {
                log::info!("Loaded {} diagnosis codes from {}", dataset.len(), path.display());
                self.set_dataset(dataset);
                self.status_message = Some(format!("Loaded {}", path.display()));
            }
            Err(e) => self.set_load_error(path, &e),
        }
    }

    /// Ingest a newly loaded dataset and preselect the first code.
    pub fn set_dataset(&mut self, dataset: AdmissionDataset) {
        self.codes = available_codes(dataset.records());
        self.selected_code = self.codes.first().cloned();
        self.dataset = Some(dataset);
        self.load_error = None;
    }

    fn set_load_error(&mut self, path: &Path, error: &LoadError) {
        log::error!("Failed to load {}: {error}", path.display());
        self.dataset = None;
        self.codes.clear();
        self.selected_code = None;
        self.load_error = Some(format!("{}: {error}", path.display()));
        self.status_message = None;
    }
}
