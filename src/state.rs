use std::path::{Path, PathBuf};

use kalman_plot::data::loader;
use kalman_plot::{Chart, ChartConfig, KalmanDataset};

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full viewer state, independent of rendering.
pub struct AppState {
    /// Chart configuration (frame, styles, axis mode).
    pub config: ChartConfig,

    /// File the dataset was read from.
    pub source: Option<PathBuf>,

    /// Loaded dataset (None until a file loads).
    pub dataset: Option<KalmanDataset>,

    /// Fitted chart for the current dataset (cached).
    pub chart: Option<Chart>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(config: ChartConfig) -> Self {
        Self {
            config,
            source: None,
            dataset: None,
            chart: None,
            status_message: None,
        }
    }

    /// Read a dataset from disk and fit the chart to it.
    pub fn load(&mut self, path: &Path) {
        self.source = Some(path.to_path_buf());
        match loader::load_file(path) {
            Ok(dataset) => self.set_dataset(dataset),
            Err(e) => {
                log::error!("Failed to load file: {e:#}");
                self.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }

    /// Ingest a newly loaded dataset and rebuild the chart.
    pub fn set_dataset(&mut self, dataset: KalmanDataset) {
        match Chart::build(&dataset, &self.config) {
            Ok(chart) => {
                self.chart = Some(chart);
                self.status_message = None;
            }
            Err(e) => {
                log::error!("Cannot chart dataset: {e}");
                self.chart = None;
                self.status_message = Some(format!("Error: {e}"));
            }
        }
        self.dataset = Some(dataset);
    }

    /// One-line description of what is on screen.
    pub fn summary(&self) -> Option<String> {
        let dataset = self.dataset.as_ref()?;
        let name = self
            .source
            .as_ref()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "dataset".to_string());
        Some(format!("{name}: {} points", dataset.len()))
    }
}
