//! Kalman filter chart: model estimate, filtered state and observations
//! plotted against the iteration axis, rendered to SVG or a desktop window.

pub mod chart;
pub mod color;
pub mod config;
pub mod data;

pub use chart::scene::Scene;
pub use chart::{Chart, ChartError};
pub use config::ChartConfig;
pub use data::model::{DataPoint, KalmanDataset, Matrix, SeriesKind};
