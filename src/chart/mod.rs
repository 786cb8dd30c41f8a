//! Chart layer: scales, layout, scene construction and SVG output.
//!
//! ```text
//!   KalmanDataset + ChartConfig
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  Chart    │  domains, scales, data-space columns
//!   └──────────┘
//!        │ scene()
//!        ▼
//!   ┌──────────┐
//!   │  Scene    │  axes, line paths, marker anchors (pixels)
//!   └──────────┘
//!        │
//!        ▼
//!     svg::render
//! ```

pub mod layout;
pub mod scale;
pub mod scene;
pub mod svg;

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use thiserror::Error;

use crate::config::{ChartConfig, XAxisMode};
use crate::data::loader::DATE_FORMAT;
use crate::data::model::{KalmanDataset, SeriesKind};

use scale::{extent, format_tick, LinearScale};
use scene::{Axis, LinePath, MarkerSet, Orient, Scene, Tick};

#[derive(Debug, Error, PartialEq)]
pub enum ChartError {
    #[error("dataset has no points")]
    EmptyDataset,
    #[error("point {index}: {field} is not finite ({value})")]
    NonFinite {
        index: usize,
        field: &'static str,
        value: f64,
    },
    #[error("point {index} has no date, but the x axis is a date axis")]
    MissingDate { index: usize },
}

// ---------------------------------------------------------------------------
// Chart – scales plus the data-space columns they apply to
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Chart {
    config: ChartConfig,
    pub x: LinearScale,
    pub y: LinearScale,
    xs: Vec<f64>,
    columns: BTreeMap<SeriesKind, Vec<f64>>,
}

impl Chart {
    /// Validate the dataset against the config and fit the scales.
    ///
    /// The x domain is the extent of `iter` (or of the dates), the y domain
    /// the extent of the configured series (`Xmodel` by default). Other
    /// series may fall outside the plot area.
    pub fn build(dataset: &KalmanDataset, config: &ChartConfig) -> Result<Self, ChartError> {
        if dataset.is_empty() {
            return Err(ChartError::EmptyDataset);
        }

        let xs = dataset
            .points
            .iter()
            .enumerate()
            .map(|(index, p)| {
                let (value, field) = match config.x_axis {
                    XAxisMode::Iteration => (p.iter, "iter"),
                    XAxisMode::Date => {
                        let date = p.date.ok_or(ChartError::MissingDate { index })?;
                        (date.num_days_from_ce() as f64, "date")
                    }
                };
                finite(value, index, field)
            })
            .collect::<Result<Vec<f64>, ChartError>>()?;

        let mut columns = BTreeMap::new();
        for kind in plotted_series(config) {
            let values = dataset
                .points
                .iter()
                .enumerate()
                .map(|(index, p)| finite(kind.value(p), index, kind.field_name()))
                .collect::<Result<Vec<f64>, ChartError>>()?;
            columns.insert(kind, values);
        }

        let x_domain = extent(xs.iter().copied()).ok_or(ChartError::EmptyDataset)?;
        let y_domain = columns
            .get(&config.y_domain)
            .and_then(|ys| extent(ys.iter().copied()))
            .ok_or(ChartError::EmptyDataset)?;

        let frame = config.frame;
        let chart = Chart {
            config: config.clone(),
            x: LinearScale::new(x_domain, (0.0, frame.inner_width())),
            y: LinearScale::new(y_domain, (frame.inner_height(), 0.0)),
            xs,
            columns,
        };
        log::debug!(
            "Chart fitted: x domain {:?}, y domain {:?}",
            chart.x.domain,
            chart.y.domain
        );
        Ok(chart)
    }

    pub fn config(&self) -> &ChartConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.xs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.xs.is_empty()
    }

    /// Data-space `[x, value]` pairs of one series, in input order.
    pub fn series(&self, kind: SeriesKind) -> Vec<[f64; 2]> {
        match self.columns.get(&kind) {
            Some(values) => self
                .xs
                .iter()
                .zip(values)
                .map(|(&x, &y)| [x, y])
                .collect(),
            None => Vec::new(),
        }
    }

    /// Requested ticks per axis, capped at one per pixel of the shorter side.
    fn tick_count(&self) -> usize {
        self.config
            .tick_count
            .clamp(1, self.config.frame.max_tick_count())
    }

    /// Label for an x value: a date in date mode, a number otherwise.
    pub fn format_x(&self, value: f64) -> String {
        match self.config.x_axis {
            XAxisMode::Iteration => {
                format_tick(value, self.x.tick_precision(self.tick_count()))
            }
            XAxisMode::Date => format_day(value),
        }
    }

    pub fn format_y(&self, value: f64) -> String {
        format_tick(value, self.y.tick_precision(self.tick_count()))
    }

    /// Tick values on the x axis. Date axes only tick whole days.
    pub fn x_ticks(&self) -> Vec<f64> {
        let ticks = self.x.ticks(self.tick_count());
        match self.config.x_axis {
            XAxisMode::Iteration => ticks,
            XAxisMode::Date => ticks.into_iter().filter(|t| t.fract() == 0.0).collect(),
        }
    }

    pub fn y_ticks(&self) -> Vec<f64> {
        self.y.ticks(self.tick_count())
    }

    /// Project the chart into pixel space.
    pub fn scene(&self) -> Scene {
        let frame = self.config.frame;

        let x_ticks = self
            .x_ticks()
            .into_iter()
            .map(|value| Tick {
                value,
                position: self.x.apply(value),
                label: self.format_x(value),
            })
            .collect();
        let x_axis = Axis::new(
            Orient::Bottom,
            (0.0, frame.inner_height()),
            self.x.range,
            x_ticks,
        );

        let y_ticks = self
            .y_ticks()
            .into_iter()
            .map(|value| Tick {
                value,
                position: self.y.apply(value),
                label: self.format_y(value),
            })
            .collect();
        let mut y_axis = Axis::new(Orient::Left, (0.0, 0.0), self.y.range, y_ticks);
        if !self.config.y_label.is_empty() {
            y_axis = y_axis.with_title(self.config.y_label.clone());
        }

        let lines = self
            .config
            .lines
            .iter()
            .map(|style| LinePath {
                series: style.series,
                stroke: style.color.clone(),
                dash: style.dash.clone(),
                points: self.project(style.series, [0.0, 0.0]),
            })
            .collect();

        let markers = self
            .config
            .markers
            .iter()
            .map(|style| MarkerSet {
                series: style.series,
                glyph: style.glyph.clone(),
                color: style.color.clone(),
                anchors: self.project(style.series, style.offset),
            })
            .collect();

        Scene {
            frame,
            x_axis,
            y_axis,
            lines,
            markers,
        }
    }

    fn project(&self, kind: SeriesKind, offset: [f64; 2]) -> Vec<(f64, f64)> {
        self.series(kind)
            .into_iter()
            .map(|[x, y]| (self.x.apply(x) + offset[0], self.y.apply(y) + offset[1]))
            .collect()
    }
}

/// Format a day count (days since 0001-01-01, as used on date axes).
pub fn format_day(days: f64) -> String {
    NaiveDate::from_num_days_from_ce_opt(days.round() as i32)
        .map(|d| d.format(DATE_FORMAT).to_string())
        .unwrap_or_default()
}

fn finite(value: f64, index: usize, field: &'static str) -> Result<f64, ChartError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ChartError::NonFinite {
            index,
            field,
            value,
        })
    }
}

/// Series referenced anywhere in the config, y-domain series included.
fn plotted_series(config: &ChartConfig) -> Vec<SeriesKind> {
    let mut kinds: Vec<SeriesKind> = std::iter::once(config.y_domain)
        .chain(config.lines.iter().map(|l| l.series))
        .chain(config.markers.iter().map(|m| m.series))
        .collect();
    kinds.sort();
    kinds.dedup();
    kinds
}
