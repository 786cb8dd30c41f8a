use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::chart::layout::Frame;
use crate::color::{parse_color, ColorError};
use crate::data::model::SeriesKind;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading config {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("parsing config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error(transparent)]
    Color(#[from] ColorError),
    #[error("frame {width}x{height} leaves no room inside the margins")]
    Frame { width: f64, height: f64 },
    #[error("tick count must be at least 1")]
    TickCount,
    #[error("tick count {count} exceeds {max}, one per pixel of the plot area")]
    TooManyTicks { count: usize, max: usize },
}

/// What the horizontal axis measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum XAxisMode {
    /// The `iter` field.
    #[default]
    Iteration,
    /// The `date` field; every point must carry one.
    Date,
}

/// Stroke of one series line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineStyle {
    pub series: SeriesKind,
    pub color: String,
    /// SVG dash array; empty means solid.
    #[serde(default)]
    pub dash: Vec<f64>,
}

/// A glyph drawn at every point of one series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerStyle {
    pub series: SeriesKind,
    pub glyph: String,
    #[serde(default)]
    pub color: Option<String>,
    /// Pixel nudge applied to the anchor, `[dx, dy]`.
    #[serde(default = "default_marker_offset")]
    pub offset: [f64; 2],
}

fn default_marker_offset() -> [f64; 2] {
    [-2.0, 3.0]
}

// ---------------------------------------------------------------------------
// ChartConfig
// ---------------------------------------------------------------------------

/// Everything that shapes the chart. Defaults reproduce the classic
/// estimate-vs-observation plot: 960×500, green model line, dashed red
/// filter line, three marker series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    pub frame: Frame,
    pub y_label: String,
    pub x_axis: XAxisMode,
    pub tick_count: usize,
    /// Series whose extent sets the y domain.
    pub y_domain: SeriesKind,
    /// Drawn first, in order.
    pub lines: Vec<LineStyle>,
    /// Drawn after the lines, in order.
    pub markers: Vec<MarkerStyle>,
}

impl Default for ChartConfig {
    fn default() -> Self {
        ChartConfig {
            frame: Frame::default(),
            y_label: "Distance".to_string(),
            x_axis: XAxisMode::Iteration,
            tick_count: 10,
            y_domain: SeriesKind::Xmodel,
            lines: vec![
                LineStyle {
                    series: SeriesKind::Xmodel,
                    color: "green".to_string(),
                    dash: Vec::new(),
                },
                LineStyle {
                    series: SeriesKind::Xk,
                    color: "red".to_string(),
                    dash: vec![3.0, 3.0],
                },
            ],
            markers: vec![
                MarkerStyle {
                    series: SeriesKind::Zk,
                    glyph: "\u{f083}".to_string(),
                    color: None,
                    offset: default_marker_offset(),
                },
                MarkerStyle {
                    series: SeriesKind::Xk,
                    glyph: "\u{25cb}".to_string(),
                    color: None,
                    offset: default_marker_offset(),
                },
                MarkerStyle {
                    series: SeriesKind::Xmodel,
                    glyph: "x".to_string(),
                    color: None,
                    offset: default_marker_offset(),
                },
            ],
        }
    }
}

impl ChartConfig {
    /// Read a JSON config; missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_json(&text)?;
        log::debug!("Loaded chart config from {}", path.display());
        Ok(config)
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: ChartConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.frame.is_valid() {
            return Err(ConfigError::Frame {
                width: self.frame.width,
                height: self.frame.height,
            });
        }
        if self.tick_count == 0 {
            return Err(ConfigError::TickCount);
        }
        let max = self.frame.max_tick_count();
        if self.tick_count > max {
            return Err(ConfigError::TooManyTicks {
                count: self.tick_count,
                max,
            });
        }
        for line in &self.lines {
            parse_color(&line.color)?;
        }
        for marker in &self.markers {
            if let Some(color) = &marker.color {
                parse_color(color)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_describe_the_reference_chart() {
        let config = ChartConfig::default();
        assert_eq!(config.frame.inner_width(), 890.0);
        assert_eq!(config.y_label, "Distance");
        assert_eq!(config.lines[0].series, SeriesKind::Xmodel);
        assert!(config.lines[0].dash.is_empty());
        assert_eq!(config.lines[1].dash, vec![3.0, 3.0]);
        let glyphs: Vec<&str> = config.markers.iter().map(|m| m.glyph.as_str()).collect();
        assert_eq!(glyphs, vec!["\u{f083}", "○", "x"]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_json_overrides_only_given_fields() {
        let config = ChartConfig::from_json(
            r#"{"y_label": "Position", "x_axis": "date", "frame": {"width": 640}}"#,
        )
        .unwrap();
        assert_eq!(config.y_label, "Position");
        assert_eq!(config.x_axis, XAxisMode::Date);
        assert_eq!(config.frame.width, 640.0);
        assert_eq!(config.frame.height, 500.0);
        assert_eq!(config.lines.len(), 2);
    }

    #[test]
    fn marker_offset_defaults_when_omitted() {
        let config = ChartConfig::from_json(
            r##"{"markers": [{"series": "Zk", "glyph": "*", "color": "#336699"}]}"##,
        )
        .unwrap();
        assert_eq!(config.markers[0].offset, [-2.0, 3.0]);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let err = ChartConfig::from_json(
            r#"{"lines": [{"series": "Xk", "color": "ultraviolet"}]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Color(_)));

        let err = ChartConfig::from_json(r#"{"tick_count": 0}"#).unwrap_err();
        assert!(matches!(err, ConfigError::TickCount));

        let err = ChartConfig::from_json(r#"{"tick_count": 50000000}"#).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::TooManyTicks {
                count: 50_000_000,
                max: 450
            }
        ));
        assert!(ChartConfig::from_json(r#"{"tick_count": 450}"#).is_ok());

        let err = ChartConfig::from_json(r#"{"frame": {"height": 40}}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Frame { .. }));

        let err = ChartConfig::from_json("{").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
