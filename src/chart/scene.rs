use std::fmt::Write;

use crate::chart::layout::Frame;
use crate::data::model::SeriesKind;

// ---------------------------------------------------------------------------
// Scene – the projected chart, independent of any renderer
// ---------------------------------------------------------------------------

/// Everything needed to draw the chart, already in pixel space relative
/// to the plot area (the margin translate is applied by the renderer).
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub frame: Frame,
    pub x_axis: Axis,
    pub y_axis: Axis,
    pub lines: Vec<LinePath>,
    pub markers: Vec<MarkerSet>,
}

impl Scene {
    pub fn line(&self, series: SeriesKind) -> Option<&LinePath> {
        self.lines.iter().find(|l| l.series == series)
    }

    pub fn marker_set(&self, series: SeriesKind) -> Option<&MarkerSet> {
        self.markers.iter().find(|m| m.series == series)
    }
}

// ---------------------------------------------------------------------------
// Axis
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orient {
    Bottom,
    Left,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tick {
    pub value: f64,
    /// Pixel position along the axis.
    pub position: f64,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Axis {
    pub orient: Orient,
    /// Translate of the axis group inside the plot area.
    pub offset: (f64, f64),
    /// Pixel extent covered by the axis line, ascending.
    pub extent: (f64, f64),
    pub ticks: Vec<Tick>,
    pub title: Option<String>,
}

impl Axis {
    pub const INNER_TICK_SIZE: f64 = 6.0;
    pub const OUTER_TICK_SIZE: f64 = 6.0;
    pub const TICK_PADDING: f64 = 3.0;

    pub fn new(orient: Orient, offset: (f64, f64), range: (f64, f64), ticks: Vec<Tick>) -> Self {
        let extent = if range.0 <= range.1 {
            range
        } else {
            (range.1, range.0)
        };
        Axis {
            orient,
            offset,
            extent,
            ticks,
            title: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// +1 when ticks hang below/right of the axis line, -1 above/left.
    pub fn sign(&self) -> f64 {
        match self.orient {
            Orient::Bottom => 1.0,
            Orient::Left => -1.0,
        }
    }

    /// Axis line with its outer end ticks, as SVG path data.
    pub fn domain_path(&self) -> String {
        let outer = self.sign() * Self::OUTER_TICK_SIZE;
        let (r0, r1) = self.extent;
        match self.orient {
            Orient::Bottom => format!("M{r0},{outer}V0H{r1}V{outer}"),
            Orient::Left => format!("M{outer},{r0}H0V{r1}H{outer}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Series geometry
// ---------------------------------------------------------------------------

/// One stroked series, points projected and in input order.
#[derive(Debug, Clone, PartialEq)]
pub struct LinePath {
    pub series: SeriesKind,
    pub stroke: String,
    pub dash: Vec<f64>,
    pub points: Vec<(f64, f64)>,
}

impl LinePath {
    /// `M x0,y0Lx1,y1…`; empty when there are no points.
    pub fn path_data(&self) -> String {
        let mut d = String::new();
        for (i, (x, y)) in self.points.iter().enumerate() {
            let cmd = if i == 0 { 'M' } else { 'L' };
            let _ = write!(d, "{cmd}{x},{y}");
        }
        d
    }

    pub fn dash_array(&self) -> Option<String> {
        if self.dash.is_empty() {
            return None;
        }
        let parts: Vec<String> = self.dash.iter().map(|v| v.to_string()).collect();
        Some(parts.join(","))
    }
}

/// A glyph repeated at each point of one series.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerSet {
    pub series: SeriesKind,
    pub glyph: String,
    pub color: Option<String>,
    /// Text anchors, offset already applied.
    pub anchors: Vec<(f64, f64)>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_data_moves_then_draws() {
        let line = LinePath {
            series: SeriesKind::Xmodel,
            stroke: "green".into(),
            dash: Vec::new(),
            points: vec![(0.0, 450.0), (445.0, 225.5), (890.0, 0.0)],
        };
        assert_eq!(line.path_data(), "M0,450L445,225.5L890,0");
        assert_eq!(line.dash_array(), None);
    }

    #[test]
    fn empty_line_has_empty_path() {
        let line = LinePath {
            series: SeriesKind::Xk,
            stroke: "red".into(),
            dash: vec![3.0, 3.0],
            points: Vec::new(),
        };
        assert_eq!(line.path_data(), "");
        assert_eq!(line.dash_array().as_deref(), Some("3,3"));
    }

    #[test]
    fn domain_paths_follow_orientation() {
        let x = Axis::new(Orient::Bottom, (0.0, 450.0), (0.0, 890.0), Vec::new());
        assert_eq!(x.domain_path(), "M0,6V0H890V6");

        let y = Axis::new(Orient::Left, (0.0, 0.0), (450.0, 0.0), Vec::new());
        assert_eq!(y.extent, (0.0, 450.0));
        assert_eq!(y.domain_path(), "M-6,0H0V450H-6");
    }
}
