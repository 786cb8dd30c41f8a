use serde::{Deserialize, Serialize};

/// Space reserved around the plot area for the axes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Margin {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Default for Margin {
    fn default() -> Self {
        Margin {
            top: 20.0,
            right: 20.0,
            bottom: 30.0,
            left: 50.0,
        }
    }
}

/// The drawing surface: outer size plus margins.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Frame {
    pub width: f64,
    pub height: f64,
    pub margin: Margin,
}

impl Default for Frame {
    fn default() -> Self {
        Frame {
            width: 960.0,
            height: 500.0,
            margin: Margin::default(),
        }
    }
}

impl Frame {
    /// Width of the plot area inside the margins.
    pub fn inner_width(&self) -> f64 {
        self.width - self.margin.left - self.margin.right
    }

    pub fn inner_height(&self) -> f64 {
        self.height - self.margin.top - self.margin.bottom
    }

    /// Most ticks either axis can carry without two sharing a pixel.
    pub fn max_tick_count(&self) -> usize {
        self.inner_width().min(self.inner_height()).floor().max(1.0) as usize
    }

    pub fn is_valid(&self) -> bool {
        self.inner_width() > 0.0 && self.inner_height() > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_frame_leaves_890_by_450() {
        let frame = Frame::default();
        assert_eq!(frame.inner_width(), 890.0);
        assert_eq!(frame.inner_height(), 450.0);
        assert!(frame.is_valid());
        assert_eq!(frame.max_tick_count(), 450);
    }

    #[test]
    fn margins_larger_than_frame_are_invalid() {
        let frame = Frame {
            width: 60.0,
            ..Frame::default()
        };
        assert!(!frame.is_valid());
    }

    #[test]
    fn partial_margin_json_keeps_defaults() {
        let margin: Margin = serde_json::from_str(r#"{"left": 80}"#).unwrap();
        assert_eq!(margin.left, 80.0);
        assert_eq!(margin.top, 20.0);
    }
}
