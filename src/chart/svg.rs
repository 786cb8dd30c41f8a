use std::fmt::Write;
use std::path::Path;

use anyhow::{Context, Result};
use html_escape::{encode_double_quoted_attribute as attr, encode_text};

use super::scene::{Axis, LinePath, MarkerSet, Orient, Scene};

/// Stroke and font rules for the chart's classes.
const STYLE: &str = "\
svg { font: 10px sans-serif; }
.axis path, .axis line { fill: none; stroke: #000; shape-rendering: crispEdges; }
.line { fill: none; stroke-width: 1.5px; }
.symbol { font-family: FontAwesome, sans-serif; }";

// ---------------------------------------------------------------------------
// SVG output
// ---------------------------------------------------------------------------

/// Render a scene as a standalone SVG document.
pub fn render(scene: &Scene) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = write_scene(&mut out, scene);
    out
}

/// Render and write to `path`.
pub fn write_file(scene: &Scene, path: &Path) -> Result<()> {
    std::fs::write(path, render(scene))
        .with_context(|| format!("writing SVG to {}", path.display()))?;
    log::info!("Wrote chart to {}", path.display());
    Ok(())
}

fn write_scene(out: &mut String, scene: &Scene) -> std::fmt::Result {
    let frame = scene.frame;
    writeln!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{}" height="{}">"#,
        frame.width, frame.height
    )?;
    writeln!(out, "<style>\n{STYLE}\n</style>")?;
    writeln!(
        out,
        r#"<g transform="translate({},{})">"#,
        frame.margin.left, frame.margin.top
    )?;

    write_axis(out, &scene.x_axis, "x axis")?;
    write_axis(out, &scene.y_axis, "y axis")?;

    for line in &scene.lines {
        write_line(out, line)?;
    }
    for set in &scene.markers {
        write_markers(out, set)?;
    }

    writeln!(out, "</g>")?;
    writeln!(out, "</svg>")
}

fn write_axis(out: &mut String, axis: &Axis, class: &str) -> std::fmt::Result {
    let (tx, ty) = axis.offset;
    if (tx, ty) == (0.0, 0.0) {
        writeln!(out, r#"<g class="{class}">"#)?;
    } else {
        writeln!(out, r#"<g class="{class}" transform="translate({tx},{ty})">"#)?;
    }

    let sign = axis.sign();
    let tick_len = sign * Axis::INNER_TICK_SIZE;
    let label_gap = sign * (Axis::INNER_TICK_SIZE + Axis::TICK_PADDING);
    for tick in &axis.ticks {
        let label = encode_text(&tick.label);
        match axis.orient {
            Orient::Bottom => writeln!(
                out,
                r#"<g class="tick" transform="translate({},0)"><line y2="{tick_len}" x2="0"/><text dy=".71em" y="{label_gap}" x="0" style="text-anchor: middle;">{label}</text></g>"#,
                tick.position
            )?,
            Orient::Left => writeln!(
                out,
                r#"<g class="tick" transform="translate(0,{})"><line x2="{tick_len}" y2="0"/><text dy=".32em" x="{label_gap}" y="0" style="text-anchor: end;">{label}</text></g>"#,
                tick.position
            )?,
        }
    }
    writeln!(out, r#"<path class="domain" d="{}"/>"#, axis.domain_path())?;

    if let Some(title) = &axis.title {
        writeln!(
            out,
            r#"<text transform="rotate(-90)" y="6" dy=".71em" style="text-anchor: end;">{}</text>"#,
            encode_text(title)
        )?;
    }
    writeln!(out, "</g>")
}

fn write_line(out: &mut String, line: &LinePath) -> std::fmt::Result {
    write!(out, r#"<path class="line" stroke="{}""#, attr(&line.stroke))?;
    if let Some(dash) = line.dash_array() {
        write!(out, r#" stroke-dasharray="{dash}""#)?;
    }
    writeln!(out, r#" d="{}"/>"#, line.path_data())
}

fn write_markers(out: &mut String, set: &MarkerSet) -> std::fmt::Result {
    writeln!(out, "<g>")?;
    let glyph = encode_text(&set.glyph);
    let fill = set
        .color
        .as_deref()
        .map(|c| format!(r#" fill="{}""#, attr(c)))
        .unwrap_or_default();
    for (x, y) in &set.anchors {
        writeln!(
            out,
            r#"<text class="symbol" x="{x}" y="{y}"{fill}>{glyph}</text>"#
        )?;
    }
    writeln!(out, "</g>")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::Chart;
    use crate::config::ChartConfig;
    use crate::data::model::{DataPoint, KalmanDataset, Matrix, SeriesKind};

    fn scene() -> Scene {
        let points = (0..5)
            .map(|i| {
                let v = i as f64;
                DataPoint {
                    iter: v,
                    date: None,
                    xmodel: Matrix::scalar(v * 2.0),
                    xk: Matrix::scalar(v * 2.0 + 0.5),
                    zk: Matrix::scalar(v * 2.0 - 0.5),
                    close: None,
                }
            })
            .collect();
        Chart::build(&KalmanDataset::new(points), &ChartConfig::default())
            .unwrap()
            .scene()
    }

    #[test]
    fn document_has_frame_size_and_margin_translate() {
        let svg = render(&scene());
        assert!(svg.starts_with(r#"<svg xmlns="http://www.w3.org/2000/svg" width="960" height="500">"#));
        assert!(svg.contains(r#"<g transform="translate(50,20)">"#));
        assert!(svg.contains(r#"<g class="x axis" transform="translate(0,450)">"#));
        assert!(svg.contains(r#"<g class="y axis">"#));
        assert!(svg.trim_end().ends_with("</svg>"));
    }

    #[test]
    fn lines_carry_stroke_dash_and_path() {
        let scene = scene();
        let svg = render(&scene);
        let green = scene.line(SeriesKind::Xmodel).unwrap().path_data();
        assert!(svg.contains(&format!(r#"<path class="line" stroke="green" d="{green}"/>"#)));
        assert!(svg.contains(r#"<path class="line" stroke="red" stroke-dasharray="3,3" d="M"#));
    }

    #[test]
    fn three_marker_glyphs_per_point() {
        let svg = render(&scene());
        assert_eq!(svg.matches(r#"class="symbol""#).count(), 15);
        assert_eq!(svg.matches(">\u{f083}</text>").count(), 5);
        assert_eq!(svg.matches(">○</text>").count(), 5);
        assert_eq!(svg.matches(">x</text>").count(), 5);
    }

    #[test]
    fn y_axis_title_is_rotated() {
        let svg = render(&scene());
        assert!(svg.contains(
            r#"<text transform="rotate(-90)" y="6" dy=".71em" style="text-anchor: end;">Distance</text>"#
        ));
    }

    #[test]
    fn markup_in_labels_and_colors_is_escaped() {
        let mut scene = scene();
        scene.y_axis.title = Some(r#"a<b & "c">"#.to_string());
        scene.lines[0].stroke = r#"x"/><script"#.to_string();
        scene.markers[0].glyph = "<".to_string();
        let svg = render(&scene);
        assert!(svg.contains(r#"style="text-anchor: end;">a&lt;b &amp; "c"&gt;</text>"#));
        assert!(svg.contains(r#"stroke="x&quot;/&gt;&lt;script""#));
        assert!(svg.contains(">&lt;</text>"));
        assert!(!svg.contains("<script"));
    }
}
