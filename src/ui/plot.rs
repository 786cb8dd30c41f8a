use eframe::egui::{Color32, Ui};
use egui_plot::{GridMark, Line, LineStyle, MarkerShape, Plot, PlotBounds, PlotPoints, Points};

use kalman_plot::chart::format_day;
use kalman_plot::color::color32_or_gray;
use kalman_plot::config::XAxisMode;

use crate::state::AppState;

// ---------------------------------------------------------------------------
// Kalman chart (central panel)
// ---------------------------------------------------------------------------

/// Egui marker closest to a text glyph.
fn marker_shape(glyph: &str) -> MarkerShape {
    match glyph {
        "x" | "X" | "×" => MarkerShape::Cross,
        "○" | "o" | "O" | "●" => MarkerShape::Circle,
        "+" => MarkerShape::Plus,
        "*" => MarkerShape::Asterisk,
        "□" | "■" => MarkerShape::Square,
        "△" | "▲" => MarkerShape::Up,
        _ => MarkerShape::Diamond,
    }
}

/// Render the chart with fixed bounds; the view does not pan or zoom.
pub fn kalman_plot(ui: &mut Ui, state: &AppState) {
    let Some(chart) = &state.chart else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Nothing to plot  (pass a .json, .csv or .parquet file)");
        });
        return;
    };
    let config = chart.config();

    let (x0, x1) = chart.x.domain;
    let (y0, y1) = chart.y.domain;
    // egui_plot cannot show a zero-width range.
    let pad = |lo: f64, hi: f64| if hi > lo { (lo, hi) } else { (lo - 0.5, hi + 0.5) };
    let (x0, x1) = pad(x0, x1);
    let (y0, y1) = pad(y0, y1);

    let date_axis = config.x_axis == XAxisMode::Date;
    let text_color = ui.visuals().text_color();

    let mut plot = Plot::new("kalman_plot")
        .x_axis_label(if date_axis { "Date" } else { "Iteration" })
        .y_axis_label(config.y_label.clone())
        .show_grid(false)
        .allow_boxed_zoom(false)
        .allow_drag(false)
        .allow_scroll(false)
        .allow_zoom(false)
        .allow_double_click_reset(false);
    if date_axis {
        plot = plot.x_axis_formatter(|mark: GridMark, _range| format_day(mark.value));
    }

    plot.show(ui, |plot_ui| {
        plot_ui.set_plot_bounds(PlotBounds::from_min_max([x0, y0], [x1, y1]));

        for style in &config.lines {
            let points: PlotPoints = chart.series(style.series).into();
            let mut line = Line::new(points)
                .name(style.series.field_name())
                .color(color32_or_gray(&style.color))
                .width(1.5);
            if let Some(&dash) = style.dash.first() {
                line = line.style(LineStyle::Dashed {
                    length: dash as f32,
                });
            }
            plot_ui.line(line);
        }

        for style in &config.markers {
            let color: Color32 = style
                .color
                .as_deref()
                .map(color32_or_gray)
                .unwrap_or(text_color);
            let points: PlotPoints = chart.series(style.series).into();
            plot_ui.points(
                Points::new(points)
                    .name(style.series.field_name())
                    .shape(marker_shape(&style.glyph))
                    .filled(false)
                    .radius(3.0)
                    .color(color),
            );
        }
    });
}
