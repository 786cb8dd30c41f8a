use eframe::egui::{self, Color32, RichText, Ui};

use crate::state::AppState;

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top bar: dataset summary, fitted domains, status.
pub fn top_bar(ui: &mut Ui, state: &AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        match state.summary() {
            Some(summary) => ui.label(summary),
            None => ui.label("No dataset loaded."),
        };

        if let Some(chart) = &state.chart {
            ui.separator();
            let (x0, x1) = chart.x.domain;
            let (y0, y1) = chart.y.domain;
            ui.label(format!(
                "x: {} – {}   {}: {} – {}",
                chart.format_x(x0),
                chart.format_x(x1),
                chart.config().y_domain,
                chart.format_y(y0),
                chart.format_y(y1),
            ));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}
