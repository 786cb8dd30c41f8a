mod app;
mod state;
mod ui;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use app::KalmanPlotApp;
use eframe::egui;
use kalman_plot::chart::svg;
use kalman_plot::data::loader;
use kalman_plot::{Chart, ChartConfig};
use state::AppState;

#[derive(Debug, Default)]
struct Args {
    config: Option<PathBuf>,
    svg: Option<PathBuf>,
    input: Option<PathBuf>,
}

fn parse_args() -> Result<Args> {
    let mut args = Args::default();
    let mut it = std::env::args().skip(1);

    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--config" => {
                let path = it.next().context("--config requires a file path argument")?;
                args.config = Some(PathBuf::from(path));
            }
            "--svg" => {
                let path = it.next().context("--svg requires a file path argument")?;
                args.svg = Some(PathBuf::from(path));
            }
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            other if other.starts_with('-') => bail!("Unknown argument: {other}"),
            other => {
                if args.input.is_some() {
                    bail!("Only one data file may be given (extra: {other})");
                }
                args.input = Some(PathBuf::from(other));
            }
        }
    }

    Ok(args)
}

fn print_help() {
    println!("Kalman filter chart");
    println!("Usage: kalman-plot [OPTIONS] <DATA>");
    println!();
    println!("DATA is a .json, .csv or .parquet file with Xmodel, Xk and Zk per row.");
    println!();
    println!("OPTIONS:");
    println!("  --config <FILE>   Chart configuration (JSON)");
    println!("  --svg <FILE>      Write the chart as SVG instead of opening a window");
    println!("  -h, --help        Show this help");
}

/// Headless path: load, fit, write.
fn render_svg(input: &Path, output: &Path, config: &ChartConfig) -> Result<()> {
    let dataset = loader::load_file(input)?;
    let chart = Chart::build(&dataset, config)
        .with_context(|| format!("charting {}", input.display()))?;
    svg::write_file(&chart.scene(), output)
}

fn run_viewer(input: Option<PathBuf>, config: ChartConfig) -> Result<()> {
    let frame = config.frame;
    let mut state = AppState::new(config);
    if let Some(path) = &input {
        state.load(path);
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([frame.width as f32, frame.height as f32 + 32.0])
            .with_resizable(false),
        ..Default::default()
    };

    eframe::run_native(
        "Kalman Plot",
        options,
        Box::new(|_cc| Ok(Box::new(KalmanPlotApp::new(state)))),
    )
    .map_err(|e| anyhow::anyhow!("viewer failed: {e}"))
}

fn main() -> Result<()> {
    env_logger::init();

    let args = parse_args()?;
    let config = match &args.config {
        Some(path) => ChartConfig::load(path)?,
        None => ChartConfig::default(),
    };

    match (&args.svg, &args.input) {
        (Some(output), Some(input)) => render_svg(input, output, &config),
        (Some(_), None) => bail!("--svg needs a data file"),
        (None, input) => run_viewer(input.clone(), config),
    }
}
