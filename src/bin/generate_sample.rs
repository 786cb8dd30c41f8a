use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use arrow::array::{Float64Array, Float64Builder, Int64Array, ListBuilder, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::{Days, NaiveDate};
use parquet::arrow::ArrowWriter;
use serde::Serialize;

use kalman_plot::data::loader::DATE_FORMAT;

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5)).rotate_left(7).wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

// ---------------------------------------------------------------------------
// Constant-velocity tracker: state [position, velocity], position observed
// ---------------------------------------------------------------------------

struct Config {
    steps: usize,
    seed: u64,
    dt: f64,
    /// Acceleration noise variance.
    process_var: f64,
    /// Position measurement variance.
    measurement_var: f64,
    output_file: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            steps: 50,
            seed: 42,
            dt: 1.0,
            process_var: 0.05,
            measurement_var: 4.0,
            output_file: PathBuf::from("sample_kalman.json"),
        }
    }
}

type Vec2 = [f64; 2];
type Mat2 = [[f64; 2]; 2];

/// One filter step as written to disk.
#[derive(Debug, Clone, Serialize)]
struct Record {
    iter: i64,
    date: String,
    #[serde(rename = "Xmodel")]
    xmodel: Vec<Vec<f64>>,
    #[serde(rename = "Xk")]
    xk: Vec<Vec<f64>>,
    #[serde(rename = "Zk")]
    zk: Vec<Vec<f64>>,
}

struct Tracker {
    dt: f64,
    q: f64,
    r: f64,
    x: Vec2,
    p: Mat2,
}

impl Tracker {
    fn new(dt: f64, q: f64, r: f64, x0: Vec2) -> Self {
        Tracker {
            dt,
            q,
            r,
            x: x0,
            p: [[r, 0.0], [0.0, 1.0]],
        }
    }

    fn transition(&self, x: Vec2) -> Vec2 {
        [x[0] + self.dt * x[1], x[1]]
    }

    fn predict(&mut self) {
        let dt = self.dt;
        let p = self.p;
        self.x = self.transition(self.x);
        // F P Fᵀ + Q with white-noise acceleration
        let p00 = p[0][0] + dt * (p[1][0] + p[0][1]) + dt * dt * p[1][1];
        let p01 = p[0][1] + dt * p[1][1];
        let p10 = p[1][0] + dt * p[1][1];
        let p11 = p[1][1];
        let q = self.q;
        self.p = [
            [p00 + q * dt.powi(3) / 3.0, p01 + q * dt.powi(2) / 2.0],
            [p10 + q * dt.powi(2) / 2.0, p11 + q * dt],
        ];
    }

    fn update(&mut self, z: f64) {
        let p = self.p;
        let s = p[0][0] + self.r;
        let k = [p[0][0] / s, p[1][0] / s];
        let innovation = z - self.x[0];
        self.x = [self.x[0] + k[0] * innovation, self.x[1] + k[1] * innovation];
        self.p = [
            [(1.0 - k[0]) * p[0][0], (1.0 - k[0]) * p[0][1]],
            [p[1][0] - k[1] * p[0][0], p[1][1] - k[1] * p[0][1]],
        ];
    }
}

fn simulate(config: &Config) -> Vec<Record> {
    let mut rng = SimpleRng::new(config.seed);
    let dt = config.dt;
    let start = NaiveDate::from_ymd_opt(2015, 1, 1).unwrap_or_default();

    let x0: Vec2 = [0.0, 1.0];
    let mut truth = x0;
    let mut tracker = Tracker::new(dt, config.process_var, config.measurement_var, x0);
    let mut model = x0;

    (0..config.steps)
        .map(|k| {
            if k > 0 {
                let accel = rng.gauss(0.0, config.process_var.sqrt());
                truth = [
                    truth[0] + truth[1] * dt + 0.5 * accel * dt * dt,
                    truth[1] + accel * dt,
                ];
                model = tracker.transition(model);
                tracker.predict();
            }
            let z = truth[0] + rng.gauss(0.0, config.measurement_var.sqrt());
            tracker.update(z);

            let date = start
                .checked_add_days(Days::new(k as u64))
                .unwrap_or(start)
                .format(DATE_FORMAT)
                .to_string();
            Record {
                iter: k as i64,
                date,
                xmodel: vec![vec![model[0]], vec![model[1]]],
                xk: vec![vec![tracker.x[0]], vec![tracker.x[1]]],
                zk: vec![vec![z]],
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

fn write_json(records: &[Record], path: &Path) -> Result<()> {
    let text = serde_json::to_string_pretty(records).context("serializing records")?;
    std::fs::write(path, text).with_context(|| format!("writing {}", path.display()))
}

fn nested_list(values: impl Iterator<Item = Vec<Vec<f64>>>) -> arrow::array::ListArray {
    let mut builder = ListBuilder::new(ListBuilder::new(Float64Builder::new()));
    for matrix in values {
        for row in matrix {
            for v in row {
                builder.values().values().append_value(v);
            }
            builder.values().append(true);
        }
        builder.append(true);
    }
    builder.finish()
}

fn write_parquet(records: &[Record], path: &Path) -> Result<()> {
    let item = Arc::new(Field::new("item", DataType::Float64, true));
    let nested = DataType::List(Arc::new(Field::new("item", DataType::List(item), true)));

    let schema = Arc::new(Schema::new(vec![
        Field::new("iter", DataType::Int64, false),
        Field::new("date", DataType::Utf8, false),
        Field::new("Xmodel", nested.clone(), false),
        Field::new("Xk", nested, false),
        Field::new("Zk", DataType::Float64, false),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(Int64Array::from_iter_values(records.iter().map(|r| r.iter))),
            Arc::new(StringArray::from_iter_values(records.iter().map(|r| r.date.as_str()))),
            Arc::new(nested_list(records.iter().map(|r| r.xmodel.clone()))),
            Arc::new(nested_list(records.iter().map(|r| r.xk.clone()))),
            Arc::new(Float64Array::from_iter_values(records.iter().map(|r| r.zk[0][0]))),
        ],
    )
    .context("building record batch")?;

    let file = std::fs::File::create(path)
        .with_context(|| format!("creating {}", path.display()))?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

fn parse_args() -> Result<Config> {
    let args: Vec<String> = std::env::args().collect();
    let mut config = Config::default();

    let mut i = 1;
    while i < args.len() {
        let value = |i: usize| -> Result<&String> {
            args.get(i + 1)
                .with_context(|| format!("{} requires an argument", args[i]))
        };
        match args[i].as_str() {
            "--steps" => {
                config.steps = value(i)?.parse().context("--steps")?;
                i += 1;
            }
            "--seed" => {
                config.seed = value(i)?.parse().context("--seed")?;
                i += 1;
            }
            "--dt" => {
                config.dt = value(i)?.parse().context("--dt")?;
                i += 1;
            }
            "--process-var" => {
                config.process_var = value(i)?.parse().context("--process-var")?;
                i += 1;
            }
            "--measurement-var" => {
                config.measurement_var = value(i)?.parse().context("--measurement-var")?;
                i += 1;
            }
            "--out" => {
                config.output_file = PathBuf::from(value(i)?);
                i += 1;
            }
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            other => {
                log::warn!("Unknown argument: {other}");
            }
        }
        i += 1;
    }

    if config.steps == 0 {
        bail!("--steps must be at least 1");
    }
    Ok(config)
}

fn print_help() {
    println!("Kalman sample generator");
    println!("Usage: generate_sample [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("  --steps <N>             Filter iterations (default: 50)");
    println!("  --seed <N>              PRNG seed (default: 42)");
    println!("  --dt <T>                Time step (default: 1.0)");
    println!("  --process-var <Q>       Acceleration noise variance (default: 0.05)");
    println!("  --measurement-var <R>   Measurement noise variance (default: 4.0)");
    println!("  --out <FILE>            .json or .parquet (default: sample_kalman.json)");
}

fn main() -> Result<()> {
    env_logger::init();
    let config = parse_args()?;
    let records = simulate(&config);

    let path = &config.output_file;
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    match ext.as_str() {
        "json" => write_json(&records, path)?,
        "parquet" | "pq" => write_parquet(&records, path)?,
        other => bail!("Unsupported output extension: .{other}"),
    }

    println!("Wrote {} filter steps to {}", records.len(), path.display());
    Ok(())
}
