use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use arrow::array::{
    Array, AsArray, Float32Array, Float64Array, Int32Array, Int64Array, LargeListArray, ListArray,
    StringArray,
};
use arrow::datatypes::DataType;
use chrono::NaiveDate;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde::Deserialize;
use serde_json::Value as JsonValue;

use super::model::{DataPoint, KalmanDataset, Matrix, SeriesKind};

/// Date layout used by the filter logs, e.g. `03-Feb-15`.
pub const DATE_FORMAT: &str = "%d-%b-%y";

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a Kalman dataset from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.json`    – `[{ "iter": 0, "Xmodel": [[..]], "Xk": [[..]], "Zk": [[..]], ... }, ...]`
/// * `.csv`     – header row; matrix cells as `a b;c d` (rows split by `;`)
/// * `.parquet` – matrix columns as Float64, List<Float64> or List<List<Float64>>
pub fn load_file(path: &Path) -> Result<KalmanDataset> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let dataset = match ext.as_str() {
        "json" => load_json(path),
        "csv" => load_csv(path),
        "parquet" | "pq" => load_parquet(path),
        other => bail!("Unsupported file extension: .{other}"),
    }
    .with_context(|| format!("loading {}", path.display()))?;

    log::info!("Loaded {} points from {}", dataset.len(), path.display());
    Ok(dataset)
}

// ---------------------------------------------------------------------------
// Field coercion
// ---------------------------------------------------------------------------

/// Parse a `date` cell. Accepts `%d-%b-%y` and ISO `%Y-%m-%d`.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, DATE_FORMAT)
        .or_else(|_| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
        .ok()
}

fn coerce_date(raw: Option<&str>, row: usize) -> Option<NaiveDate> {
    let raw = raw.map(str::trim).filter(|s| !s.is_empty())?;
    let date = parse_date(raw);
    if date.is_none() {
        log::warn!("Row {row}: unparsable date '{raw}', ignoring");
    }
    date
}

/// `close` is carried as a number; numeric strings are accepted.
fn coerce_close_str(raw: &str, row: usize) -> Option<f64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    match raw.parse::<f64>() {
        Ok(v) => Some(v),
        Err(_) => {
            log::warn!("Row {row}: 'close' value '{raw}' is not a number, ignoring");
            None
        }
    }
}

fn coerce_close_json(raw: Option<&JsonValue>, row: usize) -> Option<f64> {
    match raw? {
        JsonValue::Number(n) => n.as_f64(),
        JsonValue::String(s) => coerce_close_str(s, row),
        JsonValue::Null => None,
        other => {
            log::warn!("Row {row}: 'close' value {other} is not a number, ignoring");
            None
        }
    }
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct JsonRecord {
    #[serde(default)]
    iter: Option<f64>,
    #[serde(default)]
    date: Option<String>,
    #[serde(rename = "Xmodel")]
    xmodel: Matrix,
    #[serde(rename = "Xk")]
    xk: Matrix,
    #[serde(rename = "Zk")]
    zk: Matrix,
    #[serde(default)]
    close: Option<JsonValue>,
}

/// Expected JSON schema (records-oriented):
///
/// ```json
/// [
///   { "iter": 0, "date": "01-Jan-15",
///     "Xmodel": [[0.0], [1.0]], "Xk": [[0.1], [0.9]], "Zk": [[0.3]] },
///   ...
/// ]
/// ```
fn load_json(path: &Path) -> Result<KalmanDataset> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    parse_json(&text)
}

pub fn parse_json(text: &str) -> Result<KalmanDataset> {
    let root: JsonValue = serde_json::from_str(text).context("parsing JSON")?;
    let records = root.as_array().context("Expected top-level JSON array")?;

    let mut points = Vec::with_capacity(records.len());
    for (i, rec) in records.iter().enumerate() {
        let rec: JsonRecord =
            serde_json::from_value(rec.clone()).with_context(|| format!("Row {i}"))?;
        points.push(DataPoint {
            iter: rec.iter.unwrap_or(i as f64),
            date: coerce_date(rec.date.as_deref(), i),
            xmodel: rec.xmodel,
            xk: rec.xk,
            zk: rec.zk,
            close: coerce_close_json(rec.close.as_ref(), i),
        });
    }

    Ok(KalmanDataset::new(points))
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names `iter`, `date`, `Xmodel`,
/// `Xk`, `Zk`, `close` (only the three matrix columns are required).
/// Matrix cells list rows separated by `;`, values by spaces or commas:
/// `"1.0;0.5"` is a column vector, `"1 0;0 1"` a 2×2 matrix.
fn load_csv(path: &Path) -> Result<KalmanDataset> {
    let reader = csv::Reader::from_path(path).context("opening CSV")?;
    read_csv(reader)
}

pub fn read_csv<R: std::io::Read>(mut reader: csv::Reader<R>) -> Result<KalmanDataset> {
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    let column = |name: &str| headers.iter().position(|h| h == name);

    let matrix_idx = SeriesKind::ALL
        .iter()
        .map(|kind| {
            column(kind.field_name())
                .with_context(|| format!("CSV missing '{}' column", kind.field_name()))
        })
        .collect::<Result<Vec<usize>>>()?;
    let iter_idx = column("iter");
    let date_idx = column("date");
    let close_idx = column("close");

    let mut points = Vec::new();

    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        let cell = |idx: usize| record.get(idx).unwrap_or("");

        // A blank cell counts as missing, like an absent column.
        let iter = match iter_idx.map(|idx| cell(idx).trim()) {
            Some(raw) if !raw.is_empty() => raw
                .parse::<f64>()
                .with_context(|| format!("CSV row {row_no}: 'iter' is not a number"))?,
            _ => row_no as f64,
        };

        let mut matrices = matrix_idx
            .iter()
            .zip(SeriesKind::ALL)
            .map(|(&idx, kind)| parse_matrix_cell(cell(idx), row_no, kind.field_name()))
            .collect::<Result<Vec<Matrix>>>()?
            .into_iter();
        let (Some(xmodel), Some(xk), Some(zk)) = (matrices.next(), matrices.next(), matrices.next())
        else {
            bail!("CSV row {row_no}: missing matrix cells");
        };

        points.push(DataPoint {
            iter,
            date: coerce_date(date_idx.map(cell), row_no),
            xmodel,
            xk,
            zk,
            close: close_idx.and_then(|idx| coerce_close_str(cell(idx), row_no)),
        });
    }

    Ok(KalmanDataset::new(points))
}

fn parse_matrix_cell(s: &str, row: usize, col: &str) -> Result<Matrix> {
    let rows = s
        .split(';')
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(|r| {
            r.split(|c: char| c == ',' || c.is_whitespace())
                .filter(|tok| !tok.is_empty())
                .map(|tok| {
                    tok.parse::<f64>()
                        .with_context(|| format!("Row {row}, {col}: '{tok}' is not a number"))
                })
                .collect::<Result<Vec<f64>>>()
        })
        .collect::<Result<Vec<Vec<f64>>>>()?;

    Matrix::new(rows).with_context(|| format!("Row {row}, {col}"))
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file containing filter output.
///
/// Expected schema:
/// - `Xmodel`, `Xk`, `Zk`: Float64 (scalar), List<Float64> (column vector)
///   or List<List<Float64>> (row-major matrix)
/// - `iter`: Int32, Int64, Float32 or Float64 (optional, defaults to row number)
/// - `date`: Utf8 (optional)
/// - `close`: Float64 (optional)
fn load_parquet(path: &Path) -> Result<KalmanDataset> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    let mut points = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let schema = batch.schema();
        let column = |name: &str| schema.index_of(name).ok().map(|i| batch.column(i));

        let matrix_cols = SeriesKind::ALL
            .iter()
            .map(|kind| {
                column(kind.field_name())
                    .with_context(|| format!("Parquet file missing '{}' column", kind.field_name()))
            })
            .collect::<Result<Vec<_>>>()?;
        let iter_col = column("iter");
        let date_col = column("date");
        let close_col = column("close");

        for row in 0..batch.num_rows() {
            let index = points.len();
            let iter = match iter_col {
                Some(col) if !col.is_null(row) => extract_f64(col, row)
                    .with_context(|| format!("Row {index}: failed to read 'iter'"))?,
                _ => index as f64,
            };

            let mut matrices = Vec::with_capacity(3);
            for (col, kind) in matrix_cols.iter().zip(SeriesKind::ALL) {
                let m = extract_matrix(col, row)
                    .with_context(|| format!("Row {index}: failed to read '{kind}'"))?;
                matrices.push(m);
            }
            let mut matrices = matrices.into_iter();
            let (Some(xmodel), Some(xk), Some(zk)) =
                (matrices.next(), matrices.next(), matrices.next())
            else {
                bail!("Row {index}: missing matrix values");
            };

            let date = match date_col {
                Some(col) => coerce_date(extract_str(col, row)?.as_deref(), index),
                None => None,
            };
            let close = match close_col {
                Some(col) if !col.is_null(row) => Some(
                    extract_f64(col, row)
                        .with_context(|| format!("Row {index}: failed to read 'close'"))?,
                ),
                _ => None,
            };

            points.push(DataPoint {
                iter,
                date,
                xmodel,
                xk,
                zk,
                close,
            });
        }
    }

    Ok(KalmanDataset::new(points))
}

// -- Parquet / Arrow helpers --

/// Read a numeric scalar cell as `f64`.
fn extract_f64(col: &Arc<dyn Array>, row: usize) -> Result<f64> {
    if col.is_null(row) {
        bail!("null value in numeric column");
    }
    let value = match col.data_type() {
        DataType::Float64 => col
            .as_any()
            .downcast_ref::<Float64Array>()
            .context("expected Float64Array")?
            .value(row),
        DataType::Float32 => col
            .as_any()
            .downcast_ref::<Float32Array>()
            .context("expected Float32Array")?
            .value(row) as f64,
        DataType::Int64 => col
            .as_any()
            .downcast_ref::<Int64Array>()
            .context("expected Int64Array")?
            .value(row) as f64,
        DataType::Int32 => col
            .as_any()
            .downcast_ref::<Int32Array>()
            .context("expected Int32Array")?
            .value(row) as f64,
        other => bail!("Expected a numeric column, got {other:?}"),
    };
    Ok(value)
}

fn extract_str(col: &Arc<dyn Array>, row: usize) -> Result<Option<String>> {
    if col.is_null(row) {
        return Ok(None);
    }
    match col.data_type() {
        DataType::Utf8 => {
            let s = col
                .as_any()
                .downcast_ref::<StringArray>()
                .context("expected StringArray")?;
            Ok(Some(s.value(row).to_string()))
        }
        DataType::LargeUtf8 => Ok(Some(col.as_string::<i64>().value(row).to_string())),
        other => bail!("Expected a string column, got {other:?}"),
    }
}

/// The child array of a List or LargeList cell.
fn list_value(col: &Arc<dyn Array>, row: usize) -> Result<Arc<dyn Array>> {
    if col.is_null(row) {
        bail!("null value in list column");
    }
    match col.data_type() {
        DataType::List(_) => Ok(col
            .as_any()
            .downcast_ref::<ListArray>()
            .context("expected ListArray")?
            .value(row)),
        DataType::LargeList(_) => Ok(col
            .as_any()
            .downcast_ref::<LargeListArray>()
            .context("expected LargeListArray")?
            .value(row)),
        other => bail!("Expected List or LargeList column, got {other:?}"),
    }
}

/// All values of a Float64/Float32 array; nulls become NaN.
fn f64_values(values: &Arc<dyn Array>) -> Result<Vec<f64>> {
    if let Some(arr) = values.as_any().downcast_ref::<Float64Array>() {
        Ok(arr.iter().map(|v| v.unwrap_or(f64::NAN)).collect())
    } else if let Some(arr) = values.as_any().downcast_ref::<Float32Array>() {
        Ok(arr.iter().map(|v| v.unwrap_or(f32::NAN) as f64).collect())
    } else {
        bail!(
            "List inner type is {:?}, expected Float64 or Float32",
            values.data_type()
        )
    }
}

fn extract_matrix(col: &Arc<dyn Array>, row: usize) -> Result<Matrix> {
    match col.data_type() {
        DataType::Float64 | DataType::Float32 | DataType::Int64 | DataType::Int32 => {
            Ok(Matrix::scalar(extract_f64(col, row)?))
        }
        DataType::List(_) | DataType::LargeList(_) => {
            let inner = list_value(col, row)?;
            match inner.data_type() {
                DataType::List(_) | DataType::LargeList(_) => {
                    let rows = (0..inner.len())
                        .map(|r| f64_values(&list_value(&inner, r)?))
                        .collect::<Result<Vec<Vec<f64>>>>()?;
                    Ok(Matrix::new(rows)?)
                }
                _ => Ok(Matrix::column(&f64_values(&inner)?)?),
            }
        }
        other => bail!("Expected a numeric or list column, got {other:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use arrow::array::{Float64Builder, ListBuilder};
    use arrow::datatypes::{Field, Schema};
    use arrow::record_batch::RecordBatch;
    use parquet::arrow::ArrowWriter;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("kalman_plot_loader_{}_{name}", std::process::id()))
    }

    #[test]
    fn json_records_are_coerced() {
        let text = r#"[
            {"iter": 1, "date": "01-Jan-15", "Xmodel": [[1.0],[0.5]], "Xk": [0.9, 0.4], "Zk": 1.2, "close": "58.13"},
            {"iter": 2, "date": "02-Jan-15", "Xmodel": [[1.5],[0.5]], "Xk": [1.4, 0.5], "Zk": 1.3, "close": 59}
        ]"#;
        let ds = parse_json(text).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.points[0].iter, 1.0);
        assert_eq!(ds.points[0].date, NaiveDate::from_ymd_opt(2015, 1, 1));
        assert_eq!(ds.points[0].close, Some(58.13));
        assert_eq!(ds.points[1].close, Some(59.0));
        assert_eq!(ds.points[1].xk.top_left(), 1.4);
        assert_eq!(ds.points[1].zk.top_left(), 1.3);
    }

    #[test]
    fn json_missing_iter_defaults_to_row_index() {
        let text = r#"[
            {"Xmodel": 1, "Xk": 1, "Zk": 1},
            {"Xmodel": 2, "Xk": 2, "Zk": 2, "close": "n/a", "date": "garbage"}
        ]"#;
        let ds = parse_json(text).unwrap();
        assert_eq!(ds.points[0].iter, 0.0);
        assert_eq!(ds.points[1].iter, 1.0);
        assert_eq!(ds.points[1].close, None);
        assert_eq!(ds.points[1].date, None);
        assert!(!ds.has_dates());
    }

    #[test]
    fn json_errors_name_the_row() {
        let text = r#"[{"Xmodel": 1, "Xk": 1, "Zk": 1}, {"Xmodel": 1, "Xk": 1}]"#;
        let err = parse_json(text).unwrap_err();
        assert!(format!("{err:#}").contains("Row 1"), "{err:#}");

        assert!(parse_json(r#"{"Xmodel": 1}"#).is_err());
    }

    #[test]
    fn csv_parses_matrix_cells() {
        let data = "\
iter,date,Xmodel,Xk,Zk,close
0,05-Mar-15,1.0;0.5,0.9;0.4,1.1,10.5
1,06-Mar-15,\"1.5 0;0 1\",1.4;0.5,1.6,
";
        let ds = read_csv(csv::Reader::from_reader(data.as_bytes())).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.points[0].xmodel.shape(), (2, 1));
        assert_eq!(ds.points[1].xmodel.shape(), (2, 2));
        assert_eq!(ds.points[1].xmodel.top_left(), 1.5);
        assert_eq!(ds.points[0].close, Some(10.5));
        assert_eq!(ds.points[1].close, None);
        assert_eq!(ds.points[1].date, NaiveDate::from_ymd_opt(2015, 3, 6));
    }

    #[test]
    fn csv_blank_iter_defaults_to_row_index() {
        let data = "iter,Xmodel,Xk,Zk\n,2,2,2\n7,3,3,3\n  ,4,4,4\n";
        let ds = read_csv(csv::Reader::from_reader(data.as_bytes())).unwrap();
        let iters: Vec<f64> = ds.points.iter().map(|p| p.iter).collect();
        assert_eq!(iters, vec![0.0, 7.0, 2.0]);

        let bad = "iter,Xmodel,Xk,Zk\nfirst,2,2,2\n";
        let err = read_csv(csv::Reader::from_reader(bad.as_bytes())).unwrap_err();
        assert!(err.to_string().contains("'iter' is not a number"), "{err}");
    }

    #[test]
    fn csv_requires_matrix_columns() {
        let data = "iter,Xmodel,Xk\n0,1,1\n";
        let err = read_csv(csv::Reader::from_reader(data.as_bytes())).unwrap_err();
        assert!(err.to_string().contains("Zk"), "{err}");
    }

    #[test]
    fn csv_rejects_ragged_matrix() {
        let data = "Xmodel,Xk,Zk\n\"1 2;3\",1,1\n";
        assert!(read_csv(csv::Reader::from_reader(data.as_bytes())).is_err());
    }

    #[test]
    fn parse_date_accepts_both_layouts() {
        assert_eq!(parse_date("24-Apr-12"), NaiveDate::from_ymd_opt(2012, 4, 24));
        assert_eq!(parse_date("2012-04-24"), NaiveDate::from_ymd_opt(2012, 4, 24));
        assert_eq!(parse_date("April"), None);
    }

    #[test]
    fn unsupported_extension_is_an_error() {
        let err = load_file(Path::new("data.xlsx")).unwrap_err();
        assert!(format!("{err:#}").contains("Unsupported file extension"));
    }

    #[test]
    fn parquet_nested_lists_round_trip() {
        let list_field = Arc::new(Field::new("item", DataType::Float64, true));
        let nested_field = Arc::new(Field::new(
            "item",
            DataType::List(list_field.clone()),
            true,
        ));

        let mut xmodel = ListBuilder::new(ListBuilder::new(Float64Builder::new()));
        for v in [1.0, 2.0] {
            xmodel.values().values().append_value(v);
            xmodel.values().append(true);
            xmodel.values().values().append_value(0.5);
            xmodel.values().append(true);
            xmodel.append(true);
        }
        let mut xk = ListBuilder::new(Float64Builder::new());
        for v in [0.8, 2.2] {
            xk.values().append_value(v);
            xk.values().append_value(0.4);
            xk.append(true);
        }

        let schema = Arc::new(Schema::new(vec![
            Field::new("iter", DataType::Int64, false),
            Field::new("Xmodel", DataType::List(nested_field), false),
            Field::new("Xk", DataType::List(list_field), false),
            Field::new("Zk", DataType::Float64, false),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(Int64Array::from(vec![10, 11])),
                Arc::new(xmodel.finish()),
                Arc::new(xk.finish()),
                Arc::new(Float64Array::from(vec![1.1, 1.9])),
            ],
        )
        .unwrap();

        let path = temp_path("nested.parquet");
        let file = std::fs::File::create(&path).unwrap();
        let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let ds = load_file(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(ds.len(), 2);
        assert_eq!(ds.points[1].iter, 11.0);
        assert_eq!(ds.points[1].xmodel.shape(), (2, 1));
        assert_eq!(ds.points[1].xmodel.top_left(), 2.0);
        assert_eq!(ds.points[0].xk.shape(), (2, 1));
        assert_eq!(ds.points[0].xk.top_left(), 0.8);
        assert_eq!(ds.points[1].zk.top_left(), 1.9);
        assert_eq!(ds.points[0].date, None);
    }
}
