//! Structural profile of a tabular data file, handed to the data-analysis
//! subagent so it can write a script without reading the data itself.
//!
//! Column types are reported with pandas dtype names (`int64`, `float64`,
//! `bool`, `datetime64[ns]`, `object`) because the scripts the subagent writes
//! load the file with pandas.

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use serde::ser::{SerializeMap, Serializer};
use serde_json::Value;
use std::path::Path;

const SAMPLE_ROWS: usize = 3;
const DATETIME_OUTPUT: &str = "%Y-%m-%d %H:%M:%S";

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
];
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d.%m.%Y"];

static NULL: Cell = Cell::Null;

#[derive(Debug, Clone, PartialEq)]
enum Cell {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dtype {
    Int64,
    Float64,
    Bool,
    Datetime,
    Object,
}

impl Dtype {
    pub fn as_str(self) -> &'static str {
        match self {
            Dtype::Int64 => "int64",
            Dtype::Float64 => "float64",
            Dtype::Bool => "bool",
            Dtype::Datetime => "datetime64[ns]",
            Dtype::Object => "object",
        }
    }
}

/// Columns and rows as loaded from disk, before typing.
#[derive(Debug, Default)]
struct Frame {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Frame {
    fn column(&self, idx: usize) -> impl Iterator<Item = &Cell> {
        self.rows.iter().map(move |row| row.get(idx).unwrap_or(&NULL))
    }

    fn dtype(&self, idx: usize) -> Dtype {
        let mut has_null = false;
        let (mut ints, mut floats, mut bools, mut strs) = (0usize, 0usize, 0usize, 0usize);
        for cell in self.column(idx) {
            match cell {
                Cell::Null => has_null = true,
                Cell::Int(_) => ints += 1,
                Cell::Float(_) => floats += 1,
                Cell::Bool(_) => bools += 1,
                Cell::Str(_) => strs += 1,
            }
        }
        let values = ints + floats + bools + strs;

        if values == 0 {
            return if self.rows.is_empty() { Dtype::Object } else { Dtype::Float64 };
        }
        if ints == values {
            return if has_null { Dtype::Float64 } else { Dtype::Int64 };
        }
        if ints + floats == values {
            return Dtype::Float64;
        }
        if bools == values && !has_null {
            return Dtype::Bool;
        }
        if strs == values
            && self.column(idx).all(|c| match c {
                Cell::Str(s) => parse_datetime(s).is_some(),
                _ => true,
            })
        {
            return Dtype::Datetime;
        }
        Dtype::Object
    }
}

fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|f| NaiveDate::parse_from_str(s, f).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

fn parse_field(raw: &str) -> Cell {
    if raw.is_empty() {
        return Cell::Null;
    }
    if let Ok(i) = raw.parse::<i64>() {
        return Cell::Int(i);
    }
    if let Ok(f) = raw.parse::<f64>() {
        return Cell::Float(f);
    }
    match raw {
        "True" | "true" | "TRUE" => Cell::Bool(true),
        "False" | "false" | "FALSE" => Cell::Bool(false),
        _ => Cell::Str(raw.to_string()),
    }
}

fn from_json_value(value: &Value) -> Cell {
    match value {
        Value::Null => Cell::Null,
        Value::Bool(b) => Cell::Bool(*b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => Cell::Int(i),
            None => n.as_f64().map(Cell::Float).unwrap_or(Cell::Null),
        },
        Value::String(s) => Cell::Str(s.clone()),
        other => Cell::Str(other.to_string()),
    }
}

fn read_csv(path: &Path) -> Result<Frame, String> {
    let mut reader = csv::Reader::from_path(path).map_err(|e| e.to_string())?;
    let columns = reader
        .headers()
        .map_err(|e| e.to_string())?
        .iter()
        .map(str::to_string)
        .collect();
    let rows = reader
        .records()
        .map(|rec| {
            rec.map(|r| r.iter().map(parse_field).collect())
                .map_err(|e| e.to_string())
        })
        .collect::<Result<Vec<Vec<Cell>>, String>>()?;
    Ok(Frame { columns, rows })
}

/// Accepts a list of records, or an object of columns where each column is
/// either a list or an `{index: value}` object.
fn read_json(path: &Path) -> Result<Frame, String> {
    let text = std::fs::read_to_string(path).map_err(|e| e.to_string())?;
    let value: Value = serde_json::from_str(&text).map_err(|e| e.to_string())?;

    match value {
        Value::Array(records) => {
            let mut frame = Frame::default();
            for record in &records {
                let Value::Object(map) = record else {
                    return Err("JSON records must be objects".into());
                };
                for key in map.keys() {
                    if !frame.columns.contains(key) {
                        frame.columns.push(key.clone());
                    }
                }
            }
            frame.rows = records
                .iter()
                .map(|r| {
                    frame
                        .columns
                        .iter()
                        .map(|c| r.get(c).map(from_json_value).unwrap_or(Cell::Null))
                        .collect()
                })
                .collect();
            Ok(frame)
        }
        Value::Object(columns) => {
            let mut names = Vec::with_capacity(columns.len());
            let mut data: Vec<Vec<Cell>> = Vec::with_capacity(columns.len());
            for (name, col) in &columns {
                let cells = match col {
                    Value::Array(items) => items.iter().map(from_json_value).collect(),
                    Value::Object(by_index) => {
                        // keys are row labels ("0", "1", ... "10"); order them numerically
                        let mut entries: Vec<_> = by_index.iter().collect();
                        entries.sort_by_key(|(k, _)| k.parse::<u64>().unwrap_or(u64::MAX));
                        entries.into_iter().map(|(_, v)| from_json_value(v)).collect()
                    }
                    scalar => vec![from_json_value(scalar)],
                };
                names.push(name.clone());
                data.push(cells);
            }
            let height = data.iter().map(Vec::len).max().unwrap_or(0);
            let rows = (0..height)
                .map(|i| {
                    data.iter()
                        .map(|col| col.get(i).cloned().unwrap_or(Cell::Null))
                        .collect()
                })
                .collect();
            Ok(Frame {
                columns: names,
                rows,
            })
        }
        _ => Err("JSON data must be an array of records or an object of columns".into()),
    }
}

/// Serializes a slice of pairs as a JSON object, keeping the order.
struct Ordered<'a, V>(&'a [(String, V)]);

impl<V: Serialize> Serialize for Ordered<'_, V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (k, v) in self.0 {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

#[derive(Serialize)]
struct Shape {
    rows: usize,
    columns: usize,
}

#[derive(Serialize)]
struct Profile<'a> {
    file_path: &'a str,
    shape: Shape,
    columns: Ordered<'a, &'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sample: Option<Vec<Ordered<'a, Value>>>,
}

fn render_cell(cell: &Cell, dtype: Dtype) -> Value {
    match (cell, dtype) {
        (Cell::Null, _) => Value::Null,
        (Cell::Int(i), Dtype::Float64) => serde_json::json!(*i as f64),
        (Cell::Int(i), _) => serde_json::json!(i),
        (Cell::Float(f), _) => serde_json::Number::from_f64(*f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        (Cell::Bool(b), Dtype::Object) => Value::String(if *b { "True" } else { "False" }.into()),
        (Cell::Bool(b), _) => Value::Bool(*b),
        (Cell::Str(s), Dtype::Datetime) => match parse_datetime(s) {
            Some(dt) => Value::String(dt.format(DATETIME_OUTPUT).to_string()),
            None => Value::String(s.clone()),
        },
        (Cell::Str(s), _) => Value::String(s.clone()),
    }
}

fn error_json(message: &str) -> String {
    let quoted = serde_json::to_string(message).unwrap_or_else(|_| "\"\"".into());
    format!("{{\"error\": {quoted}}}")
}

/// Profile `file_path` as pretty-printed JSON: shape, column dtypes and, unless
/// `privacy_mode` is set, the first three rows. Failures are reported as
/// `{"error": ...}` rather than returned.
pub fn analyze_dataframe(file_path: &str, privacy_mode: bool) -> String {
    let path = Path::new(file_path);
    let frame = if file_path.ends_with(".csv") {
        read_csv(path)
    } else if file_path.ends_with(".json") {
        read_json(path)
    } else {
        return error_json(&format!("Unsupported file type: {file_path}"));
    };
    let frame = match frame {
        Ok(frame) => frame,
        Err(e) => return error_json(&e),
    };

    let dtypes: Vec<Dtype> = (0..frame.columns.len()).map(|i| frame.dtype(i)).collect();
    let columns: Vec<(String, &'static str)> = frame
        .columns
        .iter()
        .zip(&dtypes)
        .map(|(name, d)| (name.clone(), d.as_str()))
        .collect();

    let records: Vec<Vec<(String, Value)>> = if privacy_mode {
        Vec::new()
    } else {
        frame
            .rows
            .iter()
            .take(SAMPLE_ROWS)
            .map(|row| {
                frame
                    .columns
                    .iter()
                    .enumerate()
                    .map(|(i, name)| {
                        let cell = row.get(i).unwrap_or(&NULL);
                        (name.clone(), render_cell(cell, dtypes[i]))
                    })
                    .collect()
            })
            .collect()
    };

    let profile = Profile {
        file_path,
        shape: Shape {
            rows: frame.rows.len(),
            columns: frame.columns.len(),
        },
        columns: Ordered(&columns),
        sample: (!privacy_mode).then(|| records.iter().map(|r| Ordered(r.as_slice())).collect()),
    };

    serde_json::to_string_pretty(&profile).unwrap_or_else(|e| error_json(&e.to_string()))
}
