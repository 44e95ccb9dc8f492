use crate::domain::model::SensorRecord;
use crate::utils::error::{Result, SensorMatchError};
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::path::Path;

pub const REQUIRED_COLUMNS: [&str; 3] = ["id", "latitude", "longitude"];

/// Cell texts read as a missing value rather than a parse failure.
const NA_VALUES: [&str; 8] = ["", "NA", "N/A", "n/a", "NaN", "nan", "null", "NULL"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Csv,
    Json,
}

impl InputFormat {
    pub fn from_path(path: &str) -> Result<Self> {
        let extension = Path::new(path)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "csv" => Ok(InputFormat::Csv),
            "json" => Ok(InputFormat::Json),
            _ => Err(SensorMatchError::UnsupportedFormat {
                input: path.to_string(),
                extension,
            }),
        }
    }
}

/// Decodes one input file into sensor records, preserving row order.
/// `input` names the file in diagnostics.
pub fn decode(input: &str, format: InputFormat, bytes: &[u8]) -> Result<Vec<SensorRecord>> {
    if bytes.iter().all(|b| b.is_ascii_whitespace()) {
        return Err(SensorMatchError::EmptyInput {
            input: input.to_string(),
        });
    }

    let records = match format {
        InputFormat::Csv => decode_csv(input, bytes)?,
        InputFormat::Json => decode_json(input, bytes)?,
    };

    if records.is_empty() {
        return Err(SensorMatchError::EmptyInput {
            input: input.to_string(),
        });
    }

    tracing::debug!("Decoded {} records from {}", records.len(), input);
    Ok(records)
}

fn decode_csv(input: &str, bytes: &[u8]) -> Result<Vec<SensorRecord>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(bytes);

    let headers = rdr.headers().map_err(|e| parse_error(input, e))?.clone();
    let mut positions = [0usize; 3];
    for (slot, column) in positions.iter_mut().zip(REQUIRED_COLUMNS) {
        *slot = headers
            .iter()
            .position(|h| h == column)
            .ok_or_else(|| missing_column(input, column))?;
    }
    let [id_pos, lat_pos, lon_pos] = positions;

    let mut records = Vec::new();
    for (index, row) in rdr.records().enumerate() {
        let row = row.map_err(|e| parse_error(input, e))?;
        let cell = |pos: usize| row.get(pos).unwrap_or("");

        records.push(SensorRecord {
            id: parse_id_text(cell(id_pos)).map_err(|m| cell_error(input, index, "id", m))?,
            latitude: parse_coord_text(cell(lat_pos))
                .map_err(|m| cell_error(input, index, "latitude", m))?,
            longitude: parse_coord_text(cell(lon_pos))
                .map_err(|m| cell_error(input, index, "longitude", m))?,
        });
    }

    Ok(records)
}

/// Accepts an array of record objects or a column-oriented object whose
/// columns are index-keyed objects or arrays.
fn decode_json(input: &str, bytes: &[u8]) -> Result<Vec<SensorRecord>> {
    let value: Value = serde_json::from_slice(bytes).map_err(|e| parse_error(input, e))?;

    match value {
        Value::Array(items) => decode_json_records(input, items),
        Value::Object(columns) => decode_json_columns(input, columns),
        other => Err(parse_error(
            input,
            format!("expected an array or object at top level, found {}", type_name(&other)),
        )),
    }
}

fn decode_json_records(input: &str, items: Vec<Value>) -> Result<Vec<SensorRecord>> {
    let mut objects = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        match item {
            Value::Object(obj) => objects.push(obj),
            other => {
                return Err(parse_error(
                    input,
                    format!("record {} is {}, expected an object", index, type_name(&other)),
                ))
            }
        }
    }

    for column in REQUIRED_COLUMNS {
        if !objects.is_empty() && !objects.iter().any(|obj| obj.contains_key(column)) {
            return Err(missing_column(input, column));
        }
    }

    objects
        .iter()
        .enumerate()
        .map(|(index, obj)| -> Result<SensorRecord> {
            Ok(SensorRecord {
                id: json_id(obj.get("id")).map_err(|m| cell_error(input, index, "id", m))?,
                latitude: json_coord(obj.get("latitude"))
                    .map_err(|m| cell_error(input, index, "latitude", m))?,
                longitude: json_coord(obj.get("longitude"))
                    .map_err(|m| cell_error(input, index, "longitude", m))?,
            })
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum RowKey {
    Position(u64),
    Label(String),
}

impl RowKey {
    fn parse(key: &str) -> Self {
        match key.parse::<u64>() {
            Ok(pos) if pos.to_string() == key => RowKey::Position(pos),
            _ => RowKey::Label(key.to_string()),
        }
    }

    fn lookup<'a>(&self, column: &'a Value) -> Option<&'a Value> {
        match (self, column) {
            (RowKey::Position(pos), Value::Array(values)) => values.get(*pos as usize),
            (RowKey::Position(pos), Value::Object(map)) => map.get(&pos.to_string()),
            (RowKey::Label(label), Value::Object(map)) => map.get(label),
            _ => None,
        }
    }
}

fn decode_json_columns(input: &str, columns: Map<String, Value>) -> Result<Vec<SensorRecord>> {
    let mut required = Vec::with_capacity(REQUIRED_COLUMNS.len());
    for column in REQUIRED_COLUMNS {
        let values = columns
            .get(column)
            .ok_or_else(|| missing_column(input, column))?;
        required.push(values);
    }

    let mut rows = BTreeSet::new();
    for (column, values) in REQUIRED_COLUMNS.iter().zip(&required) {
        match values {
            Value::Array(items) => rows.extend((0..items.len() as u64).map(RowKey::Position)),
            Value::Object(map) => rows.extend(map.keys().map(|k| RowKey::parse(k))),
            other => {
                return Err(parse_error(
                    input,
                    format!("column '{}' is {}, expected an object or array", column, type_name(other)),
                ))
            }
        }
    }

    rows.iter()
        .enumerate()
        .map(|(index, row)| -> Result<SensorRecord> {
            Ok(SensorRecord {
                id: json_id(row.lookup(required[0]))
                    .map_err(|m| cell_error(input, index, "id", m))?,
                latitude: json_coord(row.lookup(required[1]))
                    .map_err(|m| cell_error(input, index, "latitude", m))?,
                longitude: json_coord(row.lookup(required[2]))
                    .map_err(|m| cell_error(input, index, "longitude", m))?,
            })
        })
        .collect()
}

fn parse_id_text(text: &str) -> std::result::Result<Option<i64>, String> {
    let text = text.trim();
    if NA_VALUES.contains(&text) {
        return Ok(None);
    }
    if let Ok(id) = text.parse::<i64>() {
        return Ok(Some(id));
    }
    match text.parse::<f64>() {
        Ok(f) => integral(f).map(Some),
        Err(_) => Err(format!("'{}' is not an integer", text)),
    }
}

fn parse_coord_text(text: &str) -> std::result::Result<Option<f64>, String> {
    let text = text.trim();
    if NA_VALUES.contains(&text) {
        return Ok(None);
    }
    match text.parse::<f64>() {
        Ok(f) if f.is_finite() => Ok(Some(f)),
        _ => Err(format!("'{}' is not a number", text)),
    }
}

fn integral(f: f64) -> std::result::Result<i64, String> {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
        Ok(f as i64)
    } else {
        Err(format!("{} is not an integer", f))
    }
}

fn json_id(value: Option<&Value>) -> std::result::Result<Option<i64>, String> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => match n.as_i64() {
            Some(id) => Ok(Some(id)),
            None => integral(n.as_f64().unwrap_or(f64::NAN)).map(Some),
        },
        Some(Value::String(s)) => parse_id_text(s),
        Some(other) => Err(format!("{} is not an integer", type_name(other))),
    }
}

fn json_coord(value: Option<&Value>) -> std::result::Result<Option<f64>, String> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_f64()
            .map(Some)
            .ok_or_else(|| format!("{} is not a number", n)),
        Some(Value::String(s)) => parse_coord_text(s),
        Some(other) => Err(format!("{} is not a number", type_name(other))),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn parse_error(input: &str, e: impl std::fmt::Display) -> SensorMatchError {
    SensorMatchError::InputParseError {
        input: input.to_string(),
        message: e.to_string(),
    }
}

fn cell_error(input: &str, index: usize, field: &str, message: String) -> SensorMatchError {
    parse_error(input, format!("record {}: {}: {}", index, field, message))
}

fn missing_column(input: &str, column: &str) -> SensorMatchError {
    SensorMatchError::MissingColumn {
        input: input.to_string(),
        column: column.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(InputFormat::from_path("SensorData1.csv").unwrap(), InputFormat::Csv);
        assert_eq!(InputFormat::from_path("dir/SensorData2.JSON").unwrap(), InputFormat::Json);
        assert!(matches!(
            InputFormat::from_path("SensorData.xlsx"),
            Err(SensorMatchError::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn test_csv_any_column_order_and_extra_columns() {
        let csv = "longitude,name,id,latitude\n13.4050,berlin,1,52.5200\n2.3522,paris,2,48.8566\n";
        let records = decode("a.csv", InputFormat::Csv, csv.as_bytes()).unwrap();
        assert_eq!(
            records,
            vec![
                SensorRecord::new(1, 52.52, 13.405),
                SensorRecord::new(2, 48.8566, 2.3522),
            ]
        );
    }

    #[test]
    fn test_csv_empty_cell_is_missing_field() {
        let csv = "id,latitude,longitude\n1,,0.5\nNaN,1.0,2.0\n";
        let records = decode("a.csv", InputFormat::Csv, csv.as_bytes()).unwrap();
        assert_eq!(records[0].latitude, None);
        assert_eq!(records[0].longitude, Some(0.5));
        assert_eq!(records[1].id, None);
    }

    #[test]
    fn test_csv_short_row_is_missing_field() {
        let csv = "id,latitude,longitude\n1,0.0\n2,0.0,0.0\n";
        let records = decode("a.csv", InputFormat::Csv, csv.as_bytes()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].latitude, Some(0.0));
        assert_eq!(records[0].longitude, None);
        assert_eq!(records[1], SensorRecord::new(2, 0.0, 0.0));
    }

    #[test]
    fn test_csv_missing_column_is_fatal() {
        let csv = "id,latitude\n1,0.0\n";
        let err = decode("SensorData1.csv", InputFormat::Csv, csv.as_bytes()).unwrap_err();
        match err {
            SensorMatchError::MissingColumn { input, column } => {
                assert_eq!(input, "SensorData1.csv");
                assert_eq!(column, "longitude");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_csv_header_only_is_empty() {
        let err = decode("a.csv", InputFormat::Csv, b"id,latitude,longitude\n").unwrap_err();
        assert!(matches!(err, SensorMatchError::EmptyInput { .. }));

        let err = decode("a.csv", InputFormat::Csv, b"  \n").unwrap_err();
        assert!(matches!(err, SensorMatchError::EmptyInput { .. }));
    }

    #[test]
    fn test_csv_bad_number_is_parse_error() {
        let csv = "id,latitude,longitude\n1,north,0.0\n";
        let err = decode("a.csv", InputFormat::Csv, csv.as_bytes()).unwrap_err();
        match err {
            SensorMatchError::InputParseError { message, .. } => {
                assert!(message.contains("latitude"));
                assert!(message.contains("north"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_csv_integral_float_id() {
        let csv = "id,latitude,longitude\n7.0,1.0,2.0\n";
        let records = decode("a.csv", InputFormat::Csv, csv.as_bytes()).unwrap();
        assert_eq!(records[0].id, Some(7));

        let csv = "id,latitude,longitude\n7.5,1.0,2.0\n";
        assert!(decode("a.csv", InputFormat::Csv, csv.as_bytes()).is_err());
    }

    #[test]
    fn test_json_record_array() {
        let json = r#"[
            {"id": 10, "latitude": 0.0, "longitude": 0.0},
            {"id": "11", "latitude": 0.0009, "longitude": null}
        ]"#;
        let records = decode("b.json", InputFormat::Json, json.as_bytes()).unwrap();
        assert_eq!(records[0], SensorRecord::new(10, 0.0, 0.0));
        assert_eq!(records[1].id, Some(11));
        assert_eq!(records[1].longitude, None);
    }

    #[test]
    fn test_json_record_array_missing_column() {
        let json = r#"[{"id": 10, "lat": 0.0, "longitude": 0.0}]"#;
        let err = decode("b.json", InputFormat::Json, json.as_bytes()).unwrap_err();
        assert!(matches!(err, SensorMatchError::MissingColumn { ref column, .. } if column == "latitude"));
    }

    #[test]
    fn test_json_columns_ordered_by_numeric_index() {
        let json = r#"{
            "id": {"10": 3, "2": 2, "0": 1},
            "latitude": {"0": 1.0, "2": 2.0, "10": 3.0},
            "longitude": {"0": 4.0, "2": 5.0}
        }"#;
        let records = decode("b.json", InputFormat::Json, json.as_bytes()).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0], SensorRecord::new(1, 1.0, 4.0));
        assert_eq!(records[1], SensorRecord::new(2, 2.0, 5.0));
        assert_eq!(records[2].id, Some(3));
        assert_eq!(records[2].longitude, None);
    }

    #[test]
    fn test_json_columns_as_arrays() {
        let json = r#"{"id": [1, 2], "latitude": [0.5, 0.6], "longitude": [1.5, 1.6]}"#;
        let records = decode("b.json", InputFormat::Json, json.as_bytes()).unwrap();
        assert_eq!(
            records,
            vec![SensorRecord::new(1, 0.5, 1.5), SensorRecord::new(2, 0.6, 1.6)]
        );
    }

    #[test]
    fn test_json_malformed_and_empty() {
        let err = decode("b.json", InputFormat::Json, b"[{\"id\": 1,").unwrap_err();
        assert!(matches!(err, SensorMatchError::InputParseError { .. }));

        let err = decode("b.json", InputFormat::Json, b"[]").unwrap_err();
        assert!(matches!(err, SensorMatchError::EmptyInput { .. }));

        let err = decode("b.json", InputFormat::Json, b"42").unwrap_err();
        assert!(matches!(err, SensorMatchError::InputParseError { .. }));
    }
}
