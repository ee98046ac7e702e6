//! Source Dataset
//!
//! Loads the tabular record set produced by the extraction pipeline and
//! indexes it by stable record key. Supported layouts:
//!
//! - `.jsonl` / `.ndjson`: one JSON object per line
//! - `.json`: a JSON array of objects
//! - `.db` / `.sqlite` / `.sqlite3`: a SQLite table (default `questions`), read in `rowid` order
//! - `.parquet`: the extraction pipeline's own output, read row by row
//!   (requires the `parquet` feature)
//!
//! Column names are matched case-insensitively, so both `id`/`title` and the
//! extraction pipeline's `Id`/`Title` spellings load. Unknown columns are kept
//! in [`Record::extra`] and can be selected as text fields.

use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::DatasetOptions;
use crate::error::{Error, Result};
use crate::text;

// ============================================================================
// RECORD
// ============================================================================

/// Stable external key of a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub i64);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for RecordId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// One source question
///
/// Rows are read through [`Record::from_row`], which tolerates the loose
/// typing of the extraction output; serialization is for result output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    /// Stable external key
    pub id: RecordId,
    /// Question title (raw)
    pub title: String,
    /// Question body (raw, may contain markup)
    pub body: String,
    /// Vote score
    pub score: i64,
    /// Tag string, e.g. `<python><recursion>`
    pub tags: String,
    /// Any other columns
    #[serde(flatten, skip_serializing_if = "Map::is_empty")]
    pub extra: Map<String, Value>,
}

impl Record {
    /// Create a record with empty tags and zero score
    pub fn new(id: i64, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            id: RecordId(id),
            title: title.into(),
            body: body.into(),
            score: 0,
            tags: String::new(),
            extra: Map::new(),
        }
    }

    /// Build a record from a loosely typed row
    pub fn from_row(row: Map<String, Value>) -> std::result::Result<Self, String> {
        let mut id = None;
        let mut record = Record::new(0, "", "");

        for (column, value) in row {
            match column.to_ascii_lowercase().as_str() {
                "id" => id = Some(parse_id(&value)?),
                "title" => record.title = raw_text(value),
                "body" => record.body = raw_text(value),
                "tags" => record.tags = raw_text(value),
                "score" => record.score = parse_score(&value)?,
                _ => {
                    record.extra.insert(column, value);
                }
            }
        }

        record.id = id.ok_or_else(|| "missing id column".to_string())?;
        Ok(record)
    }

    /// Normalized text of a named field, or `None` if the record has no such field
    pub fn field_text(&self, name: &str) -> Option<String> {
        match name.to_ascii_lowercase().as_str() {
            "id" => Some(self.id.to_string()),
            "title" => Some(text::normalize(&self.title)),
            "body" => Some(text::normalize(&self.body)),
            "tags" => Some(text::normalize(&self.tags)),
            "score" => Some(self.score.to_string()),
            _ => self
                .extra
                .iter()
                .find(|(column, _)| column.eq_ignore_ascii_case(name))
                .map(|(_, value)| text::normalize_value(value)),
        }
    }
}

fn raw_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn parse_id(value: &Value) -> std::result::Result<RecordId, String> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .map(RecordId)
            .ok_or_else(|| format!("id {} is not an integer", n)),
        Value::String(s) => s
            .trim()
            .parse()
            .map(RecordId)
            .map_err(|_| format!("id {:?} is not an integer", s)),
        other => Err(format!("id has unsupported type: {}", other)),
    }
}

fn parse_score(value: &Value) -> std::result::Result<i64, String> {
    match value {
        Value::Null => Ok(0),
        Value::Number(n) => match (n.as_i64(), n.as_f64()) {
            (Some(score), _) => Ok(score),
            // Whole floats come from nullable integer columns
            (None, Some(f)) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Ok(f as i64),
            (None, Some(f)) if f.is_finite() && f.fract() != 0.0 => {
                Err(format!("score {} is not an integer", n))
            }
            _ => Err(format!("score {} out of range", n)),
        },
        Value::String(s) if s.trim().is_empty() => Ok(0),
        Value::String(s) => s
            .trim()
            .parse()
            .map_err(|_| format!("score {:?} is not an integer", s)),
        other => Err(format!("score has unsupported type: {}", other)),
    }
}

// ============================================================================
// DATASET
// ============================================================================

/// On-disk layout of a dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetFormat {
    /// One JSON object per line
    JsonLines,
    /// JSON array of objects
    Json,
    /// SQLite database
    Sqlite,
    /// Apache Parquet file
    Parquet,
}

impl DatasetFormat {
    /// Infer the layout from a file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "jsonl" | "ndjson" => Some(Self::JsonLines),
            "json" => Some(Self::Json),
            "db" | "sqlite" | "sqlite3" => Some(Self::Sqlite),
            "parquet" | "pq" => Some(Self::Parquet),
            _ => None,
        }
    }
}

/// Ordered record set keyed by [`RecordId`]
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    records: Vec<Record>,
    by_id: HashMap<RecordId, usize>,
}

impl Dataset {
    /// Wrap records, rejecting duplicate keys. File order is preserved.
    pub fn from_records(records: Vec<Record>) -> Result<Self> {
        let mut by_id = HashMap::with_capacity(records.len());
        for (position, record) in records.iter().enumerate() {
            if by_id.insert(record.id, position).is_some() {
                return Err(Error::InvalidDataset(format!(
                    "duplicate record id {}",
                    record.id
                )));
            }
        }
        Ok(Self { records, by_id })
    }

    /// Load a dataset with default options
    pub fn load(path: &Path) -> Result<Self> {
        Self::load_with(path, &DatasetOptions::default())
    }

    /// Load a dataset, choosing the reader from the file extension
    pub fn load_with(path: &Path, options: &DatasetOptions) -> Result<Self> {
        if !path.exists() {
            return Err(Error::InputMissing(path.to_path_buf()));
        }
        let format = DatasetFormat::from_path(path).ok_or_else(|| {
            Error::InvalidInput(format!(
                "unsupported dataset extension: {} (expected .jsonl, .json, .parquet, .db or .sqlite)",
                path.display()
            ))
        })?;

        let records = match format {
            DatasetFormat::JsonLines => read_json_lines(path)?,
            DatasetFormat::Json => read_json_array(path)?,
            DatasetFormat::Sqlite => read_sqlite(path, &options.table)?,
            DatasetFormat::Parquet => read_parquet(path)?,
        };

        tracing::info!(
            path = %path.display(),
            records = records.len(),
            "Loaded dataset"
        );
        Self::from_records(records)
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the dataset is empty
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in file order
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Look up a record by stable key
    pub fn get(&self, id: RecordId) -> Option<&Record> {
        self.by_id.get(&id).map(|&position| &self.records[position])
    }

    /// Check if a key is present
    pub fn contains(&self, id: RecordId) -> bool {
        self.by_id.contains_key(&id)
    }
}

fn read_json_lines(path: &Path) -> Result<Vec<Record>> {
    let reader = BufReader::new(File::open(path).map_err(|e| Error::from_io_at(e, path))?);
    let mut records = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let row: Map<String, Value> = serde_json::from_str(&line).map_err(|e| {
            Error::InvalidDataset(format!("{}:{}: {}", path.display(), index + 1, e))
        })?;
        let record = Record::from_row(row).map_err(|e| {
            Error::InvalidDataset(format!("{}:{}: {}", path.display(), index + 1, e))
        })?;
        records.push(record);
    }

    Ok(records)
}

fn read_json_array(path: &Path) -> Result<Vec<Record>> {
    let reader = BufReader::new(File::open(path).map_err(|e| Error::from_io_at(e, path))?);
    let rows: Vec<Map<String, Value>> = serde_json::from_reader(reader)
        .map_err(|e| Error::InvalidDataset(format!("{}: {}", path.display(), e)))?;

    rows.into_iter()
        .enumerate()
        .map(|(index, row)| {
            Record::from_row(row).map_err(|e| {
                Error::InvalidDataset(format!("{}[{}]: {}", path.display(), index, e))
            })
        })
        .collect()
}

fn read_sqlite(path: &Path, table: &str) -> Result<Vec<Record>> {
    let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)?;
    let sql = format!(
        "SELECT * FROM \"{}\" ORDER BY rowid",
        table.replace('"', "\"\"")
    );
    let mut stmt = conn.prepare(&sql)?;
    let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

    let mut rows = stmt.query([])?;
    let mut records = Vec::new();
    let mut row_number = 0usize;

    while let Some(row) = rows.next()? {
        row_number += 1;
        let mut map = Map::with_capacity(columns.len());
        for (i, column) in columns.iter().enumerate() {
            let value = match row.get_ref(i)? {
                ValueRef::Null => Value::Null,
                ValueRef::Integer(n) => Value::from(n),
                ValueRef::Real(f) => Value::from(f),
                ValueRef::Text(t) => Value::String(String::from_utf8_lossy(t).into_owned()),
                ValueRef::Blob(_) => {
                    return Err(Error::InvalidDataset(format!(
                        "{} row {}: column {} holds a BLOB",
                        table, row_number, column
                    )));
                }
            };
            map.insert(column.clone(), value);
        }
        let record = Record::from_row(map).map_err(|e| {
            Error::InvalidDataset(format!("{} row {}: {}", table, row_number, e))
        })?;
        records.push(record);
    }

    Ok(records)
}

#[cfg(feature = "parquet")]
fn read_parquet(path: &Path) -> Result<Vec<Record>> {
    use parquet::file::reader::{FileReader, SerializedFileReader};

    let invalid = |e: parquet::errors::ParquetError| {
        Error::InvalidDataset(format!("{}: {}", path.display(), e))
    };

    let file = File::open(path).map_err(|e| Error::from_io_at(e, path))?;
    let reader = SerializedFileReader::new(file).map_err(invalid)?;
    let mut records = Vec::new();

    for (index, row) in reader.get_row_iter(None).map_err(invalid)?.enumerate() {
        let row = row.map_err(invalid)?;
        let mut map = Map::new();
        for (column, field) in row.get_column_iter() {
            let value = parquet_value(field).map_err(|e| {
                Error::InvalidDataset(format!(
                    "{} row {}: column {}: {}",
                    path.display(),
                    index + 1,
                    column,
                    e
                ))
            })?;
            map.insert(column.clone(), value);
        }
        let record = Record::from_row(map).map_err(|e| {
            Error::InvalidDataset(format!("{} row {}: {}", path.display(), index + 1, e))
        })?;
        records.push(record);
    }

    Ok(records)
}

#[cfg(feature = "parquet")]
fn parquet_value(field: &parquet::record::Field) -> std::result::Result<Value, String> {
    use parquet::record::Field;

    Ok(match field {
        Field::Null => Value::Null,
        Field::Bool(b) => Value::Bool(*b),
        Field::Byte(n) => Value::from(*n),
        Field::Short(n) => Value::from(*n),
        Field::Int(n) => Value::from(*n),
        Field::Long(n) => Value::from(*n),
        Field::UByte(n) => Value::from(*n),
        Field::UShort(n) => Value::from(*n),
        Field::UInt(n) => Value::from(*n),
        Field::ULong(n) => Value::from(*n),
        Field::Float(f) => Value::from(f64::from(*f)),
        Field::Double(f) => Value::from(*f),
        Field::Str(s) => Value::String(s.clone()),
        Field::Bytes(bytes) => match std::str::from_utf8(bytes.data()) {
            Ok(s) => Value::String(s.to_string()),
            Err(_) => return Err("binary value is not UTF-8 text".to_string()),
        },
        other => Value::String(other.to_string()),
    })
}

#[cfg(not(feature = "parquet"))]
fn read_parquet(path: &Path) -> Result<Vec<Record>> {
    Err(Error::InvalidInput(format!(
        "{}: Parquet datasets need the `parquet` feature",
        path.display()
    )))
}

// ============================================================================
// TESTS
// ============================================================================
