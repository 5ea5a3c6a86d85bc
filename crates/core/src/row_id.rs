//! Row identity for grids and key extraction for addressing records.

use std::collections::HashSet;
use std::fmt;

use serde_json::Value;

use crate::error::CoreError;
use crate::types::Record;

/// Separator used when joining composite key values into a row id.
pub const COMPOSITE_SEPARATOR: &str = "_";

/// Prefix of the fallback id given to rows without a usable key.
pub const TEMP_ID_PREFIX: &str = "temp_";

/// The field(s) that identify a record of a resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrimaryKey {
    Single(String),
    /// Ordered list of fields; order determines both the row id and the
    /// URL path segments.
    Composite(Vec<String>),
}

impl PrimaryKey {
    pub fn single(field: impl Into<String>) -> Self {
        Self::Single(field.into())
    }

    pub fn composite<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Composite(fields.into_iter().map(Into::into).collect())
    }

    pub fn fields(&self) -> &[String] {
        match self {
            Self::Single(field) => std::slice::from_ref(field),
            Self::Composite(fields) => fields,
        }
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields().iter().any(|f| f == field)
    }

    /// Extract the key values from a row.
    ///
    /// Fails when any key field is missing, null, or blank.
    pub fn extract(&self, row: &Record) -> Result<RecordKey, CoreError> {
        self.fields()
            .iter()
            .map(|field| {
                row.get(field).and_then(key_segment).ok_or_else(|| {
                    CoreError::Validation(format!("Record is missing key field '{field}'"))
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(RecordKey)
    }

    /// Grid id for a row: the value itself, or `_`-joined values for
    /// composite keys. `None` when any part is missing.
    pub fn row_id(&self, row: &Record) -> Option<String> {
        self.extract(row).ok().map(|key| key.0.join(COMPOSITE_SEPARATOR))
    }
}

/// Stringify a key value. Blank strings and non-scalar values do not count.
fn key_segment(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Key values addressing one record, rendered as successive URL path
/// segments (`/ligands/4HHB/HEM`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordKey(Vec<String>);

impl RecordKey {
    pub fn single(value: impl Into<String>) -> Self {
        Self(vec![value.into()])
    }

    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("/"))
    }
}

/// A record paired with its grid id.
#[derive(Debug, Clone, PartialEq)]
pub struct GridRow {
    pub id: String,
    pub record: Record,
}

/// Assign every row a unique grid id.
///
/// Rows whose key is missing, or whose id collides with an earlier row,
/// fall back to `temp_<index>` and a warning is logged.
pub fn assign_row_ids(rows: Vec<Record>, key: &PrimaryKey) -> Vec<GridRow> {
    let mut seen = HashSet::with_capacity(rows.len());

    rows.into_iter()
        .enumerate()
        .map(|(index, record)| {
            let id = match key.row_id(&record) {
                Some(id) if seen.insert(id.clone()) => id,
                Some(id) => {
                    tracing::warn!(row_id = %id, index, "Duplicate row key, using temporary id");
                    temp_id(index)
                }
                None => {
                    tracing::warn!(key = ?key.fields(), index, "Row missing primary key, using temporary id");
                    temp_id(index)
                }
            };
            GridRow { id, record }
        })
        .collect()
}

fn temp_id(index: usize) -> String {
    format!("{TEMP_ID_PREFIX}{index}")
}
