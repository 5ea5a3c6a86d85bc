//! Field and column descriptors consumed by the generic views.
//!
//! A [`FieldKind`] is a closed set of variants so display, parsing and
//! empty-state construction are handled exhaustively per kind.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::entities::lenient_date;
use crate::error::CoreError;
use crate::types::Record;

/// Placeholder shown for absent values.
pub const EMPTY_DISPLAY: &str = "N/A";

// ---------------------------------------------------------------------------
// Custom renderer
// ---------------------------------------------------------------------------

type RenderFn = dyn Fn(&Value, &Record) -> String + Send + Sync;

/// A named display function for fields that need bespoke formatting
/// (links, composed values). Receives the cell value and the whole row.
#[derive(Clone)]
pub struct Renderer {
    name: &'static str,
    render: Arc<RenderFn>,
}

impl Renderer {
    pub fn new(
        name: &'static str,
        render: impl Fn(&Value, &Record) -> String + Send + Sync + 'static,
    ) -> Self {
        Self {
            name,
            render: Arc::new(render),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn render(&self, value: &Value, row: &Record) -> String {
        (self.render)(value, row)
    }
}

impl fmt::Debug for Renderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Renderer").field("name", &self.name).finish()
    }
}

// ---------------------------------------------------------------------------
// Field kind
// ---------------------------------------------------------------------------

/// The data type of a field, driving both display and input parsing.
#[derive(Debug, Clone)]
pub enum FieldKind {
    Text,
    Multiline,
    Number { integer: bool },
    Date,
    Select { options: Vec<String> },
    Boolean,
    Custom(Renderer),
}

impl FieldKind {
    pub fn integer() -> Self {
        Self::Number { integer: true }
    }

    pub fn decimal() -> Self {
        Self::Number { integer: false }
    }

    pub fn select<I, S>(options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Select {
            options: options.into_iter().map(Into::into).collect(),
        }
    }

    /// Format a value for read-only display.
    pub fn display(&self, value: &Value, row: &Record) -> String {
        match self {
            Self::Custom(renderer) => renderer.render(value, row),
            _ if value.is_null() => EMPTY_DISPLAY.to_string(),
            Self::Text | Self::Multiline | Self::Select { .. } => value_to_plain(value),
            Self::Number { integer } => match value {
                Value::Number(n) if *integer => n
                    .as_i64()
                    .map(|i| i.to_string())
                    .unwrap_or_else(|| n.to_string()),
                Value::Number(n) => n.to_string(),
                other => value_to_plain(other),
            },
            Self::Date => match value {
                Value::String(s) => lenient_date::parse(s)
                    .map(|d| d.format("%Y-%m-%d").to_string())
                    .unwrap_or_else(|| s.clone()),
                other => value_to_plain(other),
            },
            Self::Boolean => match value {
                Value::Bool(true) => "Yes".to_string(),
                Value::Bool(false) => "No".to_string(),
                other => value_to_plain(other),
            },
        }
    }

    /// Parse raw user input into the JSON value sent to the backend.
    ///
    /// Blank input always yields `null`; required-ness is checked separately.
    pub fn parse_input(&self, label: &str, raw: &str) -> Result<Value, CoreError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(match self {
                Self::Boolean => Value::Bool(false),
                _ => Value::Null,
            });
        }
        match self {
            Self::Text | Self::Multiline | Self::Custom(_) => Ok(Value::String(raw.to_string())),
            Self::Number { integer: true } => trimmed
                .parse::<i64>()
                .map(Value::from)
                .map_err(|_| CoreError::Validation(format!("{label} must be a whole number"))),
            Self::Number { integer: false } => trimmed
                .parse::<f64>()
                .ok()
                .and_then(serde_json::Number::from_f64)
                .map(Value::Number)
                .ok_or_else(|| CoreError::Validation(format!("{label} must be a number"))),
            Self::Date => lenient_date::parse(trimmed)
                .map(|d| Value::String(d.format("%Y-%m-%d").to_string()))
                .ok_or_else(|| CoreError::Validation(format!("{label} must be a date (YYYY-MM-DD)"))),
            Self::Select { options } => options
                .iter()
                .find(|o| o.as_str() == trimmed)
                .map(|o| Value::String(o.clone()))
                .ok_or_else(|| {
                    CoreError::Validation(format!(
                        "{label} must be one of: {}",
                        options.join(", ")
                    ))
                }),
            Self::Boolean => match trimmed.to_ascii_lowercase().as_str() {
                "true" | "yes" | "1" | "on" => Ok(Value::Bool(true)),
                "false" | "no" | "0" | "off" => Ok(Value::Bool(false)),
                _ => Err(CoreError::Validation(format!("{label} must be yes or no"))),
            },
        }
    }

    /// Initial value of this field in an empty "Add" draft.
    pub fn empty_value(&self) -> Value {
        match self {
            Self::Boolean => Value::Bool(false),
            _ => Value::Null,
        }
    }
}

/// Render a JSON value without surrounding quotes.
pub fn value_to_plain(value: &Value) -> String {
    match value {
        Value::Null => EMPTY_DISPLAY.to_string(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => items.iter().map(value_to_plain).collect::<Vec<_>>().join(", "),
        Value::Object(_) => value.to_string(),
    }
}

/// Returns `true` for `null`, missing, and blank-string values.
pub fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(_) => false,
    }
}

// ---------------------------------------------------------------------------
// Field descriptor
// ---------------------------------------------------------------------------

/// Metadata for one field shown in view/edit/add dialogs.
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    /// JSON key in the record.
    pub key: String,
    /// Human-readable label.
    pub label: String,
    pub kind: FieldKind,
    /// Blocks saving when blank.
    pub required: bool,
    /// Shown in dialogs but never editable (e.g. synthetic ids).
    pub read_only: bool,
}

impl FieldDescriptor {
    pub fn new(key: impl Into<String>, label: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            kind,
            required: false,
            read_only: false,
        }
    }

    pub fn text(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(key, label, FieldKind::Text)
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    /// Display string for this field within `row`.
    pub fn display(&self, row: &Record) -> String {
        let value = row.get(&self.key).unwrap_or(&Value::Null);
        self.kind.display(value, row)
    }
}

/// Check every required field in `draft`, reporting all blank ones at once.
pub fn validate_required(fields: &[FieldDescriptor], draft: &Record) -> Result<(), CoreError> {
    let missing: Vec<&str> = fields
        .iter()
        .filter(|f| f.required && !f.read_only && is_blank(draft.get(&f.key)))
        .map(|f| f.label.as_str())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Required fields missing: {}",
            missing.join(", ")
        )))
    }
}

// ---------------------------------------------------------------------------
// Column definition
// ---------------------------------------------------------------------------

/// One grid column.
#[derive(Debug, Clone)]
pub struct ColumnDef {
    pub field: String,
    pub header: String,
    /// Preferred width in characters, if any.
    pub width: Option<u16>,
    pub kind: FieldKind,
    pub sortable: bool,
}

impl ColumnDef {
    pub fn new(field: impl Into<String>, header: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            field: field.into(),
            header: header.into(),
            width: None,
            kind,
            sortable: true,
        }
    }

    pub fn text(field: impl Into<String>, header: impl Into<String>) -> Self {
        Self::new(field, header, FieldKind::Text)
    }

    pub fn width(mut self, width: u16) -> Self {
        self.width = Some(width);
        self
    }

    pub fn unsortable(mut self) -> Self {
        self.sortable = false;
        self
    }

    pub fn render_cell(&self, row: &Record) -> String {
        let value = row.get(&self.field).unwrap_or(&Value::Null);
        self.kind.display(value, row)
    }
}
