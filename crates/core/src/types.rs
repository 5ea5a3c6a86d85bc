/// A single row as exchanged with the backend: a flat JSON object.
///
/// Generic views operate on this shape so one implementation serves every
/// resource; typed structs in [`crate::entities`] exist for typed callers.
pub type Record = serde_json::Map<String, serde_json::Value>;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
