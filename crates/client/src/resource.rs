//! Per-resource REST client.
//!
//! One [`ResourceClient`] per [`ResourceKind`]; every operation maps to
//! exactly one HTTP call under `<api_url>/<slug>`.

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;

use pdbw_core::entities::Entity;
use pdbw_core::row_id::RecordKey;
use pdbw_core::{Record, ResourceKind};

use crate::config::RelationPath;
use crate::error::ClientError;
use crate::transport::{unwrap_data, HttpTransport};

// ---------------------------------------------------------------------------
// List query / page
// ---------------------------------------------------------------------------

/// Query parameters for list endpoints (`?limit=&offset=&q=`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    pub limit: Option<u32>,
    pub offset: Option<u64>,
    /// Free-text filter; blank values are not sent.
    pub q: Option<String>,
}

impl ListQuery {
    pub fn page(limit: u32, offset: u64) -> Self {
        Self {
            limit: Some(limit),
            offset: Some(offset),
            q: None,
        }
    }

    pub fn with_search(mut self, q: impl Into<String>) -> Self {
        self.q = Some(q.into());
        self
    }

    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::with_capacity(3);
        if let Some(limit) = self.limit {
            params.push(("limit", limit.to_string()));
        }
        if let Some(offset) = self.offset {
            params.push(("offset", offset.to_string()));
        }
        if let Some(q) = self.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
            params.push(("q", q.to_string()));
        }
        params
    }
}

/// One page of rows plus the backend-reported total.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListPage {
    pub rows: Vec<Record>,
    /// `total` from the envelope when reported, else the row count.
    pub total: u64,
}

impl ListPage {
    /// Interpret a list response.
    ///
    /// Accepts a bare array or a `{data: [...], total: n}` envelope
    /// (`total` optional). Non-object array items are skipped.
    pub fn from_value(value: Value) -> Result<Self, ClientError> {
        let (items, total) = match value {
            Value::Array(items) => (items, None),
            Value::Object(mut map) => match map.remove("data") {
                Some(Value::Array(items)) => {
                    let total = map.get("total").and_then(total_from);
                    (items, total)
                }
                _ => {
                    return Err(ClientError::UnexpectedResponse(
                        "expected an array or an object with a `data` array".into(),
                    ))
                }
            },
            Value::Null => (Vec::new(), None),
            other => {
                return Err(ClientError::UnexpectedResponse(format!(
                    "expected a list, got {other}"
                )))
            }
        };

        let item_count = items.len();
        let rows: Vec<Record> = items
            .into_iter()
            .filter_map(|item| match item {
                Value::Object(map) => Some(map),
                _ => None,
            })
            .collect();
        if rows.len() != item_count {
            tracing::warn!(skipped = item_count - rows.len(), "Skipped non-object list items");
        }

        let total = total.unwrap_or(rows.len() as u64);
        Ok(Self { rows, total })
    }
}

/// Totals arrive as numbers or numeric strings.
fn total_from(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Extract a single record from a create/update/get response.
///
/// Accepts the record itself or a `{data: {...}}` envelope; anything else
/// yields an empty record (the caller reloads anyway).
pub fn record_from(value: Value) -> Record {
    match unwrap_data(value) {
        Value::Object(map) => map,
        _ => Record::new(),
    }
}

// ---------------------------------------------------------------------------
// ResourceClient
// ---------------------------------------------------------------------------

/// HTTP client for one warehouse resource.
#[derive(Clone)]
pub struct ResourceClient {
    kind: ResourceKind,
    transport: HttpTransport,
    relation_path: RelationPath,
}

impl ResourceClient {
    pub fn new(kind: ResourceKind, transport: HttpTransport, relation_path: RelationPath) -> Self {
        Self {
            kind,
            transport,
            relation_path,
        }
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    fn url_for(&self, tail: &[&str]) -> reqwest::Url {
        self.transport
            .url(std::iter::once(self.kind.slug()).chain(tail.iter().copied()))
    }

    fn key_url(&self, key: &RecordKey) -> reqwest::Url {
        self.transport.url(
            std::iter::once(self.kind.slug()).chain(key.segments().iter().map(String::as_str)),
        )
    }

    /// `GET /<slug>?limit=&offset=&q=`
    pub async fn get_all(&self, query: &ListQuery) -> Result<ListPage, ClientError> {
        let value = self.transport.get(self.url_for(&[]), &query.to_params()).await?;
        ListPage::from_value(value)
    }

    /// `GET /<slug>/<key...>`
    pub async fn get_by_id(&self, key: &RecordKey) -> Result<Record, ClientError> {
        let value = self.transport.get(self.key_url(key), &[]).await?;
        Ok(record_from(value))
    }

    /// `GET /<slug>/by-pdb/<pdb_id>` (or `/pdb/<pdb_id>`, per configuration).
    pub async fn get_by_pdb(&self, pdb_id: &str) -> Result<Vec<Record>, ClientError> {
        let url = self.url_for(&[self.relation_path.segment(), pdb_id]);
        let value = self.transport.get(url, &[]).await?;
        // Single-record resources may answer with one object.
        match unwrap_data(value) {
            Value::Object(map) => Ok(vec![map]),
            other => ListPage::from_value(other).map(|page| page.rows),
        }
    }

    /// `POST /<slug>`
    pub async fn create(&self, body: &Record) -> Result<Record, ClientError> {
        let value = self
            .transport
            .send_json(Method::POST, self.url_for(&[]), body)
            .await?;
        tracing::info!(resource = %self.kind, "Record created");
        Ok(record_from(value))
    }

    /// `PUT /<slug>/<key...>`
    pub async fn update(&self, key: &RecordKey, body: &Record) -> Result<Record, ClientError> {
        let value = self
            .transport
            .send_json(Method::PUT, self.key_url(key), body)
            .await?;
        tracing::info!(resource = %self.kind, %key, "Record updated");
        Ok(record_from(value))
    }

    /// `DELETE /<slug>/<key...>`
    pub async fn delete(&self, key: &RecordKey) -> Result<(), ClientError> {
        self.transport.delete(self.key_url(key)).await?;
        tracing::info!(resource = %self.kind, %key, "Record deleted");
        Ok(())
    }

    /// `GET /<slug>/search?q=&limit=`
    pub async fn search(&self, q: &str, limit: u32) -> Result<Vec<Record>, ClientError> {
        let params = [("q", q.to_string()), ("limit", limit.to_string())];
        let value = self.transport.get(self.url_for(&["search"]), &params).await?;
        ListPage::from_value(value).map(|page| page.rows)
    }

    /// `GET /<slug>/statistics`, returned as raw JSON.
    pub async fn get_statistics(&self) -> Result<Value, ClientError> {
        let value = self.transport.get(self.url_for(&["statistics"]), &[]).await?;
        Ok(unwrap_data(value))
    }

    /// `GET /<slug>/count`; accepts `{count: n}`, `{total: n}` or a bare number.
    pub async fn count(&self) -> Result<u64, ClientError> {
        let value = unwrap_data(self.transport.get(self.url_for(&["count"]), &[]).await?);
        let count = match &value {
            Value::Object(map) => map.get("count").or_else(|| map.get("total")).and_then(total_from),
            other => total_from(other),
        };
        count.ok_or_else(|| ClientError::UnexpectedResponse(format!("expected a count, got {value}")))
    }

    /// Typed list for callers that know the record type.
    pub async fn list_typed<T: Entity + DeserializeOwned>(
        &self,
        query: &ListQuery,
    ) -> Result<(Vec<T>, u64), ClientError> {
        if T::KIND != self.kind {
            return Err(ClientError::Config(format!(
                "{} client cannot decode {} records",
                self.kind,
                T::KIND
            )));
        }
        let page = self.get_all(query).await?;
        let rows = page
            .rows
            .into_iter()
            .map(|row| serde_json::from_value(Value::Object(row)))
            .collect::<Result<Vec<T>, _>>()?;
        Ok((rows, page.total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn bare_array_total_is_row_count() {
        let page = ListPage::from_value(json!([{ "pdb_id": "1ABC" }, { "pdb_id": "2XYZ" }])).unwrap();
        assert_eq!(page.rows.len(), 2);
        assert_eq!(page.total, 2);
    }

    #[test]
    fn envelope_total_wins_over_row_count() {
        let page = ListPage::from_value(json!({ "data": [{ "pdb_id": "1ABC" }], "total": 42 })).unwrap();
        assert_eq!(page.rows.len(), 1);
        assert_eq!(page.total, 42);

        let page = ListPage::from_value(json!({ "data": [], "total": "7" })).unwrap();
        assert_eq!(page.total, 7);
    }

    #[test]
    fn envelope_without_total_counts_rows() {
        let page = ListPage::from_value(json!({ "data": [{ "a": 1 }, { "a": 2 }] })).unwrap();
        assert_eq!(page.total, 2);
    }

    #[test]
    fn unexpected_shapes_are_errors() {
        assert!(ListPage::from_value(json!({ "rows": [] })).is_err());
        assert!(ListPage::from_value(json!("nope")).is_err());
    }

    #[test]
    fn non_object_items_are_skipped() {
        let page = ListPage::from_value(json!([{ "a": 1 }, 5, null])).unwrap();
        assert_eq!(page.rows.len(), 1);
    }

    #[test]
    fn list_query_omits_blank_search() {
        let query = ListQuery::page(25, 50).with_search("  ");
        assert_eq!(
            query.to_params(),
            vec![("limit", "25".to_string()), ("offset", "50".to_string())]
        );
    }

    #[test]
    fn record_from_unwraps_envelope() {
        assert_eq!(record_from(json!({ "data": { "pdb_id": "1ABC" } }))["pdb_id"], "1ABC");
        assert!(record_from(json!({ "message": "ok" })).contains_key("message"));
        assert!(record_from(json!(true)).is_empty());
    }
}
