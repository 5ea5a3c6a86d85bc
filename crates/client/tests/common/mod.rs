//! In-process fake of the warehouse REST API for client integration tests.
//!
//! The fake binds `127.0.0.1:0`, serves `/api/...` from in-memory tables and
//! records every request so tests can assert on method, path, query and
//! the `Authorization` header.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use serde_json::{json, Value};

use pdbw_client::{ClientConfig, HttpTransport, RelationPath, Session};

/// Password accepted by the fake login endpoint.
pub const GOOD_PASSWORD: &str = "correct-horse";

/// Token handed out by the fake login endpoint.
pub const TOKEN: &str = "tok-123";

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub query: HashMap<String, String>,
    pub authorization: Option<String>,
}

#[derive(Default)]
pub struct FakeState {
    requests: Mutex<Vec<RecordedRequest>>,
    tables: Mutex<HashMap<String, Vec<Value>>>,
    /// Report this total in list envelopes instead of the table size.
    reported_total: Mutex<Option<u64>>,
    /// Slugs whose search endpoint answers 500.
    failing_search: Mutex<Vec<String>>,
}

pub struct FakeBackend {
    pub base_url: String,
    pub state: Arc<FakeState>,
}

impl FakeBackend {
    /// Start the fake on an ephemeral port.
    pub async fn start() -> Self {
        let state = Arc::new(FakeState::default());
        let app = Router::new().fallback(handle).with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{addr}/api"),
            state,
        }
    }

    pub fn seed(&self, slug: &str, rows: Vec<Value>) {
        self.state.tables.lock().unwrap().insert(slug.to_string(), rows);
    }

    pub fn rows(&self, slug: &str) -> Vec<Value> {
        self.state
            .tables
            .lock()
            .unwrap()
            .get(slug)
            .cloned()
            .unwrap_or_default()
    }

    pub fn report_total(&self, total: u64) {
        *self.state.reported_total.lock().unwrap() = Some(total);
    }

    pub fn fail_search(&self, slug: &str) {
        self.state.failing_search.lock().unwrap().push(slug.to_string());
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> RecordedRequest {
        self.requests().pop().expect("no request recorded")
    }

    pub fn config(&self) -> ClientConfig {
        ClientConfig {
            api_url: self.base_url.clone(),
            relation_path: RelationPath::ByPdb,
            ..ClientConfig::default()
        }
    }

    pub fn transport(&self, session: Arc<Session>) -> HttpTransport {
        HttpTransport::new(&self.config(), session).unwrap()
    }
}

// ---------------------------------------------------------------------------
// Handler
// ---------------------------------------------------------------------------

fn key_fields(slug: &str) -> &'static [&'static str] {
    match slug {
        "protein-info" | "experimental-data" => &["pdb_id"],
        "ligands" => &["pdb_id", "ligand_id"],
        _ => &["id"],
    }
}

fn plain(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn matches_key(row: &Value, slug: &str, key: &[&str]) -> bool {
    let fields = key_fields(slug);
    fields.len() == key.len()
        && fields
            .iter()
            .zip(key)
            .all(|(field, expected)| row.get(*field).map(plain).as_deref() == Some(*expected))
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

async fn handle(
    State(state): State<Arc<FakeState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
    body: Bytes,
) -> Response {
    let path = uri.path().to_string();
    state.requests.lock().unwrap().push(RecordedRequest {
        method: method.clone(),
        path: path.clone(),
        query: query.clone(),
        authorization: headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    });

    let Some(rest) = path.strip_prefix("/api/") else {
        return error(StatusCode::NOT_FOUND, "Not found");
    };
    let segments: Vec<String> = rest
        .split('/')
        .map(|s| s.replace("%20", " "))
        .collect();
    let segments: Vec<&str> = segments.iter().map(String::as_str).collect();
    let body: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);

    match (method.as_str(), segments.as_slice()) {
        // -- auth --
        ("POST", ["auth", "login"]) => {
            if body["password"] == GOOD_PASSWORD {
                Json(json!({
                    "token": TOKEN,
                    "user": { "id": 7, "name": "Ada", "email": body["email"] }
                }))
                .into_response()
            } else {
                error(StatusCode::UNAUTHORIZED, "Invalid credentials")
            }
        }
        ("POST", ["auth", "register"]) => {
            (StatusCode::CREATED, Json(json!({ "message": "Registered" }))).into_response()
        }
        ("POST", ["auth", "forgot-password"]) => {
            Json(json!({ "message": "Reset link sent" })).into_response()
        }
        ("POST", ["auth", "reset-password"]) => Json(json!({})).into_response(),
        ("GET", ["auth", "verify-email"]) => match query.get("token") {
            Some(_) => Json(json!({ "message": "Verified" })).into_response(),
            None => error(StatusCode::BAD_REQUEST, "Missing token"),
        },

        // -- advanced search --
        ("GET", ["search"]) => {
            let rows = state.tables.lock().unwrap().get("protein-info").cloned().unwrap_or_default();
            let total = rows.len();
            Json(json!({ "data": rows, "total": total })).into_response()
        }

        // -- resources --
        ("GET", [slug]) => {
            let rows = state.tables.lock().unwrap().get(*slug).cloned().unwrap_or_default();
            let offset: usize = query.get("offset").and_then(|o| o.parse().ok()).unwrap_or(0);
            let limit: usize = query.get("limit").and_then(|l| l.parse().ok()).unwrap_or(rows.len());
            let total = state.reported_total.lock().unwrap().unwrap_or(rows.len() as u64);
            let page: Vec<Value> = rows.into_iter().skip(offset).take(limit).collect();
            Json(json!({ "data": page, "total": total })).into_response()
        }
        ("POST", [slug]) => {
            state
                .tables
                .lock()
                .unwrap()
                .entry(slug.to_string())
                .or_default()
                .push(body.clone());
            (StatusCode::CREATED, Json(body)).into_response()
        }
        ("GET", [slug, "search"]) => {
            if state.failing_search.lock().unwrap().iter().any(|s| s == slug) {
                return error(StatusCode::INTERNAL_SERVER_ERROR, "search exploded");
            }
            let needle = query.get("q").cloned().unwrap_or_default().to_lowercase();
            let limit: usize = query.get("limit").and_then(|l| l.parse().ok()).unwrap_or(10);
            let rows = state.tables.lock().unwrap().get(*slug).cloned().unwrap_or_default();
            let hits: Vec<Value> = rows
                .into_iter()
                .filter(|row| row.to_string().to_lowercase().contains(&needle))
                .take(limit)
                .collect();
            Json(Value::Array(hits)).into_response()
        }
        ("GET", [slug, "statistics"]) => {
            let count = state.tables.lock().unwrap().get(*slug).map_or(0, Vec::len);
            Json(json!({ "total": count })).into_response()
        }
        ("GET", [slug, "count"]) => {
            let count = state.tables.lock().unwrap().get(*slug).map_or(0, Vec::len);
            Json(json!({ "count": count })).into_response()
        }
        ("GET", [slug, "by-pdb", pdb_id]) => {
            let rows = state.tables.lock().unwrap().get(*slug).cloned().unwrap_or_default();
            let related: Vec<Value> = rows
                .into_iter()
                .filter(|row| row.get("pdb_id").map(plain).as_deref() == Some(*pdb_id))
                .collect();
            Json(Value::Array(related)).into_response()
        }
        (verb, [slug, key @ ..]) => {
            let mut tables = state.tables.lock().unwrap();
            let rows = tables.entry(slug.to_string()).or_default();
            let Some(index) = rows.iter().position(|row| matches_key(row, slug, key)) else {
                return error(StatusCode::NOT_FOUND, "Record not found");
            };
            match verb {
                "GET" => Json(json!({ "data": rows[index] })).into_response(),
                "PUT" => {
                    if let (Some(row), Some(patch)) = (rows[index].as_object_mut(), body.as_object()) {
                        row.extend(patch.clone());
                    }
                    Json(json!({ "data": rows[index] })).into_response()
                }
                "DELETE" => {
                    rows.remove(index);
                    StatusCode::NO_CONTENT.into_response()
                }
                _ => error(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed"),
            }
        }
        _ => error(StatusCode::NOT_FOUND, "Not found"),
    }
}
