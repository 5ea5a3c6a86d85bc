//! In-memory `ApiService` double shared by the view tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use pdbw_client::{ApiService, ClientError, ListPage, ListQuery};
use pdbw_core::row_id::RecordKey;
use pdbw_core::{Record, ResourceKind};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    GetAll(ListQuery),
    GetById(RecordKey),
    GetByPdb(String),
    Create(Record),
    Update(RecordKey, Record),
    Delete(RecordKey),
    Search(String, u32),
    Statistics,
}

pub struct MockService {
    kind: ResourceKind,
    key_fields: Vec<&'static str>,
    rows: Mutex<Vec<Record>>,
    calls: Mutex<Vec<Call>>,
    total: Mutex<Option<u64>>,
    list_delays: Mutex<VecDeque<Duration>>,
    pdb_delays: Mutex<HashMap<String, Duration>>,
    fail_writes: Mutex<bool>,
    fail_statistics: Mutex<bool>,
}

pub fn record(value: Value) -> Record {
    value.as_object().cloned().expect("test record must be an object")
}

impl MockService {
    pub fn new(kind: ResourceKind, key_fields: &[&'static str], rows: Vec<Value>) -> Self {
        Self {
            kind,
            key_fields: key_fields.to_vec(),
            rows: Mutex::new(rows.into_iter().map(record).collect()),
            calls: Mutex::new(Vec::new()),
            total: Mutex::new(None),
            list_delays: Mutex::new(VecDeque::new()),
            pdb_delays: Mutex::new(HashMap::new()),
            fail_writes: Mutex::new(false),
            fail_statistics: Mutex::new(false),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count_calls(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls().iter().filter(|c| pred(c)).count()
    }

    pub fn rows(&self) -> Vec<Record> {
        self.rows.lock().unwrap().clone()
    }

    pub fn report_total(&self, total: u64) {
        *self.total.lock().unwrap() = Some(total);
    }

    /// Delay successive `get_all` calls by these durations, in order.
    pub fn delay_lists(&self, delays: impl IntoIterator<Item = Duration>) {
        self.list_delays.lock().unwrap().extend(delays);
    }

    /// Delay every `get_by_pdb` call for `pdb_id`.
    pub fn delay_pdb(&self, pdb_id: &str, delay: Duration) {
        self.pdb_delays.lock().unwrap().insert(pdb_id.to_string(), delay);
    }

    pub fn fail_writes(&self) {
        *self.fail_writes.lock().unwrap() = true;
    }

    pub fn fail_statistics(&self) {
        *self.fail_statistics.lock().unwrap() = true;
    }

    fn record_call(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn matches(&self, row: &Record, key: &RecordKey) -> bool {
        self.key_fields.len() == key.segments().len()
            && self.key_fields.iter().zip(key.segments()).all(|(field, expected)| {
                row.get(*field).map(|v| match v {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                }) == Some(expected.clone())
            })
    }

    fn write_failure(&self) -> Option<ClientError> {
        (*self.fail_writes.lock().unwrap()).then(|| ClientError::Api {
            status: 500,
            body: json!({ "error": "backend unavailable" }).to_string(),
        })
    }
}

#[async_trait]
impl ApiService for MockService {
    fn resource(&self) -> ResourceKind {
        self.kind
    }

    async fn get_all(&self, query: &ListQuery) -> Result<ListPage, ClientError> {
        self.record_call(Call::GetAll(query.clone()));
        let call_number = self.count_calls(|c| matches!(c, Call::GetAll(_))) as u64;
        let delay = self.list_delays.lock().unwrap().pop_front();

        let rows = self.rows();
        let offset = query.offset.unwrap_or(0) as usize;
        let limit = query.limit.map_or(rows.len(), |l| l as usize);
        let page: Vec<Record> = rows.iter().skip(offset).take(limit).cloned().collect();
        let total = self.total.lock().unwrap().unwrap_or(rows.len() as u64);

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
            // Delayed responses report which call they answer.
            return Ok(ListPage { rows: page, total: call_number });
        }
        Ok(ListPage { rows: page, total })
    }

    async fn get_by_id(&self, key: &RecordKey) -> Result<Record, ClientError> {
        self.record_call(Call::GetById(key.clone()));
        self.rows()
            .into_iter()
            .find(|row| self.matches(row, key))
            .ok_or(ClientError::Api {
                status: 404,
                body: String::new(),
            })
    }

    async fn get_by_pdb(&self, pdb_id: &str) -> Result<Vec<Record>, ClientError> {
        self.record_call(Call::GetByPdb(pdb_id.to_string()));
        let delay = self.pdb_delays.lock().unwrap().get(pdb_id).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self
            .rows()
            .into_iter()
            .filter(|row| row.get("pdb_id").and_then(Value::as_str) == Some(pdb_id))
            .collect())
    }

    async fn create(&self, body: &Record) -> Result<Record, ClientError> {
        self.record_call(Call::Create(body.clone()));
        if let Some(e) = self.write_failure() {
            return Err(e);
        }
        self.rows.lock().unwrap().push(body.clone());
        Ok(body.clone())
    }

    async fn update(&self, key: &RecordKey, body: &Record) -> Result<Record, ClientError> {
        self.record_call(Call::Update(key.clone(), body.clone()));
        if let Some(e) = self.write_failure() {
            return Err(e);
        }
        let mut rows = self.rows.lock().unwrap();
        let row = rows
            .iter_mut()
            .find(|row| self.matches(row, key))
            .ok_or(ClientError::Api {
                status: 404,
                body: String::new(),
            })?;
        row.extend(body.clone());
        Ok(row.clone())
    }

    async fn delete(&self, key: &RecordKey) -> Result<(), ClientError> {
        self.record_call(Call::Delete(key.clone()));
        if let Some(e) = self.write_failure() {
            return Err(e);
        }
        self.rows.lock().unwrap().retain(|row| !self.matches(row, key));
        Ok(())
    }

    async fn search(&self, q: &str, limit: u32) -> Result<Vec<Record>, ClientError> {
        self.record_call(Call::Search(q.to_string(), limit));
        let needle = q.to_lowercase();
        Ok(self
            .rows()
            .into_iter()
            .filter(|row| Value::Object(row.clone()).to_string().to_lowercase().contains(&needle))
            .take(limit as usize)
            .collect())
    }

    async fn get_statistics(&self) -> Result<Value, ClientError> {
        self.record_call(Call::Statistics);
        if *self.fail_statistics.lock().unwrap() {
            return Err(ClientError::Api {
                status: 503,
                body: String::new(),
            });
        }
        Ok(json!({ "total": self.rows().len() }))
    }
}
