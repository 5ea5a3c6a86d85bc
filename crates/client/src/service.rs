//! The JSON-level API seam the view models are written against.
//!
//! [`ResourceClient`] is the production implementation; tests drive the
//! views through in-memory doubles.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use pdbw_core::row_id::RecordKey;
use pdbw_core::{Record, ResourceKind};

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::resource::{ListPage, ListQuery, ResourceClient};
use crate::session::Session;
use crate::transport::HttpTransport;

/// CRUD, search and statistics for one resource.
#[async_trait]
pub trait ApiService: Send + Sync {
    fn resource(&self) -> ResourceKind;

    async fn get_all(&self, query: &ListQuery) -> Result<ListPage, ClientError>;
    async fn get_by_id(&self, key: &RecordKey) -> Result<Record, ClientError>;
    async fn get_by_pdb(&self, pdb_id: &str) -> Result<Vec<Record>, ClientError>;
    async fn create(&self, body: &Record) -> Result<Record, ClientError>;
    async fn update(&self, key: &RecordKey, body: &Record) -> Result<Record, ClientError>;
    async fn delete(&self, key: &RecordKey) -> Result<(), ClientError>;
    async fn search(&self, q: &str, limit: u32) -> Result<Vec<Record>, ClientError>;
    async fn get_statistics(&self) -> Result<Value, ClientError>;
}

#[async_trait]
impl ApiService for ResourceClient {
    fn resource(&self) -> ResourceKind {
        self.kind()
    }

    async fn get_all(&self, query: &ListQuery) -> Result<ListPage, ClientError> {
        ResourceClient::get_all(self, query).await
    }

    async fn get_by_id(&self, key: &RecordKey) -> Result<Record, ClientError> {
        ResourceClient::get_by_id(self, key).await
    }

    async fn get_by_pdb(&self, pdb_id: &str) -> Result<Vec<Record>, ClientError> {
        ResourceClient::get_by_pdb(self, pdb_id).await
    }

    async fn create(&self, body: &Record) -> Result<Record, ClientError> {
        ResourceClient::create(self, body).await
    }

    async fn update(&self, key: &RecordKey, body: &Record) -> Result<Record, ClientError> {
        ResourceClient::update(self, key, body).await
    }

    async fn delete(&self, key: &RecordKey) -> Result<(), ClientError> {
        ResourceClient::delete(self, key).await
    }

    async fn search(&self, q: &str, limit: u32) -> Result<Vec<Record>, ClientError> {
        ResourceClient::search(self, q, limit).await
    }

    async fn get_statistics(&self) -> Result<Value, ClientError> {
        ResourceClient::get_statistics(self).await
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// One [`ApiService`] per resource kind.
#[derive(Clone, Default)]
pub struct ServiceRegistry {
    services: HashMap<ResourceKind, Arc<dyn ApiService>>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// HTTP-backed services for every resource, sharing one transport.
    pub fn from_config(config: &ClientConfig, session: Arc<Session>) -> Result<Self, ClientError> {
        let transport = HttpTransport::new(config, session)?;
        Ok(Self::from_transport(&transport, config))
    }

    pub fn from_transport(transport: &HttpTransport, config: &ClientConfig) -> Self {
        let services = ResourceKind::ALL
            .iter()
            .map(|&kind| {
                let client = ResourceClient::new(kind, transport.clone(), config.relation_path);
                (kind, Arc::new(client) as Arc<dyn ApiService>)
            })
            .collect();
        Self { services }
    }

    /// Register (or replace) the service for its resource.
    pub fn insert(&mut self, service: Arc<dyn ApiService>) {
        self.services.insert(service.resource(), service);
    }

    pub fn get(&self, kind: ResourceKind) -> Result<Arc<dyn ApiService>, ClientError> {
        self.services
            .get(&kind)
            .cloned()
            .ok_or_else(|| ClientError::Config(format!("No service registered for {kind}")))
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}
