//! HTTP client for the PDB warehouse REST API.
//!
//! [`ResourceClient`] wraps one resource's endpoints, [`AuthClient`] the
//! `/auth/*` endpoints, and [`Session`] the persisted client state (token,
//! user, colour mode, search history). Views depend on the [`ApiService`]
//! trait rather than on the concrete client.

pub mod auth;
pub mod config;
pub mod error;
pub mod resource;
pub mod search;
pub mod service;
pub mod session;
pub mod storage;
pub mod transport;

pub use auth::AuthClient;
pub use config::{ClientConfig, RelationPath};
pub use error::{ClientError, ClientResult};
pub use resource::{ListPage, ListQuery, ResourceClient};
pub use search::{GlobalSearch, SearchClient, SearchHit, SearchSource};
pub use service::{ApiService, ServiceRegistry};
pub use session::{ColorMode, Session, SessionEvent, UserInfo};
pub use storage::{FileStore, KeyValueStore, MemoryStore};
pub use transport::HttpTransport;
