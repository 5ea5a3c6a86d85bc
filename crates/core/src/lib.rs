//! Domain building blocks for the PDB warehouse client.
//!
//! Pure logic only: resource kinds, typed records, field descriptors, row
//! identity, plot generators, search history and filters, routes and form
//! validation. Nothing here performs I/O.

pub mod entities;
pub mod error;
pub mod fields;
pub mod filter;
pub mod forms;
pub mod history;
pub mod pagination;
pub mod pdb;
pub mod plot;
pub mod resource;
pub mod routes;
pub mod row_id;
pub mod types;

pub use error::CoreError;
pub use resource::ResourceKind;
pub use types::Record;
