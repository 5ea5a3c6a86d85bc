//! Headless view models for the PDB warehouse client.
//!
//! The views own paging, dialogs, notifications and plots; callers render
//! their state however they like. Every view talks to the backend through
//! [`pdbw_client::ApiService`].

pub mod auth;
pub mod error;
pub mod master_detail;
pub mod nav;
pub mod notify;
pub mod pages;
pub mod search;
pub mod table;

#[cfg(test)]
mod testing;

pub use error::{ViewError, ViewResult};
pub use master_detail::{MasterDetailConfig, MasterDetailView};
pub use notify::{Severity, Snackbar};
pub use search::{DebouncedSearch, SearchUpdate};
pub use table::{DataTableView, Dialog, TableConfig, ViewOutcome};
