use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ClientError;

/// Default backend base URL for local development.
pub const DEFAULT_API_URL: &str = "http://localhost:5000/api";

/// Default per-request timeout in seconds.
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Which URL convention the backend uses for "records belonging to a PDB
/// entry" lookups. Both forms exist in the wild.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RelationPath {
    /// `/<resource>/by-pdb/<pdb_id>`
    #[default]
    ByPdb,
    /// `/<resource>/pdb/<pdb_id>`
    Pdb,
}

impl RelationPath {
    pub fn segment(self) -> &'static str {
        match self {
            Self::ByPdb => "by-pdb",
            Self::Pdb => "pdb",
        }
    }
}

impl FromStr for RelationPath {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "by-pdb" => Ok(Self::ByPdb),
            "pdb" => Ok(Self::Pdb),
            other => Err(ClientError::Config(format!(
                "PDBW_RELATION_PATH must be 'by-pdb' or 'pdb', got '{other}'"
            ))),
        }
    }
}

/// Client configuration loaded from environment variables.
///
/// All fields have defaults suitable for a backend on localhost.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend base URL; resources live at `<api_url>/<slug>`.
    pub api_url: String,
    /// Per-request timeout.
    pub request_timeout: Duration,
    /// JSON file backing the persisted session.
    pub state_file: PathBuf,
    /// URL convention for by-PDB relationship lookups.
    pub relation_path: RelationPath,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            state_file: default_state_file(),
            relation_path: RelationPath::default(),
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                     | Default                        |
    /// |-----------------------------|--------------------------------|
    /// | `PDBW_API_URL`              | `http://localhost:5000/api`    |
    /// | `PDBW_REQUEST_TIMEOUT_SECS` | `30`                           |
    /// | `PDBW_STATE_FILE`           | `$HOME/.pdbw/state.json`       |
    /// | `PDBW_RELATION_PATH`        | `by-pdb`                       |
    pub fn from_env() -> Result<Self, ClientError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ClientError> {
        let api_url = lookup("PDBW_API_URL")
            .map(|u| u.trim().trim_end_matches('/').to_string())
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let request_timeout_secs: u64 = match lookup("PDBW_REQUEST_TIMEOUT_SECS") {
            Some(raw) => raw.trim().parse().map_err(|_| {
                ClientError::Config(format!(
                    "PDBW_REQUEST_TIMEOUT_SECS must be a whole number of seconds, got '{raw}'"
                ))
            })?,
            None => DEFAULT_REQUEST_TIMEOUT_SECS,
        };

        let state_file = lookup("PDBW_STATE_FILE")
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(default_state_file);

        let relation_path = match lookup("PDBW_RELATION_PATH") {
            Some(raw) => raw.parse()?,
            None => RelationPath::default(),
        };

        Ok(Self {
            api_url,
            request_timeout: Duration::from_secs(request_timeout_secs),
            state_file,
            relation_path,
        })
    }
}

fn default_state_file() -> PathBuf {
    let base = std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    base.join(".pdbw").join("state.json")
}
