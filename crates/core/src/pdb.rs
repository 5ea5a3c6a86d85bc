//! PDB identifiers and the external RCSB URLs derived from them.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Base URL of the RCSB structure image CDN.
pub const RCSB_IMAGE_CDN: &str = "https://cdn.rcsb.org/images/structures";

/// Base URL for PDB coordinate file downloads.
pub const RCSB_FILE_DOWNLOAD: &str = "https://files.rcsb.org/download";

fn pdb_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[1-9][A-Z0-9]{3}$").expect("static regex is valid"))
}

/// A four-character PDB identifier, normalised to uppercase (`1ABC`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PdbId(String);

impl PdbId {
    /// Parse and normalise a PDB id.
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        let upper = raw.trim().to_ascii_uppercase();
        if pdb_id_pattern().is_match(&upper) {
            Ok(Self(upper))
        } else {
            Err(CoreError::Validation(format!(
                "Invalid PDB ID '{raw}': expected a digit 1-9 followed by 3 alphanumeric characters"
            )))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Lowercase form used by RCSB CDN paths.
    pub fn lowercase(&self) -> String {
        self.0.to_ascii_lowercase()
    }
}

/// Returns `true` when `raw` is a well-formed PDB id (case-insensitive).
pub fn is_valid_pdb_id(raw: &str) -> bool {
    PdbId::parse(raw).is_ok()
}

impl fmt::Display for PdbId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for PdbId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for PdbId {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<PdbId> for String {
    fn from(id: PdbId) -> Self {
        id.0
    }
}

// ---------------------------------------------------------------------------
// External URLs
// ---------------------------------------------------------------------------

/// Coordinate file formats offered for download.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PdbFileFormat {
    Pdb,
    Cif,
}

impl PdbFileFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Pdb => "pdb",
            Self::Cif => "cif",
        }
    }
}

/// Assembly image on the RCSB CDN.
///
/// The CDN shards by the middle two characters of the lowercase id:
/// `1abc` lives under `ab/1abc/1abc_assembly-1.jpeg`.
pub fn structure_image_url(id: &PdbId) -> String {
    let lower = id.lowercase();
    format!("{RCSB_IMAGE_CDN}/{}/{lower}/{lower}_assembly-1.jpeg", &lower[1..3])
}

/// Download URL for the structure's coordinate file.
pub fn pdb_file_url(id: &PdbId, format: PdbFileFormat) -> String {
    format!("{RCSB_FILE_DOWNLOAD}/{}.{}", id.as_str(), format.extension())
}
