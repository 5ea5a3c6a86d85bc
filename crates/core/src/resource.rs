//! The seven REST resources of the warehouse and their URL slugs.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// One REST resource exposed by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceKind {
    ProteinInfo,
    AuthorsFunding,
    ExperimentalData,
    Macromolecules,
    Ligands,
    SoftwareUsed,
    VersionHistory,
}

impl ResourceKind {
    /// Every resource, in navigation order.
    pub const ALL: [ResourceKind; 7] = [
        Self::ProteinInfo,
        Self::AuthorsFunding,
        Self::ExperimentalData,
        Self::Macromolecules,
        Self::Ligands,
        Self::SoftwareUsed,
        Self::VersionHistory,
    ];

    /// URL path segment, e.g. `protein-info`.
    pub fn slug(self) -> &'static str {
        match self {
            Self::ProteinInfo => "protein-info",
            Self::AuthorsFunding => "authors-funding",
            Self::ExperimentalData => "experimental-data",
            Self::Macromolecules => "macromolecules",
            Self::Ligands => "ligands",
            Self::SoftwareUsed => "software-used",
            Self::VersionHistory => "version-history",
        }
    }

    /// Human-readable label for page titles and navigation.
    pub fn label(self) -> &'static str {
        match self {
            Self::ProteinInfo => "Protein Info",
            Self::AuthorsFunding => "Authors & Funding",
            Self::ExperimentalData => "Experimental Data",
            Self::Macromolecules => "Macromolecules",
            Self::Ligands => "Ligands",
            Self::SoftwareUsed => "Software Used",
            Self::VersionHistory => "Version History",
        }
    }

    /// Entity name used in error messages.
    pub fn entity_name(self) -> &'static str {
        match self {
            Self::ProteinInfo => "protein_info",
            Self::AuthorsFunding => "authors_funding",
            Self::ExperimentalData => "experimental_data",
            Self::Macromolecules => "macromolecule",
            Self::Ligands => "ligand",
            Self::SoftwareUsed => "software_used",
            Self::VersionHistory => "version_history",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for ResourceKind {
    type Err = CoreError;

    /// Accepts the slug (`protein-info`) or its snake_case form (`protein_info`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|kind| kind.slug() == normalized)
            .ok_or_else(|| {
                CoreError::Validation(format!(
                    "Unknown resource '{s}'. Must be one of: {}",
                    Self::ALL.map(|k| k.slug()).join(", ")
                ))
            })
    }
}
