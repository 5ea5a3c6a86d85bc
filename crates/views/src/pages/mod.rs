//! Page configurations: one table page per resource plus the protein
//! explorer.

pub mod authors_funding;
pub mod experimental_data;
pub mod explorer;
pub mod ligands;
pub mod macromolecules;
pub mod protein_info;
pub mod software_used;
pub mod version_history;

use pdbw_core::ResourceKind;

use crate::table::TableConfig;

/// The table page for `kind`.
pub fn table_config(kind: ResourceKind) -> TableConfig {
    match kind {
        ResourceKind::ProteinInfo => protein_info::config(),
        ResourceKind::AuthorsFunding => authors_funding::config(),
        ResourceKind::ExperimentalData => experimental_data::config(),
        ResourceKind::Macromolecules => macromolecules::config(),
        ResourceKind::Ligands => ligands::config(),
        ResourceKind::SoftwareUsed => software_used::config(),
        ResourceKind::VersionHistory => version_history::config(),
    }
}
