//! Protein explorer: browse protein entries and drill into everything
//! recorded for one structure.

use pdbw_core::fields::{ColumnDef, FieldDescriptor, FieldKind};
use pdbw_core::pagination::DEFAULT_PAGE_SIZE;
use pdbw_core::row_id::PrimaryKey;
use pdbw_core::ResourceKind;

use crate::master_detail::{MasterDetailConfig, Relationship};

pub fn config() -> MasterDetailConfig {
    MasterDetailConfig {
        title: "Protein Explorer".into(),
        resource: ResourceKind::ProteinInfo,
        primary_key: PrimaryKey::single("pdb_id"),
        columns: vec![
            ColumnDef::text("pdb_id", "PDB ID"),
            ColumnDef::text("title", "Title"),
            ColumnDef::text("organism", "Organism"),
        ],
        detail_fields: vec![
            FieldDescriptor::text("pdb_id", "PDB ID"),
            FieldDescriptor::text("title", "Title"),
            FieldDescriptor::text("classification", "Classification"),
            FieldDescriptor::text("organism", "Organism"),
            FieldDescriptor::new("molecular_weight", "Molecular Weight (kDa)", FieldKind::decimal()),
            FieldDescriptor::new("deposition_date", "Deposition Date", FieldKind::Date),
            FieldDescriptor::new("release_date", "Release Date", FieldKind::Date),
        ],
        relationships: relationships(),
        form_fields: vec![
            FieldDescriptor::text("pdb_id", "PDB ID").required(),
            FieldDescriptor::text("title", "Title").required(),
            FieldDescriptor::text("classification", "Classification"),
            FieldDescriptor::text("organism", "Organism"),
        ],
        page_size: DEFAULT_PAGE_SIZE,
    }
}

fn relationships() -> Vec<Relationship> {
    vec![
        Relationship::new(
            "experimental_data",
            "Experimental Data",
            ResourceKind::ExperimentalData,
            PrimaryKey::single("pdb_id"),
        )
        .columns(vec![
            ColumnDef::text("method", "Method"),
            ColumnDef::new("resolution", "Resolution (Å)", FieldKind::decimal()),
        ])
        .edit_fields(vec![
            FieldDescriptor::text("method", "Method").required(),
            FieldDescriptor::new("resolution", "Resolution (Å)", FieldKind::decimal()),
        ]),
        Relationship::new(
            "macromolecules",
            "Macromolecules",
            ResourceKind::Macromolecules,
            PrimaryKey::single("id"),
        )
        .columns(vec![
            ColumnDef::new("entity_id", "Entity", FieldKind::integer()),
            ColumnDef::text("molecule_name", "Molecule"),
            ColumnDef::text("chain_ids", "Chains"),
        ])
        .edit_fields(vec![
            FieldDescriptor::new("entity_id", "Entity ID", FieldKind::integer()).required(),
            FieldDescriptor::text("molecule_name", "Molecule Name"),
        ]),
        Relationship::new(
            "ligands",
            "Ligands",
            ResourceKind::Ligands,
            PrimaryKey::composite(["pdb_id", "ligand_id"]),
        )
        .columns(vec![
            ColumnDef::text("ligand_id", "Ligand"),
            ColumnDef::text("name", "Name"),
            ColumnDef::text("formula", "Formula"),
        ])
        .edit_fields(vec![
            FieldDescriptor::text("ligand_id", "Ligand ID").required(),
            FieldDescriptor::text("name", "Name"),
        ]),
        Relationship::new(
            "authors",
            "Authors & Funding",
            ResourceKind::AuthorsFunding,
            PrimaryKey::single("id"),
        )
        .columns(vec![
            ColumnDef::text("author_name", "Author"),
            ColumnDef::text("funding_organization", "Funding"),
        ])
        .edit_fields(vec![FieldDescriptor::text("author_name", "Author Name").required()]),
        Relationship::new(
            "software",
            "Software Used",
            ResourceKind::SoftwareUsed,
            PrimaryKey::single("id"),
        )
        .columns(vec![
            ColumnDef::text("software_name", "Software"),
            ColumnDef::text("classification", "Classification"),
        ])
        .edit_fields(vec![FieldDescriptor::text("software_name", "Software Name").required()]),
        Relationship::new(
            "versions",
            "Version History",
            ResourceKind::VersionHistory,
            PrimaryKey::single("id"),
        )
        .columns(vec![
            ColumnDef::text("version", "Version"),
            ColumnDef::new("revision_date", "Revised", FieldKind::Date),
        ])
        .edit_fields(vec![FieldDescriptor::text("version", "Version").required()]),
    ]
}
