use pdbw_core::fields::{ColumnDef, FieldDescriptor, FieldKind};
use pdbw_core::plot::{bar_counts, histogram, PlotConfig, PlotLayout};
use pdbw_core::row_id::PrimaryKey;
use pdbw_core::ResourceKind;

use crate::table::TableConfig;

pub fn config() -> TableConfig {
    TableConfig::new("Macromolecules", ResourceKind::Macromolecules, PrimaryKey::single("id"))
        .columns(vec![
            ColumnDef::text("pdb_id", "PDB ID").width(90),
            ColumnDef::new("entity_id", "Entity", FieldKind::integer()).width(70),
            ColumnDef::text("molecule_name", "Molecule").width(240),
            ColumnDef::text("chain_ids", "Chains").width(90),
            ColumnDef::new("sequence_length", "Length", FieldKind::integer()).width(90),
            ColumnDef::text("organism", "Organism").width(180),
        ])
        .detail_fields(vec![
            FieldDescriptor::new("id", "ID", FieldKind::integer()).read_only(),
            FieldDescriptor::text("pdb_id", "PDB ID").required(),
            FieldDescriptor::new("entity_id", "Entity ID", FieldKind::integer()).required(),
            FieldDescriptor::text("molecule_name", "Molecule Name"),
            FieldDescriptor::text("chain_ids", "Chain IDs"),
            FieldDescriptor::new("sequence_length", "Sequence Length", FieldKind::integer()),
            FieldDescriptor::new("sequence", "Sequence", FieldKind::Multiline),
            FieldDescriptor::text("organism", "Organism"),
            FieldDescriptor::text("mutation", "Mutation"),
        ])
        .plots(vec![
            PlotConfig::new(
                "Sequence length distribution",
                PlotLayout::axes("Residues", "Entities"),
                |rows, _| histogram(rows, "sequence_length", 20),
            ),
            PlotConfig::new(
                "Entities by organism",
                PlotLayout::axes("Organism", "Entities"),
                |rows, _| bar_counts(rows, "organism"),
            ),
        ])
}
