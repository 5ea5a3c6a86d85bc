use pdbw_core::fields::{ColumnDef, FieldDescriptor, FieldKind};
use pdbw_core::plot::{bar_counts, histogram, PlotConfig, PlotLayout};
use pdbw_core::row_id::PrimaryKey;
use pdbw_core::ResourceKind;

use crate::table::TableConfig;

pub fn config() -> TableConfig {
    TableConfig::new("Ligands", ResourceKind::Ligands, PrimaryKey::composite(["pdb_id", "ligand_id"]))
        .columns(vec![
            ColumnDef::text("pdb_id", "PDB ID").width(90),
            ColumnDef::text("ligand_id", "Ligand").width(80),
            ColumnDef::text("name", "Name").width(240),
            ColumnDef::text("formula", "Formula").width(140),
            ColumnDef::new("molecular_weight", "MW (Da)", FieldKind::decimal()).width(100),
            ColumnDef::text("chain_id", "Chain").width(70),
            ColumnDef::text("smiles", "SMILES").width(200).unsortable(),
        ])
        .detail_fields(vec![
            FieldDescriptor::text("pdb_id", "PDB ID").required(),
            FieldDescriptor::text("ligand_id", "Ligand ID").required(),
            FieldDescriptor::text("name", "Name"),
            FieldDescriptor::text("formula", "Formula"),
            FieldDescriptor::new("molecular_weight", "Molecular Weight (Da)", FieldKind::decimal()),
            FieldDescriptor::text("chain_id", "Chain ID"),
            FieldDescriptor::new("smiles", "SMILES", FieldKind::Multiline),
        ])
        .plots(vec![
            PlotConfig::new(
                "Most common ligands",
                PlotLayout::axes("Ligand", "Occurrences"),
                |rows, _| bar_counts(rows, "ligand_id"),
            ),
            PlotConfig::new(
                "Ligand molecular weight",
                PlotLayout::axes("Molecular weight (Da)", "Ligands"),
                |rows, _| histogram(rows, "molecular_weight", 15),
            ),
        ])
}
