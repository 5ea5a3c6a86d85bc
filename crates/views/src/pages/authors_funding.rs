use pdbw_core::fields::{ColumnDef, FieldDescriptor, FieldKind};
use pdbw_core::plot::{bar_counts, pie_counts, PlotConfig, PlotLayout};
use pdbw_core::row_id::PrimaryKey;
use pdbw_core::ResourceKind;

use crate::table::TableConfig;

pub fn config() -> TableConfig {
    TableConfig::new("Authors & Funding", ResourceKind::AuthorsFunding, PrimaryKey::single("id"))
        .columns(vec![
            ColumnDef::text("pdb_id", "PDB ID").width(90),
            ColumnDef::text("author_name", "Author").width(200),
            ColumnDef::new("author_order", "Order", FieldKind::integer()).width(70),
            ColumnDef::text("funding_organization", "Funding Organization").width(240),
            ColumnDef::text("grant_number", "Grant").width(140),
            ColumnDef::text("country", "Country").width(120),
        ])
        .detail_fields(vec![
            FieldDescriptor::new("id", "ID", FieldKind::integer()).read_only(),
            FieldDescriptor::text("pdb_id", "PDB ID").required(),
            FieldDescriptor::text("author_name", "Author Name").required(),
            FieldDescriptor::new("author_order", "Author Order", FieldKind::integer()),
            FieldDescriptor::text("funding_organization", "Funding Organization"),
            FieldDescriptor::text("grant_number", "Grant Number"),
            FieldDescriptor::text("country", "Country"),
        ])
        .plots(vec![
            PlotConfig::new(
                "Top funding organizations",
                PlotLayout::axes("Organization", "Grants"),
                |rows, _| bar_counts(rows, "funding_organization"),
            ),
            PlotConfig::new("Funding by country", PlotLayout::default(), |rows, _| {
                pie_counts(rows, "country")
            }),
        ])
}
