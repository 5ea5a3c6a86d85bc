use pdbw_core::fields::{ColumnDef, FieldDescriptor, FieldKind};
use pdbw_core::plot::{bar_counts, stats_series, PlotConfig, PlotLayout};
use pdbw_core::row_id::PrimaryKey;
use pdbw_core::ResourceKind;

use crate::table::TableConfig;

pub fn config() -> TableConfig {
    TableConfig::new("Version History", ResourceKind::VersionHistory, PrimaryKey::single("id"))
        .columns(vec![
            ColumnDef::text("pdb_id", "PDB ID").width(90),
            ColumnDef::text("version", "Version").width(80),
            ColumnDef::new("revision_date", "Revised", FieldKind::Date).width(110),
            ColumnDef::text("revision_type", "Type").width(160),
            ColumnDef::text("description", "Description").width(320).unsortable(),
        ])
        .detail_fields(vec![
            FieldDescriptor::new("id", "ID", FieldKind::integer()).read_only(),
            FieldDescriptor::text("pdb_id", "PDB ID").required(),
            FieldDescriptor::text("version", "Version").required(),
            FieldDescriptor::new("revision_date", "Revision Date", FieldKind::Date),
            FieldDescriptor::text("revision_type", "Revision Type"),
            FieldDescriptor::new("description", "Description", FieldKind::Multiline),
        ])
        .plots(vec![
            PlotConfig::new(
                "Revisions by type",
                PlotLayout::axes("Revision type", "Revisions"),
                |rows, _| bar_counts(rows, "revision_type"),
            ),
            PlotConfig::new(
                "Revisions per year",
                PlotLayout::axes("Year", "Revisions"),
                |_, stats| stats_series(stats, "by_year"),
            ),
        ])
}
