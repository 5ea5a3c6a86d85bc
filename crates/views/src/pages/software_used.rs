use pdbw_core::fields::{ColumnDef, FieldDescriptor, FieldKind};
use pdbw_core::plot::{bar_counts, pie_counts, PlotConfig, PlotLayout};
use pdbw_core::row_id::PrimaryKey;
use pdbw_core::ResourceKind;

use crate::table::TableConfig;

pub const CLASSIFICATIONS: [&str; 6] = [
    "data collection",
    "data reduction",
    "data scaling",
    "phasing",
    "refinement",
    "model building",
];

pub fn config() -> TableConfig {
    TableConfig::new("Software Used", ResourceKind::SoftwareUsed, PrimaryKey::single("id"))
        .columns(vec![
            ColumnDef::text("pdb_id", "PDB ID").width(90),
            ColumnDef::text("software_name", "Software").width(200),
            ColumnDef::text("version", "Version").width(100),
            ColumnDef::text("classification", "Classification").width(160),
        ])
        .detail_fields(vec![
            FieldDescriptor::new("id", "ID", FieldKind::integer()).read_only(),
            FieldDescriptor::text("pdb_id", "PDB ID").required(),
            FieldDescriptor::text("software_name", "Software Name").required(),
            FieldDescriptor::text("version", "Version"),
            FieldDescriptor::new("classification", "Classification", FieldKind::select(CLASSIFICATIONS)),
        ])
        .plots(vec![
            PlotConfig::new(
                "Most used software",
                PlotLayout::axes("Software", "Structures"),
                |rows, _| bar_counts(rows, "software_name"),
            ),
            PlotConfig::new("Usage by stage", PlotLayout::default(), |rows, _| {
                pie_counts(rows, "classification")
            }),
        ])
}
