use pdbw_core::fields::{ColumnDef, FieldDescriptor, FieldKind};
use pdbw_core::plot::{histogram, pie_counts, scatter, PlotConfig, PlotLayout};
use pdbw_core::row_id::PrimaryKey;
use pdbw_core::ResourceKind;

use crate::table::{DeleteKey, TableConfig};

/// Structure determination methods offered in the edit form.
pub const METHODS: [&str; 6] = [
    "X-RAY DIFFRACTION",
    "ELECTRON MICROSCOPY",
    "SOLUTION NMR",
    "SOLID-STATE NMR",
    "NEUTRON DIFFRACTION",
    "ELECTRON CRYSTALLOGRAPHY",
];

pub fn config() -> TableConfig {
    TableConfig::new("Experimental Data", ResourceKind::ExperimentalData, PrimaryKey::single("pdb_id"))
        .columns(vec![
            ColumnDef::text("pdb_id", "PDB ID").width(90),
            ColumnDef::text("method", "Method").width(180),
            ColumnDef::new("resolution", "Resolution (Å)", FieldKind::decimal()).width(120),
            ColumnDef::new("r_value_work", "R-work", FieldKind::decimal()).width(90),
            ColumnDef::new("r_value_free", "R-free", FieldKind::decimal()).width(90),
            ColumnDef::text("space_group", "Space Group").width(120),
        ])
        .detail_fields(vec![
            FieldDescriptor::text("pdb_id", "PDB ID").required(),
            FieldDescriptor::new("method", "Method", FieldKind::select(METHODS)).required(),
            FieldDescriptor::new("resolution", "Resolution (Å)", FieldKind::decimal()),
            FieldDescriptor::new("r_value_work", "R-work", FieldKind::decimal()),
            FieldDescriptor::new("r_value_free", "R-free", FieldKind::decimal()),
            FieldDescriptor::text("space_group", "Space Group"),
            FieldDescriptor::new("crystallization_method", "Crystallization Method", FieldKind::Multiline),
            FieldDescriptor::new("ph", "pH", FieldKind::decimal()),
            FieldDescriptor::new("temperature", "Temperature (K)", FieldKind::decimal()),
        ])
        // The backend deletes experimental data by structure id.
        .delete_key(DeleteKey::Field("pdb_id".into()))
        .plots(vec![
            PlotConfig::new("Methods", PlotLayout::default(), |rows, _| pie_counts(rows, "method")),
            PlotConfig::new(
                "Resolution distribution",
                PlotLayout::axes("Resolution (Å)", "Structures"),
                |rows, _| histogram(rows, "resolution", 15),
            ),
            PlotConfig::new(
                "Resolution vs R-free",
                PlotLayout::axes("Resolution (Å)", "R-free"),
                |rows, _| scatter(rows, "resolution", "r_value_free", "pdb_id"),
            ),
        ])
}
