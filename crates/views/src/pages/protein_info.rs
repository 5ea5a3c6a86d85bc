use pdbw_core::fields::{ColumnDef, FieldDescriptor, FieldKind, Renderer};
use pdbw_core::plot::{bar_counts, histogram, pie_counts, stats_series, PlotConfig, PlotLayout};
use pdbw_core::routes::Route;
use pdbw_core::row_id::PrimaryKey;
use pdbw_core::ResourceKind;

use crate::table::TableConfig;

/// Longest title shown in the grid before it is elided.
const TITLE_CELL_CHARS: usize = 60;

pub fn config() -> TableConfig {
    TableConfig::new("Protein Information", ResourceKind::ProteinInfo, PrimaryKey::single("pdb_id"))
        .columns(vec![
            ColumnDef::text("pdb_id", "PDB ID").width(90),
            ColumnDef::new("title", "Title", FieldKind::Custom(title_cell())).width(320),
            ColumnDef::text("classification", "Classification").width(180),
            ColumnDef::text("organism", "Organism").width(180),
            ColumnDef::new("molecular_weight", "MW (kDa)", FieldKind::decimal()).width(100),
            ColumnDef::new("deposition_date", "Deposited", FieldKind::Date).width(110),
            ColumnDef::new("release_date", "Released", FieldKind::Date).width(110),
        ])
        .detail_fields(vec![
            FieldDescriptor::text("pdb_id", "PDB ID").required(),
            FieldDescriptor::new("title", "Title", FieldKind::Multiline).required(),
            FieldDescriptor::text("classification", "Classification"),
            FieldDescriptor::text("organism", "Organism"),
            FieldDescriptor::text("expression_system", "Expression System"),
            FieldDescriptor::new("molecular_weight", "Molecular Weight (kDa)", FieldKind::decimal()),
            FieldDescriptor::new("atom_count", "Atom Count", FieldKind::integer()),
            FieldDescriptor::new("residue_count", "Residue Count", FieldKind::integer()),
            FieldDescriptor::new("polymer_entity_count", "Polymer Entities", FieldKind::integer()),
            FieldDescriptor::new("deposition_date", "Deposition Date", FieldKind::Date),
            FieldDescriptor::new("release_date", "Release Date", FieldKind::Date),
            FieldDescriptor::new("keywords", "Keywords", FieldKind::Multiline),
        ])
        .plots(vec![
            PlotConfig::new(
                "Structures by classification",
                PlotLayout::axes("Classification", "Structures"),
                |rows, _| bar_counts(rows, "classification"),
            ),
            PlotConfig::new("Source organisms", PlotLayout::default(), |rows, _| {
                pie_counts(rows, "organism")
            }),
            PlotConfig::new(
                "Molecular weight distribution",
                PlotLayout::axes("Molecular weight (kDa)", "Structures"),
                |rows, _| histogram(rows, "molecular_weight", 20),
            ),
            PlotConfig::new(
                "Depositions per year",
                PlotLayout::axes("Year", "Depositions"),
                |_, stats| stats_series(stats, "by_year"),
            ),
        ])
        .detail_route(Route::protein_detail_for)
}

fn title_cell() -> Renderer {
    Renderer::new("elided_title", |value, _| {
        let title = value.as_str().unwrap_or_default();
        if title.chars().count() > TITLE_CELL_CHARS {
            let short: String = title.chars().take(TITLE_CELL_CHARS - 1).collect();
            format!("{short}…")
        } else {
            title.to_string()
        }
    })
}
