//! Plain-text rendering of view state.

use pdbw_core::plot::{PlotData, RenderedPlot};
use pdbw_views::table::DisplayField;
use pdbw_views::{Severity, Snackbar};

/// Widest a table cell is allowed to grow.
const MAX_CELL_WIDTH: usize = 40;

/// Longest bar drawn for bar, pie and histogram plots.
const BAR_WIDTH: usize = 30;

fn clip(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut clipped: String = text.chars().take(width.saturating_sub(1)).collect();
    clipped.push('…');
    clipped
}

/// Render rows as aligned columns with the row id first.
pub fn table(headers: &[String], rows: &[(String, Vec<String>)]) -> String {
    let mut widths: Vec<usize> = std::iter::once("ID".len())
        .chain(headers.iter().map(|h| h.chars().count()))
        .collect();
    for (id, cells) in rows {
        widths[0] = widths[0].max(id.chars().count());
        for (i, cell) in cells.iter().enumerate() {
            if let Some(w) = widths.get_mut(i + 1) {
                *w = (*w).max(cell.chars().count());
            }
        }
    }
    for w in &mut widths {
        *w = (*w).min(MAX_CELL_WIDTH);
    }

    let line = |cells: Vec<&str>| -> String {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, w)| format!("{:<w$}", clip(cell, *w), w = *w))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut out = Vec::with_capacity(rows.len() + 1);
    out.push(line(std::iter::once("ID").chain(headers.iter().map(String::as_str)).collect()));
    for (id, cells) in rows {
        out.push(line(std::iter::once(id.as_str()).chain(cells.iter().map(String::as_str)).collect()));
    }
    out.join("\n")
}

/// Render label/value pairs one per line, labels aligned.
pub fn fields(fields: &[DisplayField]) -> String {
    let width = fields.iter().map(|f| f.label.chars().count()).max().unwrap_or(0);
    fields
        .iter()
        .map(|f| format!("{:<width$}  {}", f.label, f.value))
        .collect::<Vec<_>>()
        .join("\n")
}

fn bars(labels: &[String], values: &[f64]) -> Vec<String> {
    let max = values.iter().copied().fold(0.0_f64, f64::max);
    let width = labels.iter().map(|l| l.chars().count()).max().unwrap_or(0).min(MAX_CELL_WIDTH);
    labels
        .iter()
        .zip(values)
        .map(|(label, value)| {
            let len = if max > 0.0 {
                ((value / max) * BAR_WIDTH as f64).round() as usize
            } else {
                0
            };
            format!("{:<width$}  {:<BAR_WIDTH$}  {value}", clip(label, width), "#".repeat(len))
        })
        .collect()
}

/// Render one plot as a text chart.
pub fn plot(plot: &RenderedPlot) -> String {
    let mut out = vec![format!("== {} ==", plot.title)];
    if plot.data.is_empty() {
        out.push("(no data)".to_string());
        return out.join("\n");
    }
    match &plot.data {
        PlotData::Bar { labels, values } => out.extend(bars(labels, values)),
        PlotData::Pie { labels, values } => {
            let sum: f64 = values.iter().sum();
            let percent: Vec<f64> = values
                .iter()
                .map(|v| if sum > 0.0 { (v / sum * 1000.0).round() / 10.0 } else { 0.0 })
                .collect();
            let labels: Vec<String> = labels.iter().zip(&percent).map(|(l, p)| format!("{l} ({p}%)")).collect();
            out.extend(bars(&labels, values));
        }
        PlotData::Histogram { bin_edges, counts } => {
            let labels: Vec<String> = bin_edges
                .windows(2)
                .map(|edge| format!("{:.2}-{:.2}", edge[0], edge[1]))
                .collect();
            let values: Vec<f64> = counts.iter().map(|c| *c as f64).collect();
            out.extend(bars(&labels, &values));
        }
        PlotData::Scatter { x, y, labels } => {
            if let Some(x_title) = &plot.layout.x_title {
                out.push(format!("x: {x_title}, y: {}", plot.layout.y_title.as_deref().unwrap_or("")));
            }
            out.extend(
                x.iter()
                    .zip(y)
                    .zip(labels)
                    .map(|((x, y), label)| format!("{label}  ({x}, {y})")),
            );
        }
    }
    out.join("\n")
}

/// One line per snackbar, prefixed by its severity.
pub fn notices(snackbars: &[Snackbar]) -> Vec<String> {
    snackbars
        .iter()
        .map(|s| {
            let tag = match s.severity {
                Severity::Success => "ok",
                Severity::Info => "info",
                Severity::Warning => "warning",
                Severity::Error => "error",
            };
            format!("[{tag}] {}", s.message)
        })
        .collect()
}
