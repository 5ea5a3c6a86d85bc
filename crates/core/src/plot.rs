//! Chart-library-agnostic plot descriptors and the generators page
//! configurations build them from.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::fields::value_to_plain;
use crate::types::Record;

/// Label used for rows where the grouped field is blank.
pub const UNKNOWN_LABEL: &str = "Unknown";

/// Maximum number of categories kept by [`count_by`] before the tail is
/// folded into an "Other" bucket.
pub const MAX_CATEGORIES: usize = 12;

/// Series data for one chart, independent of any rendering library.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PlotData {
    Bar { labels: Vec<String>, values: Vec<f64> },
    Pie { labels: Vec<String>, values: Vec<f64> },
    Histogram { bin_edges: Vec<f64>, counts: Vec<u64> },
    Scatter { x: Vec<f64>, y: Vec<f64>, labels: Vec<String> },
}

impl PlotData {
    /// `true` when the series has nothing to draw.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Bar { values, .. } | Self::Pie { values, .. } => values.is_empty(),
            Self::Histogram { counts, .. } => counts.iter().all(|c| *c == 0),
            Self::Scatter { x, .. } => x.is_empty(),
        }
    }
}

/// Axis titles and sizing hints.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PlotLayout {
    pub x_title: Option<String>,
    pub y_title: Option<String>,
    pub height: Option<u32>,
}

impl PlotLayout {
    pub fn axes(x: impl Into<String>, y: impl Into<String>) -> Self {
        Self {
            x_title: Some(x.into()),
            y_title: Some(y.into()),
            height: None,
        }
    }
}

type GenerateFn = dyn Fn(&[Record], Option<&Value>) -> PlotData + Send + Sync;

/// A chart panel: a pure function of (current rows, statistics payload).
#[derive(Clone)]
pub struct PlotConfig {
    pub title: String,
    pub layout: PlotLayout,
    generate: Arc<GenerateFn>,
}

impl PlotConfig {
    pub fn new(
        title: impl Into<String>,
        layout: PlotLayout,
        generate: impl Fn(&[Record], Option<&Value>) -> PlotData + Send + Sync + 'static,
    ) -> Self {
        Self {
            title: title.into(),
            layout,
            generate: Arc::new(generate),
        }
    }

    pub fn generate(&self, rows: &[Record], stats: Option<&Value>) -> PlotData {
        (self.generate)(rows, stats)
    }
}

impl fmt::Debug for PlotConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlotConfig")
            .field("title", &self.title)
            .field("layout", &self.layout)
            .finish_non_exhaustive()
    }
}

/// A generated panel ready to hand to a renderer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedPlot {
    pub title: String,
    pub layout: PlotLayout,
    pub data: PlotData,
}

// ---------------------------------------------------------------------------
// Generators
// ---------------------------------------------------------------------------

/// Numeric value of `field`, accepting numbers and numeric strings.
pub fn numeric_field(row: &Record, field: &str) -> Option<f64> {
    match row.get(field)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Count rows per distinct value of `field`, most frequent first.
///
/// Ties are ordered by label. Categories beyond [`MAX_CATEGORIES`] are
/// summed into a trailing "Other" bucket.
pub fn count_by(rows: &[Record], field: &str) -> (Vec<String>, Vec<f64>) {
    let mut counts: BTreeMap<String, u64> = BTreeMap::new();
    for row in rows {
        let label = match row.get(field) {
            None | Some(Value::Null) => UNKNOWN_LABEL.to_string(),
            Some(Value::String(s)) if s.trim().is_empty() => UNKNOWN_LABEL.to_string(),
            Some(v) => value_to_plain(v),
        };
        *counts.entry(label).or_default() += 1;
    }

    let mut sorted: Vec<(String, u64)> = counts.into_iter().collect();
    sorted.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    if sorted.len() > MAX_CATEGORIES {
        let other: u64 = sorted[MAX_CATEGORIES - 1..].iter().map(|(_, c)| c).sum();
        sorted.truncate(MAX_CATEGORIES - 1);
        sorted.push(("Other".to_string(), other));
    }

    sorted
        .into_iter()
        .map(|(label, count)| (label, count as f64))
        .unzip()
}

/// Bar chart of [`count_by`].
pub fn bar_counts(rows: &[Record], field: &str) -> PlotData {
    let (labels, values) = count_by(rows, field);
    PlotData::Bar { labels, values }
}

/// Pie chart of [`count_by`].
pub fn pie_counts(rows: &[Record], field: &str) -> PlotData {
    let (labels, values) = count_by(rows, field);
    PlotData::Pie { labels, values }
}

/// Equal-width histogram over the numeric values of `field`.
///
/// Rows without a numeric value are skipped. `bins` is clamped to at
/// least 1; a constant series yields a single bin.
pub fn histogram(rows: &[Record], field: &str, bins: usize) -> PlotData {
    let values: Vec<f64> = rows.iter().filter_map(|r| numeric_field(r, field)).collect();
    let bins = bins.max(1);

    let (min, max) = match values.iter().copied().fold(None, |acc: Option<(f64, f64)>, v| {
        Some(acc.map_or((v, v), |(lo, hi)| (lo.min(v), hi.max(v))))
    }) {
        Some(bounds) => bounds,
        None => {
            return PlotData::Histogram {
                bin_edges: Vec::new(),
                counts: Vec::new(),
            }
        }
    };

    if (max - min).abs() < f64::EPSILON {
        return PlotData::Histogram {
            bin_edges: vec![min, max],
            counts: vec![values.len() as u64],
        };
    }

    let width = (max - min) / bins as f64;
    let bin_edges: Vec<f64> = (0..=bins).map(|i| min + width * i as f64).collect();
    let mut counts = vec![0u64; bins];
    for v in values {
        let idx = (((v - min) / width) as usize).min(bins - 1);
        counts[idx] += 1;
    }

    PlotData::Histogram { bin_edges, counts }
}

/// Scatter of two numeric fields, labelled by `label_field`.
pub fn scatter(rows: &[Record], x_field: &str, y_field: &str, label_field: &str) -> PlotData {
    let mut x = Vec::new();
    let mut y = Vec::new();
    let mut labels = Vec::new();
    for row in rows {
        if let (Some(xv), Some(yv)) = (numeric_field(row, x_field), numeric_field(row, y_field)) {
            x.push(xv);
            y.push(yv);
            labels.push(row.get(label_field).map(value_to_plain).unwrap_or_default());
        }
    }
    PlotData::Scatter { x, y, labels }
}

/// Bar series read from a statistics payload.
///
/// Accepts `stats[key]` as either an object of `label -> number` or an
/// array of `{label|name|_id, count|value}` objects. Missing or malformed
/// payloads yield an empty series.
pub fn stats_series(stats: Option<&Value>, key: &str) -> PlotData {
    let mut labels = Vec::new();
    let mut values = Vec::new();

    match stats.and_then(|s| s.get(key)) {
        Some(Value::Object(map)) => {
            for (label, v) in map {
                if let Some(n) = v.as_f64() {
                    labels.push(label.clone());
                    values.push(n);
                }
            }
        }
        Some(Value::Array(items)) => {
            for item in items {
                let label = ["label", "name", "_id"]
                    .iter()
                    .find_map(|k| item.get(*k))
                    .map(value_to_plain);
                let value = ["count", "value"]
                    .iter()
                    .find_map(|k| item.get(*k))
                    .and_then(Value::as_f64);
                if let (Some(label), Some(value)) = (label, value) {
                    labels.push(label);
                    values.push(value);
                }
            }
        }
        _ => {}
    }

    PlotData::Bar { labels, values }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rows(values: Vec<Value>) -> Vec<Record> {
        values
            .into_iter()
            .map(|v| v.as_object().cloned().expect("object"))
            .collect()
    }

    #[test]
    fn count_by_orders_by_frequency_then_label() {
        let data = rows(vec![
            json!({ "organism": "Homo sapiens" }),
            json!({ "organism": "E. coli" }),
            json!({ "organism": "Homo sapiens" }),
            json!({ "organism": null }),
        ]);
        let (labels, values) = count_by(&data, "organism");
        assert_eq!(labels, ["Homo sapiens", "E. coli", "Unknown"]);
        assert_eq!(values, [2.0, 1.0, 1.0]);
    }

    #[test]
    fn count_by_folds_long_tail_into_other() {
        let data: Vec<Record> = (0..20)
            .map(|i| json!({ "c": format!("class-{i:02}") }).as_object().cloned().unwrap())
            .collect();
        let (labels, values) = count_by(&data, "c");
        assert_eq!(labels.len(), MAX_CATEGORIES);
        assert_eq!(labels.last().map(String::as_str), Some("Other"));
        assert_eq!(values.iter().sum::<f64>(), 20.0);
    }

    #[test]
    fn histogram_bins_values() {
        let data = rows(vec![
            json!({ "resolution": 1.0 }),
            json!({ "resolution": "2.0" }),
            json!({ "resolution": 3.0 }),
            json!({ "resolution": null }),
        ]);
        match histogram(&data, "resolution", 2) {
            PlotData::Histogram { bin_edges, counts } => {
                assert_eq!(bin_edges, [1.0, 2.0, 3.0]);
                assert_eq!(counts, [1, 2]);
            }
            other => panic!("expected histogram, got {other:?}"),
        }
    }

    #[test]
    fn histogram_of_nothing_is_empty() {
        assert!(histogram(&[], "resolution", 10).is_empty());
    }

    #[test]
    fn scatter_skips_incomplete_rows() {
        let data = rows(vec![
            json!({ "pdb_id": "1ABC", "resolution": 1.5, "r_value_free": 0.2 }),
            json!({ "pdb_id": "2XYZ", "resolution": 2.5 }),
        ]);
        assert_eq!(
            scatter(&data, "resolution", "r_value_free", "pdb_id"),
            PlotData::Scatter {
                x: vec![1.5],
                y: vec![0.2],
                labels: vec!["1ABC".into()],
            }
        );
    }

    #[test]
    fn stats_series_reads_both_payload_shapes() {
        let as_map = json!({ "by_method": { "X-RAY": 10, "NMR": 2 } });
        assert_eq!(
            stats_series(Some(&as_map), "by_method"),
            PlotData::Bar {
                labels: vec!["NMR".into(), "X-RAY".into()],
                values: vec![2.0, 10.0],
            }
        );

        let as_list = json!({ "by_method": [{ "_id": "EM", "count": 4 }, { "name": "bad" }] });
        assert_eq!(
            stats_series(Some(&as_list), "by_method"),
            PlotData::Bar {
                labels: vec!["EM".into()],
                values: vec![4.0],
            }
        );

        assert!(stats_series(None, "by_method").is_empty());
    }
}
