//! Global search fan-out and the structured advanced search endpoint.

use std::collections::HashSet;
use std::sync::Arc;

use pdbw_core::fields::{is_blank, value_to_plain};
use pdbw_core::filter::SearchFilter;
use pdbw_core::{Record, ResourceKind};

use crate::error::ClientError;
use crate::resource::{ListPage, ListQuery};
use crate::service::{ApiService, ServiceRegistry};
use crate::transport::HttpTransport;

/// Maximum hits returned by one global search.
pub const MAX_GLOBAL_RESULTS: usize = 10;

/// Queries shorter than this (after trimming) are not sent.
pub const MIN_QUERY_CHARS: usize = 2;

// ---------------------------------------------------------------------------
// Sources and hits
// ---------------------------------------------------------------------------

/// A resource queried by the global search, in merge order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchSource {
    ProteinInfo,
    ExperimentalData,
    Macromolecule,
}

impl SearchSource {
    pub const ALL: [SearchSource; 3] = [
        Self::ProteinInfo,
        Self::ExperimentalData,
        Self::Macromolecule,
    ];

    pub fn resource(self) -> ResourceKind {
        match self {
            Self::ProteinInfo => ResourceKind::ProteinInfo,
            Self::ExperimentalData => ResourceKind::ExperimentalData,
            Self::Macromolecule => ResourceKind::Macromolecules,
        }
    }

    /// Per-source result cap sent as `limit`.
    pub fn cap(self) -> u32 {
        match self {
            Self::ProteinInfo => 5,
            Self::ExperimentalData | Self::Macromolecule => 3,
        }
    }

    /// Icon name shown next to a hit.
    pub fn icon(self) -> &'static str {
        match self {
            Self::ProteinInfo => "protein",
            Self::ExperimentalData => "science",
            Self::Macromolecule => "biotech",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::ProteinInfo => "Protein",
            Self::ExperimentalData => "Experiment",
            Self::Macromolecule => "Macromolecule",
        }
    }

    /// Build the display hit for one row from this source.
    fn hit(self, row: &Record) -> Option<SearchHit> {
        let field = |name: &str| {
            row.get(name)
                .filter(|v| !is_blank(Some(v)))
                .map(value_to_plain)
        };
        let pdb_id = field("pdb_id")?;
        let (title, subtitle) = match self {
            Self::ProteinInfo => (
                field("title").unwrap_or_else(|| pdb_id.clone()),
                field("organism"),
            ),
            Self::ExperimentalData => (
                format!("{pdb_id} ({})", field("method").unwrap_or_else(|| "Unknown method".into())),
                field("resolution").map(|r| format!("{r} Å")),
            ),
            Self::Macromolecule => (
                field("molecule_name").unwrap_or_else(|| pdb_id.clone()),
                field("organism"),
            ),
        };
        Some(SearchHit {
            pdb_id,
            title,
            subtitle,
            source: self,
        })
    }
}

/// One merged global-search result.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub pdb_id: String,
    pub title: String,
    pub subtitle: Option<String>,
    pub source: SearchSource,
}

/// Merge per-source hits in source order, keep the first hit per `pdb_id`,
/// and cap the total at [`MAX_GLOBAL_RESULTS`].
pub fn merge_hits<I>(batches: I) -> Vec<SearchHit>
where
    I: IntoIterator<Item = Vec<SearchHit>>,
{
    let mut seen = HashSet::new();
    batches
        .into_iter()
        .flatten()
        .filter(|hit| seen.insert(hit.pdb_id.clone()))
        .take(MAX_GLOBAL_RESULTS)
        .collect()
}

// ---------------------------------------------------------------------------
// GlobalSearch
// ---------------------------------------------------------------------------

/// Parallel search across protein info, experimental data and
/// macromolecules.
#[derive(Clone)]
pub struct GlobalSearch {
    protein_info: Arc<dyn ApiService>,
    experimental_data: Arc<dyn ApiService>,
    macromolecules: Arc<dyn ApiService>,
}

impl GlobalSearch {
    pub fn new(
        protein_info: Arc<dyn ApiService>,
        experimental_data: Arc<dyn ApiService>,
        macromolecules: Arc<dyn ApiService>,
    ) -> Self {
        Self {
            protein_info,
            experimental_data,
            macromolecules,
        }
    }

    pub fn from_registry(registry: &ServiceRegistry) -> Result<Self, ClientError> {
        Ok(Self::new(
            registry.get(ResourceKind::ProteinInfo)?,
            registry.get(ResourceKind::ExperimentalData)?,
            registry.get(ResourceKind::Macromolecules)?,
        ))
    }

    /// Run all three searches concurrently and merge the results.
    ///
    /// A failing source contributes nothing; the failure is only logged.
    pub async fn search(&self, query: &str) -> Vec<SearchHit> {
        let query = query.trim();
        if query.chars().count() < MIN_QUERY_CHARS {
            return Vec::new();
        }

        let (proteins, experiments, molecules) = futures::join!(
            query_source(self.protein_info.as_ref(), SearchSource::ProteinInfo, query),
            query_source(self.experimental_data.as_ref(), SearchSource::ExperimentalData, query),
            query_source(self.macromolecules.as_ref(), SearchSource::Macromolecule, query),
        );

        let hits = merge_hits([proteins, experiments, molecules]);
        tracing::debug!(query, hits = hits.len(), "Global search finished");
        hits
    }
}

async fn query_source(service: &dyn ApiService, source: SearchSource, query: &str) -> Vec<SearchHit> {
    match service.search(query, source.cap()).await {
        Ok(rows) => rows
            .iter()
            .take(source.cap() as usize)
            .filter_map(|row| source.hit(row))
            .collect(),
        Err(e) => {
            tracing::warn!(source = source.label(), error = %e, "Search source failed");
            Vec::new()
        }
    }
}

// ---------------------------------------------------------------------------
// Advanced search
// ---------------------------------------------------------------------------

/// Structured search over `GET <api_url>/search`.
#[derive(Clone)]
pub struct SearchClient {
    transport: HttpTransport,
}

impl SearchClient {
    pub fn new(transport: HttpTransport) -> Self {
        Self { transport }
    }

    /// Validate `filter` and send it as discrete query parameters.
    pub async fn advanced(&self, filter: &SearchFilter, paging: &ListQuery) -> Result<ListPage, ClientError> {
        let mut params = filter.to_query_params()?;
        params.extend(paging.to_params());
        let value = self.transport.get(self.transport.url(["search"]), &params).await?;
        tracing::info!(params = params.len(), "Advanced search");
        ListPage::from_value(value)
    }
}

/// Text of the best display field for an advanced-search row.
pub fn row_title(row: &Record) -> String {
    ["title", "molecule_name", "name", "pdb_id"]
        .iter()
        .filter_map(|key| row.get(*key))
        .find(|v| !is_blank(Some(v)))
        .map(value_to_plain)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn hit(pdb: &str, source: SearchSource) -> SearchHit {
        SearchHit {
            pdb_id: pdb.into(),
            title: pdb.into(),
            subtitle: None,
            source,
        }
    }

    #[test]
    fn merge_keeps_first_source_for_duplicate_pdb_ids() {
        let merged = merge_hits([
            vec![hit("1ABC", SearchSource::ProteinInfo)],
            vec![hit("1ABC", SearchSource::ExperimentalData), hit("2XYZ", SearchSource::ExperimentalData)],
        ]);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].source, SearchSource::ProteinInfo);
        assert_eq!(merged[1].pdb_id, "2XYZ");
    }

    #[test]
    fn merge_truncates_to_ten() {
        let batch: Vec<_> = (0..15)
            .map(|i| hit(&format!("{i}AAA"), SearchSource::ProteinInfo))
            .collect();
        assert_eq!(merge_hits([batch]).len(), MAX_GLOBAL_RESULTS);
    }

    #[test]
    fn hits_need_a_pdb_id() {
        let row = json!({ "title": "Orphan" });
        assert!(SearchSource::ProteinInfo.hit(row.as_object().unwrap()).is_none());
    }

    #[test]
    fn experiment_hit_mentions_method_and_resolution() {
        let row = json!({ "pdb_id": "1ABC", "method": "X-RAY DIFFRACTION", "resolution": 1.8 });
        let hit = SearchSource::ExperimentalData.hit(row.as_object().unwrap()).unwrap();
        assert_eq!(hit.title, "1ABC (X-RAY DIFFRACTION)");
        assert_eq!(hit.subtitle.as_deref(), Some("1.8 Å"));
    }

    #[test]
    fn caps_match_sources() {
        assert_eq!(SearchSource::ProteinInfo.cap(), 5);
        assert_eq!(SearchSource::ExperimentalData.cap(), 3);
        assert_eq!(SearchSource::Macromolecule.cap(), 3);
    }

    #[test]
    fn row_title_falls_through_blank_fields() {
        let row = json!({ "title": "", "molecule_name": "Lysozyme", "pdb_id": "1LYZ" });
        assert_eq!(row_title(row.as_object().unwrap()), "Lysozyme");
    }
}
