//! Debounced global search box with search-history recording.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use pdbw_client::search::MIN_QUERY_CHARS;
use pdbw_client::{GlobalSearch, SearchHit, Session};
use pdbw_core::history::{HistoryEntry, SearchHistory};
use pdbw_core::pdb::PdbId;
use pdbw_core::routes::Route;

use crate::error::ViewResult;

/// Quiet period after the last keystroke before a search is sent.
pub const DEBOUNCE: Duration = Duration::from_millis(300);

/// History `type` recorded for global-search selections.
pub const GLOBAL_SEARCH_KIND: &str = "global";

/// Outcome of one keystroke.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchUpdate {
    /// Results for the latest query.
    Results(Vec<SearchHit>),
    /// A newer keystroke arrived; the caller should ignore this one.
    Superseded,
}

/// Global search input that waits for typing to pause and only ever
/// reports the newest query's results.
pub struct DebouncedSearch {
    search: GlobalSearch,
    session: Arc<Session>,
    delay: Duration,
    generation: AtomicU64,
    pending: Mutex<Option<CancellationToken>>,
}

impl DebouncedSearch {
    pub fn new(search: GlobalSearch, session: Arc<Session>) -> Self {
        Self::with_delay(search, session, DEBOUNCE)
    }

    pub fn with_delay(search: GlobalSearch, session: Arc<Session>, delay: Duration) -> Self {
        Self {
            search,
            session,
            delay,
            generation: AtomicU64::new(0),
            pending: Mutex::new(None),
        }
    }

    /// Handle a change of the input text.
    ///
    /// Cancels any earlier pending wait. Queries shorter than two
    /// characters resolve to no results without touching the network.
    pub async fn input(&self, query: &str) -> SearchUpdate {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let token = CancellationToken::new();
        if let Ok(mut pending) = self.pending.lock() {
            if let Some(previous) = pending.replace(token.clone()) {
                previous.cancel();
            }
        }

        if query.trim().chars().count() < MIN_QUERY_CHARS {
            return SearchUpdate::Results(Vec::new());
        }

        tokio::select! {
            _ = token.cancelled() => return SearchUpdate::Superseded,
            _ = tokio::time::sleep(self.delay) => {}
        }

        let hits = self.search.search(query).await;
        if self.generation.load(Ordering::SeqCst) != generation {
            tracing::debug!(query, generation, "Dropping superseded search results");
            return SearchUpdate::Superseded;
        }
        SearchUpdate::Results(hits)
    }

    /// Record the query in the history and return the hit's detail route.
    pub async fn select(&self, query: &str, hit: &SearchHit) -> ViewResult<Route> {
        let route = Route::ProteinDetail(PdbId::parse(&hit.pdb_id)?);
        self.session
            .record_search(HistoryEntry::now(query.trim(), GLOBAL_SEARCH_KIND))
            .await?;
        Ok(route)
    }

    pub async fn history(&self) -> SearchHistory {
        self.session.search_history().await
    }

    pub async fn clear_history(&self) -> ViewResult<()> {
        self.session.clear_search_history().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use pdbw_client::SearchSource;
    use pdbw_core::history::MAX_HISTORY_ENTRIES;
    use pdbw_core::ResourceKind;

    use super::*;
    use crate::testing::{Call, MockService};

    struct Fixture {
        proteins: Arc<MockService>,
        search: DebouncedSearch,
    }

    fn fixture() -> Fixture {
        let proteins = Arc::new(MockService::new(
            ResourceKind::ProteinInfo,
            &["pdb_id"],
            vec![
                json!({ "pdb_id": "1LYZ", "title": "Lysozyme" }),
                json!({ "pdb_id": "2HHB", "title": "Hemoglobin" }),
            ],
        ));
        let experiments = Arc::new(MockService::new(
            ResourceKind::ExperimentalData,
            &["pdb_id"],
            vec![json!({ "pdb_id": "1LYZ", "method": "lysozyme soak" })],
        ));
        let molecules = Arc::new(MockService::new(ResourceKind::Macromolecules, &["id"], vec![]));
        let global = GlobalSearch::new(proteins.clone(), experiments, molecules);
        Fixture {
            proteins,
            search: DebouncedSearch::new(global, Arc::new(Session::in_memory())),
        }
    }

    fn search_calls(service: &MockService) -> usize {
        service.count_calls(|c| matches!(c, Call::Search(..)))
    }

    #[tokio::test(start_paused = true)]
    async fn only_latest_keystroke_searches() {
        let f = fixture();

        let (first, second) = tokio::join!(f.search.input("lys"), async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            f.search.input("lyso").await
        });

        assert_eq!(first, SearchUpdate::Superseded);
        let SearchUpdate::Results(hits) = second else {
            panic!("expected results");
        };
        // Deduplicated across protein info and experimental data.
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].source, SearchSource::ProteinInfo);
        assert_eq!(search_calls(&f.proteins), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn short_query_skips_network() {
        let f = fixture();
        assert_eq!(f.search.input(" l ").await, SearchUpdate::Results(Vec::new()));
        assert_eq!(search_calls(&f.proteins), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn short_query_cancels_pending_search() {
        let f = fixture();
        let (first, second) = tokio::join!(f.search.input("hemo"), async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            f.search.input("h").await
        });
        assert_eq!(first, SearchUpdate::Superseded);
        assert_eq!(second, SearchUpdate::Results(Vec::new()));
        assert_eq!(search_calls(&f.proteins), 0);
    }

    #[tokio::test]
    async fn selecting_records_history_newest_first() {
        let f = fixture();
        let hit = SearchHit {
            pdb_id: "2hhb".into(),
            title: "Hemoglobin".into(),
            subtitle: None,
            source: SearchSource::ProteinInfo,
        };

        for i in 0..12 {
            f.search.select(&format!("query {i}"), &hit).await.unwrap();
        }
        let route = f.search.select("hemoglobin", &hit).await.unwrap();
        assert_eq!(route.path(), "/protein/2HHB");

        let history = f.search.history().await;
        assert_eq!(history.len(), MAX_HISTORY_ENTRIES);
        assert_eq!(history.entries()[0].query, "hemoglobin");
        assert_eq!(history.entries()[0].kind, GLOBAL_SEARCH_KIND);

        f.search.clear_history().await.unwrap();
        assert!(f.search.history().await.is_empty());
    }
}
