//! Recent-search history persisted alongside the session.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::types::Timestamp;

/// Maximum number of history entries retained.
pub const MAX_HISTORY_ENTRIES: usize = 10;

/// One remembered search. Serialised as `{query, type, timestamp}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub query: String,
    /// Which search produced it, e.g. `"global"` or `"advanced"`.
    #[serde(rename = "type")]
    pub kind: String,
    pub timestamp: Timestamp,
}

impl HistoryEntry {
    pub fn now(query: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            kind: kind.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Newest-first list of at most [`MAX_HISTORY_ENTRIES`] searches.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SearchHistory {
    entries: Vec<HistoryEntry>,
}

impl SearchHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode the persisted JSON array. Malformed input yields an empty
    /// history rather than an error; the list is re-capped on load.
    pub fn from_json(raw: &str) -> Self {
        match serde_json::from_str::<Vec<HistoryEntry>>(raw) {
            Ok(mut entries) => {
                entries.truncate(MAX_HISTORY_ENTRIES);
                Self { entries }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Discarding unreadable search history");
                Self::default()
            }
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.entries).unwrap_or_else(|_| "[]".to_string())
    }

    /// Record a search at the front. A previous entry with the same query
    /// and kind is removed first; the oldest entry is evicted past the cap.
    /// Blank queries are ignored.
    pub fn push(&mut self, entry: HistoryEntry) {
        if entry.query.trim().is_empty() {
            return;
        }
        self.entries
            .retain(|e| !(e.query == entry.query && e.kind == entry.kind));
        self.entries.insert(0, entry);
        self.entries.truncate(MAX_HISTORY_ENTRIES);
    }

    pub fn remove(&mut self, query: &str) {
        self.entries.retain(|e| e.query != query);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eleventh_entry_evicts_oldest() {
        let mut history = SearchHistory::new();
        for i in 0..11 {
            history.push(HistoryEntry::now(format!("q{i}"), "global"));
        }
        assert_eq!(history.len(), MAX_HISTORY_ENTRIES);
        assert_eq!(history.entries()[0].query, "q10");
        assert_eq!(history.entries()[9].query, "q1");
        assert!(history.entries().iter().all(|e| e.query != "q0"));
    }

    #[test]
    fn repeated_query_moves_to_front() {
        let mut history = SearchHistory::new();
        history.push(HistoryEntry::now("lysozyme", "global"));
        history.push(HistoryEntry::now("hemoglobin", "global"));
        history.push(HistoryEntry::now("lysozyme", "global"));
        let queries: Vec<_> = history.entries().iter().map(|e| e.query.as_str()).collect();
        assert_eq!(queries, ["lysozyme", "hemoglobin"]);
    }

    #[test]
    fn blank_queries_are_ignored() {
        let mut history = SearchHistory::new();
        history.push(HistoryEntry::now("   ", "global"));
        assert!(history.is_empty());
    }

    #[test]
    fn json_uses_type_key_and_survives_garbage() {
        let mut history = SearchHistory::new();
        history.push(HistoryEntry::now("1abc", "advanced"));
        let raw = history.to_json();
        assert!(raw.contains("\"type\":\"advanced\""));
        assert_eq!(SearchHistory::from_json(&raw), history);
        assert!(SearchHistory::from_json("not json").is_empty());
    }
}
