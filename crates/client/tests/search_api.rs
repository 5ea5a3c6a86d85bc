//! Global and advanced search against the in-process fake.

mod common;

use std::sync::Arc;

use serde_json::json;

use common::FakeBackend;
use pdbw_client::{GlobalSearch, ListQuery, SearchClient, SearchSource, ServiceRegistry, Session};
use pdbw_core::filter::SearchFilter;

fn seed(backend: &FakeBackend) {
    backend.seed(
        "protein-info",
        vec![
            json!({ "pdb_id": "1HHO", "title": "Hemoglobin", "organism": "Homo sapiens" }),
            json!({ "pdb_id": "2HHB", "title": "Deoxy hemoglobin", "organism": "Homo sapiens" }),
        ],
    );
    backend.seed(
        "experimental-data",
        vec![
            json!({ "pdb_id": "1HHO", "method": "X-RAY DIFFRACTION hemoglobin" }),
            json!({ "pdb_id": "4HHB", "method": "X-RAY DIFFRACTION hemoglobin" }),
        ],
    );
    backend.seed(
        "macromolecules",
        vec![json!({ "id": 1, "pdb_id": "5HHB", "molecule_name": "Hemoglobin alpha" })],
    );
}

fn global(backend: &FakeBackend) -> GlobalSearch {
    let registry =
        ServiceRegistry::from_config(&backend.config(), Arc::new(Session::in_memory())).unwrap();
    GlobalSearch::from_registry(&registry).unwrap()
}

#[tokio::test]
async fn global_search_dedupes_across_sources() {
    let backend = FakeBackend::start().await;
    seed(&backend);

    let hits = global(&backend).search("hemoglobin").await;
    let ids: Vec<_> = hits.iter().map(|h| h.pdb_id.as_str()).collect();
    assert_eq!(ids, ["1HHO", "2HHB", "4HHB", "5HHB"]);
    assert_eq!(hits[0].source, SearchSource::ProteinInfo);
    assert_eq!(hits[2].source, SearchSource::ExperimentalData);

    let limits: Vec<_> = backend
        .requests()
        .into_iter()
        .map(|r| (r.path, r.query["limit"].clone()))
        .collect();
    assert!(limits.contains(&("/api/protein-info/search".into(), "5".into())));
    assert!(limits.contains(&("/api/experimental-data/search".into(), "3".into())));
    assert!(limits.contains(&("/api/macromolecules/search".into(), "3".into())));
}

#[tokio::test]
async fn failing_source_is_skipped() {
    let backend = FakeBackend::start().await;
    seed(&backend);
    backend.fail_search("experimental-data");

    let hits = global(&backend).search("hemoglobin").await;
    assert!(hits.iter().all(|h| h.source != SearchSource::ExperimentalData));
    assert_eq!(hits.len(), 3);
}

#[tokio::test]
async fn short_queries_send_nothing() {
    let backend = FakeBackend::start().await;
    seed(&backend);

    assert!(global(&backend).search(" h ").await.is_empty());
    assert!(backend.requests().is_empty());
}

#[tokio::test]
async fn advanced_search_sends_discrete_params() {
    let backend = FakeBackend::start().await;
    seed(&backend);
    let transport = backend.transport(Arc::new(Session::in_memory()));
    let search = SearchClient::new(transport);

    let filter = SearchFilter {
        organism: Some("Homo sapiens".into()),
        resolution_max: Some(2.5),
        has_ligands: Some(true),
        ..Default::default()
    };
    let page = search.advanced(&filter, &ListQuery::page(25, 0)).await.unwrap();
    assert_eq!(page.total, 2);

    let request = backend.last_request();
    assert_eq!(request.path, "/api/search");
    assert_eq!(request.query["organism"], "Homo sapiens");
    assert_eq!(request.query["resolution_max"], "2.5");
    assert_eq!(request.query["has_ligands"], "true");
    assert_eq!(request.query["limit"], "25");
}

#[tokio::test]
async fn invalid_filter_is_rejected_locally() {
    let backend = FakeBackend::start().await;
    let search = SearchClient::new(backend.transport(Arc::new(Session::in_memory())));

    let filter = SearchFilter {
        resolution_min: Some(3.0),
        resolution_max: Some(1.0),
        ..Default::default()
    };
    assert!(search.advanced(&filter, &ListQuery::default()).await.is_err());
    assert!(backend.requests().is_empty());
}
