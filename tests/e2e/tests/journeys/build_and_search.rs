//! Journey: build artifacts from a dataset on disk, then query them
//!
//! Covers the whole happy path: JSONL dataset -> embed -> index + identity map
//! committed -> reopened engine -> ranked, enriched results.

use janitor_core::{
    text, EmbeddingProvider, HashingEmbedder, IdentityMap, Lookup, RecordId, VectorIndex,
};
use janitor_e2e_tests::{TestDataFactory, TestWorkspace, FIXTURE_DIMENSIONS};

fn provider() -> HashingEmbedder {
    HashingEmbedder::new(FIXTURE_DIMENSIONS)
}

fn built_workspace() -> TestWorkspace {
    let ws = TestWorkspace::new();
    ws.write_dataset(&TestDataFactory::questions());
    ws.build(&provider()).expect("build should succeed");
    ws
}

#[test]
fn test_artifact_lengths_agree_with_dataset() {
    let ws = built_workspace();

    let map = IdentityMap::load(&ws.map_path()).unwrap();
    let index = VectorIndex::load(&ws.index_path(), FIXTURE_DIMENSIONS).unwrap();
    let dataset = ws.load_dataset().unwrap();

    assert_eq!(map.len(), dataset.len());
    assert_eq!(index.len(), dataset.len());

    // Ordinals follow dataset order
    for (ordinal, key) in map.iter() {
        assert_eq!(dataset.records()[ordinal].id, key);
    }
}

#[test]
fn test_provenance_recorded() {
    let ws = built_workspace();
    let map = IdentityMap::load(&ws.map_path()).unwrap();
    let provenance = map.provenance().expect("provenance should be recorded");

    assert_eq!(provenance.model, "hashing-256");
    assert_eq!(provenance.dimensions, FIXTURE_DIMENSIONS);
}

#[test]
fn test_topical_queries_rank_expected_question_first() {
    let ws = built_workspace();
    let engine = ws.open_engine(provider()).unwrap();

    for (query, expected) in TestDataFactory::topical_queries() {
        let results = engine.query(query, 5).unwrap();
        assert_eq!(results.len(), 5, "query {:?}", query);
        assert_eq!(results[0].rank, 1);
        assert_eq!(
            results[0].lookup.record().map(|r| r.id),
            Some(expected),
            "query {:?}",
            query
        );
    }
}

#[test]
fn test_results_non_decreasing_in_distance() {
    let ws = built_workspace();
    let engine = ws.open_engine(provider()).unwrap();

    let results = engine.query("python pandas recursion column", 12).unwrap();
    assert_eq!(results.len(), 12);
    for pair in results.windows(2) {
        assert!(pair[0].distance <= pair[1].distance);
        assert_eq!(pair[0].rank + 1, pair[1].rank);
    }
}

#[test]
fn test_k_larger_than_corpus_returns_everything() {
    let ws = built_workspace();
    let engine = ws.open_engine(provider()).unwrap();

    let results = engine.query("docker", 100).unwrap();
    assert_eq!(results.len(), TestDataFactory::questions().len());
}

#[test]
fn test_self_retrieval() {
    let ws = built_workspace();
    let engine = ws.open_engine(provider()).unwrap();

    for (ordinal, record) in TestDataFactory::questions().iter().enumerate() {
        let query = format!("{} {}", record.title, record.body);
        let results = engine.query(&query, 3).unwrap();

        assert_eq!(results[0].ordinal, ordinal, "record {}", record.id);
        assert!(results[0].distance < 1e-4, "record {}", record.id);
        assert!(results[1].distance > results[0].distance);
    }
}

#[test]
fn test_round_trip_preserves_search() {
    let ws = TestWorkspace::new();
    ws.write_dataset(&TestDataFactory::questions());
    let built = ws.build(&provider()).unwrap();
    let loaded = VectorIndex::load(&ws.index_path(), FIXTURE_DIMENSIONS).unwrap();

    let queries = ["undo git commit", "kubectl pod restarting", "email regex plus"];
    for query in queries {
        let normalized = text::normalize(query);
        let vector = provider().encode(&[normalized.as_str()]).unwrap().remove(0);
        assert_eq!(
            built.index.search(&vector, 5).unwrap(),
            loaded.search(&vector, 5).unwrap(),
            "query {:?}",
            query
        );
    }
}

#[test]
fn test_python_over_java_scenario() {
    let ws = TestWorkspace::new();
    ws.write_dataset(&TestDataFactory::python_and_java());
    ws.build(&provider()).unwrap();
    let engine = ws.open_engine(provider()).unwrap();

    let results = engine.query("python recursion", 2).unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].lookup.record().unwrap().id, RecordId(1));
    assert_eq!(results[1].lookup.record().unwrap().id, RecordId(2));
}

#[test]
fn test_markup_in_query_is_ignored() {
    let ws = built_workspace();
    let engine = ws.open_engine(provider()).unwrap();

    let plain = engine.query("flexbox center div", 3).unwrap();
    let marked = engine
        .query("<p><b>flexbox</b>\n\n   center <code>div</code></p>", 3)
        .unwrap();
    assert_eq!(plain, marked);
}

#[test]
fn test_whitespace_query_returns_no_results() {
    let ws = built_workspace();
    let engine = ws.open_engine(provider()).unwrap();

    assert!(engine.query("   <br/>  \n", 5).unwrap().is_empty());
}

#[test]
fn test_results_serialize_with_status() {
    let ws = built_workspace();
    let engine = ws.open_engine(provider()).unwrap();

    let results = engine.query("docker container exits", 1).unwrap();
    let json = serde_json::to_value(&results).unwrap();
    let first = &json[0];

    assert_eq!(first["rank"], 1);
    assert_eq!(first["status"], "found");
    assert_eq!(first["record"]["id"], 17);
    assert_eq!(first["record"]["tags"], "<docker>");
    assert!(matches!(results[0].lookup, Lookup::Found { .. }));
}
