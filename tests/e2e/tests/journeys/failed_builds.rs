//! Journey: builds and opens that must fail cleanly
//!
//! A failed build never leaves partial artifacts, and an earlier good pair
//! survives a failed rebuild byte for byte.

use janitor_core::{
    build_artifacts, BuildOptions, Error, HashingEmbedder, IdentityMap, QueryEngine,
    VectorIndex,
};
use janitor_e2e_tests::{FailingProvider, TestDataFactory, TestWorkspace, FIXTURE_DIMENSIONS};

#[test]
fn test_capability_failure_leaves_no_artifacts() {
    let ws = TestWorkspace::new();
    ws.write_dataset(&TestDataFactory::questions());

    let provider = FailingProvider::new(FIXTURE_DIMENSIONS, 1);
    let result = ws.build(&provider);

    assert!(matches!(result, Err(Error::CapabilityFailure(_))));
    assert!(ws.has_no_artifacts());
}

#[test]
fn test_failure_in_later_batch_aborts_whole_build() {
    let ws = TestWorkspace::new();
    ws.write_dataset(&TestDataFactory::questions());
    let dataset = ws.load_dataset().unwrap();

    let provider = FailingProvider::new(FIXTURE_DIMENSIONS, 2);
    let options = BuildOptions {
        batch_size: 4,
        ..BuildOptions::default()
    };
    let result = build_artifacts(&dataset, &provider, &options);

    assert!(matches!(result, Err(Error::CapabilityFailure(_))));
    assert_eq!(provider.calls(), 2);
    assert!(ws.has_no_artifacts());
}

#[test]
fn test_failed_rebuild_keeps_previous_artifacts() {
    let ws = TestWorkspace::new();
    ws.write_dataset(&TestDataFactory::questions());
    ws.build(&HashingEmbedder::new(FIXTURE_DIMENSIONS)).unwrap();
    let before = ws.artifact_bytes();

    ws.write_dataset(&TestDataFactory::questions_without(&[11]));
    let result = ws.build(&FailingProvider::new(FIXTURE_DIMENSIONS, 1));

    assert!(result.is_err());
    assert_eq!(ws.artifact_bytes(), before);
}

#[test]
fn test_missing_dataset_is_input_missing() {
    let ws = TestWorkspace::new();
    let result = ws.build(&HashingEmbedder::new(FIXTURE_DIMENSIONS));

    assert!(matches!(result, Err(Error::InputMissing(path)) if path == ws.dataset_path()));
    assert!(ws.has_no_artifacts());
}

#[test]
fn test_open_without_artifacts_is_input_missing() {
    let ws = TestWorkspace::new();
    ws.write_dataset(&TestDataFactory::questions());

    let result = ws.open_engine(HashingEmbedder::new(FIXTURE_DIMENSIONS));
    assert!(matches!(result, Err(Error::InputMissing(_))));
}

#[test]
fn test_mismatched_pair_rejected_on_open() {
    let ws = TestWorkspace::new();
    ws.write_dataset(&TestDataFactory::questions());
    ws.build(&HashingEmbedder::new(FIXTURE_DIMENSIONS)).unwrap();

    // Replace only the identity map with one from a smaller dataset
    let smaller = janitor_core::Dataset::from_records(TestDataFactory::questions_without(&[11]))
        .unwrap();
    let other = build_artifacts(
        &smaller,
        &HashingEmbedder::new(FIXTURE_DIMENSIONS),
        &BuildOptions::default(),
    )
    .unwrap();
    other.map.persist(&ws.map_path()).unwrap();

    let result = ws.open_engine(HashingEmbedder::new(FIXTURE_DIMENSIONS));
    assert!(matches!(result, Err(Error::ArtifactMismatch(_))));
}

#[test]
fn test_query_with_wrong_dimensions_fails() {
    let ws = TestWorkspace::new();
    ws.write_dataset(&TestDataFactory::questions());
    ws.build(&HashingEmbedder::new(FIXTURE_DIMENSIONS)).unwrap();

    let index = VectorIndex::load(&ws.index_path(), FIXTURE_DIMENSIONS).unwrap();
    let map = IdentityMap::load(&ws.map_path()).unwrap();
    let dataset = ws.load_dataset().unwrap();
    let engine = QueryEngine::new(HashingEmbedder::new(64), index, map, dataset).unwrap();

    assert!(matches!(
        engine.query("docker container exits", 3),
        Err(Error::DimensionMismatch {
            expected: 256,
            actual: 64
        })
    ));
}
