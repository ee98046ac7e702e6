//! Journey: the dataset changes after the index was built
//!
//! Records removed from the dataset are reported per rank instead of failing
//! the query; rebuilding brings the artifacts back in line.

use janitor_core::{HashingEmbedder, IdentityMap, IdentityMapError, Lookup, Record, RecordId};
use janitor_e2e_tests::{TestDataFactory, TestWorkspace, FIXTURE_DIMENSIONS};

fn provider() -> HashingEmbedder {
    HashingEmbedder::new(FIXTURE_DIMENSIONS)
}

fn three_questions() -> Vec<Record> {
    vec![
        Record::new(101, "recursion error in python", ""),
        Record::new(205, "java stack trace", ""),
        Record::new(999, "rust borrow checker", ""),
    ]
}

#[test]
fn test_identity_map_resolves_persisted_keys() {
    let ws = TestWorkspace::new();
    ws.write_dataset(&three_questions());
    ws.build(&provider()).unwrap();

    let map = IdentityMap::load(&ws.map_path()).unwrap();
    assert_eq!(map.resolve(0).unwrap(), RecordId(101));
    assert_eq!(map.resolve(1).unwrap(), RecordId(205));
    assert_eq!(map.resolve(2).unwrap(), RecordId(999));
    assert!(matches!(map.resolve(5), Err(IdentityMapError::NotFound(5))));
}

#[test]
fn test_removed_record_reported_for_its_rank() {
    let ws = TestWorkspace::new();
    ws.write_dataset(&three_questions());
    ws.build(&provider()).unwrap();

    // 999 disappears from the dataset; artifacts are not rebuilt
    let mut reloaded = three_questions();
    reloaded.retain(|r| r.id != RecordId(999));
    ws.write_dataset(&reloaded);

    let engine = ws.open_engine(provider()).unwrap();
    let results = engine.query("rust borrow checker", 3).unwrap();
    assert_eq!(results.len(), 3);

    for result in &results {
        if result.ordinal == 2 {
            assert_eq!(result.lookup, Lookup::MissingRecord { key: RecordId(999) });
        } else {
            assert!(result.lookup.record().is_some(), "ordinal {}", result.ordinal);
        }
    }
}

#[test]
fn test_missing_top_hit_keeps_remaining_ranks() {
    let ws = TestWorkspace::new();
    ws.write_dataset(&TestDataFactory::questions());
    ws.build(&provider()).unwrap();
    ws.write_dataset(&TestDataFactory::questions_without(&[17]));

    let engine = ws.open_engine(provider()).unwrap();
    let results = engine.query("docker container exits", 3).unwrap();

    assert_eq!(results[0].lookup, Lookup::MissingRecord { key: RecordId(17) });
    assert!(results[1..].iter().all(|r| r.lookup.record().is_some()));

    let json = serde_json::to_value(&results).unwrap();
    assert_eq!(json[0]["status"], "missing_record");
    assert_eq!(json[0]["key"], 17);
}

#[test]
fn test_rebuild_after_drift_resolves_everything() {
    let ws = TestWorkspace::new();
    ws.write_dataset(&TestDataFactory::questions());
    ws.build(&provider()).unwrap();

    ws.write_dataset(&TestDataFactory::questions_without(&[17, 21]));
    ws.build(&provider()).unwrap();

    let engine = ws.open_engine(provider()).unwrap();
    assert_eq!(engine.identity_map().len(), 10);

    let results = engine.query("docker container exits", 10).unwrap();
    assert_eq!(results.len(), 10);
    assert!(results.iter().all(|r| !r.lookup.is_not_found()));
}

#[test]
fn test_new_records_are_invisible_until_rebuild() {
    let ws = TestWorkspace::new();
    let mut records = TestDataFactory::questions_without(&[22]);
    ws.write_dataset(&records);
    ws.build(&provider()).unwrap();

    records.push(TestDataFactory::questions().pop().unwrap());
    ws.write_dataset(&records);

    let engine = ws.open_engine(provider()).unwrap();
    assert_eq!(engine.dataset().len(), 12);
    assert_eq!(engine.index().len(), 11);

    let results = engine.query("regex email plus signs", 11).unwrap();
    assert!(results
        .iter()
        .all(|r| r.lookup.record().map(|rec| rec.id) != Some(RecordId(22))));
}
