use std::thread;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use storebench::core::comparison::compare;
use storebench::core::export::{export_all, load_records, RunLog, COMPARISON_FILE};
use storebench::core::stats::summarize;
use storebench::{
    run_suite, Backend, BenchError, DatasetGenerator, MeasurementHarness, SledDocumentBackend,
    SqliteBackend,
};
use tempfile::tempdir;

#[test]
fn test_fixed_delay_lookup() {
    let harness = MeasurementHarness::new();
    let mut lookup = harness.instrument("lookup", "EngineA", 2).wrap(|| {
        thread::sleep(Duration::from_millis(10));
        Ok::<_, BenchError>(vec!["a", "b", "c"])
    });

    let result = lookup().unwrap();
    assert_eq!(result, vec!["a", "b", "c"]);

    let records = harness.collected_records();
    assert_eq!(records.len(), 1);

    let record = &records[0];
    assert_eq!(record.operation, "lookup");
    assert_eq!(record.engine, "EngineA");
    assert_eq!(record.result_count, 3);
    assert_eq!(record.complexity_score, 2);
    assert!(record.mean_duration >= 0.008, "{}", record.mean_duration);
    assert!(record.mean_duration <= 0.02, "{}", record.mean_duration);
}

#[test]
fn test_same_operation_different_engines() {
    let harness = MeasurementHarness::with_trials(3).unwrap();

    harness.instrument("scan", "EngineA", 1).call(|| Ok::<_, BenchError>(vec![1, 2])).unwrap();
    harness.instrument("scan", "EngineB", 1).call(|| Ok::<_, BenchError>(vec![1, 2, 3, 4])).unwrap();
    harness.instrument("scan", "EngineA", 1).call(|| Ok::<_, BenchError>(vec![1, 2, 3, 4])).unwrap();

    let summary = summarize(&harness.collected_records());
    assert_eq!(summary.len(), 2);

    assert_eq!(summary[0].engine, "EngineA");
    assert_eq!(summary[0].samples, 2);
    assert_eq!(summary[0].avg_results, 3.0);
    assert!(summary[0].time_std.is_some());

    assert_eq!(summary[1].engine, "EngineB");
    assert_eq!(summary[1].samples, 1);
    assert_eq!(summary[1].avg_results, 4.0);
    assert!(summary[1].time_std.is_none());
}

#[test]
fn test_failed_operation_leaves_log_untouched() {
    let harness = MeasurementHarness::new();
    harness.instrument("ok", "EngineA", 1).call(|| Ok::<_, BenchError>(1)).unwrap();

    let before = harness.collected_records();
    let result = harness
        .instrument("broken", "EngineA", 1)
        .call(|| Err::<u32, _>(BenchError::Operation("no such table".to_string())));

    assert!(matches!(result, Err(BenchError::Operation(_))));
    assert_eq!(harness.collected_records(), before);
}

#[test]
fn test_full_run_on_generated_dataset() {
    let dir = tempdir().unwrap();
    let dataset = DatasetGenerator::new(11)
        .with_reference_time(Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap())
        .generate(800, 4);

    let mut sqlite = SqliteBackend::open(dir.path().join("relational.sqlite3")).unwrap();
    let mut sled = SledDocumentBackend::open(dir.path().join("documents.sled")).unwrap();
    sqlite.load(&dataset).unwrap();
    sled.load(&dataset).unwrap();
    assert_eq!(sqlite.count_products().unwrap(), 800);
    assert_eq!(sled.count_products().unwrap(), 800);

    let harness = MeasurementHarness::with_trials(2).unwrap();
    run_suite(&harness, &[&sqlite, &sled]).unwrap();

    let records = harness.into_records();
    assert_eq!(records.len(), 32);

    // Same dataset, same answers, whatever the engine
    for pair in records.chunks(2) {
        assert_eq!(pair[0].engine, "SQLite");
        assert_eq!(pair[1].engine, "Sled");
        if pair[0].operation != "get_product_with_reviews" {
            assert_eq!(pair[0].result_count, pair[1].result_count, "{}", pair[0].operation);
        }
    }

    let summary = summarize(&records);
    let comparison = compare(&summary, "Sled", "SQLite");
    assert_eq!(comparison.rows.len(), 6);

    let results = dir.path().join("results");
    let run = RunLog::new(2, records.clone());
    let files = export_all(&results, &summary, Some(&comparison), Some(&run)).unwrap();

    assert!(files.summary.exists());
    assert_eq!(files.comparison.unwrap(), results.join(COMPARISON_FILE));

    let reloaded = load_records(&files.records.unwrap()).unwrap();
    assert_eq!(reloaded.len(), records.len());
    assert_eq!(summarize(&reloaded).len(), summary.len());
}
