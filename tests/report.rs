//! Optional JSON report.

mod common;

use std::time::Duration;

use common::{config, runner};
use mongo_id_perf::recorder::{ResultRecorder, SCHEMA_VERSION};
use mongo_id_perf::schema::BenchmarkReport;
use mongo_id_perf::store::MemoryConnector;
use mongo_id_perf::{IdentifierScheme, ResultRow};

#[tokio::test]
async fn report_has_one_result_per_row() {
    let mut runner = runner(MemoryConnector::new(), config(10, 5));
    let rows = runner.run_all().await.unwrap();

    let mut recorder = ResultRecorder::new();
    for row in &rows {
        recorder.record_row(row, runner.config());
    }
    let report = recorder.report();

    assert_eq!(report.schema_version, SCHEMA_VERSION);
    assert_eq!(report.results.len(), 2);
    assert_eq!(report.results[0].benchmark, "memory local OID");
    assert_eq!(report.results[1].scheme, "UUID");
    for result in &report.results {
        assert_eq!(result.metrics.samples, 5);
        assert_eq!(result.metrics.misses, 0);
        assert!(result.metrics.p50_ns.is_some());
        assert_eq!(result.parameters["insertion_count"], serde_json::json!(10));
    }
}

#[test]
fn saved_report_parses_back() {
    let row = ResultRow {
        label: "local UUID".into(),
        target: "local".into(),
        scheme: IdentifierScheme::Uuid,
        samples: vec![Duration::from_micros(300), Duration::from_micros(100)],
        misses: 1,
    };
    let mut recorder = ResultRecorder::new();
    recorder.record_row(&row, &config(2, 2));

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("reports").join("run.json");
    recorder.save(&path).unwrap();

    let json = std::fs::read_to_string(&path).unwrap();
    let report: BenchmarkReport = serde_json::from_str(&json).unwrap();
    let metrics = &report.results[0].metrics;
    assert_eq!(metrics.samples, 2);
    assert_eq!(metrics.misses, 1);
    assert_eq!(metrics.min_ns, Some(100_000));
    assert_eq!(metrics.max_ns, Some(300_000));
    assert_eq!(
        report.results[0].parameters["collection"],
        serde_json::json!("documents-uuid")
    );
}
