//! Whole invocations: passes, then the output files, or nothing on failure.

mod common;

use std::path::{Path, PathBuf};

use common::{config, local_target, remote_target};
use mongo_id_perf::output::read_results;
use mongo_id_perf::schema::BenchmarkReport;
use mongo_id_perf::store::MemoryConnector;
use mongo_id_perf::{run_benchmark, BenchConfig, BenchError, IdentifierScheme};
use tempfile::TempDir;

const PREVIOUS: &str = "previous run,1,2,3\n";

fn config_writing_to(path: &Path) -> BenchConfig {
    BenchConfig {
        output: path.to_path_buf(),
        ..config(10, 5)
    }
}

/// A results path that already holds the output of an earlier run.
fn existing_output(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("results.csv");
    std::fs::write(&path, PREVIOUS).unwrap();
    path
}

// =============================================================================
// Success
// =============================================================================

#[tokio::test]
async fn successful_run_writes_csv_and_report() {
    let dir = tempfile::tempdir().unwrap();
    let csv = dir.path().join("results.csv");
    let json = dir.path().join("reports").join("run.json");

    let rows = run_benchmark(MemoryConnector::new(), config_writing_to(&csv), Some(&json))
        .await
        .unwrap();
    assert_eq!(rows.len(), IdentifierScheme::ALL.len());

    let parsed = read_results(&csv).unwrap();
    let labels: Vec<_> = parsed.iter().map(|r| r.label.as_str()).collect();
    assert_eq!(labels, ["memory local OID", "memory local UUID"]);
    assert!(parsed.iter().all(|r| r.nanos.len() == 5));

    let report: BenchmarkReport =
        serde_json::from_str(&std::fs::read_to_string(&json).unwrap()).unwrap();
    assert_eq!(report.results.len(), rows.len());
}

#[tokio::test]
async fn csv_replaces_an_earlier_run() {
    let dir = tempfile::tempdir().unwrap();
    let csv = existing_output(&dir);

    run_benchmark(MemoryConnector::new(), config_writing_to(&csv), None)
        .await
        .unwrap();

    let contents = std::fs::read_to_string(&csv).unwrap();
    assert!(!contents.contains("previous run"));
    assert_eq!(contents.lines().count(), IdentifierScheme::ALL.len());
}

// =============================================================================
// Failures leave the output alone
// =============================================================================

#[tokio::test]
async fn each_failure_kind_leaves_existing_output_untouched() {
    let cases = [
        MemoryConnector::new().with_unreachable(local_target().address),
        MemoryConnector::new().with_failing_reset(),
        MemoryConnector::new().with_failing_inserts(),
        MemoryConnector::new().with_failing_lookups(),
    ];
    for connector in cases {
        let dir = tempfile::tempdir().unwrap();
        let csv = existing_output(&dir);

        let err = run_benchmark(connector, config_writing_to(&csv), None)
            .await
            .unwrap_err();
        assert!(
            matches!(
                err,
                BenchError::Connection { .. }
                    | BenchError::Provisioning { .. }
                    | BenchError::Insert { .. }
                    | BenchError::Retrieval { .. }
            ),
            "unexpected error: {}",
            err
        );
        assert_eq!(std::fs::read_to_string(&csv).unwrap(), PREVIOUS);
    }
}

#[tokio::test]
async fn failed_run_creates_no_csv() {
    let dir = tempfile::tempdir().unwrap();
    let csv = dir.path().join("results.csv");

    let connector = MemoryConnector::new().with_failing_lookups();
    assert!(run_benchmark(connector, config_writing_to(&csv), None)
        .await
        .is_err());
    assert!(!csv.exists());
}

#[tokio::test]
async fn late_failure_discards_earlier_passes() {
    let dir = tempfile::tempdir().unwrap();
    let csv = dir.path().join("results.csv");
    let json = dir.path().join("run.json");
    let mut cfg = config_writing_to(&csv);
    cfg.targets = vec![local_target(), remote_target()];

    let connector = MemoryConnector::new().with_unreachable(remote_target().address);
    let err = run_benchmark(connector, cfg, Some(&json)).await.unwrap_err();
    assert!(matches!(err, BenchError::Connection { .. }));
    assert!(!csv.exists());
    assert!(!json.exists());
}

#[tokio::test]
async fn report_failure_leaves_no_csv() {
    let dir = tempfile::tempdir().unwrap();
    let csv = dir.path().join("results.csv");
    // A regular file where the report's parent directory should be.
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, "").unwrap();
    let json = blocker.join("run.json");

    let err = run_benchmark(MemoryConnector::new(), config_writing_to(&csv), Some(&json))
        .await
        .unwrap_err();
    assert!(matches!(err, BenchError::Io(_)));
    assert!(!csv.exists());
}

#[tokio::test]
async fn invalid_config_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let csv = existing_output(&dir);
    let cfg = BenchConfig {
        retrieval_count: 0,
        ..config_writing_to(&csv)
    };

    let err = run_benchmark(MemoryConnector::new(), cfg, None)
        .await
        .unwrap_err();
    assert!(matches!(err, BenchError::Config(_)));
    assert_eq!(std::fs::read_to_string(&csv).unwrap(), PREVIOUS);
}
