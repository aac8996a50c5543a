//! A whole benchmark invocation: every pass, then the output files.
//!
//! Nothing is written until every pass has succeeded. The optional JSON
//! report goes first and the CSV last, so any failure leaves the CSV path
//! exactly as it was before the run.

use std::path::Path;

use tracing::info;

use crate::config::BenchConfig;
use crate::error::Result;
use crate::output::ResultWriter;
use crate::recorder::ResultRecorder;
use crate::runner::{BenchmarkRunner, ResultRow};
use crate::store::Connector;

/// Run all configured passes over `connector`, then write the JSON report
/// (when `json_report` is given) and the CSV at `config.output`.
pub async fn run_benchmark<C: Connector>(
    connector: C,
    config: BenchConfig,
    json_report: Option<&Path>,
) -> Result<Vec<ResultRow>> {
    let mut runner = BenchmarkRunner::new(connector, config)?;
    let rows = runner.run_all().await?;
    let config = runner.config();

    if let Some(path) = json_report {
        let mut recorder = ResultRecorder::new();
        for row in &rows {
            recorder.record_row(row, config);
        }
        recorder.save(path)?;
    }

    let writer = ResultWriter::new(&config.output);
    writer.write(&rows)?;
    info!(path = %writer.path().display(), rows = rows.len(), "results written");

    Ok(rows)
}
