//! Collects result rows into a [`BenchmarkReport`] and saves it as JSON.

use std::collections::HashMap;
use std::path::Path;
use std::process::Command;
use std::time::SystemTime;

use tracing::info;

use crate::config::BenchConfig;
use crate::error::Result;
use crate::runner::ResultRow;
use crate::schema::{BenchmarkReport, BenchmarkResult, HardwareInfo, LookupMetrics, RunMetadata};

pub const SCHEMA_VERSION: u32 = 1;

/// Accumulates per-pass results for the JSON report.
pub struct ResultRecorder {
    metadata: RunMetadata,
    results: Vec<BenchmarkResult>,
}

impl Default for ResultRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultRecorder {
    /// Captures run metadata (timestamp, git, hardware) at construction time.
    pub fn new() -> Self {
        Self {
            metadata: RunMetadata::capture(),
            results: Vec::new(),
        }
    }

    pub fn record_row(&mut self, row: &ResultRow, config: &BenchConfig) {
        let mut params = HashMap::new();
        params.insert("insertion_count".into(), serde_json::json!(config.insertion_count));
        params.insert("retrieval_count".into(), serde_json::json!(config.retrieval_count));
        params.insert("warmup_count".into(), serde_json::json!(config.warmup_count));
        params.insert("database".into(), serde_json::json!(config.database));
        params.insert(
            "collection".into(),
            serde_json::json!(config.collection_name(row.scheme)),
        );

        let mut metrics = LookupMetrics {
            samples: row.samples.len() as u64,
            misses: row.misses as u64,
            ..Default::default()
        };
        if let Some(s) = row.stats() {
            metrics.p50_ns = Some(s.p50.as_nanos() as u64);
            metrics.p95_ns = Some(s.p95.as_nanos() as u64);
            metrics.p99_ns = Some(s.p99.as_nanos() as u64);
            metrics.min_ns = Some(s.min.as_nanos() as u64);
            metrics.max_ns = Some(s.max.as_nanos() as u64);
            metrics.avg_ns = Some(s.avg.as_nanos() as u64);
        }

        self.results.push(BenchmarkResult {
            benchmark: row.label.clone(),
            target: row.target.clone(),
            scheme: row.scheme.label().to_string(),
            parameters: params,
            metrics,
        });
    }

    pub fn report(&self) -> BenchmarkReport {
        BenchmarkReport {
            schema_version: SCHEMA_VERSION,
            metadata: self.metadata.clone(),
            results: self.results.clone(),
        }
    }

    /// Write the report as pretty JSON to `path`, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.report())?;
        std::fs::write(path, json)?;
        info!(path = %path.display(), "JSON report saved");
        Ok(())
    }
}

impl RunMetadata {
    fn capture() -> Self {
        let secs = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        RunMetadata {
            timestamp: utc_timestamp(secs),
            git_commit: command_output("git", &["describe", "--always", "--dirty"]),
            git_branch: command_output("git", &["branch", "--show-current"]),
            version: env!("CARGO_PKG_VERSION").to_string(),
            hardware: HardwareInfo::capture(),
        }
    }
}

impl HardwareInfo {
    fn capture() -> Self {
        HardwareInfo {
            cpu: cpu_model().unwrap_or_else(|| "unknown".into()),
            cores: std::thread::available_parallelism().map_or(0, |n| n.get()),
            os: std::env::consts::OS.into(),
            arch: std::env::consts::ARCH.into(),
        }
    }
}

/// `YYYY-MM-DDTHH:MM:SSZ` for `secs` since the Unix epoch.
fn utc_timestamp(secs: u64) -> String {
    let (year, month, day) = civil_from_days(secs / 86_400);
    let (hh, mm, ss) = (secs / 3_600 % 24, secs / 60 % 60, secs % 60);
    format!("{year:04}-{month:02}-{day:02}T{hh:02}:{mm:02}:{ss:02}Z")
}

fn is_leap(year: u64) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

/// Calendar date of the `days`th day after 1970-01-01.
fn civil_from_days(mut days: u64) -> (u64, u64, u64) {
    let mut year = 1970;
    loop {
        let year_len = if is_leap(year) { 366 } else { 365 };
        if days < year_len {
            break;
        }
        days -= year_len;
        year += 1;
    }
    let february = if is_leap(year) { 29 } else { 28 };
    let month_lens = [31, february, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];
    let mut month = 1;
    for len in month_lens {
        if days < len {
            break;
        }
        days -= len;
        month += 1;
    }
    (year, month, days + 1)
}

/// Trimmed stdout of a successful, non-empty command.
fn command_output(program: &str, args: &[&str]) -> Option<String> {
    let out = Command::new(program).args(args).output().ok()?;
    let text = String::from_utf8(out.stdout).ok()?;
    let text = text.trim();
    (out.status.success() && !text.is_empty()).then(|| text.to_string())
}

fn cpu_model() -> Option<String> {
    let info = std::fs::read_to_string("/proc/cpuinfo").ok()?;
    info.lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(key, _)| key.trim() == "model name")
        .map(|(_, value)| value.trim().to_string())
}
