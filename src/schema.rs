//! JSON report types written by `--json-report`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Top-level report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkReport {
    /// Schema version for forward compatibility.
    pub schema_version: u32,
    pub metadata: RunMetadata,
    /// One entry per (target, scheme) pass.
    pub results: Vec<BenchmarkResult>,
}

/// Metadata captured when the recorder is created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunMetadata {
    /// ISO 8601 timestamp of the run start.
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub git_commit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub git_branch: Option<String>,
    /// Crate version of the harness.
    pub version: String,
    pub hardware: HardwareInfo,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HardwareInfo {
    pub cpu: String,
    /// Logical cores.
    pub cores: usize,
    pub os: String,
    pub arch: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkResult {
    /// Row label, e.g. "mongodb local UUID".
    pub benchmark: String,
    pub target: String,
    pub scheme: String,
    /// Run parameters (counts, database, collection).
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    #[serde(default)]
    pub parameters: HashMap<String, serde_json::Value>,
    pub metrics: LookupMetrics,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LookupMetrics {
    pub samples: u64,
    pub misses: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub p50_ns: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub p95_ns: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub p99_ns: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_ns: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_ns: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_ns: Option<u64>,
}
