//! Benchmark configuration.
//!
//! A `BenchConfig` is built once at startup (compiled defaults, then an
//! optional JSON file, then CLI flags) and passed by value into the runner.

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{BenchError, Result};
use crate::scheme::IdentifierScheme;

pub const DEFAULT_INSERTIONS: usize = 1_000;
pub const DEFAULT_DATABASE: &str = "id-perf";
pub const DEFAULT_COLLECTION_PREFIX: &str = "documents";
pub const DEFAULT_OUTPUT: &str = "./results.csv";

/// A named database endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    /// Human-readable label, first half of every result row label.
    pub name: String,
    /// Connection string handed to the driver.
    pub address: String,
}

impl Target {
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Parses `"<name>=<address>"`, as accepted by `--target`.
impl FromStr for Target {
    type Err = BenchError;

    fn from_str(s: &str) -> Result<Self> {
        let (name, address) = s.split_once('=').ok_or_else(|| {
            BenchError::Config(format!("target '{}' is not of the form NAME=ADDRESS", s))
        })?;
        let (name, address) = (name.trim(), address.trim());
        if name.is_empty() || address.is_empty() {
            return Err(BenchError::Config(format!(
                "target '{}' has an empty name or address",
                s
            )));
        }
        Ok(Target::new(name, address))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchConfig {
    pub targets: Vec<Target>,
    /// Documents bulk-inserted per pass.
    pub insertion_count: usize,
    /// Timed lookups per pass; equals the number of values in each result row.
    pub retrieval_count: usize,
    /// Untimed lookups issued before the timed series.
    pub warmup_count: usize,
    pub database: String,
    pub collection_prefix: String,
    /// Schemes measured for every target, in this order.
    pub schemes: Vec<IdentifierScheme>,
    pub output: PathBuf,
    /// Seed for identifier sampling; OS entropy when absent.
    pub seed: Option<u64>,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            targets: vec![Target::new("mongodb local", "mongodb://localhost:27117")],
            insertion_count: DEFAULT_INSERTIONS,
            retrieval_count: DEFAULT_INSERTIONS,
            warmup_count: 0,
            database: DEFAULT_DATABASE.to_string(),
            collection_prefix: DEFAULT_COLLECTION_PREFIX.to_string(),
            schemes: IdentifierScheme::ALL.to_vec(),
            output: PathBuf::from(DEFAULT_OUTPUT),
            seed: None,
        }
    }
}

/// One configuration source: a JSON file or the command line. Every field is
/// optional; unset fields defer to lower layers and finally to the compiled
/// defaults.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigLayer {
    pub targets: Option<Vec<Target>>,
    pub insertion_count: Option<usize>,
    pub retrieval_count: Option<usize>,
    pub warmup_count: Option<usize>,
    pub database: Option<String>,
    pub collection_prefix: Option<String>,
    pub schemes: Option<Vec<IdentifierScheme>>,
    pub output: Option<PathBuf>,
    pub seed: Option<u64>,
}

impl ConfigLayer {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    pub fn from_json_str(contents: &str) -> Result<Self> {
        Ok(serde_json::from_str(contents)?)
    }

    /// Stack `over` on top of `self`; fields set in `over` win.
    pub fn merge(self, over: ConfigLayer) -> ConfigLayer {
        ConfigLayer {
            targets: over.targets.or(self.targets),
            insertion_count: over.insertion_count.or(self.insertion_count),
            retrieval_count: over.retrieval_count.or(self.retrieval_count),
            warmup_count: over.warmup_count.or(self.warmup_count),
            database: over.database.or(self.database),
            collection_prefix: over.collection_prefix.or(self.collection_prefix),
            schemes: over.schemes.or(self.schemes),
            output: over.output.or(self.output),
            seed: over.seed.or(self.seed),
        }
    }
}

impl BenchConfig {
    /// Resolve layers given lowest priority first on top of the defaults.
    ///
    /// The retrieval count follows the resolved insertion count unless some
    /// layer sets `retrieval_count` itself.
    pub fn from_layers<I>(layers: I) -> Self
    where
        I: IntoIterator<Item = ConfigLayer>,
    {
        let merged = layers
            .into_iter()
            .fold(ConfigLayer::default(), ConfigLayer::merge);
        let defaults = BenchConfig::default();
        let insertion_count = merged.insertion_count.unwrap_or(defaults.insertion_count);

        BenchConfig {
            targets: merged.targets.unwrap_or(defaults.targets),
            insertion_count,
            retrieval_count: merged.retrieval_count.unwrap_or(insertion_count),
            warmup_count: merged.warmup_count.unwrap_or(defaults.warmup_count),
            database: merged.database.unwrap_or(defaults.database),
            collection_prefix: merged.collection_prefix.unwrap_or(defaults.collection_prefix),
            schemes: merged.schemes.unwrap_or(defaults.schemes),
            output: merged.output.unwrap_or(defaults.output),
            seed: merged.seed,
        }
    }

    /// Load a JSON config file on top of the defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        Ok(Self::from_layers([ConfigLayer::from_json_file(path)?]))
    }

    pub fn from_json_str(contents: &str) -> Result<Self> {
        Ok(Self::from_layers([ConfigLayer::from_json_str(contents)?]))
    }

    /// Name of the collection a pass of `scheme` runs against.
    pub fn collection_name(&self, scheme: IdentifierScheme) -> String {
        format!("{}-{}", self.collection_prefix, scheme.collection_suffix())
    }

    pub fn validate(&self) -> Result<()> {
        if self.targets.is_empty() {
            return Err(BenchError::Config("at least one target is required".into()));
        }
        if self.insertion_count == 0 {
            return Err(BenchError::Config("insertion count must be at least 1".into()));
        }
        if self.retrieval_count == 0 {
            return Err(BenchError::Config("retrieval count must be at least 1".into()));
        }
        if self.database.is_empty() || self.collection_prefix.is_empty() {
            return Err(BenchError::Config(
                "database and collection prefix must not be empty".into(),
            ));
        }
        if self.schemes.is_empty() {
            return Err(BenchError::Config("at least one identifier scheme is required".into()));
        }
        let mut seen = HashSet::new();
        for scheme in &self.schemes {
            if !seen.insert(scheme) {
                return Err(BenchError::Config(format!("scheme {} listed twice", scheme)));
            }
        }
        let mut names = HashSet::new();
        for target in &self.targets {
            if target.name.contains(['\r', '\n']) {
                return Err(BenchError::Config(format!(
                    "target name {:?} contains a line break",
                    target.name
                )));
            }
            if !names.insert(target.name.as_str()) {
                return Err(BenchError::Config(format!(
                    "target name '{}' listed twice",
                    target.name
                )));
            }
        }
        Ok(())
    }
}
