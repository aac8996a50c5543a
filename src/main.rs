//! ObjectId vs UUID lookup latency benchmark.
//!
//! Run:     `cargo run --release -- --target "mongodb local=mongodb://localhost:27117"`
//! Quick:   `cargo run --release -- -n 100 -r 100`
//! Dry run: `cargo run -- --backend memory --memory-latency-us 200`

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use mongo_id_perf::stats::render_table;
use mongo_id_perf::store::{Connector, MemoryConnector, MongoConnector};
use mongo_id_perf::{run_benchmark, BenchConfig, ConfigLayer, IdentifierScheme, Target};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Backend {
    /// MongoDB wire protocol via the official driver
    Mongodb,
    /// In-process store, for dry runs without a server
    Memory,
}

#[derive(Parser, Debug)]
#[command(name = "mongo-id-perf")]
#[command(about = "Compare lookup latency of ObjectId and UUID document keys")]
#[command(version)]
struct Args {
    /// JSON config file; flags below override its values
    #[arg(long, short = 'c', env = "MONGO_ID_PERF_CONFIG")]
    config: Option<PathBuf>,

    /// Target as NAME=ADDRESS; repeat for several targets
    #[arg(long = "target", short = 't', value_name = "NAME=ADDRESS")]
    targets: Vec<Target>,

    /// Documents inserted per pass
    #[arg(long, short = 'n', env = "MONGO_ID_PERF_INSERTIONS")]
    insertions: Option<usize>,

    /// Timed lookups per pass (defaults to the insertion count)
    #[arg(long, short = 'r', env = "MONGO_ID_PERF_RETRIEVALS")]
    retrievals: Option<usize>,

    /// Untimed lookups before each timed series
    #[arg(long)]
    warmup: Option<usize>,

    /// Database name
    #[arg(long)]
    database: Option<String>,

    /// Collection name prefix; the scheme is appended
    #[arg(long)]
    collection_prefix: Option<String>,

    /// Identifier schemes to measure, comma separated
    #[arg(long, value_enum, value_delimiter = ',')]
    schemes: Vec<IdentifierScheme>,

    /// CSV output path
    #[arg(long, short = 'o')]
    output: Option<PathBuf>,

    /// Also write a JSON summary report to this path
    #[arg(long)]
    json_report: Option<PathBuf>,

    /// Seed for identifier sampling
    #[arg(long, env = "MONGO_ID_PERF_SEED")]
    seed: Option<u64>,

    #[arg(long, value_enum, default_value = "mongodb")]
    backend: Backend,

    /// Injected lookup latency for the memory backend, in microseconds
    #[arg(long, default_value = "0")]
    memory_latency_us: u64,
}

impl Args {
    /// Settings given on the command line, as the topmost config layer.
    fn cli_layer(&self) -> ConfigLayer {
        ConfigLayer {
            targets: (!self.targets.is_empty()).then(|| self.targets.clone()),
            insertion_count: self.insertions,
            retrieval_count: self.retrievals,
            warmup_count: self.warmup,
            database: self.database.clone(),
            collection_prefix: self.collection_prefix.clone(),
            schemes: (!self.schemes.is_empty()).then(|| self.schemes.clone()),
            output: self.output.clone(),
            seed: self.seed,
        }
    }

    /// Defaults, then the config file, then flags.
    fn to_config(&self) -> Result<BenchConfig> {
        let mut layers = Vec::with_capacity(2);
        if let Some(path) = &self.config {
            layers.push(
                ConfigLayer::from_json_file(path)
                    .with_context(|| format!("failed to load config {}", path.display()))?,
            );
        }
        layers.push(self.cli_layer());
        Ok(BenchConfig::from_layers(layers))
    }
}

async fn run<C: Connector>(
    connector: C,
    config: BenchConfig,
    json_report: Option<&Path>,
) -> Result<()> {
    let rows = run_benchmark(connector, config, json_report)
        .await
        .context("benchmark run aborted")?;

    let table: Vec<_> = rows
        .iter()
        .filter_map(|r| r.stats().map(|s| (r.label.clone(), s)))
        .collect();
    eprintln!();
    eprint!("{}", render_table(&table));
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "mongo_id_perf=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let config = args.to_config()?;

    info!(
        targets = config.targets.len(),
        insertions = config.insertion_count,
        retrievals = config.retrieval_count,
        backend = ?args.backend,
        "starting benchmark"
    );

    let json_report = args.json_report.as_deref();
    match args.backend {
        Backend::Mongodb => run(MongoConnector::new(), config, json_report).await,
        Backend::Memory => {
            let latency = Duration::from_micros(args.memory_latency_us);
            let connector = MemoryConnector::new().with_lookup_latency(latency);
            run(connector, config, json_report).await
        }
    }
}
