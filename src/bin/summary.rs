//! Summarise a results CSV.
//!
//! Prints a latency table for every row, then the p50 of each scheme relative
//! to the first scheme measured on the same target.
//!
//! Usage: `cargo run --bin bench-summary -- results.csv`

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use mongo_id_perf::output::{read_results, ParsedRow};
use mongo_id_perf::stats::{format_ns, latency_delta, render_table, LatencyStats};

#[derive(Parser, Debug)]
#[command(name = "bench-summary")]
#[command(about = "Summarise a mongo-id-perf results file")]
struct Args {
    /// Results CSV written by mongo-id-perf
    results: PathBuf,
}

/// Split "<target> <scheme>" at the last space.
fn split_label(label: &str) -> (&str, &str) {
    label.rsplit_once(' ').unwrap_or((label, ""))
}

fn main() -> Result<()> {
    let args = Args::parse();
    let rows: Vec<ParsedRow> = read_results(&args.results)
        .with_context(|| format!("failed to read {}", args.results.display()))?;

    let summaries: Vec<(String, LatencyStats)> = rows
        .iter()
        .filter_map(|r| LatencyStats::from_samples(&r.samples()).map(|s| (r.label.clone(), s)))
        .collect();

    if summaries.is_empty() {
        eprintln!("No latency rows in {}", args.results.display());
        return Ok(());
    }

    print!("{}", render_table(&summaries));
    println!();

    // Baseline is the first scheme seen for each target, in file order.
    let mut baselines: Vec<(&str, &str, &LatencyStats)> = Vec::new();
    for (label, stats) in &summaries {
        let (target, scheme) = split_label(label);
        let baseline = baselines.iter().find(|(t, _, _)| *t == target).copied();
        match baseline {
            None => baselines.push((target, scheme, stats)),
            Some((_, base_scheme, base)) => {
                let (delta_pct, hint) = latency_delta(base.p50, stats.p50);
                println!(
                    "{:<30} {} vs {}: p50 {} -> {} ({:+.1}%, {})",
                    target,
                    scheme,
                    base_scheme,
                    format_ns(base.p50.as_nanos()),
                    format_ns(stats.p50.as_nanos()),
                    delta_pct,
                    hint,
                );
            }
        }
    }
    Ok(())
}
