//! Shared helpers for the black-box tests.

#![allow(dead_code)]

use mongo_id_perf::store::MemoryConnector;
use mongo_id_perf::{BenchConfig, BenchmarkRunner, Target};
use rand::rngs::StdRng;
use rand::SeedableRng;

pub const SEED: u64 = 0xC0FFEE;

pub fn local_target() -> Target {
    Target::new("memory local", "memory://local")
}

pub fn remote_target() -> Target {
    Target::new("memory remote", "memory://remote")
}

/// Single-target config over the in-memory backend.
pub fn config(insertions: usize, retrievals: usize) -> BenchConfig {
    BenchConfig {
        targets: vec![local_target()],
        insertion_count: insertions,
        retrieval_count: retrievals,
        seed: Some(SEED),
        ..BenchConfig::default()
    }
}

pub fn runner(
    connector: MemoryConnector,
    config: BenchConfig,
) -> BenchmarkRunner<MemoryConnector, StdRng> {
    BenchmarkRunner::with_rng(connector, config, StdRng::seed_from_u64(SEED))
        .expect("valid config")
}
