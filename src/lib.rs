//! Lookup latency benchmarks for document keys.
//!
//! Compares point-lookup latency of documents keyed by a 12-byte ObjectId
//! against documents keyed by a 16-byte UUID, across one or more database
//! targets. Results are written as one CSV row per (target, scheme) pass.

pub mod config;
pub mod error;
pub mod harness;
pub mod output;
pub mod recorder;
pub mod runner;
pub mod schema;
pub mod scheme;
pub mod stats;
pub mod store;

pub use config::{BenchConfig, ConfigLayer, Target};
pub use error::{BenchError, Result};
pub use harness::run_benchmark;
pub use runner::{BenchmarkRunner, ResultRow, TimedLookup};
pub use scheme::{Identifier, IdentifierScheme, Record};
