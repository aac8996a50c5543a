//! The benchmark pass: provision, insert, sample, then time lookups one at a
//! time.
//!
//! Lookups are issued strictly sequentially and each is awaited before the
//! next starts, so no two requests of a pass are ever in flight together.
//! Only the lookup call itself is inside the timed region.

use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, warn};

use crate::config::{BenchConfig, Target};
use crate::error::{BenchError, Result};
use crate::scheme::{Identifier, IdentifierScheme, Record};
use crate::stats::{duration_ms, LatencyStats};
use crate::store::{CollectionOf, Connector, DocumentCollection, DocumentStore};

/// Where a pass currently is. Transitions only move forward; any error
/// moves the pass to `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassState {
    Idle,
    Provisioned,
    Inserted,
    Sampled,
    /// `k` timed lookups completed so far.
    Retrieving(usize),
    Done,
    Failed,
}

/// Outcome of one timed lookup.
#[derive(Debug, Clone, Copy)]
pub struct TimedLookup {
    pub elapsed: Duration,
    /// `None` means the lookup missed, which points at a setup bug.
    pub record: Option<Record>,
}

/// Latency series of one (target, scheme) pass.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRow {
    /// `"<target name> <scheme label>"`.
    pub label: String,
    pub target: String,
    pub scheme: IdentifierScheme,
    /// One sample per timed lookup, in execution order.
    pub samples: Vec<Duration>,
    /// Timed lookups that matched no document.
    pub misses: usize,
}

impl ResultRow {
    pub fn label_for(target: &Target, scheme: IdentifierScheme) -> String {
        format!("{} {}", target.name, scheme.label())
    }

    pub fn stats(&self) -> Option<LatencyStats> {
        LatencyStats::from_samples(&self.samples)
    }
}

/// Build `count` records of `scheme`, bulk-insert them in a single call and
/// return their identifiers in insertion order.
pub async fn insert_batch<D>(
    collection: &D,
    scheme: IdentifierScheme,
    count: usize,
) -> Result<Vec<Identifier>>
where
    D: DocumentCollection + ?Sized,
{
    let records = Record::batch(scheme, count);
    collection.insert_many(&records).await?;
    Ok(records.into_iter().map(|r| r.id).collect())
}

/// Draw `count` identifiers uniformly at random, with replacement.
pub fn sample_identifiers<R: Rng>(
    rng: &mut R,
    ids: &[Identifier],
    count: usize,
) -> Result<Vec<Identifier>> {
    if ids.is_empty() {
        return Err(BenchError::EmptyPool);
    }
    Ok((0..count)
        .map(|_| ids[rng.random_range(0..ids.len())])
        .collect())
}

/// Issue one lookup by identifier and time it with a monotonic clock.
///
/// A miss is not an error here; the elapsed time is still returned.
pub async fn timed_retrieve<D>(collection: &D, id: &Identifier) -> Result<TimedLookup>
where
    D: DocumentCollection + ?Sized,
{
    let start = Instant::now();
    let found = collection.find_by_id(id).await;
    let elapsed = start.elapsed();
    Ok(TimedLookup {
        elapsed,
        record: found?,
    })
}

/// Smallest non-zero step observed on the monotonic clock behind
/// [`Instant`].
pub fn clock_resolution() -> Duration {
    (0..8)
        .map(|_| {
            let start = Instant::now();
            loop {
                let step = start.elapsed();
                if step > Duration::ZERO {
                    break step;
                }
            }
        })
        .min()
        .unwrap_or_default()
}

pub struct BenchmarkRunner<C, R = StdRng> {
    connector: C,
    config: BenchConfig,
    rng: R,
    state: PassState,
}

impl<C: Connector> BenchmarkRunner<C, StdRng> {
    /// Runner whose sampler is seeded from `config.seed`, or from OS entropy
    /// when no seed is configured.
    pub fn new(connector: C, config: BenchConfig) -> Result<Self> {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self::with_rng(connector, config, rng)
    }
}

impl<C: Connector, R: Rng> BenchmarkRunner<C, R> {
    /// Runner with an explicit sampling source.
    pub fn with_rng(connector: C, config: BenchConfig, rng: R) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            connector,
            config,
            rng,
            state: PassState::Idle,
        })
    }

    pub fn config(&self) -> &BenchConfig {
        &self.config
    }

    /// State of the current or most recent pass.
    pub fn state(&self) -> PassState {
        self.state
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// Connect to `target` and reset the collection used by `scheme`.
    pub async fn provision_collection(
        &self,
        target: &Target,
        scheme: IdentifierScheme,
    ) -> Result<CollectionOf<C>> {
        let store = self.connector.connect(target, &self.config.database).await?;
        let name = self.config.collection_name(scheme);
        debug!(endpoint = %target, collection = %name, "provisioning collection");
        store.reset_collection(&name).await
    }

    /// Draw `count` identifiers from `ids` with the runner's sampling source.
    pub fn sample_identifiers(&mut self, ids: &[Identifier], count: usize) -> Result<Vec<Identifier>> {
        sample_identifiers(&mut self.rng, ids, count)
    }

    /// Run every configured scheme against every configured target, in
    /// configuration order. The first failure aborts the whole run.
    pub async fn run_all(&mut self) -> Result<Vec<ResultRow>> {
        let targets = self.config.targets.clone();
        let schemes = self.config.schemes.clone();
        let (insertions, retrievals) = (self.config.insertion_count, self.config.retrieval_count);

        let mut rows = Vec::with_capacity(targets.len() * schemes.len());
        for target in &targets {
            for &scheme in &schemes {
                rows.push(self.run_pass(target, scheme, insertions, retrievals).await?);
            }
        }
        Ok(rows)
    }

    /// One complete measurement pass for a (target, scheme) pair.
    pub async fn run_pass(
        &mut self,
        target: &Target,
        scheme: IdentifierScheme,
        insertion_count: usize,
        retrieval_count: usize,
    ) -> Result<ResultRow> {
        self.state = PassState::Idle;
        let result = self
            .pass(target, scheme, insertion_count, retrieval_count)
            .await;
        self.state = match result {
            Ok(_) => PassState::Done,
            Err(_) => PassState::Failed,
        };
        result
    }

    async fn pass(
        &mut self,
        target: &Target,
        scheme: IdentifierScheme,
        insertion_count: usize,
        retrieval_count: usize,
    ) -> Result<ResultRow> {
        info!(endpoint = %target, scheme = %scheme, "running pass");
        debug!(
            clock = "monotonic",
            resolution_ns = clock_resolution().as_nanos() as u64,
            "timing lookups"
        );

        let collection = self.provision_collection(target, scheme).await?;
        self.state = PassState::Provisioned;

        info!(count = insertion_count, "inserting");
        let ids = insert_batch(&collection, scheme, insertion_count).await?;
        info!(count = ids.len(), "inserted documents");
        self.state = PassState::Inserted;

        // Fixed before timing starts so RNG cost stays out of the series.
        let to_retrieve = self.sample_identifiers(&ids, retrieval_count)?;
        let warmup_count = self.config.warmup_count;
        let warmup = self.sample_identifiers(&ids, warmup_count)?;
        self.state = PassState::Sampled;

        if !warmup.is_empty() {
            debug!(count = warmup.len(), "warming up");
            for id in &warmup {
                collection.find_by_id(id).await?;
            }
        }

        let mut samples = Vec::with_capacity(to_retrieve.len());
        let mut misses = 0;
        for (k, id) in to_retrieve.iter().enumerate() {
            self.state = PassState::Retrieving(k);
            let lookup = timed_retrieve(&collection, id).await?;
            if lookup.record.is_none() {
                misses += 1;
                warn!(%id, "lookup of an inserted identifier matched no document");
            }
            samples.push(lookup.elapsed);
        }
        self.state = PassState::Retrieving(samples.len());

        let row = ResultRow {
            label: ResultRow::label_for(target, scheme),
            target: target.name.clone(),
            scheme,
            samples,
            misses,
        };
        if misses > 0 {
            warn!(label = %row.label, misses, "pass finished with missed lookups");
        }
        if let Some(s) = row.stats() {
            info!(
                label = %row.label,
                p50_ms = duration_ms(s.p50),
                p99_ms = duration_ms(s.p99),
                avg_ms = duration_ms(s.avg),
                "pass complete"
            );
        }
        Ok(row)
    }
}
