//! In-process backend.
//!
//! Used by the tests, the criterion benches and `--backend memory` dry runs.
//! Lookups can be slowed by a fixed injected latency, and every boundary
//! operation can be made to fail so each error path of a pass is reachable.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use super::{Connector, DocumentCollection, DocumentStore};
use crate::config::Target;
use crate::error::{BenchError, Result};
use crate::scheme::{Identifier, Record};

/// Error raised by an injected fault.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct MemoryFault(pub &'static str);

#[derive(Debug, Clone, Default)]
struct Behaviour {
    unreachable: HashSet<String>,
    fail_reset: bool,
    fail_insert: bool,
    fail_lookup: bool,
    lookup_latency: Duration,
}

/// Collections keyed by (address, database, collection).
type Collections = HashMap<(String, String, String), Arc<Mutex<HashSet<Identifier>>>>;

/// Connector over a shared in-memory "server".
///
/// Clones share data, so records written through one handle are visible to
/// handles opened later against the same address.
#[derive(Debug, Clone, Default)]
pub struct MemoryConnector {
    collections: Arc<Mutex<Collections>>,
    behaviour: Arc<Behaviour>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MemoryConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every `find_by_id` by `latency`.
    pub fn with_lookup_latency(mut self, latency: Duration) -> Self {
        Arc::make_mut(&mut self.behaviour).lookup_latency = latency;
        self
    }

    /// Refuse connections to `address`.
    pub fn with_unreachable(mut self, address: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.behaviour)
            .unreachable
            .insert(address.into());
        self
    }

    pub fn with_failing_reset(mut self) -> Self {
        Arc::make_mut(&mut self.behaviour).fail_reset = true;
        self
    }

    pub fn with_failing_inserts(mut self) -> Self {
        Arc::make_mut(&mut self.behaviour).fail_insert = true;
        self
    }

    pub fn with_failing_lookups(mut self) -> Self {
        Arc::make_mut(&mut self.behaviour).fail_lookup = true;
        self
    }

    /// Number of records currently stored in a collection, `None` if it was
    /// never provisioned.
    pub fn collection_len(&self, address: &str, database: &str, name: &str) -> Option<usize> {
        let key = (address.to_string(), database.to_string(), name.to_string());
        lock(&self.collections).get(&key).map(|docs| lock(docs).len())
    }
}

#[async_trait]
impl Connector for MemoryConnector {
    type Store = MemoryStore;

    async fn connect(&self, target: &Target, database: &str) -> Result<MemoryStore> {
        if self.behaviour.unreachable.contains(&target.address) {
            return Err(BenchError::Connection {
                target: target.name.clone(),
                source: Box::new(MemoryFault("address unreachable")),
            });
        }
        Ok(MemoryStore {
            collections: Arc::clone(&self.collections),
            behaviour: Arc::clone(&self.behaviour),
            address: target.address.clone(),
            database: database.to_string(),
        })
    }
}

pub struct MemoryStore {
    collections: Arc<Mutex<Collections>>,
    behaviour: Arc<Behaviour>,
    address: String,
    database: String,
}

#[async_trait]
impl DocumentStore for MemoryStore {
    type Collection = MemoryCollection;

    async fn reset_collection(&self, name: &str) -> Result<MemoryCollection> {
        if self.behaviour.fail_reset {
            return Err(BenchError::Provisioning {
                collection: name.to_string(),
                source: Box::new(MemoryFault("collection reset refused")),
            });
        }
        let docs = Arc::new(Mutex::new(HashSet::new()));
        let key = (self.address.clone(), self.database.clone(), name.to_string());
        lock(&self.collections).insert(key, Arc::clone(&docs));
        Ok(MemoryCollection {
            docs,
            behaviour: Arc::clone(&self.behaviour),
        })
    }
}

pub struct MemoryCollection {
    docs: Arc<Mutex<HashSet<Identifier>>>,
    behaviour: Arc<Behaviour>,
}

impl MemoryCollection {
    pub fn len(&self) -> usize {
        lock(&self.docs).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, id: &Identifier) -> bool {
        lock(&self.docs).contains(id)
    }
}

#[async_trait]
impl DocumentCollection for MemoryCollection {
    async fn insert_many(&self, records: &[Record]) -> Result<()> {
        if self.behaviour.fail_insert {
            return Err(BenchError::Insert {
                count: records.len(),
                source: Box::new(MemoryFault("bulk write refused")),
            });
        }
        let mut docs = lock(&self.docs);
        // Duplicate keys reject the whole batch, like an ordered bulk write
        // that is reported as one failure.
        let mut batch = HashSet::with_capacity(records.len());
        let duplicate = records
            .iter()
            .any(|r| docs.contains(&r.id) || !batch.insert(r.id));
        if duplicate {
            return Err(BenchError::Insert {
                count: records.len(),
                source: Box::new(MemoryFault("duplicate key")),
            });
        }
        docs.extend(batch);
        Ok(())
    }

    async fn find_by_id(&self, id: &Identifier) -> Result<Option<Record>> {
        let latency = self.behaviour.lookup_latency;
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        if self.behaviour.fail_lookup {
            return Err(BenchError::Retrieval {
                id: id.to_string(),
                source: Box::new(MemoryFault("query refused")),
            });
        }
        Ok(lock(&self.docs).get(id).map(|id| Record { id: *id }))
    }
}
