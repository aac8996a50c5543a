//! The document-database boundary.
//!
//! The runner needs exactly four capabilities from a database: connect to a
//! target, reset a collection, bulk-insert records and find one record by its
//! identifier. Each backend implements them through the traits below.

use async_trait::async_trait;

use crate::config::Target;
use crate::error::Result;
use crate::scheme::{Identifier, Record};

pub mod memory;
pub mod mongo;

pub use memory::MemoryConnector;
pub use mongo::MongoConnector;

/// Opens a connection to a target.
#[async_trait]
pub trait Connector: Send + Sync {
    type Store: DocumentStore;

    /// Fails with `BenchError::Connection` when the target is unreachable.
    async fn connect(&self, target: &Target, database: &str) -> Result<Self::Store>;
}

/// A connected database.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    type Collection: DocumentCollection;

    /// Drop `name` if it exists and create it empty.
    ///
    /// Fails with `BenchError::Provisioning`.
    async fn reset_collection(&self, name: &str) -> Result<Self::Collection>;
}

/// A collection of benchmark records.
#[async_trait]
pub trait DocumentCollection: Send + Sync {
    /// Insert all records in one bulk call. Fails with `BenchError::Insert`.
    async fn insert_many(&self, records: &[Record]) -> Result<()>;

    /// Find the first record whose `_id` equals `id`.
    ///
    /// `Ok(None)` when nothing matches; `BenchError::Retrieval` only when the
    /// query itself fails.
    async fn find_by_id(&self, id: &Identifier) -> Result<Option<Record>>;
}

/// Collection handle type produced by a connector.
pub type CollectionOf<C> = <<C as Connector>::Store as DocumentStore>::Collection;
