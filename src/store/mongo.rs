//! MongoDB backend (also works against API-compatible services such as
//! Cosmos DB for MongoDB).

use async_trait::async_trait;
use mongodb::bson::{doc, Document};
use mongodb::{Client, Collection, Database};
use tracing::debug;

use super::{Connector, DocumentCollection, DocumentStore};
use crate::config::Target;
use crate::error::{BenchError, Result};
use crate::scheme::{Identifier, Record};

/// Connects with the official driver. A fresh client is built per call.
#[derive(Debug, Clone, Default)]
pub struct MongoConnector;

impl MongoConnector {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Connector for MongoConnector {
    type Store = MongoStore;

    async fn connect(&self, target: &Target, database: &str) -> Result<MongoStore> {
        let connection_error = |e: mongodb::error::Error| BenchError::Connection {
            target: target.name.clone(),
            source: Box::new(e),
        };

        let client = Client::with_uri_str(&target.address)
            .await
            .map_err(connection_error)?;

        // Client construction is lazy; ping so an unreachable endpoint or bad
        // credentials surface here rather than during provisioning.
        client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(connection_error)?;
        debug!(endpoint = %target.name, database, "connected");

        Ok(MongoStore {
            db: client.database(database),
        })
    }
}

pub struct MongoStore {
    db: Database,
}

#[async_trait]
impl DocumentStore for MongoStore {
    type Collection = MongoCollection;

    async fn reset_collection(&self, name: &str) -> Result<MongoCollection> {
        let provisioning_error = |e: mongodb::error::Error| BenchError::Provisioning {
            collection: name.to_string(),
            source: Box::new(e),
        };

        let collection = self.db.collection::<Document>(name);
        collection.drop().await.map_err(provisioning_error)?;
        self.db
            .create_collection(name)
            .await
            .map_err(provisioning_error)?;
        debug!(collection = name, "collection reset");

        Ok(MongoCollection { inner: collection })
    }
}

pub struct MongoCollection {
    inner: Collection<Document>,
}

#[async_trait]
impl DocumentCollection for MongoCollection {
    async fn insert_many(&self, records: &[Record]) -> Result<()> {
        let docs: Vec<Document> = records.iter().map(|r| doc! { "_id": r.id.to_bson() }).collect();
        self.inner
            .insert_many(docs)
            .await
            .map_err(|e| BenchError::Insert {
                count: records.len(),
                source: Box::new(e),
            })?;
        Ok(())
    }

    async fn find_by_id(&self, id: &Identifier) -> Result<Option<Record>> {
        let found = self
            .inner
            .find_one(doc! { "_id": id.to_bson() })
            .await
            .map_err(|e| BenchError::Retrieval {
                id: id.to_string(),
                source: Box::new(e),
            })?;

        Ok(found.and_then(|d| {
            d.get("_id")
                .and_then(Identifier::from_bson)
                .map(|id| Record { id })
        }))
    }
}
