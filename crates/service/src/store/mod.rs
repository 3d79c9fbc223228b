//! Document-store abstraction
//!
//! Handlers talk to a `DocumentStore` trait object injected at startup, so the
//! MongoDB client and the in-memory test store are interchangeable.

pub mod memory;
pub mod mongo;

use async_trait::async_trait;
use models::{Collection, Filter, FindSpec, Record, RecordId};
use serde_json::Value;

use crate::errors::ServiceError;

pub use memory::MemoryStore;
pub use mongo::MongoStore;

/// Result of a single-document update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateOutcome {
    pub matched: u64,
    pub modified: u64,
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert one record; the returned copy carries the generated `_id`.
    async fn insert_one(&self, collection: Collection, record: Record) -> Result<Record, ServiceError>;

    async fn find(&self, collection: Collection, filter: Filter, spec: FindSpec) -> Result<Vec<Record>, ServiceError>;

    /// `$set` one field on the record with the given id.
    async fn set_field(
        &self,
        collection: Collection,
        id: RecordId,
        field: &str,
        value: Value,
    ) -> Result<UpdateOutcome, ServiceError>;
}
