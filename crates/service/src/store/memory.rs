use std::{
    collections::HashMap,
    sync::atomic::{AtomicBool, Ordering},
};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use models::{record::ID, Collection, Filter, FindSpec, Record, RecordId};

use super::{DocumentStore, UpdateOutcome};
use crate::errors::ServiceError;

/// In-memory document store for tests and local runs without MongoDB.
///
/// Records keep insertion order per collection, which is what newest-first
/// reads reverse. `set_unavailable(true)` makes every call fail like a
/// dropped connection.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<HashMap<Collection, Vec<Record>>>,
    unavailable: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self { Self::default() }

    pub fn set_unavailable(&self, down: bool) {
        self.unavailable.store(down, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), ServiceError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(ServiceError::Store("memory store marked unavailable".into()));
        }
        Ok(())
    }

    /// Number of records currently held in a collection.
    pub async fn count(&self, collection: Collection) -> usize {
        let map = self.inner.read().await;
        map.get(&collection).map_or(0, Vec::len)
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn insert_one(&self, collection: Collection, record: Record) -> Result<Record, ServiceError> {
        self.check()?;
        let mut stored = Record::new();
        stored.insert(ID.to_string(), Value::String(RecordId::generate().to_hex()));
        stored.extend(record);
        let mut map = self.inner.write().await;
        map.entry(collection).or_default().push(stored.clone());
        Ok(stored)
    }

    async fn find(&self, collection: Collection, filter: Filter, spec: FindSpec) -> Result<Vec<Record>, ServiceError> {
        self.check()?;
        let map = self.inner.read().await;
        let Some(records) = map.get(&collection) else { return Ok(Vec::new()) };
        let matching: Box<dyn Iterator<Item = &Record>> = if spec.newest_first {
            Box::new(records.iter().rev().filter(|r| filter.matches(r)))
        } else {
            Box::new(records.iter().filter(|r| filter.matches(r)))
        };
        // the driver treats a zero or negative limit as "no limit" / single batch
        let cap = match spec.limit {
            Some(n) if n > 0 => n as usize,
            Some(n) if n < 0 => n.unsigned_abs() as usize,
            _ => usize::MAX,
        };
        Ok(matching.take(cap).cloned().collect())
    }

    async fn set_field(
        &self,
        collection: Collection,
        id: RecordId,
        field: &str,
        value: Value,
    ) -> Result<UpdateOutcome, ServiceError> {
        self.check()?;
        let key = Value::String(id.to_hex());
        let mut map = self.inner.write().await;
        let Some(record) = map
            .get_mut(&collection)
            .and_then(|records| records.iter_mut().find(|r| r.get(ID) == Some(&key)))
        else {
            return Ok(UpdateOutcome::default());
        };
        let changed = record.get(field) != Some(&value);
        if changed {
            record.insert(field.to_string(), value);
        }
        Ok(UpdateOutcome { matched: 1, modified: u64::from(changed) })
    }
}
