use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::{self, doc, Bson, Document},
    options::FindOptions,
    Database,
};
use serde_json::Value;
use tracing::{debug, instrument};

use models::{record::ID, Collection, Filter, FindSpec, Record, RecordId};

use super::{DocumentStore, UpdateOutcome};
use crate::errors::ServiceError;

/// MongoDB-backed store sharing one `Database` handle for the process lifetime.
#[derive(Clone)]
pub struct MongoStore {
    db: Database,
}

impl MongoStore {
    pub fn new(db: Database) -> Self { Self { db } }

    fn collection(&self, collection: Collection) -> mongodb::Collection<Document> {
        self.db.collection::<Document>(collection.name())
    }
}

fn to_document(record: &Record) -> Result<Document, ServiceError> {
    bson::to_document(record).map_err(|e| ServiceError::Validation(e.to_string()))
}

fn filter_document(filter: &Filter) -> Result<Document, ServiceError> {
    match filter {
        Filter::All => Ok(doc! {}),
        Filter::Eq { field, value } => {
            let value = bson::to_bson(value).map_err(|e| ServiceError::Validation(e.to_string()))?;
            let mut d = Document::new();
            d.insert(field.as_str(), value);
            Ok(d)
        }
    }
}

/// Object ids are rendered as bare hex strings; everything else as relaxed extended JSON.
fn id_to_json(id: Bson) -> Value {
    match id {
        Bson::ObjectId(oid) => Value::String(oid.to_hex()),
        other => other.into_relaxed_extjson(),
    }
}

fn to_record(mut doc: Document) -> Record {
    let hex = match doc.get(ID) {
        Some(Bson::ObjectId(oid)) => Some(oid.to_hex()),
        _ => None,
    };
    if let Some(hex) = hex {
        doc.insert(ID, hex);
    }
    match Bson::Document(doc).into_relaxed_extjson() {
        Value::Object(map) => map,
        _ => Record::new(),
    }
}

#[async_trait]
impl DocumentStore for MongoStore {
    #[instrument(skip(self, record), fields(collection = %collection))]
    async fn insert_one(&self, collection: Collection, record: Record) -> Result<Record, ServiceError> {
        let doc = to_document(&record)?;
        let res = self.collection(collection).insert_one(&doc, None).await?;
        let mut out = Record::new();
        out.insert(ID.to_string(), id_to_json(res.inserted_id));
        out.extend(record);
        debug!(id = %out[ID], "inserted");
        Ok(out)
    }

    #[instrument(skip(self), fields(collection = %collection))]
    async fn find(&self, collection: Collection, filter: Filter, spec: FindSpec) -> Result<Vec<Record>, ServiceError> {
        let mut opts = FindOptions::default();
        if spec.newest_first {
            opts.sort = Some(doc! { "$natural": -1 });
        }
        opts.limit = spec.limit;
        let cursor = self.collection(collection).find(filter_document(&filter)?, opts).await?;
        let docs: Vec<Document> = cursor.try_collect().await?;
        Ok(docs.into_iter().map(to_record).collect())
    }

    #[instrument(skip(self, value), fields(collection = %collection, id = %id))]
    async fn set_field(
        &self,
        collection: Collection,
        id: RecordId,
        field: &str,
        value: Value,
    ) -> Result<UpdateOutcome, ServiceError> {
        let value = bson::to_bson(&value).map_err(|e| ServiceError::Validation(e.to_string()))?;
        let mut set = Document::new();
        set.insert(field, value);
        let res = self
            .collection(collection)
            .update_one(doc! { "_id": id.object_id() }, doc! { "$set": set }, None)
            .await?;
        Ok(UpdateOutcome { matched: res.matched_count, modified: res.modified_count })
    }
}
