use std::sync::Arc;

use serde_json::Value;
use tracing::{info, instrument};

use models::{
    record::{ADMIN_EMAIL, EMAIL, ID, PHOTO, SERVICE_STATUS},
    Collection, Filter, FindSpec, Record, RecordId,
};

use crate::errors::ServiceError;
use crate::store::DocumentStore;

/// How many reviews the landing page shows.
pub const REVIEW_LIMIT: i64 = 3;

/// One store primitive per resource operation, independent of the web framework.
pub struct ResourceGateway {
    store: Arc<dyn DocumentStore>,
}

impl ResourceGateway {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self { Self { store } }

    /// Ids are always store-generated; a client-supplied `_id` is dropped.
    async fn insert(&self, collection: Collection, mut record: Record) -> Result<Record, ServiceError> {
        record.remove(ID);
        let stored = self.store.insert_one(collection, record).await?;
        let id = stored.get(ID).cloned().unwrap_or_default();
        info!(collection = %collection, %id, "record_inserted");
        Ok(stored)
    }

    /// Insert a service whose banner has already been relayed; `photo_url` overrides any submitted `photo`.
    #[instrument(skip(self, fields))]
    pub async fn create_service(&self, mut fields: Record, photo_url: String) -> Result<Record, ServiceError> {
        fields.insert(PHOTO.to_string(), Value::String(photo_url));
        self.insert(Collection::Services, fields).await
    }

    pub async fn list_services(&self) -> Result<Vec<Record>, ServiceError> {
        self.store.find(Collection::Services, Filter::All, FindSpec::default()).await
    }

    /// The newest reviews, at most [`REVIEW_LIMIT`].
    pub async fn latest_reviews(&self) -> Result<Vec<Record>, ServiceError> {
        self.store.find(Collection::Reviews, Filter::All, FindSpec::newest(REVIEW_LIMIT)).await
    }

    pub async fn submit_registration(&self, record: Record) -> Result<Record, ServiceError> {
        self.insert(Collection::Registrations, record).await
    }

    pub async fn add_admin(&self, record: Record) -> Result<Record, ServiceError> {
        self.insert(Collection::Admins, record).await
    }

    #[instrument(skip(self))]
    pub async fn search_admins(&self, email: Option<String>) -> Result<Vec<Record>, ServiceError> {
        self.store
            .find(Collection::Admins, Filter::eq_opt(ADMIN_EMAIL, email), FindSpec::default())
            .await
    }

    pub async fn create_order(&self, record: Record) -> Result<Record, ServiceError> {
        self.insert(Collection::ServiceRegistrations, record).await
    }

    pub async fn post_review(&self, record: Record) -> Result<Record, ServiceError> {
        self.insert(Collection::Reviews, record).await
    }

    pub async fn list_orders(&self) -> Result<Vec<Record>, ServiceError> {
        self.store
            .find(Collection::ServiceRegistrations, Filter::All, FindSpec::default())
            .await
    }

    #[instrument(skip(self))]
    pub async fn list_orders_for(&self, user: Option<String>) -> Result<Vec<Record>, ServiceError> {
        self.store
            .find(Collection::ServiceRegistrations, Filter::eq_opt(EMAIL, user), FindSpec::default())
            .await
    }

    /// Set `serviceStatus` on one order; `true` only when the stored value changed.
    #[instrument(skip(self, status))]
    pub async fn update_order_status(&self, id: &str, status: Value) -> Result<bool, ServiceError> {
        let id = RecordId::parse(id)?;
        let outcome = self
            .store
            .set_field(Collection::ServiceRegistrations, id, SERVICE_STATUS, status)
            .await?;
        info!(%id, matched = outcome.matched, modified = outcome.modified, "order_status_updated");
        Ok(outcome.modified > 0)
    }
}
