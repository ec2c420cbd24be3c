//! # Customer Repository
//!
//! Phone is the natural key for customers but is not unique in storage.
//! Lookups return the first match by id.

use tracing::debug;

use potu_core::{Customer, CustomerFields, CustomerPatch};

use super::{insert_and_load, load_all, load_one, load_where, update_and_load};
use crate::error::DbResult;
use crate::store::{Collection, RecordAccess};

const COLLECTION: Collection = Collection::Customers;

pub struct CustomerRepository<'a> {
    store: &'a dyn RecordAccess,
}

impl<'a> CustomerRepository<'a> {
    pub fn new(store: &'a dyn RecordAccess) -> Self {
        CustomerRepository { store }
    }

    pub async fn list(&self) -> DbResult<Vec<Customer>> {
        load_all(self.store, COLLECTION).await
    }

    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Customer>> {
        load_one(self.store, COLLECTION, id).await
    }

    /// First customer whose phone equals `phone` exactly.
    pub async fn find_by_phone(&self, phone: &str) -> DbResult<Option<Customer>> {
        let found: Vec<Customer> = load_where(self.store, COLLECTION, &|r| {
            r.get("phone").and_then(|v| v.as_str()) == Some(phone)
        })
        .await?;
        Ok(found.into_iter().next())
    }

    pub async fn insert(&self, fields: &CustomerFields) -> DbResult<Customer> {
        debug!(phone = %fields.phone, "Inserting customer");
        insert_and_load(self.store, COLLECTION, fields).await
    }

    pub async fn update(&self, id: i64, patch: &CustomerPatch) -> DbResult<Customer> {
        debug!(id = id, "Updating customer");
        update_and_load(self.store, COLLECTION, id, patch).await
    }

    pub async fn delete(&self, id: i64) -> DbResult<u64> {
        debug!(id = id, "Deleting customer");
        self.store.delete(COLLECTION, id).await
    }
}
