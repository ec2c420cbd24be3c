//! Customer directory.
//!
//! ## Find-or-create
//! ```text
//! phone "555-0101" ──► first customer with that exact phone?
//!                        │
//!              yes ──────┴────── no
//!               │                 │
//!   coalesce update:          insert new customer
//!   non-empty input wins,
//!   empty input keeps stored
//!               │                 │
//!               └──── customer ◄──┘
//! ```
//! Phones are compared verbatim. `555-0101` and `5550101` are different
//! customers.

use potu_core::reports::{customers_with_order_counts, customers_with_products};
use potu_core::validation::validate_phone;
use potu_core::{CoreError, Customer, CustomerFields, CustomerPatch, Order};
use potu_core::reports::{CustomerWithOrderCount, CustomerWithProducts};
use potu_db::{Database, DbError, DbResult, RecordAccess};
use tracing::{debug, info};

use super::ServiceResult;

/// Finds the customer with `contact.phone` and refreshes their details,
/// or creates one.
///
/// Generic over the store so the order engine can run it inside its
/// transaction.
pub async fn find_or_create<S: RecordAccess>(store: &S, contact: &CustomerFields) -> DbResult<Customer> {
    match store.customers().find_by_phone(&contact.phone).await? {
        Some(existing) => {
            let patch = contact.coalesce_patch();
            if patch == CustomerPatch::default() {
                debug!(id = existing.id, "Customer found, nothing to update");
                return Ok(existing);
            }
            debug!(id = existing.id, "Customer found, updating details");
            store.customers().update(existing.id, &patch).await
        }
        None => {
            let customer = store.customers().insert(contact).await?;
            debug!(id = customer.id, "Customer created");
            Ok(customer)
        }
    }
}

/// Customer operations.
pub struct CustomerService<'a> {
    db: &'a Database,
}

impl<'a> CustomerService<'a> {
    pub fn new(db: &'a Database) -> Self {
        CustomerService { db }
    }

    /// Every customer with their order count, newest customer first.
    pub async fn list(&self) -> ServiceResult<Vec<CustomerWithOrderCount>> {
        let customers = self.db.customers().list().await?;
        let orders = self.db.orders().list().await?;
        Ok(customers_with_order_counts(&customers, &orders))
    }

    pub async fn get(&self, id: i64) -> ServiceResult<Customer> {
        Ok(self
            .db
            .customers()
            .get_by_id(id)
            .await?
            .ok_or(CoreError::CustomerNotFound(id))?)
    }

    /// Each customer with the distinct names of products they bought.
    pub async fn with_products(&self) -> ServiceResult<Vec<CustomerWithProducts>> {
        let customers = self.db.customers().list().await?;
        let orders = self.db.orders().list().await?;
        let items = self.db.orders().all_items().await?;
        let products = self.db.products().list().await?;
        Ok(customers_with_products(&customers, &orders, &items, &products))
    }

    /// The customer's orders, newest first.
    pub async fn orders(&self, id: i64) -> ServiceResult<Vec<Order>> {
        self.get(id).await?;
        let mut orders = self.db.orders().for_customer(id).await?;
        orders.sort_by(|a, b| b.order_date.cmp(&a.order_date));
        Ok(orders)
    }

    pub async fn create(&self, fields: CustomerFields) -> ServiceResult<Customer> {
        validate_phone(Some(&fields.phone))?;
        let customer = self.db.customers().insert(&fields).await?;
        info!(id = customer.id, "Customer created");
        Ok(customer)
    }

    /// Applies the fields present in `patch`.
    pub async fn update(&self, id: i64, patch: CustomerPatch) -> ServiceResult<Customer> {
        if let Some(phone) = patch.phone.as_deref() {
            validate_phone(Some(phone))?;
        }
        match self.db.customers().update(id, &patch).await {
            Ok(customer) => {
                info!(id = id, "Customer updated");
                Ok(customer)
            }
            Err(DbError::RecordNotFound { .. }) => Err(CoreError::CustomerNotFound(id).into()),
            Err(e) => Err(e.into()),
        }
    }

    /// Deletes the customer and returns it. Their orders keep the copied
    /// name.
    pub async fn delete(&self, id: i64) -> ServiceResult<Customer> {
        let tx = self.db.begin().await?;
        let customer = tx
            .customers()
            .get_by_id(id)
            .await?
            .ok_or(CoreError::CustomerNotFound(id))?;
        tx.customers().delete(id).await?;
        tx.commit().await?;

        info!(id = id, "Customer deleted");
        Ok(customer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use potu_db::DbConfig;

    fn contact(name: &str, phone: &str, email: Option<&str>) -> CustomerFields {
        CustomerFields {
            customer_name: name.to_string(),
            phone: phone.to_string(),
            email: email.map(str::to_string),
            address: None,
        }
    }

    #[tokio::test]
    async fn test_find_or_create_reuses_phone() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let first = find_or_create(&db, &contact("Alice", "555-0101", None)).await.unwrap();
        let again = find_or_create(&db, &contact("", "555-0101", Some("alice@example.com")))
            .await
            .unwrap();

        assert_eq!(first.id, again.id);
        assert_eq!(again.customer_name, "Alice");
        assert_eq!(again.email.as_deref(), Some("alice@example.com"));

        let renamed = find_or_create(&db, &contact("Alice B", "555-0101", None)).await.unwrap();
        assert_eq!(renamed.id, first.id);
        assert_eq!(renamed.customer_name, "Alice B");
        assert_eq!(renamed.email.as_deref(), Some("alice@example.com"));

        assert_eq!(db.customers().list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_phones_are_not_normalized() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let a = find_or_create(&db, &contact("A", "555-0101", None)).await.unwrap();
        let b = find_or_create(&db, &contact("B", "5550101", None)).await.unwrap();
        assert_ne!(a.id, b.id);
    }

    #[tokio::test]
    async fn test_update_and_delete_missing_customer() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let service = CustomerService::new(&db);

        let err = service.update(9, CustomerPatch::default()).await.unwrap_err();
        assert!(matches!(
            err,
            crate::services::ServiceError::Domain(CoreError::CustomerNotFound(9))
        ));
        assert!(service.delete(9).await.is_err());
    }
}
