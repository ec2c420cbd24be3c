//! Products and categories.

use chrono::Utc;
use potu_core::numbering::{serial_number, SERIAL_SUFFIX_RANGE};
use potu_core::reports::low_stock;
use potu_core::validation::{validate_category_name, validate_new_product, validate_product_patch};
use potu_core::{Category, CoreError, NewCategory, NewProduct, Product, ProductFields, ProductPatch};
use potu_core::{ProductWithStock, DEFAULT_LOW_STOCK_THRESHOLD};
use potu_db::{Database, DbError, RecordAccess};
use rand::Rng;
use tracing::info;

use super::ServiceResult;

/// Catalog operations.
pub struct CatalogService<'a> {
    db: &'a Database,
}

impl<'a> CatalogService<'a> {
    pub fn new(db: &'a Database) -> Self {
        CatalogService { db }
    }

    // =========================================================================
    // Products
    // =========================================================================

    pub async fn list_products(&self) -> ServiceResult<Vec<ProductWithStock>> {
        let products = self.db.products().list().await?;
        Ok(products.into_iter().map(ProductWithStock::from).collect())
    }

    pub async fn get_product(&self, id: i64) -> ServiceResult<ProductWithStock> {
        let product = self
            .db
            .products()
            .get_by_id(id)
            .await?
            .ok_or(CoreError::ProductNotFound(id))?;
        Ok(product.into())
    }

    /// Creates a product, generating `serial_no` when the request has none.
    pub async fn create_product(&self, new: NewProduct) -> ServiceResult<Product> {
        validate_new_product(&new)?;

        let suffix = rand::rng().random_range(SERIAL_SUFFIX_RANGE.0..=SERIAL_SUFFIX_RANGE.1);
        let fields = ProductFields::from_new(new, serial_number(Utc::now(), suffix));
        let product = self.db.products().insert(&fields).await?;

        info!(id = product.id, serial_no = %product.serial_no, "Product created");
        Ok(product)
    }

    /// Applies a partial update. `sold_items` may be set directly for
    /// manual stock corrections.
    pub async fn update_product(&self, id: i64, patch: ProductPatch) -> ServiceResult<Product> {
        validate_product_patch(&patch)?;

        match self.db.products().update(id, &patch).await {
            Ok(product) => {
                info!(id = id, "Product updated");
                Ok(product)
            }
            Err(DbError::RecordNotFound { .. }) => Err(CoreError::ProductNotFound(id).into()),
            Err(e) => Err(e.into()),
        }
    }

    /// Deletes a product and returns it. Past line items keep their
    /// snapshot of it.
    pub async fn delete_product(&self, id: i64) -> ServiceResult<Product> {
        let tx = self.db.begin().await?;
        let product = tx
            .products()
            .get_by_id(id)
            .await?
            .ok_or(CoreError::ProductNotFound(id))?;
        tx.products().delete(id).await?;
        tx.commit().await?;

        info!(id = id, name = %product.item_name, "Product deleted");
        Ok(product)
    }

    /// Products with `0 < remaining_items <= threshold`.
    pub async fn low_stock(&self, threshold: Option<i64>) -> ServiceResult<Vec<ProductWithStock>> {
        let products = self.db.products().list().await?;
        Ok(low_stock(&products, threshold.unwrap_or(DEFAULT_LOW_STOCK_THRESHOLD)))
    }

    // =========================================================================
    // Categories
    // =========================================================================

    pub async fn list_categories(&self) -> ServiceResult<Vec<Category>> {
        Ok(self.db.categories().list().await?)
    }

    pub async fn create_category(&self, new: NewCategory) -> ServiceResult<Category> {
        let name = validate_category_name(&new.name)?;

        let tx = self.db.begin().await?;
        if tx.categories().find_by_name(&name).await?.is_some() {
            return Err(CoreError::DuplicateCategory { name }.into());
        }
        let category = tx.categories().insert(&name).await?;
        tx.commit().await?;

        info!(id = category.id, name = %category.name, "Category created");
        Ok(category)
    }

    /// Deletes a category no product refers to by name.
    pub async fn delete_category(&self, id: i64) -> ServiceResult<Category> {
        let tx = self.db.begin().await?;
        let category = tx
            .categories()
            .get_by_id(id)
            .await?
            .ok_or(CoreError::CategoryNotFound(id))?;

        let count = tx.products().count_in_category(&category.name).await?;
        if count > 0 {
            return Err(CoreError::CategoryInUse {
                name: category.name,
                count,
            }
            .into());
        }

        tx.categories().delete(id).await?;
        tx.commit().await?;

        info!(id = id, name = %category.name, "Category deleted");
        Ok(category)
    }
}
