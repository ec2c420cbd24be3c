//! # Category Repository

use tracing::debug;

use potu_core::{Category, NewCategory};

use super::{insert_and_load, load_all, load_one, load_where};
use crate::error::DbResult;
use crate::store::{Collection, RecordAccess};

const COLLECTION: Collection = Collection::Categories;

pub struct CategoryRepository<'a> {
    store: &'a dyn RecordAccess,
}

impl<'a> CategoryRepository<'a> {
    pub fn new(store: &'a dyn RecordAccess) -> Self {
        CategoryRepository { store }
    }

    /// All categories, sorted by name.
    pub async fn list(&self) -> DbResult<Vec<Category>> {
        let mut categories: Vec<Category> = load_all(self.store, COLLECTION).await?;
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Category>> {
        load_one(self.store, COLLECTION, id).await
    }

    /// Exact, case-sensitive name match.
    pub async fn find_by_name(&self, name: &str) -> DbResult<Option<Category>> {
        let found: Vec<Category> = load_where(self.store, COLLECTION, &|r| {
            r.get("name").and_then(|v| v.as_str()) == Some(name)
        })
        .await?;
        Ok(found.into_iter().next())
    }

    pub async fn insert(&self, name: &str) -> DbResult<Category> {
        debug!(name = %name, "Inserting category");
        let fields = NewCategory {
            name: name.to_string(),
        };
        insert_and_load(self.store, COLLECTION, &fields).await
    }

    pub async fn delete(&self, id: i64) -> DbResult<u64> {
        debug!(id = id, "Deleting category");
        self.store.delete(COLLECTION, id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    #[tokio::test]
    async fn test_list_sorted_and_find_by_name() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.categories().insert("Kitchen").await.unwrap();
        db.categories().insert("Electronics").await.unwrap();

        let names: Vec<String> = db
            .categories()
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["Electronics", "Kitchen"]);

        let found = db.categories().find_by_name("Kitchen").await.unwrap().unwrap();
        assert_eq!(found.id, 1);
        assert!(db.categories().find_by_name("kitchen").await.unwrap().is_none());
    }
}
