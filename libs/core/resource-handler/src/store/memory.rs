use super::DocumentStore;
use super::matcher::{compare_values, field, matches_filter};
use crate::error::{StoreError, StoreResult};
use async_trait::async_trait;
use mongodb::bson::{Bson, Document};
use query_features::{FindQuery, VERSION_FIELD};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default)]
struct Collection {
    documents: Vec<Document>,
    unique_indexes: BTreeSet<Vec<String>>,
}

impl Collection {
    /// The first unique index whose values clash with another document,
    /// as its leading field and value.
    fn clash(&self, candidate: &Document, skip: Option<usize>) -> Option<(String, String)> {
        self.unique_indexes.iter().find_map(|fields| {
            let values: Vec<&Bson> = fields
                .iter()
                .map(|name| candidate.get(name).filter(|v| !matches!(v, Bson::Null)))
                .collect::<Option<_>>()?;
            let taken = self.documents.iter().enumerate().any(|(i, doc)| {
                Some(i) != skip
                    && fields
                        .iter()
                        .zip(&values)
                        .all(|(name, value)| doc.get(name) == Some(*value))
            });
            taken.then(|| (fields[0].clone(), display_value(values[0])))
        })
    }
}

fn display_value(value: &Bson) -> String {
    match value {
        Bson::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Process-local [`DocumentStore`] used by handler tests and local runs
/// without a database.
///
/// Documents keep insertion order, which stands in for natural order.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    collections: Arc<RwLock<HashMap<String, Collection>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn duplicate(collection: &str, (field, value): (String, String)) -> StoreError {
        StoreError::DuplicateKey {
            collection: collection.to_string(),
            field,
            value,
        }
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn find(&self, collection: &str, query: &FindQuery) -> StoreResult<Vec<Document>> {
        let collections = self.collections.read().await;
        let Some(stored) = collections.get(collection) else {
            return Ok(Vec::new());
        };

        let mut matched: Vec<&Document> = stored
            .documents
            .iter()
            .filter(|doc| matches_filter(doc, &query.filter))
            .collect();

        if !query.sort.is_empty() {
            matched.sort_by(|a, b| {
                query
                    .sort
                    .iter()
                    .map(|key| {
                        let ordering = compare_values(field(a, &key.field), field(b, &key.field));
                        if key.direction.as_i32() < 0 {
                            ordering.reverse()
                        } else {
                            ordering
                        }
                    })
                    .find(|o| o.is_ne())
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
        }

        let skip = usize::try_from(query.skip).unwrap_or(usize::MAX);
        let limit = query
            .limit
            .map(|l| usize::try_from(l).unwrap_or(usize::MAX))
            .unwrap_or(usize::MAX);

        Ok(matched
            .into_iter()
            .skip(skip)
            .take(limit)
            .map(|doc| query.projection.apply(doc.clone()))
            .collect())
    }

    async fn find_one(&self, collection: &str, filter: Document) -> StoreResult<Option<Document>> {
        let collections = self.collections.read().await;
        Ok(collections.get(collection).and_then(|stored| {
            stored
                .documents
                .iter()
                .find(|doc| matches_filter(doc, &filter))
                .cloned()
        }))
    }

    async fn insert_one(&self, collection: &str, document: Document) -> StoreResult<()> {
        let mut collections = self.collections.write().await;
        let stored = collections.entry(collection.to_string()).or_default();

        if let Some(clash) = stored.clash(&document, None) {
            return Err(Self::duplicate(collection, clash));
        }
        stored.documents.push(document);
        Ok(())
    }

    async fn update_one(
        &self,
        collection: &str,
        filter: Document,
        set: Document,
    ) -> StoreResult<bool> {
        let mut collections = self.collections.write().await;
        let Some(stored) = collections.get_mut(collection) else {
            return Ok(false);
        };
        let Some(index) = stored
            .documents
            .iter()
            .position(|doc| matches_filter(doc, &filter))
        else {
            return Ok(false);
        };

        let mut updated = stored.documents[index].clone();
        for (key, value) in set {
            updated.insert(key, value);
        }
        let version = updated.get_i32(VERSION_FIELD).unwrap_or(0);
        updated.insert(VERSION_FIELD, version + 1);

        if let Some(clash) = stored.clash(&updated, Some(index)) {
            return Err(Self::duplicate(collection, clash));
        }
        stored.documents[index] = updated;
        Ok(true)
    }

    async fn delete_one(&self, collection: &str, filter: Document) -> StoreResult<bool> {
        let mut collections = self.collections.write().await;
        let Some(stored) = collections.get_mut(collection) else {
            return Ok(false);
        };
        match stored
            .documents
            .iter()
            .position(|doc| matches_filter(doc, &filter))
        {
            Some(index) => {
                stored.documents.remove(index);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_many(&self, collection: &str, filter: Document) -> StoreResult<u64> {
        let mut collections = self.collections.write().await;
        let Some(stored) = collections.get_mut(collection) else {
            return Ok(0);
        };
        let before = stored.documents.len();
        stored.documents.retain(|doc| !matches_filter(doc, &filter));
        Ok((before - stored.documents.len()) as u64)
    }

    async fn count(&self, collection: &str, filter: Document) -> StoreResult<u64> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .map(|stored| {
                stored
                    .documents
                    .iter()
                    .filter(|doc| matches_filter(doc, &filter))
                    .count() as u64
            })
            .unwrap_or(0))
    }

    async fn create_unique_index(&self, collection: &str, fields: &[&str]) -> StoreResult<()> {
        if fields.is_empty() {
            return Ok(());
        }
        let mut collections = self.collections.write().await;
        collections
            .entry(collection.to_string())
            .or_default()
            .unique_indexes
            .insert(fields.iter().map(|f| f.to_string()).collect());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::doc;
    use query_features::{Projection, SortKey};

    async fn seeded() -> InMemoryStore {
        let store = InMemoryStore::new();
        for (id, name, price) in [("1", "Sea Explorer", 497.0), ("2", "Forest Hiker", 397.0), ("3", "Snow Adventurer", 997.0)] {
            store
                .insert_one("tours", doc! { "_id": id, "name": name, "price": price, "__v": 0 })
                .await
                .unwrap();
        }
        store
    }

    #[tokio::test]
    async fn test_find_sorts_skips_and_limits() {
        let store = seeded().await;
        let query = FindQuery::all()
            .sorted_by(vec![SortKey::desc("price")])
            .skip(1)
            .limit(1);

        let found = store.find("tours", &query).await.unwrap();

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].get_str("name").unwrap(), "Sea Explorer");
        assert!(!found[0].contains_key("__v"));
    }

    #[tokio::test]
    async fn test_find_applies_projection() {
        let store = seeded().await;
        let query = FindQuery::all().with_projection(Projection::Include(vec!["name".into()]));

        let found = store.find("tours", &query).await.unwrap();
        assert_eq!(found[0], doc! { "_id": "1", "name": "Sea Explorer" });
    }

    #[tokio::test]
    async fn test_update_sets_fields_and_bumps_version() {
        let store = seeded().await;

        let matched = store
            .update_one("tours", doc! { "_id": "2" }, doc! { "price": 450.0 })
            .await
            .unwrap();
        assert!(matched);

        let tour = store.find_one("tours", doc! { "_id": "2" }).await.unwrap().unwrap();
        assert_eq!(tour.get_f64("price").unwrap(), 450.0);
        assert_eq!(tour.get_i32("__v").unwrap(), 1);

        let missing = store
            .update_one("tours", doc! { "_id": "9" }, doc! { "price": 1.0 })
            .await
            .unwrap();
        assert!(!missing);
    }

    #[tokio::test]
    async fn test_unique_index_rejects_duplicates() {
        let store = seeded().await;
        store.create_unique_index("tours", &["name"]).await.unwrap();

        let err = store
            .insert_one("tours", doc! { "_id": "4", "name": "Forest Hiker" })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateKey { ref value, .. } if value == "Forest Hiker"));

        let err = store
            .update_one("tours", doc! { "_id": "1" }, doc! { "name": "Snow Adventurer" })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateKey { .. }));
    }

    #[tokio::test]
    async fn test_compound_unique_index() {
        let store = InMemoryStore::new();
        store.create_unique_index("reviews", &["tour", "user"]).await.unwrap();

        store.insert_one("reviews", doc! { "_id": "1", "tour": "t1", "user": "u1" }).await.unwrap();
        store.insert_one("reviews", doc! { "_id": "2", "tour": "t1", "user": "u2" }).await.unwrap();

        let err = store
            .insert_one("reviews", doc! { "_id": "3", "tour": "t1", "user": "u1" })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateKey { ref field, .. } if field == "tour"));
    }

    #[tokio::test]
    async fn test_delete_and_count() {
        let store = seeded().await;

        assert!(store.delete_one("tours", doc! { "_id": "1" }).await.unwrap());
        assert!(!store.delete_one("tours", doc! { "_id": "1" }).await.unwrap());
        assert_eq!(store.count("tours", doc! {}).await.unwrap(), 2);
        assert_eq!(
            store.delete_many("tours", doc! { "price": { "$lt": 500 } }).await.unwrap(),
            1
        );
        assert_eq!(store.count("tours", doc! {}).await.unwrap(), 1);
    }
}
