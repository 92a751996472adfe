use super::DocumentStore;
use crate::error::{StoreError, StoreResult};
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    Collection, Database, IndexModel,
    bson::{Document, doc},
    error::{ErrorKind, WriteFailure},
    options::IndexOptions,
};
use query_features::{FindQuery, VERSION_FIELD};
use tracing::instrument;

const DUPLICATE_KEY_CODE: i32 = 11000;

/// [`DocumentStore`] over a MongoDB database.
#[derive(Clone)]
pub struct MongoStore {
    db: Database,
}

impl MongoStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    fn collection(&self, name: &str) -> Collection<Document> {
        self.db.collection::<Document>(name)
    }
}

/// Turn an E11000 write error into [`StoreError::DuplicateKey`].
fn map_write_error(collection: &str, err: mongodb::error::Error) -> StoreError {
    let duplicate = match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write)) if write.code == DUPLICATE_KEY_CODE => {
            parse_duplicate_key(&write.message)
        }
        _ => None,
    };

    match duplicate {
        Some((field, value)) => StoreError::DuplicateKey {
            collection: collection.to_string(),
            field,
            value,
        },
        None => StoreError::Backend(err),
    }
}

/// Extracts field and value from `... dup key: { name: "The Forest Hiker" }`.
pub(crate) fn parse_duplicate_key(message: &str) -> Option<(String, String)> {
    let (_, rest) = message.split_once("dup key: {")?;
    let rest = rest.trim_start();
    let (field, value) = rest.split_once(':')?;
    let value = value.trim_start();

    let value = match value.strip_prefix('"') {
        Some(quoted) => quoted.split_once('"').map(|(v, _)| v)?,
        None => value.trim_end_matches('}').trim(),
    };

    Some((field.trim().to_string(), value.to_string()))
}

#[async_trait]
impl DocumentStore for MongoStore {
    #[instrument(skip(self, query), fields(filter = %query.filter))]
    async fn find(&self, collection: &str, query: &FindQuery) -> StoreResult<Vec<Document>> {
        let collection = self.collection(collection);
        let mut find = collection
            .find(query.filter.clone())
            .projection(query.projection.to_document())
            .skip(query.skip);

        let sort = query.sort_document();
        if !sort.is_empty() {
            find = find.sort(sort);
        }
        if let Some(limit) = query.limit {
            find = find.limit(i64::try_from(limit).unwrap_or(i64::MAX));
        }

        let documents: Vec<Document> = find.await?.try_collect().await?;
        Ok(documents)
    }

    #[instrument(skip(self))]
    async fn find_one(&self, collection: &str, filter: Document) -> StoreResult<Option<Document>> {
        Ok(self.collection(collection).find_one(filter).await?)
    }

    #[instrument(skip(self, document))]
    async fn insert_one(&self, collection: &str, document: Document) -> StoreResult<()> {
        self.collection(collection)
            .insert_one(document)
            .await
            .map_err(|e| map_write_error(collection, e))?;
        Ok(())
    }

    #[instrument(skip(self, set))]
    async fn update_one(
        &self,
        collection: &str,
        filter: Document,
        set: Document,
    ) -> StoreResult<bool> {
        let mut inc = Document::new();
        inc.insert(VERSION_FIELD, 1);

        let result = self
            .collection(collection)
            .update_one(filter, doc! { "$set": set, "$inc": inc })
            .await
            .map_err(|e| map_write_error(collection, e))?;

        Ok(result.matched_count > 0)
    }

    #[instrument(skip(self))]
    async fn delete_one(&self, collection: &str, filter: Document) -> StoreResult<bool> {
        let result = self.collection(collection).delete_one(filter).await?;
        Ok(result.deleted_count > 0)
    }

    #[instrument(skip(self))]
    async fn delete_many(&self, collection: &str, filter: Document) -> StoreResult<u64> {
        let result = self.collection(collection).delete_many(filter).await?;
        Ok(result.deleted_count)
    }

    #[instrument(skip(self))]
    async fn count(&self, collection: &str, filter: Document) -> StoreResult<u64> {
        Ok(self.collection(collection).count_documents(filter).await?)
    }

    #[instrument(skip(self))]
    async fn create_unique_index(&self, collection: &str, fields: &[&str]) -> StoreResult<()> {
        if fields.is_empty() {
            return Ok(());
        }
        let mut keys = Document::new();
        for field in fields {
            keys.insert(*field, 1);
        }

        let index = IndexModel::builder()
            .keys(keys)
            .options(IndexOptions::builder().unique(true).build())
            .build();

        self.collection(collection).create_index(index).await?;
        tracing::debug!(collection, ?fields, "unique index ensured");
        Ok(())
    }
}
