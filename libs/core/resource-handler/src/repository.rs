use crate::error::{StoreError, StoreResult};
use crate::resource::Resource;
use crate::store::DocumentStore;
use mongodb::bson::{Bson, Document, from_document, to_document};
use query_features::{FindQuery, ID_FIELD, VERSION_FIELD};
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

/// Typed access to the collection of one [`Resource`].
///
/// Every read is narrowed by [`Resource::base_filter`].
pub struct Repository<R> {
    store: Arc<dyn DocumentStore>,
    _resource: PhantomData<fn() -> R>,
}

impl<R> Clone for Repository<R> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            _resource: PhantomData,
        }
    }
}

/// Filter matching the document with this id.
pub fn id_filter(id: Uuid) -> Document {
    let mut filter = Document::new();
    filter.insert(ID_FIELD, id.to_string());
    filter
}

impl<R: Resource> Repository<R> {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            _resource: PhantomData,
        }
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    /// Create the unique indexes the resource declares.
    pub async fn ensure_indexes(&self) -> StoreResult<()> {
        for fields in R::UNIQUE_INDEXES {
            self.store.create_unique_index(R::COLLECTION, fields).await?;
        }
        Ok(())
    }

    fn scoped(filter: Document) -> Document {
        let mut scoped = filter;
        for (key, value) in R::base_filter() {
            scoped.insert(key, value);
        }
        scoped
    }

    /// Raw documents, projected as the query asks.
    pub async fn find_documents(&self, query: FindQuery) -> StoreResult<Vec<Document>> {
        let query = query.and(R::base_filter());
        self.store.find(R::COLLECTION, &query).await
    }

    pub async fn find(&self, query: FindQuery) -> StoreResult<Vec<R>> {
        self.find_documents(query)
            .await?
            .into_iter()
            .map(|doc| from_document(doc).map_err(StoreError::from))
            .collect()
    }

    pub async fn find_document_by_id(&self, id: Uuid) -> StoreResult<Option<Document>> {
        self.store
            .find_one(R::COLLECTION, Self::scoped(id_filter(id)))
            .await
    }

    pub async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<R>> {
        self.find_one(id_filter(id)).await
    }

    pub async fn find_one(&self, filter: Document) -> StoreResult<Option<R>> {
        self.store
            .find_one(R::COLLECTION, Self::scoped(filter))
            .await?
            .map(|doc| from_document(doc).map_err(StoreError::from))
            .transpose()
    }

    #[instrument(skip(self, entity), fields(collection = R::COLLECTION, id = %entity.id()))]
    pub async fn insert(&self, entity: &R) -> StoreResult<()> {
        let mut document = to_document(entity)?;
        document.insert(VERSION_FIELD, 0);
        self.store.insert_one(R::COLLECTION, document).await
    }

    /// Write every field of `entity` back to its document.
    #[instrument(skip(self, entity), fields(collection = R::COLLECTION, id = %entity.id()))]
    pub async fn replace(&self, entity: &R) -> StoreResult<bool> {
        let mut set = to_document(entity)?;
        set.remove(ID_FIELD);
        self.store
            .update_one(R::COLLECTION, id_filter(entity.id()), set)
            .await
    }

    /// `$set` selected fields, bypassing the base filter.
    pub async fn update_fields(&self, id: Uuid, set: Document) -> StoreResult<bool> {
        self.store.update_one(R::COLLECTION, id_filter(id), set).await
    }

    #[instrument(skip(self), fields(collection = R::COLLECTION))]
    pub async fn delete(&self, id: Uuid) -> StoreResult<bool> {
        self.store
            .delete_one(R::COLLECTION, Self::scoped(id_filter(id)))
            .await
    }

    pub async fn delete_all(&self) -> StoreResult<u64> {
        self.store.delete_many(R::COLLECTION, Document::new()).await
    }

    pub async fn count(&self, filter: Document) -> StoreResult<u64> {
        self.store.count(R::COLLECTION, Self::scoped(filter)).await
    }
}

/// Drops `null` values at any depth; unset optional fields are stored as null.
pub(crate) fn strip_nulls(document: &mut Document) {
    let empty: Vec<String> = document
        .iter()
        .filter(|(_, v)| matches!(v, Bson::Null))
        .map(|(k, _)| k.clone())
        .collect();
    for key in empty {
        document.remove(&key);
    }
    for (_, value) in document.iter_mut() {
        match value {
            Bson::Document(nested) => strip_nulls(nested),
            Bson::Array(items) => items.iter_mut().for_each(|item| {
                if let Bson::Document(nested) = item {
                    strip_nulls(nested);
                }
            }),
            _ => {}
        }
    }
}
