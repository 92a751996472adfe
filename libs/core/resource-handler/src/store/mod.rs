//! Collection-level persistence behind [`Repository`](crate::Repository).
//!
//! Documents are plain BSON so the same store serves every resource and the
//! cross-collection lookups done by [`populate`](crate::populate).

mod matcher;
mod memory;
mod mongo;

pub use matcher::{compare_values, matches_filter};
pub use memory::InMemoryStore;
pub use mongo::MongoStore;

use crate::error::StoreResult;
use async_trait::async_trait;
use mongodb::bson::Document;
use query_features::FindQuery;

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Run a composed query: filter, sort, projection, skip and limit.
    async fn find(&self, collection: &str, query: &FindQuery) -> StoreResult<Vec<Document>>;

    async fn find_one(&self, collection: &str, filter: Document) -> StoreResult<Option<Document>>;

    async fn insert_one(&self, collection: &str, document: Document) -> StoreResult<()>;

    /// `$set` the given fields on the first match and bump `__v`.
    ///
    /// Returns whether a document matched.
    async fn update_one(&self, collection: &str, filter: Document, set: Document)
    -> StoreResult<bool>;

    async fn delete_one(&self, collection: &str, filter: Document) -> StoreResult<bool>;

    async fn delete_many(&self, collection: &str, filter: Document) -> StoreResult<u64>;

    async fn count(&self, collection: &str, filter: Document) -> StoreResult<u64>;

    /// Unique index over one or more fields. Idempotent.
    async fn create_unique_index(&self, collection: &str, fields: &[&str]) -> StoreResult<()>;
}
