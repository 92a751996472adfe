use crate::error::ResourceResult;
use crate::populate::Populate;
use mongodb::bson::Document;
use query_features::FieldType;
use serde::{Serialize, de::DeserializeOwned};
use uuid::Uuid;
use validator::Validate;

/// A stored entity served by the generic CRUD handlers.
///
/// The entity serializes with its id under `_id` (see [`ID_FIELD`](query_features::ID_FIELD)).
/// Its own [`Validate`] rules run on every create and update.
///
/// ```ignore
/// impl Resource for Tour {
///     const COLLECTION: &'static str = "tours";
///     const SINGULAR: &'static str = "tour";
///     const PLURAL: &'static str = "tours";
///     type Create = CreateTour;
///     type Update = UpdateTour;
///
///     fn id(&self) -> Uuid { self.id }
///     fn from_create(input: CreateTour) -> ResourceResult<Self> { Tour::new(input) }
///     fn apply_update(&mut self, patch: UpdateTour) { self.merge(patch) }
/// }
/// ```
pub trait Resource:
    Serialize + DeserializeOwned + Validate + Clone + Send + Sync + 'static
{
    const COLLECTION: &'static str;
    /// Envelope key for one entity
    const SINGULAR: &'static str;
    /// Envelope key for a list
    const PLURAL: &'static str;

    /// Types used to cast query-string filter values
    const FIELD_TYPES: &'static [(&'static str, FieldType)] = &[];
    /// Each entry is one unique index over the listed fields
    const UNIQUE_INDEXES: &'static [&'static [&'static str]] = &[];
    /// Never rendered, whatever the projection asks for
    const HIDDEN_FIELDS: &'static [&'static str] = &[];
    /// Relations resolved on every read
    const POPULATE: &'static [Populate] = &[];

    type Create: DeserializeOwned + Validate + Send + 'static;
    type Update: DeserializeOwned + Validate + Send + 'static;

    fn id(&self) -> Uuid;

    fn from_create(input: Self::Create) -> ResourceResult<Self>;

    fn apply_update(&mut self, patch: Self::Update);

    /// Cross-field rules checked on create only.
    fn validate_create(&self) -> ResourceResult<()> {
        Ok(())
    }

    /// Condition ANDed into every read, e.g. hiding soft-deleted rows.
    fn base_filter() -> Document {
        Document::new()
    }

    /// Derived fields added to rendered documents.
    fn add_virtuals(_document: &mut Document) {}
}
