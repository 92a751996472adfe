use crate::envelope::Envelope;
use crate::error::{ResourceError, ResourceResult};
use crate::extract::ListQuery;
use crate::populate::{Populate, resolve};
use crate::repository::{Repository, strip_nulls};
use crate::resource::Resource;
use axum::{Json, extract::State, http::StatusCode};
use axum_helpers::{AppError, JsonBody, UuidPath};
use mongodb::bson::{Bson, Document, to_document};
use query_features::{FindQuery, QueryDescriptor, QueryFeatures, VERSION_FIELD};
use serde_json::Value;
use tracing::instrument;
use uuid::Uuid;
use validator::Validate;

/// The five CRUD operations for one resource, shared by every domain.
///
/// Cloning is cheap; the repository holds the store behind an `Arc`.
pub struct ResourceHandlers<R> {
    repository: Repository<R>,
    detail_populate: &'static [Populate],
}

impl<R> Clone for ResourceHandlers<R> {
    fn clone(&self) -> Self {
        Self {
            repository: self.repository.clone(),
            detail_populate: self.detail_populate,
        }
    }
}

impl<R: Resource> ResourceHandlers<R> {
    pub fn new(repository: Repository<R>) -> Self {
        Self {
            repository,
            detail_populate: &[],
        }
    }

    /// Relations resolved by [`get_one`](Self::get_one) only, on top of
    /// [`Resource::POPULATE`].
    pub fn with_detail_populate(mut self, specs: &'static [Populate]) -> Self {
        self.detail_populate = specs;
        self
    }

    pub fn repository(&self) -> &Repository<R> {
        &self.repository
    }

    async fn render(&self, mut document: Document, detail: bool) -> ResourceResult<Value> {
        for field in R::HIDDEN_FIELDS {
            document.remove(*field);
        }
        document.remove(VERSION_FIELD);

        let store = self.repository.store().as_ref();
        resolve(store, &mut document, R::POPULATE).await?;
        if detail {
            resolve(store, &mut document, self.detail_populate).await?;
        }

        R::add_virtuals(&mut document);
        strip_nulls(&mut document);
        Ok(Bson::Document(document).into_relaxed_extjson())
    }

    /// JSON for an entity, with hidden fields removed and relations resolved.
    pub async fn render_entity(&self, entity: &R) -> ResourceResult<Value> {
        let document = to_document(entity).map_err(crate::error::StoreError::from)?;
        self.render(document, false).await
    }

    /// List with filter, sort, field selection and pagination from the query
    /// string. `scope` is ANDed in last, so path-derived conditions win over
    /// query parameters.
    #[instrument(skip(self, descriptor), fields(collection = R::COLLECTION))]
    pub async fn get_all(
        &self,
        descriptor: &QueryDescriptor,
        scope: Document,
    ) -> ResourceResult<Vec<Value>> {
        let query = QueryFeatures::new(FindQuery::all(), descriptor)
            .with_schema(R::FIELD_TYPES)
            .filter()
            .sort()
            .limit_fields()
            .paginate()
            .into_query()
            .and(scope);

        let documents = self.repository.find_documents(query).await?;
        let mut rendered = Vec::with_capacity(documents.len());
        for document in documents {
            rendered.push(self.render(document, false).await?);
        }
        Ok(rendered)
    }

    #[instrument(skip(self), fields(collection = R::COLLECTION))]
    pub async fn get_one(&self, id: Uuid) -> ResourceResult<Value> {
        let document = self
            .repository
            .find_document_by_id(id)
            .await?
            .ok_or(ResourceError::NotFound(R::SINGULAR))?;
        self.render(document, true).await
    }

    /// Validate the input, build the entity, check its own and cross-field
    /// rules, then insert. Nothing is written unless every check passes.
    #[instrument(skip(self, input), fields(collection = R::COLLECTION))]
    pub async fn create_one(&self, input: R::Create) -> ResourceResult<R> {
        input.validate()?;
        let entity = R::from_create(input)?;
        entity.validate()?;
        entity.validate_create()?;

        self.repository.insert(&entity).await?;
        tracing::info!(id = %entity.id(), "{} created", R::SINGULAR);
        Ok(entity)
    }

    /// Merge `patch` into the stored entity and re-run its own rules.
    /// Cross-field create rules are not re-checked.
    #[instrument(skip(self, patch), fields(collection = R::COLLECTION))]
    pub async fn update_one(&self, id: Uuid, patch: R::Update) -> ResourceResult<R> {
        patch.validate()?;
        let mut entity = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or(ResourceError::NotFound(R::SINGULAR))?;

        entity.apply_update(patch);
        entity.validate()?;

        if !self.repository.replace(&entity).await? {
            return Err(ResourceError::NotFound(R::SINGULAR));
        }
        Ok(entity)
    }

    /// Returns the removed entity.
    #[instrument(skip(self), fields(collection = R::COLLECTION))]
    pub async fn delete_one(&self, id: Uuid) -> ResourceResult<R> {
        let entity = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or(ResourceError::NotFound(R::SINGULAR))?;

        if !self.repository.delete(id).await? {
            return Err(ResourceError::NotFound(R::SINGULAR));
        }
        tracing::info!(%id, "{} deleted", R::SINGULAR);
        Ok(entity)
    }
}

/// `GET /` for any resource.
pub async fn get_all<R: Resource>(
    State(handlers): State<ResourceHandlers<R>>,
    ListQuery(descriptor): ListQuery,
) -> Result<Json<Envelope>, AppError> {
    let items = handlers.get_all(&descriptor, Document::new()).await?;
    Ok(Json(Envelope::many(R::PLURAL, items)))
}

/// `GET /{id}`
pub async fn get_one<R: Resource>(
    State(handlers): State<ResourceHandlers<R>>,
    UuidPath(id): UuidPath,
) -> Result<Json<Envelope>, AppError> {
    let item = handlers.get_one(id).await?;
    Ok(Json(Envelope::one(R::SINGULAR, item)))
}

/// `POST /`
pub async fn create_one<R: Resource>(
    State(handlers): State<ResourceHandlers<R>>,
    JsonBody(input): JsonBody<R::Create>,
) -> Result<(StatusCode, Json<Envelope>), AppError> {
    let entity = handlers.create_one(input).await?;
    let body = handlers.render_entity(&entity).await?;
    Ok((StatusCode::CREATED, Json(Envelope::one(R::SINGULAR, body))))
}

/// `PATCH /{id}`
pub async fn update_one<R: Resource>(
    State(handlers): State<ResourceHandlers<R>>,
    UuidPath(id): UuidPath,
    JsonBody(patch): JsonBody<R::Update>,
) -> Result<Json<Envelope>, AppError> {
    let entity = handlers.update_one(id, patch).await?;
    let body = handlers.render_entity(&entity).await?;
    Ok(Json(Envelope::one(R::SINGULAR, body)))
}

/// `DELETE /{id}`, 204 with an empty body
pub async fn delete_one<R: Resource>(
    State(handlers): State<ResourceHandlers<R>>,
    UuidPath(id): UuidPath,
) -> Result<StatusCode, AppError> {
    handlers.delete_one(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
