use axum::{
    Json, Router,
    extract::{FromRequestParts, RawPathParams, State},
    http::{StatusCode, request::Parts},
    routing::{get, patch, post},
};
use axum_helpers::{
    AppError, AuthGuard, CurrentUser, JsonBody, UuidPath,
    errors::responses::{
        BadRequestResponse, ForbiddenResponse, InternalServerErrorResponse, NotFoundResponse,
        UnauthorizedResponse,
    },
};
use resource_handler::{Envelope, ListQuery, Resource, ResourceHandlers};
use utoipa::OpenApi;
use uuid::Uuid;

use crate::models::{CreateReview, Review, UpdateReview};
use crate::service::ReviewService;

/// Roles that may write a review.
pub const REVIEW_AUTHORS: &[&str] = &["user"];
/// Roles that may change or remove one.
pub const REVIEW_EDITORS: &[&str] = &["user", "admin"];

/// Path parameter holding the tour id when mounted under a tour.
pub const TOUR_PARAM: &str = "id";

#[derive(OpenApi)]
#[openapi(
    paths(list_reviews, create_review, get_review, update_review, delete_review),
    components(
        schemas(Review, CreateReview, UpdateReview, Envelope),
        responses(
            BadRequestResponse,
            UnauthorizedResponse,
            ForbiddenResponse,
            NotFoundResponse,
            InternalServerErrorResponse
        )
    ),
    tags(
        (name = "Reviews", description = "Tour reviews and ratings")
    )
)]
pub struct ApiDoc;

/// `/reviews`: every route needs a login.
pub fn router(service: ReviewService, guard: &AuthGuard) -> Router {
    Router::new()
        .route("/", collection_routes(guard))
        .route(
            "/{id}",
            guard.protect(get(get_review)).merge(guard.restrict(
                patch(update_review).delete(delete_review),
                REVIEW_EDITORS,
            )),
        )
        .with_state(service)
}

/// List and create for one tour, mounted at `/tours/{id}/reviews`.
pub fn tour_router(service: ReviewService, guard: &AuthGuard) -> Router {
    Router::new()
        .route("/", collection_routes(guard))
        .with_state(service)
}

fn collection_routes(guard: &AuthGuard) -> axum::routing::MethodRouter<ReviewService> {
    guard
        .protect(get(list_reviews))
        .merge(guard.restrict(post(create_review), REVIEW_AUTHORS))
}

/// The enclosing tour, when the route is nested under one.
#[derive(Debug, Clone, Copy)]
pub struct TourScope(pub Option<Uuid>);

impl<S> FromRequestParts<S> for TourScope
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Ok(params) = RawPathParams::from_request_parts(parts, state).await else {
            return Ok(TourScope(None));
        };

        match params.iter().find(|(name, _)| *name == TOUR_PARAM) {
            Some((_, raw)) => Uuid::parse_str(raw)
                .map(|id| TourScope(Some(id)))
                .map_err(|_| AppError::Cast {
                    path: "tour".to_string(),
                    value: raw.to_string(),
                }),
            None => Ok(TourScope(None)),
        }
    }
}

/// List reviews
///
/// Nested under a tour, only that tour's reviews are listed.
#[utoipa::path(
    get,
    path = "",
    tag = "Reviews",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Reviews matching the query", body = Envelope),
        (status = 401, response = UnauthorizedResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn list_reviews(
    State(service): State<ReviewService>,
    TourScope(tour): TourScope,
    ListQuery(descriptor): ListQuery,
) -> Result<Json<Envelope>, AppError> {
    let reviews = service.list(&descriptor, tour).await?;
    Ok(Json(Envelope::many(Review::PLURAL, reviews)))
}

/// Write a review
///
/// The author is the logged-in user unless the body names one.
#[utoipa::path(
    post,
    path = "",
    tag = "Reviews",
    request_body = CreateReview,
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Review created", body = Envelope),
        (status = 400, response = BadRequestResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn create_review(
    State(service): State<ReviewService>,
    TourScope(tour): TourScope,
    CurrentUser(principal): CurrentUser,
    JsonBody(input): JsonBody<CreateReview>,
) -> Result<(StatusCode, Json<Envelope>), AppError> {
    let review = service.create(input, tour, principal.id).await?;
    let body = service.handlers().render_entity(&review).await?;
    Ok((StatusCode::CREATED, Json(Envelope::one(Review::SINGULAR, body))))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Reviews",
    params(("id" = Uuid, Path, description = "Review ID")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Review found", body = Envelope),
        (status = 400, response = BadRequestResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn get_review(
    state: State<ResourceHandlers<Review>>,
    id: UuidPath,
) -> Result<Json<Envelope>, AppError> {
    resource_handler::get_one::<Review>(state, id).await
}

/// Update a review and the tour's ratings
#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Reviews",
    params(("id" = Uuid, Path, description = "Review ID")),
    request_body = UpdateReview,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Review updated", body = Envelope),
        (status = 400, response = BadRequestResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn update_review(
    State(service): State<ReviewService>,
    UuidPath(id): UuidPath,
    JsonBody(patch): JsonBody<UpdateReview>,
) -> Result<Json<Envelope>, AppError> {
    let review = service.update(id, patch).await?;
    let body = service.handlers().render_entity(&review).await?;
    Ok(Json(Envelope::one(Review::SINGULAR, body)))
}

/// Delete a review and update the tour's ratings
#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Reviews",
    params(("id" = Uuid, Path, description = "Review ID")),
    security(("bearer_auth" = [])),
    responses(
        (status = 204, description = "Review deleted"),
        (status = 400, response = BadRequestResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn delete_review(
    State(service): State<ReviewService>,
    UuidPath(id): UuidPath,
) -> Result<StatusCode, AppError> {
    service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
