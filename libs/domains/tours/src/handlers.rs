use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch, post},
};
use axum_helpers::{
    AppError, AuthGuard, JsonBody, UuidPath,
    errors::responses::{
        BadRequestResponse, ForbiddenResponse, InternalServerErrorResponse, NotFoundResponse,
        UnauthorizedResponse,
    },
};
use mongodb::bson::Document;
use resource_handler::{Envelope, ListQuery, Resource, ResourceHandlers};
use utoipa::OpenApi;

use crate::models::{CreateTour, Difficulty, Location, Tour, UpdateTour};
use crate::service::TourService;
use crate::stats::{MonthlyPlan, TourStats};

/// Roles that may change the catalogue.
pub const TOUR_MANAGERS: &[&str] = &["admin", "lead-guide"];
/// Roles that see the monthly plan.
pub const TOUR_STAFF: &[&str] = &["admin", "lead-guide", "guide"];

/// OpenAPI documentation for the Tours API
#[derive(OpenApi)]
#[openapi(
    paths(
        list_tours,
        create_tour,
        get_tour,
        update_tour,
        delete_tour,
        top_five_cheap,
        get_tour_stats,
        get_monthly_plan,
    ),
    components(
        schemas(Tour, CreateTour, UpdateTour, Difficulty, Location, TourStats, MonthlyPlan, Envelope),
        responses(
            BadRequestResponse,
            UnauthorizedResponse,
            ForbiddenResponse,
            NotFoundResponse,
            InternalServerErrorResponse
        )
    ),
    tags(
        (name = "Tours", description = "Tour catalogue, aliases and statistics")
    )
)]
pub struct ApiDoc;

/// Create the tours router.
///
/// Reading is public; writes need an admin or lead guide. Reviews of one
/// tour are nested by the application under `/{id}/reviews`.
pub fn router(service: TourService, guard: &AuthGuard) -> Router {
    Router::new()
        .route(
            "/",
            get(list_tours).merge(guard.restrict(post(create_tour), TOUR_MANAGERS)),
        )
        .route("/top-5-cheap", get(top_five_cheap))
        .route("/tour-stats", get(get_tour_stats))
        .route(
            "/monthly-plan/{year}",
            guard.restrict(get(get_monthly_plan), TOUR_STAFF),
        )
        .route(
            "/{id}",
            get(get_tour).merge(guard.restrict(
                patch(update_tour).delete(delete_tour),
                TOUR_MANAGERS,
            )),
        )
        .with_state(service)
}

/// List tours
///
/// Supports `field=value`, `field[gte]=value`, `sort`, `fields`, `page` and `limit`.
#[utoipa::path(
    get,
    path = "",
    tag = "Tours",
    params(
        ("page" = Option<String>, Query, description = "Page number, default 1"),
        ("limit" = Option<String>, Query, description = "Page size, default 100"),
        ("sort" = Option<String>, Query, description = "Comma separated keys, `-` for descending"),
        ("fields" = Option<String>, Query, description = "Comma separated fields to include or `-field` to exclude"),
    ),
    responses(
        (status = 200, description = "Tours matching the query", body = Envelope),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn list_tours(
    state: State<ResourceHandlers<Tour>>,
    query: ListQuery,
) -> Result<Json<Envelope>, AppError> {
    resource_handler::get_all::<Tour>(state, query).await
}

/// Create a tour
#[utoipa::path(
    post,
    path = "",
    tag = "Tours",
    request_body = CreateTour,
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Tour created", body = Envelope),
        (status = 400, response = BadRequestResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn create_tour(
    state: State<ResourceHandlers<Tour>>,
    body: JsonBody<CreateTour>,
) -> Result<(StatusCode, Json<Envelope>), AppError> {
    resource_handler::create_one::<Tour>(state, body).await
}

/// Get a tour with its guides and reviews
#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Tours",
    params(("id" = Uuid, Path, description = "Tour ID")),
    responses(
        (status = 200, description = "Tour found", body = Envelope),
        (status = 400, response = BadRequestResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn get_tour(
    state: State<ResourceHandlers<Tour>>,
    id: UuidPath,
) -> Result<Json<Envelope>, AppError> {
    resource_handler::get_one::<Tour>(state, id).await
}

/// Update a tour
#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Tours",
    params(("id" = Uuid, Path, description = "Tour ID")),
    request_body = UpdateTour,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Tour updated", body = Envelope),
        (status = 400, response = BadRequestResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn update_tour(
    state: State<ResourceHandlers<Tour>>,
    id: UuidPath,
    body: JsonBody<UpdateTour>,
) -> Result<Json<Envelope>, AppError> {
    resource_handler::update_one::<Tour>(state, id, body).await
}

/// Delete a tour
#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Tours",
    params(("id" = Uuid, Path, description = "Tour ID")),
    security(("bearer_auth" = [])),
    responses(
        (status = 204, description = "Tour deleted"),
        (status = 400, response = BadRequestResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn delete_tour(
    state: State<ResourceHandlers<Tour>>,
    id: UuidPath,
) -> Result<StatusCode, AppError> {
    resource_handler::delete_one::<Tour>(state, id).await
}

/// The five best rated tours, cheapest first
#[utoipa::path(
    get,
    path = "/top-5-cheap",
    tag = "Tours",
    responses(
        (status = 200, description = "Top five tours", body = Envelope),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn top_five_cheap(
    State(service): State<TourService>,
    ListQuery(descriptor): ListQuery,
) -> Result<Json<Envelope>, AppError> {
    let descriptor = TourService::top_five_cheap(descriptor);
    let tours = service.handlers().get_all(&descriptor, Document::new()).await?;
    Ok(Json(Envelope::many(Tour::PLURAL, tours)))
}

/// Statistics per difficulty for tours rated 4.5 or better
#[utoipa::path(
    get,
    path = "/tour-stats",
    tag = "Tours",
    responses(
        (status = 200, description = "Statistics per difficulty", body = Envelope),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn get_tour_stats(State(service): State<TourService>) -> Result<Json<Envelope>, AppError> {
    let stats = service.stats().await?;
    Ok(Json(Envelope::one("stats", to_json(&stats)?)))
}

/// Tour starts per month of a year
#[utoipa::path(
    get,
    path = "/monthly-plan/{year}",
    tag = "Tours",
    params(("year" = i32, Path, description = "Calendar year")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Busiest months first", body = Envelope),
        (status = 400, response = BadRequestResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn get_monthly_plan(
    State(service): State<TourService>,
    Path(year): Path<String>,
) -> Result<Json<Envelope>, AppError> {
    let plan = service.monthly_plan(&year).await?;
    Ok(Json(Envelope::one("plan", to_json(&plan)?)))
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<serde_json::Value, AppError> {
    serde_json::to_value(value).map_err(|e| AppError::Internal(e.to_string()))
}
