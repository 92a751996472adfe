use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::get,
};
use axum_helpers::{
    AppError, AuthGuard, JsonBody, UuidPath,
    errors::responses::{
        BadRequestResponse, ForbiddenResponse, InternalServerErrorResponse, NotFoundResponse,
        UnauthorizedResponse,
    },
};
use resource_handler::{Envelope, ListQuery, ResourceHandlers};
use utoipa::OpenApi;

use crate::models::{Booking, CreateBooking, UpdateBooking};

/// Roles that manage bookings.
pub const BOOKING_MANAGERS: &[&str] = &["admin", "lead-guide"];

#[derive(OpenApi)]
#[openapi(
    paths(list_bookings, create_booking, get_booking, update_booking, delete_booking),
    components(
        schemas(Booking, CreateBooking, UpdateBooking, Envelope),
        responses(
            BadRequestResponse,
            UnauthorizedResponse,
            ForbiddenResponse,
            NotFoundResponse,
            InternalServerErrorResponse
        )
    ),
    tags(
        (name = "Bookings", description = "Tour bookings, staff only")
    )
)]
pub struct ApiDoc;

/// Every route needs an admin or lead guide.
pub fn router(handlers: ResourceHandlers<Booking>, guard: &AuthGuard) -> Router {
    Router::new()
        .route(
            "/",
            guard.restrict(get(list_bookings).post(create_booking), BOOKING_MANAGERS),
        )
        .route(
            "/{id}",
            guard.restrict(
                get(get_booking).patch(update_booking).delete(delete_booking),
                BOOKING_MANAGERS,
            ),
        )
        .with_state(handlers)
}

#[utoipa::path(
    get,
    path = "",
    tag = "Bookings",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Bookings with buyer and tour name", body = Envelope),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn list_bookings(
    state: State<ResourceHandlers<Booking>>,
    query: ListQuery,
) -> Result<Json<Envelope>, AppError> {
    resource_handler::get_all::<Booking>(state, query).await
}

#[utoipa::path(
    post,
    path = "",
    tag = "Bookings",
    request_body = CreateBooking,
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Booking created", body = Envelope),
        (status = 400, response = BadRequestResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn create_booking(
    state: State<ResourceHandlers<Booking>>,
    body: JsonBody<CreateBooking>,
) -> Result<(StatusCode, Json<Envelope>), AppError> {
    resource_handler::create_one::<Booking>(state, body).await
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Bookings",
    params(("id" = Uuid, Path, description = "Booking ID")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Booking found", body = Envelope),
        (status = 400, response = BadRequestResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn get_booking(
    state: State<ResourceHandlers<Booking>>,
    id: UuidPath,
) -> Result<Json<Envelope>, AppError> {
    resource_handler::get_one::<Booking>(state, id).await
}

#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Bookings",
    params(("id" = Uuid, Path, description = "Booking ID")),
    request_body = UpdateBooking,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Booking updated", body = Envelope),
        (status = 400, response = BadRequestResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn update_booking(
    state: State<ResourceHandlers<Booking>>,
    id: UuidPath,
    body: JsonBody<UpdateBooking>,
) -> Result<Json<Envelope>, AppError> {
    resource_handler::update_one::<Booking>(state, id, body).await
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Bookings",
    params(("id" = Uuid, Path, description = "Booking ID")),
    security(("bearer_auth" = [])),
    responses(
        (status = 204, description = "Booking deleted"),
        (status = 400, response = BadRequestResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn delete_booking(
    state: State<ResourceHandlers<Booking>>,
    id: UuidPath,
) -> Result<StatusCode, AppError> {
    resource_handler::delete_one::<Booking>(state, id).await
}
