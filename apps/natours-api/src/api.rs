//! Route composition for `/api/v1`.

use axum::Router;
use axum_helpers::{AuthGuard, JwtAuth};
use domain_bookings::Booking;
use domain_reviews::{Review, ReviewService};
use domain_tours::{Tour, TourService};
use domain_users::{Sessions, User, UserRepository, UserService};
use resource_handler::{DocumentStore, Repository, ResourceHandlers, StoreResult};
use std::sync::Arc;

use crate::state::AppState;

/// All resource routers, nested under `/v1`. The caller mounts the result
/// under `/api`.
pub fn routes(state: &AppState) -> Router {
    let store = &state.store;
    let users = Repository::<User>::new(store.clone());
    let guard = AuthGuard::new(
        JwtAuth::new(&state.config.jwt),
        Arc::new(UserRepository::new(users.clone())),
    );

    let tours = TourService::new(Repository::new(store.clone()));
    let reviews = ReviewService::new(Repository::new(store.clone()), tours.repository().clone());
    let accounts = UserService::new(
        users,
        Sessions::new(&state.config.jwt, state.config.environment),
        state.notifications.clone(),
    );
    let bookings = ResourceHandlers::new(Repository::<Booking>::new(store.clone()));

    let v1 = Router::new()
        .nest("/tours", domain_tours::handlers::router(tours, &guard))
        .nest(
            "/tours/{id}/reviews",
            domain_reviews::handlers::tour_router(reviews.clone(), &guard),
        )
        .nest("/users", domain_users::handlers::router(accounts, &guard))
        .nest("/reviews", domain_reviews::handlers::router(reviews, &guard))
        .nest("/bookings", domain_bookings::handlers::router(bookings, &guard));

    Router::new().nest("/v1", v1)
}

/// Create the unique indexes of every collection.
pub async fn ensure_indexes(store: &Arc<dyn DocumentStore>) -> StoreResult<()> {
    Repository::<Tour>::new(store.clone()).ensure_indexes().await?;
    Repository::<User>::new(store.clone()).ensure_indexes().await?;
    Repository::<Review>::new(store.clone()).ensure_indexes().await?;
    Repository::<Booking>::new(store.clone()).ensure_indexes().await?;
    Ok(())
}
