//! Reviews Domain
//!
//! Reviews of tours by users. Every write recalculates the reviewed tour's
//! `ratingsQuantity` and `ratingsAverage`.
//!
//! Two routers share the handlers: [`handlers::router`] for `/reviews` and
//! [`handlers::tour_router`] for `/tours/{id}/reviews`, where listing is
//! scoped to the tour and new reviews belong to it.
//!
//! ```rust,ignore
//! use domain_reviews::{ReviewService, handlers};
//!
//! let service = ReviewService::new(Repository::new(store.clone()), Repository::new(store));
//! let app = Router::new()
//!     .nest("/reviews", handlers::router(service.clone(), &guard))
//!     .nest("/tours/{id}/reviews", handlers::tour_router(service, &guard));
//! ```

pub mod handlers;
pub mod models;
pub mod ratings;
pub mod service;

pub use models::{CreateReview, Review, UpdateReview};
pub use ratings::TourRatings;
pub use service::ReviewService;
