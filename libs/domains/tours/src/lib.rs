//! Tours Domain
//!
//! The tour catalogue: CRUD through the generic resource handlers, the
//! `top-5-cheap` alias, per-difficulty statistics and the monthly start plan.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  ← HTTP endpoints, auth guard per route
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Service   │  ← alias presets, statistics
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │ Repository  │  ← resource_handler::Repository<Tour>
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Models    │  ← Tour entity, DTOs, validation rules
//! └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use domain_tours::{TourService, handlers};
//! use resource_handler::Repository;
//!
//! let service = TourService::new(Repository::new(store));
//! let router = handlers::router(service, &guard);
//! ```

pub mod error;
pub mod handlers;
pub mod models;
pub mod service;
pub mod stats;

pub use error::{TourError, TourResult};
pub use models::{CreateTour, DEFAULT_RATINGS_AVERAGE, Difficulty, Location, Tour, UpdateTour};
pub use service::TourService;
pub use stats::{MonthlyPlan, TourStats};
