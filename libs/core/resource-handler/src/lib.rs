//! Generic CRUD over document collections.
//!
//! A domain entity implements [`Resource`]; [`ResourceHandlers`] then gives it
//! list, read, create, update and delete with the standard success envelope,
//! and the free functions [`get_all`], [`get_one`], [`create_one`],
//! [`update_one`] and [`delete_one`] mount those operations as axum handlers.
//!
//! ```ignore
//! let store: Arc<dyn DocumentStore> = Arc::new(MongoStore::new(db));
//! let tours = ResourceHandlers::new(Repository::<Tour>::new(store));
//!
//! let router = Router::new()
//!     .route("/", get(get_all::<Tour>).post(create_one::<Tour>))
//!     .route("/{id}", get(get_one::<Tour>).patch(update_one::<Tour>).delete(delete_one::<Tour>))
//!     .with_state(tours);
//! ```

pub mod envelope;
pub mod error;
pub mod extract;
pub mod factory;
pub mod populate;
pub mod repository;
pub mod resource;
pub mod store;

pub use envelope::Envelope;
pub use error::{ResourceError, ResourceResult, StoreError, StoreResult, require};
pub use extract::ListQuery;
pub use factory::{ResourceHandlers, create_one, delete_one, get_all, get_one, update_one};
pub use populate::{Populate, Select};
pub use repository::{Repository, id_filter};
pub use resource::Resource;
pub use store::{DocumentStore, InMemoryStore, MongoStore};
