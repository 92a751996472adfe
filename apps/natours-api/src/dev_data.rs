//! Development data set: tours, users and reviews from JSON files.
//!
//! Each file holds an array of create payloads plus a fixed `_id`, so
//! references between the files stay valid across imports. User passwords
//! are plain text in the files and hashed on import.

use domain_reviews::Review;
use domain_tours::Tour;
use domain_users::User;
use eyre::WrapErr;
use resource_handler::{DocumentStore, Repository, Resource};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

#[derive(Deserialize)]
#[serde(bound = "T: DeserializeOwned")]
struct Record<T> {
    #[serde(rename = "_id")]
    id: Uuid,
    #[serde(flatten)]
    input: T,
}

/// Number of documents written per collection.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    pub tours: usize,
    pub users: usize,
    pub reviews: usize,
}

pub struct DevData {
    tours: Repository<Tour>,
    users: Repository<User>,
    reviews: Repository<Review>,
}

impl DevData {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            tours: Repository::new(store.clone()),
            users: Repository::new(store.clone()),
            reviews: Repository::new(store),
        }
    }

    /// Load `tours.json`, `users.json` and `reviews.json` from `dir`.
    pub async fn import(&self, dir: &Path) -> eyre::Result<ImportSummary> {
        let summary = ImportSummary {
            tours: import_file(&self.tours, &dir.join("tours.json"), |tour, id| tour.id = id).await?,
            users: import_file(&self.users, &dir.join("users.json"), |user, id| user.id = id).await?,
            reviews: import_file(&self.reviews, &dir.join("reviews.json"), |review, id| review.id = id)
                .await?,
        };
        info!(?summary, "dev data imported");
        Ok(summary)
    }

    /// Empty the three collections; returns the number of removed documents.
    pub async fn delete(&self) -> eyre::Result<u64> {
        let removed = self.reviews.delete_all().await?
            + self.users.delete_all().await?
            + self.tours.delete_all().await?;
        info!(removed, "dev data deleted");
        Ok(removed)
    }
}

async fn import_file<R: Resource>(
    repository: &Repository<R>,
    path: &Path,
    set_id: fn(&mut R, Uuid),
) -> eyre::Result<usize> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .wrap_err_with(|| format!("reading {}", path.display()))?;
    let records: Vec<Record<R::Create>> =
        serde_json::from_str(&raw).wrap_err_with(|| format!("parsing {}", path.display()))?;

    let count = records.len();
    for Record { id, input } in records {
        input
            .validate()
            .wrap_err_with(|| format!("{} {id} in {}", R::SINGULAR, path.display()))?;
        let mut entity = R::from_create(input)?;
        set_id(&mut entity, id);
        entity.validate()?;
        entity.validate_create()?;
        repository.insert(&entity).await?;
    }
    Ok(count)
}
