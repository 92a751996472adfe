use axum::extract::FromRef;
use domain_tours::Tour;
use mongodb::bson::{Document, doc};
use query_features::{FindQuery, QueryDescriptor};
use resource_handler::{Repository, ResourceHandlers, ResourceResult};
use serde_json::Value;
use tracing::instrument;
use uuid::Uuid;

use crate::models::{CreateReview, Review, UpdateReview};
use crate::ratings::TourRatings;

/// Review CRUD that keeps each tour's rating fields in step.
#[derive(Clone)]
pub struct ReviewService {
    handlers: ResourceHandlers<Review>,
    tours: Repository<Tour>,
}

impl ReviewService {
    pub fn new(reviews: Repository<Review>, tours: Repository<Tour>) -> Self {
        Self {
            handlers: ResourceHandlers::new(reviews),
            tours,
        }
    }

    pub fn handlers(&self) -> &ResourceHandlers<Review> {
        &self.handlers
    }

    /// All reviews, or those of one tour.
    pub async fn list(&self, descriptor: &QueryDescriptor, tour: Option<Uuid>) -> ResourceResult<Vec<Value>> {
        let scope = tour.map(tour_filter).unwrap_or_default();
        self.handlers.get_all(descriptor, scope).await
    }

    /// The tour of a nested route replaces any tour in the body; the author
    /// defaults to `author`.
    #[instrument(skip(self, input))]
    pub async fn create(&self, mut input: CreateReview, tour: Option<Uuid>, author: Uuid) -> ResourceResult<Review> {
        if tour.is_some() {
            input.tour = tour;
        }
        input.user.get_or_insert(author);

        let review = self.handlers.create_one(input).await?;
        self.recalculate_ratings(review.tour).await?;
        Ok(review)
    }

    #[instrument(skip(self, patch))]
    pub async fn update(&self, id: Uuid, patch: UpdateReview) -> ResourceResult<Review> {
        let review = self.handlers.update_one(id, patch).await?;
        self.recalculate_ratings(review.tour).await?;
        Ok(review)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> ResourceResult<()> {
        let review = self.handlers.delete_one(id).await?;
        self.recalculate_ratings(review.tour).await?;
        Ok(())
    }

    /// Recount the reviews of `tour_id` and store the result on the tour.
    #[instrument(skip(self))]
    pub async fn recalculate_ratings(&self, tour_id: Uuid) -> ResourceResult<TourRatings> {
        let reviews = self
            .handlers
            .repository()
            .find(FindQuery::new(tour_filter(tour_id)))
            .await?;
        let ratings = TourRatings::from_reviews(&reviews);

        if !self.tours.update_fields(tour_id, ratings.to_document()).await? {
            tracing::warn!(%tour_id, "reviewed tour no longer exists");
        }
        tracing::debug!(
            %tour_id,
            quantity = ratings.ratings_quantity,
            average = ratings.ratings_average,
            "tour ratings updated"
        );
        Ok(ratings)
    }
}

fn tour_filter(tour: Uuid) -> Document {
    doc! { "tour": tour.to_string() }
}

impl FromRef<ReviewService> for ResourceHandlers<Review> {
    fn from_ref(service: &ReviewService) -> Self {
        service.handlers.clone()
    }
}
