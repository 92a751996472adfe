use chrono::{DateTime, Utc};
use query_features::FieldType;
use resource_handler::{Populate, Resource, ResourceResult, Select, require};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Review entity, stored in the `reviews` collection.
///
/// One review per user and tour.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    #[serde(rename = "_id")]
    pub id: Uuid,
    #[validate(length(min = 1, message = "Review can not be empty!"))]
    pub review: String,
    #[validate(range(min = 1.0, max = 5.0, message = "Rating must be between 1 and 5"))]
    pub rating: Option<f64>,
    pub created_at: DateTime<Utc>,
    /// Tour id
    pub tour: Uuid,
    /// Author id, rendered as `{_id, name, photo}`
    pub user: Uuid,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateReview {
    #[validate(required(message = "Review can not be empty!"))]
    pub review: Option<String>,
    #[validate(range(min = 1.0, max = 5.0, message = "Rating must be between 1 and 5"))]
    pub rating: Option<f64>,
    #[validate(required(message = "Review must belong to a tour."))]
    pub tour: Option<Uuid>,
    #[validate(required(message = "Review must belong to a user"))]
    pub user: Option<Uuid>,
}

/// Text and rating only; a review never moves to another tour or author.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateReview {
    pub review: Option<String>,
    #[validate(range(min = 1.0, max = 5.0, message = "Rating must be between 1 and 5"))]
    pub rating: Option<f64>,
}

impl Resource for Review {
    const COLLECTION: &'static str = "reviews";
    const SINGULAR: &'static str = "review";
    const PLURAL: &'static str = "reviews";

    const FIELD_TYPES: &'static [(&'static str, FieldType)] = &[
        ("rating", FieldType::Number),
        ("createdAt", FieldType::DateTime),
    ];
    const UNIQUE_INDEXES: &'static [&'static [&'static str]] = &[&["tour", "user"]];
    const POPULATE: &'static [Populate] = &[Populate::Ref {
        path: "user",
        collection: "users",
        select: Select::Only(&["name", "photo"]),
    }];

    type Create = CreateReview;
    type Update = UpdateReview;

    fn id(&self) -> Uuid {
        self.id
    }

    fn from_create(input: CreateReview) -> ResourceResult<Self> {
        Ok(Review {
            id: Uuid::now_v7(),
            review: require("review", input.review)?.trim().to_string(),
            rating: input.rating,
            created_at: Utc::now(),
            tour: require("tour", input.tour)?,
            user: require("user", input.user)?,
        })
    }

    fn apply_update(&mut self, patch: UpdateReview) {
        if let Some(review) = patch.review {
            self.review = review.trim().to_string();
        }
        if patch.rating.is_some() {
            self.rating = patch.rating;
        }
    }
}
