use chrono::{DateTime, Utc};
use query_features::FieldType;
use resource_handler::{Populate, Resource, ResourceResult, Select, require};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// A tour bought by a user, stored in the `bookings` collection.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    #[serde(rename = "_id")]
    pub id: Uuid,
    /// Tour id, rendered as `{_id, name}`
    pub tour: Uuid,
    /// Buyer id, rendered as the public user fields
    pub user: Uuid,
    #[validate(range(min = 0.0, message = "A booking price can not be negative"))]
    pub price: f64,
    pub created_at: DateTime<Utc>,
    pub paid: bool,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateBooking {
    #[validate(required(message = "Booking must belong to a Tour!"))]
    pub tour: Option<Uuid>,
    #[validate(required(message = "Booking must belong to a User!"))]
    pub user: Option<Uuid>,
    #[validate(required(message = "Booking must have a price."))]
    pub price: Option<f64>,
    /// Defaults to `true`
    pub paid: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBooking {
    pub price: Option<f64>,
    pub paid: Option<bool>,
}

impl Resource for Booking {
    const COLLECTION: &'static str = "bookings";
    const SINGULAR: &'static str = "booking";
    const PLURAL: &'static str = "bookings";

    const FIELD_TYPES: &'static [(&'static str, FieldType)] = &[
        ("price", FieldType::Number),
        ("paid", FieldType::Boolean),
        ("createdAt", FieldType::DateTime),
    ];
    const POPULATE: &'static [Populate] = &[
        Populate::Ref {
            path: "user",
            collection: "users",
            select: Select::Only(&["name", "email", "photo", "role"]),
        },
        Populate::Ref {
            path: "tour",
            collection: "tours",
            select: Select::Only(&["name"]),
        },
    ];

    type Create = CreateBooking;
    type Update = UpdateBooking;

    fn id(&self) -> Uuid {
        self.id
    }

    fn from_create(input: CreateBooking) -> ResourceResult<Self> {
        Ok(Booking {
            id: Uuid::now_v7(),
            tour: require("tour", input.tour)?,
            user: require("user", input.user)?,
            price: require("price", input.price)?,
            created_at: Utc::now(),
            paid: input.paid.unwrap_or(true),
        })
    }

    fn apply_update(&mut self, patch: UpdateBooking) {
        if let Some(price) = patch.price {
            self.price = price;
        }
        if let Some(paid) = patch.paid {
            self.paid = paid;
        }
    }
}
