use chrono::{DateTime, Utc};
use mongodb::bson::{Bson, Document, doc};
use query_features::FieldType;
use resource_handler::{Populate, Resource, ResourceError, ResourceResult, Select, require};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum::{Display, EnumString};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// User fields never shown when a guide is embedded in a tour.
pub const PRIVATE_USER_FIELDS: &[&str] = &[
    "password",
    "passwordChangedAt",
    "passwordResetToken",
    "passwordResetExpires",
    "active",
];

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    Default,
    ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Difficulty {
    #[default]
    Easy,
    Medium,
    Difficult,
}

/// GeoJSON point with a label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Location {
    /// Always `Point`
    #[serde(rename = "type", default = "point")]
    pub kind: String,
    /// `[longitude, latitude]`
    pub coordinates: Vec<f64>,
    pub address: Option<String>,
    pub description: Option<String>,
    /// Day of the tour this stop is visited
    pub day: Option<i32>,
}

fn point() -> String {
    "Point".to_string()
}

/// Tour entity, stored in the `tours` collection
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Tour {
    #[serde(rename = "_id")]
    pub id: Uuid,
    #[validate(custom(function = "validate_tour_name"))]
    pub name: String,
    pub slug: String,
    #[validate(range(min = 1, message = "A tour must have a duration"))]
    pub duration: i32,
    #[validate(range(min = 1, message = "A tour must have a group size"))]
    pub max_group_size: i32,
    pub difficulty: Difficulty,
    #[validate(custom(function = "validate_rating"))]
    pub ratings_average: f64,
    pub ratings_quantity: i32,
    #[validate(range(min = 0.0, message = "A tour price can not be negative"))]
    pub price: f64,
    pub price_discount: Option<f64>,
    pub summary: String,
    pub description: Option<String>,
    pub image_cover: String,
    #[serde(default)]
    pub images: Vec<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub start_dates: Vec<DateTime<Utc>>,
    #[serde(default)]
    pub secret_tour: bool,
    pub start_location: Option<Location>,
    #[serde(default)]
    pub locations: Vec<Location>,
    /// User ids, rendered as the guide documents
    #[serde(default)]
    pub guides: Vec<Uuid>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTour {
    #[validate(required(message = "A tour must have a name"))]
    pub name: Option<String>,
    #[validate(required(message = "A tour must have a duration"))]
    pub duration: Option<i32>,
    #[validate(required(message = "A tour must have a group size"))]
    pub max_group_size: Option<i32>,
    #[validate(
        required(message = "A tour must have a difficulty"),
        custom(function = "validate_difficulty")
    )]
    pub difficulty: Option<String>,
    pub ratings_average: Option<f64>,
    pub ratings_quantity: Option<i32>,
    #[validate(required(message = "A tour must have a price"))]
    pub price: Option<f64>,
    pub price_discount: Option<f64>,
    #[validate(required(message = "A tour must have a summary"))]
    pub summary: Option<String>,
    pub description: Option<String>,
    #[validate(required(message = "A tour must have a cover image"))]
    pub image_cover: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub start_dates: Vec<DateTime<Utc>>,
    #[serde(default)]
    pub secret_tour: bool,
    pub start_location: Option<Location>,
    #[serde(default)]
    pub locations: Vec<Location>,
    #[serde(default)]
    pub guides: Vec<Uuid>,
}

/// Partial update; absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTour {
    pub name: Option<String>,
    pub duration: Option<i32>,
    pub max_group_size: Option<i32>,
    #[validate(custom(function = "validate_difficulty"))]
    pub difficulty: Option<String>,
    pub ratings_average: Option<f64>,
    pub ratings_quantity: Option<i32>,
    pub price: Option<f64>,
    pub price_discount: Option<f64>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub image_cover: Option<String>,
    pub images: Option<Vec<String>>,
    pub start_dates: Option<Vec<DateTime<Utc>>>,
    pub secret_tour: Option<bool>,
    pub start_location: Option<Location>,
    pub locations: Option<Vec<Location>>,
    pub guides: Option<Vec<Uuid>>,
}

fn validate_tour_name(name: &str) -> Result<(), ValidationError> {
    let length = name.chars().count();
    if length > 40 {
        return Err(ValidationError::new("max_length")
            .with_message("A tour name must have less or equal then 40 characters".into()));
    }
    if length < 10 {
        return Err(ValidationError::new("min_length")
            .with_message("A tour name must have more or equal then 10 characters".into()));
    }
    Ok(())
}

fn validate_rating(rating: f64) -> Result<(), ValidationError> {
    if rating < 1.0 {
        return Err(ValidationError::new("min").with_message("Rating must be above 1.0".into()));
    }
    if rating > 5.0 {
        return Err(ValidationError::new("max").with_message("Rating must be below 5.0".into()));
    }
    Ok(())
}

fn validate_difficulty(difficulty: &str) -> Result<(), ValidationError> {
    Difficulty::from_str(difficulty).map(|_| ()).map_err(|_| {
        ValidationError::new("enum")
            .with_message("Difficulty is either: easy, medium, difficult".into())
    })
}

/// `"The Forest Hiker"` → `"the-forest-hiker"`
pub fn slugify(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .replace(|c: char| !c.is_alphanumeric() && c != '-', "")
}

/// Default for a tour without reviews.
pub const DEFAULT_RATINGS_AVERAGE: f64 = 4.5;

const REVIEW_AUTHOR: &[Populate] = &[Populate::Ref {
    path: "user",
    collection: "users",
    select: Select::Only(&["name", "photo"]),
}];

/// Relations resolved for a single tour: its reviews with their authors.
pub const TOUR_DETAIL: &[Populate] = &[Populate::Virtual {
    path: "reviews",
    collection: "reviews",
    foreign_field: "tour",
    select: Select::All,
    nested: REVIEW_AUTHOR,
}];

impl Resource for Tour {
    const COLLECTION: &'static str = "tours";
    const SINGULAR: &'static str = "tour";
    const PLURAL: &'static str = "tours";

    const FIELD_TYPES: &'static [(&'static str, FieldType)] = &[
        ("duration", FieldType::Integer),
        ("maxGroupSize", FieldType::Integer),
        ("ratingsAverage", FieldType::Number),
        ("ratingsQuantity", FieldType::Integer),
        ("price", FieldType::Number),
        ("priceDiscount", FieldType::Number),
        ("secretTour", FieldType::Boolean),
        ("createdAt", FieldType::DateTime),
        ("startDates", FieldType::DateTime),
    ];
    const UNIQUE_INDEXES: &'static [&'static [&'static str]] = &[&["name"]];
    const POPULATE: &'static [Populate] = &[Populate::Ref {
        path: "guides",
        collection: "users",
        select: Select::Except(PRIVATE_USER_FIELDS),
    }];

    type Create = CreateTour;
    type Update = UpdateTour;

    fn id(&self) -> Uuid {
        self.id
    }

    fn from_create(input: CreateTour) -> ResourceResult<Self> {
        let name = require("name", input.name)?.trim().to_string();
        let difficulty = require("difficulty", input.difficulty)?;
        let difficulty = Difficulty::from_str(&difficulty)
            .map_err(|_| ResourceError::violation("difficulty", "Difficulty is either: easy, medium, difficult"))?;

        Ok(Tour {
            id: Uuid::now_v7(),
            slug: slugify(&name),
            name,
            duration: require("duration", input.duration)?,
            max_group_size: require("maxGroupSize", input.max_group_size)?,
            difficulty,
            ratings_average: input.ratings_average.unwrap_or(DEFAULT_RATINGS_AVERAGE),
            ratings_quantity: input.ratings_quantity.unwrap_or(0),
            price: require("price", input.price)?,
            price_discount: input.price_discount,
            summary: require("summary", input.summary)?.trim().to_string(),
            description: input.description.map(|d| d.trim().to_string()),
            image_cover: require("imageCover", input.image_cover)?,
            images: input.images,
            created_at: Utc::now(),
            start_dates: input.start_dates,
            secret_tour: input.secret_tour,
            start_location: input.start_location,
            locations: input.locations,
            guides: input.guides,
        })
    }

    fn apply_update(&mut self, patch: UpdateTour) {
        if let Some(name) = patch.name {
            self.name = name.trim().to_string();
            self.slug = slugify(&self.name);
        }
        if let Some(duration) = patch.duration {
            self.duration = duration;
        }
        if let Some(size) = patch.max_group_size {
            self.max_group_size = size;
        }
        if let Some(difficulty) = patch.difficulty.and_then(|d| Difficulty::from_str(&d).ok()) {
            self.difficulty = difficulty;
        }
        if let Some(average) = patch.ratings_average {
            self.ratings_average = average;
        }
        if let Some(quantity) = patch.ratings_quantity {
            self.ratings_quantity = quantity;
        }
        if let Some(price) = patch.price {
            self.price = price;
        }
        if patch.price_discount.is_some() {
            self.price_discount = patch.price_discount;
        }
        if let Some(summary) = patch.summary {
            self.summary = summary.trim().to_string();
        }
        if patch.description.is_some() {
            self.description = patch.description;
        }
        if let Some(cover) = patch.image_cover {
            self.image_cover = cover;
        }
        if let Some(images) = patch.images {
            self.images = images;
        }
        if let Some(dates) = patch.start_dates {
            self.start_dates = dates;
        }
        if let Some(secret) = patch.secret_tour {
            self.secret_tour = secret;
        }
        if patch.start_location.is_some() {
            self.start_location = patch.start_location;
        }
        if let Some(locations) = patch.locations {
            self.locations = locations;
        }
        if let Some(guides) = patch.guides {
            self.guides = guides;
        }
    }

    /// The discount must stay below the price. Checked on create only.
    fn validate_create(&self) -> ResourceResult<()> {
        match self.price_discount {
            Some(discount) if discount >= self.price => Err(ResourceError::violation(
                "priceDiscount",
                "Discount price should be below regular price",
            )),
            _ => Ok(()),
        }
    }

    fn base_filter() -> Document {
        doc! { "secretTour": { "$ne": true } }
    }

    fn add_virtuals(document: &mut Document) {
        let duration = match document.get("duration") {
            Some(Bson::Int32(days)) => f64::from(*days),
            Some(Bson::Int64(days)) => *days as f64,
            Some(Bson::Double(days)) => *days,
            _ => return,
        };
        document.insert("durationWeeks", duration / 7.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_input() -> CreateTour {
        CreateTour {
            name: Some("The Forest Hiker".into()),
            duration: Some(5),
            max_group_size: Some(25),
            difficulty: Some("easy".into()),
            ratings_average: None,
            ratings_quantity: None,
            price: Some(397.0),
            price_discount: None,
            summary: Some("  Breathtaking hike through the Canadian Banff National Park ".into()),
            description: None,
            image_cover: Some("tour-1-cover.jpg".into()),
            images: vec![],
            start_dates: vec![],
            secret_tour: false,
            start_location: None,
            locations: vec![],
            guides: vec![],
        }
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("The Forest Hiker"), "the-forest-hiker");
        assert_eq!(slugify("  The Sea   Explorer! "), "the-sea-explorer");
    }

    #[test]
    fn test_from_create_applies_defaults() {
        let tour = Tour::from_create(create_input()).unwrap();

        assert_eq!(tour.slug, "the-forest-hiker");
        assert_eq!(tour.ratings_average, 4.5);
        assert_eq!(tour.ratings_quantity, 0);
        assert_eq!(tour.difficulty, Difficulty::Easy);
        assert_eq!(tour.summary, "Breathtaking hike through the Canadian Banff National Park");
        assert!(tour.validate().is_ok());
    }

    #[test]
    fn test_name_length_messages() {
        let mut tour = Tour::from_create(create_input()).unwrap();
        tour.name = "Short".into();
        let err = tour.validate().unwrap_err().to_string();
        assert!(err.contains("more or equal then 10 characters"), "{err}");

        tour.name = "A".repeat(41);
        let err = tour.validate().unwrap_err().to_string();
        assert!(err.contains("less or equal then 40 characters"), "{err}");
    }

    #[test]
    fn test_rating_bounds() {
        let mut tour = Tour::from_create(create_input()).unwrap();
        tour.ratings_average = 0.5;
        assert!(tour.validate().unwrap_err().to_string().contains("Rating must be above 1.0"));

        tour.ratings_average = 5.5;
        assert!(tour.validate().unwrap_err().to_string().contains("Rating must be below 5.0"));
    }

    #[test]
    fn test_unknown_difficulty_is_a_violation() {
        let mut input = create_input();
        input.difficulty = Some("extreme".into());

        let err = input.validate().unwrap_err().to_string();
        assert!(err.contains("Difficulty is either: easy, medium, difficult"), "{err}");
    }

    #[test]
    fn test_discount_checked_on_create() {
        let mut tour = Tour::from_create(create_input()).unwrap();
        tour.price_discount = Some(400.0);
        assert!(tour.validate_create().is_err());

        tour.price_discount = Some(100.0);
        assert!(tour.validate_create().is_ok());
    }

    #[test]
    fn test_update_renames_slug_and_ignores_bad_difficulty() {
        let mut tour = Tour::from_create(create_input()).unwrap();
        tour.apply_update(UpdateTour {
            name: Some("The Sea Explorer".into()),
            difficulty: Some("extreme".into()),
            ..UpdateTour::default()
        });

        assert_eq!(tour.slug, "the-sea-explorer");
        assert_eq!(tour.difficulty, Difficulty::Easy);
    }

    #[test]
    fn test_duration_weeks_virtual() {
        let mut document = doc! { "duration": 14 };
        Tour::add_virtuals(&mut document);
        assert_eq!(document.get_f64("durationWeeks").unwrap(), 2.0);

        let mut projected = doc! { "name": "The Forest Hiker" };
        Tour::add_virtuals(&mut projected);
        assert!(projected.get("durationWeeks").is_none());
    }
}
