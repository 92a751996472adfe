use domain_tours::DEFAULT_RATINGS_AVERAGE;
use mongodb::bson::{Document, doc};

use crate::models::Review;

/// Rating fields denormalised onto a tour.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TourRatings {
    pub ratings_quantity: i32,
    pub ratings_average: f64,
}

impl TourRatings {
    /// Every review counts towards the quantity; unrated ones are left out
    /// of the average. Without any rating the average falls back to 4.5.
    pub fn from_reviews(reviews: &[Review]) -> Self {
        let ratings: Vec<f64> = reviews.iter().filter_map(|r| r.rating).collect();

        let ratings_average = if ratings.is_empty() {
            DEFAULT_RATINGS_AVERAGE
        } else {
            round_to_tenth(ratings.iter().sum::<f64>() / ratings.len() as f64)
        };

        Self {
            ratings_quantity: reviews.len() as i32,
            ratings_average,
        }
    }

    pub fn to_document(self) -> Document {
        doc! {
            "ratingsQuantity": self.ratings_quantity,
            "ratingsAverage": self.ratings_average,
        }
    }
}

fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
