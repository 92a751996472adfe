//! Aggregate views over tours, computed from the matching documents.

use crate::models::Tour;
use chrono::Datelike;
use serde::Serialize;
use std::collections::BTreeMap;
use utoipa::ToSchema;

/// Tours at or above this average count towards the statistics.
pub const STATS_MIN_RATING: f64 = 4.5;

/// Most months returned by the monthly plan.
pub const MAX_PLAN_MONTHS: usize = 12;

/// Statistics for one difficulty level.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TourStats {
    /// Upper-cased difficulty
    #[serde(rename = "_id")]
    pub difficulty: String,
    pub num_tours: i64,
    pub num_ratings: i64,
    pub avg_rating: f64,
    pub avg_price: f64,
    pub min_price: f64,
    pub max_price: f64,
}

/// Tours starting in one month.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyPlan {
    /// 1 = January
    pub month: u32,
    pub num_tour_starts: i64,
    /// Tour names, one entry per start date
    pub tours: Vec<String>,
}

/// Group the well-rated tours by difficulty, cheapest average first.
pub fn tour_stats(tours: &[Tour]) -> Vec<TourStats> {
    let mut groups: BTreeMap<String, Vec<&Tour>> = BTreeMap::new();
    for tour in tours.iter().filter(|t| t.ratings_average >= STATS_MIN_RATING) {
        groups
            .entry(tour.difficulty.to_string().to_uppercase())
            .or_default()
            .push(tour);
    }

    let mut stats: Vec<TourStats> = groups
        .into_iter()
        .map(|(difficulty, group)| {
            let count = group.len() as f64;
            let prices = group.iter().map(|t| t.price);
            TourStats {
                difficulty,
                num_tours: group.len() as i64,
                num_ratings: group.iter().map(|t| i64::from(t.ratings_quantity)).sum(),
                avg_rating: group.iter().map(|t| t.ratings_average).sum::<f64>() / count,
                avg_price: prices.clone().sum::<f64>() / count,
                min_price: prices.clone().fold(f64::INFINITY, f64::min),
                max_price: prices.fold(f64::NEG_INFINITY, f64::max),
            }
        })
        .collect();

    stats.sort_by(|a, b| a.avg_price.total_cmp(&b.avg_price));
    stats
}

/// Start dates within `year`, grouped by month. Busiest months first, ties in
/// calendar order.
pub fn monthly_plan(tours: &[Tour], year: i32) -> Vec<MonthlyPlan> {
    let mut months: BTreeMap<u32, Vec<String>> = BTreeMap::new();
    for tour in tours {
        for start in tour.start_dates.iter().filter(|d| d.year() == year) {
            months.entry(start.month()).or_default().push(tour.name.clone());
        }
    }

    let mut plan: Vec<MonthlyPlan> = months
        .into_iter()
        .map(|(month, tours)| MonthlyPlan {
            month,
            num_tour_starts: tours.len() as i64,
            tours,
        })
        .collect();

    plan.sort_by(|a, b| {
        b.num_tour_starts
            .cmp(&a.num_tour_starts)
            .then(a.month.cmp(&b.month))
    });
    plan.truncate(MAX_PLAN_MONTHS);
    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Difficulty;
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    fn tour(name: &str, difficulty: Difficulty, rating: f64, quantity: i32, price: f64) -> Tour {
        Tour {
            id: Uuid::now_v7(),
            name: name.into(),
            slug: crate::models::slugify(name),
            duration: 5,
            max_group_size: 10,
            difficulty,
            ratings_average: rating,
            ratings_quantity: quantity,
            price,
            price_discount: None,
            summary: "summary".into(),
            description: None,
            image_cover: "cover.jpg".into(),
            images: vec![],
            created_at: Utc::now(),
            start_dates: vec![],
            secret_tour: false,
            start_location: None,
            locations: vec![],
            guides: vec![],
        }
    }

    fn starting(mut tour: Tour, dates: &[(i32, u32, u32)]) -> Tour {
        tour.start_dates = dates
            .iter()
            .map(|(y, m, d)| Utc.with_ymd_and_hms(*y, *m, *d, 9, 0, 0).unwrap())
            .collect();
        tour
    }

    #[test]
    fn test_stats_group_by_difficulty_sorted_by_price() {
        let tours = vec![
            tour("The Forest Hiker", Difficulty::Easy, 4.7, 37, 397.0),
            tour("The Sea Explorer", Difficulty::Medium, 4.8, 23, 497.0),
            tour("The Sports Lover", Difficulty::Difficult, 4.7, 10, 2997.0),
            tour("The Park Camper", Difficulty::Medium, 4.9, 8, 1497.0),
            tour("The City Wanderer", Difficulty::Easy, 4.6, 11, 1197.0),
            tour("The Low Rated Trip", Difficulty::Easy, 4.0, 3, 10.0),
        ];

        let stats = tour_stats(&tours);

        assert_eq!(stats.len(), 3);
        assert_eq!(stats[0].difficulty, "EASY");
        assert_eq!(stats[0].num_tours, 2);
        assert_eq!(stats[0].num_ratings, 48);
        assert_eq!(stats[0].avg_price, 797.0);
        assert_eq!(stats[0].min_price, 397.0);
        assert_eq!(stats[0].max_price, 1197.0);
        assert!((stats[0].avg_rating - 4.65).abs() < 1e-9);

        assert_eq!(stats[1].difficulty, "MEDIUM");
        assert_eq!(stats[1].avg_price, 997.0);
        assert_eq!(stats[2].difficulty, "DIFFICULT");
    }

    #[test]
    fn test_stats_empty_when_nothing_qualifies() {
        let tours = vec![tour("The Low Rated Trip", Difficulty::Easy, 3.0, 1, 10.0)];
        assert!(tour_stats(&tours).is_empty());
    }

    #[test]
    fn test_monthly_plan_counts_starts_in_year() {
        let tours = vec![
            starting(
                tour("The Forest Hiker", Difficulty::Easy, 4.7, 1, 397.0),
                &[(2021, 4, 25), (2021, 7, 20), (2021, 10, 5)],
            ),
            starting(
                tour("The Sea Explorer", Difficulty::Medium, 4.8, 1, 497.0),
                &[(2021, 6, 19), (2021, 7, 20), (2022, 8, 18)],
            ),
            starting(
                tour("The Snow Adventurer", Difficulty::Difficult, 4.5, 1, 997.0),
                &[(2021, 1, 5), (2021, 7, 20), (2020, 12, 30)],
            ),
        ];

        let plan = monthly_plan(&tours, 2021);

        assert_eq!(plan[0].month, 7);
        assert_eq!(plan[0].num_tour_starts, 3);
        assert_eq!(
            plan[0].tours,
            vec!["The Forest Hiker", "The Sea Explorer", "The Snow Adventurer"]
        );
        let rest: Vec<u32> = plan[1..].iter().map(|p| p.month).collect();
        assert_eq!(rest, vec![1, 4, 6, 10]);
        assert!(plan[1..].iter().all(|p| p.num_tour_starts == 1));
    }

    #[test]
    fn test_monthly_plan_other_year_is_empty() {
        let tours = vec![starting(
            tour("The Forest Hiker", Difficulty::Easy, 4.7, 1, 397.0),
            &[(2021, 4, 25)],
        )];
        assert!(monthly_plan(&tours, 1999).is_empty());
    }
}
