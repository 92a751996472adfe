use crate::error::{TourError, TourResult};
use crate::models::{TOUR_DETAIL, Tour};
use crate::stats::{MonthlyPlan, STATS_MIN_RATING, TourStats, monthly_plan, tour_stats};
use axum::extract::FromRef;
use mongodb::bson::doc;
use query_features::{FindQuery, QueryDescriptor};
use resource_handler::{Repository, ResourceHandlers};
use tracing::instrument;

/// Query preset behind `GET /tours/top-5-cheap`.
pub const TOP_FIVE_CHEAP: &[(&str, &str)] = &[
    ("limit", "5"),
    ("sort", "-ratingsAverage,price"),
    ("fields", "name,price,ratingsAverage,summary,difficulty"),
];

/// Tour operations beyond the generic CRUD.
#[derive(Clone)]
pub struct TourService {
    handlers: ResourceHandlers<Tour>,
}

impl TourService {
    pub fn new(repository: Repository<Tour>) -> Self {
        Self {
            handlers: ResourceHandlers::new(repository).with_detail_populate(TOUR_DETAIL),
        }
    }

    pub fn handlers(&self) -> &ResourceHandlers<Tour> {
        &self.handlers
    }

    pub fn repository(&self) -> &Repository<Tour> {
        self.handlers.repository()
    }

    /// Apply the top-five preset under whatever the request set itself.
    pub fn top_five_cheap(descriptor: QueryDescriptor) -> QueryDescriptor {
        descriptor.with_defaults(TOP_FIVE_CHEAP)
    }

    #[instrument(skip(self))]
    pub async fn stats(&self) -> TourResult<Vec<TourStats>> {
        let query = FindQuery::new(doc! { "ratingsAverage": { "$gte": STATS_MIN_RATING } });
        let tours = self.repository().find(query).await?;
        Ok(tour_stats(&tours))
    }

    #[instrument(skip(self))]
    pub async fn monthly_plan(&self, year: &str) -> TourResult<Vec<MonthlyPlan>> {
        let year: i32 = year
            .trim()
            .parse()
            .map_err(|_| TourError::InvalidYear(year.to_string()))?;

        let tours = self.repository().find(FindQuery::all()).await?;
        Ok(monthly_plan(&tours, year))
    }
}

impl FromRef<TourService> for ResourceHandlers<Tour> {
    fn from_ref(service: &TourService) -> Self {
        service.handlers.clone()
    }
}
