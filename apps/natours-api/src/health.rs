//! Readiness endpoint

use axum::{Json, Router, extract::State, http::StatusCode, routing::get};
use axum_helpers::{HealthCheckFuture, ReadyResponse, run_health_checks};
use mongodb::Database;

pub fn router(db: Database) -> Router {
    Router::new()
        .route("/ready", get(readiness_check))
        .with_state(db)
}

/// 200 when MongoDB answers a ping, 503 otherwise.
async fn readiness_check(State(db): State<Database>) -> (StatusCode, Json<ReadyResponse>) {
    let mongodb: HealthCheckFuture<'_> = Box::pin(async {
        let status = database::mongodb::check_health_detailed(&db).await;
        if status.healthy {
            tracing::debug!(response_time_ms = status.response_time_ms, "mongodb ping");
            Ok(())
        } else {
            Err(status.message.unwrap_or_else(|| "ping failed".to_string()))
        }
    });

    run_health_checks(vec![("mongodb", mongodb)]).await
}
