use axum::{Router, http::StatusCode};
use domain_bookings::{Booking, handlers};
use mongodb::bson::doc;
use resource_handler::{DocumentStore, InMemoryStore, Repository, ResourceHandlers};
use serde_json::json;
use std::sync::Arc;
use test_utils::{TestAuth, TestRequest, assertions::assert_error};
use uuid::Uuid;

struct Harness {
    router: Router,
    auth: TestAuth,
    tour: Uuid,
    buyer: Uuid,
}

async fn setup() -> Harness {
    let store = Arc::new(InMemoryStore::new());
    let tour = Uuid::now_v7();
    let buyer = Uuid::now_v7();
    store
        .insert_one(
            "tours",
            doc! { "_id": tour.to_string(), "name": "The Forest Hiker", "price": 397.0 },
        )
        .await
        .unwrap();
    store
        .insert_one(
            "users",
            doc! {
                "_id": buyer.to_string(),
                "name": "Lourdes Browning",
                "email": "lourdes@example.com",
                "photo": "user-2.jpg",
                "role": "user",
                "password": "$argon2id$hash",
            },
        )
        .await
        .unwrap();

    let auth = TestAuth::new();
    let handlers = ResourceHandlers::new(Repository::<Booking>::new(store));
    let router = handlers::router(handlers, &auth.guard());

    Harness {
        router,
        auth,
        tour,
        buyer,
    }
}

#[tokio::test]
async fn test_bookings_are_staff_only() {
    let h = setup().await;
    let (_, user) = h.auth.login("user");
    let (_, guide) = h.auth.login("guide");

    let response = TestRequest::get("/").send(&h.router).await;
    assert_error(&response, StatusCode::UNAUTHORIZED, "You are not logged in!");

    for token in [user, guide] {
        let response = TestRequest::get("/").bearer(&token).send(&h.router).await;
        assert_error(&response, StatusCode::FORBIDDEN, "You do not have permission");
    }
}

#[tokio::test]
async fn test_created_booking_is_paid_and_populated() {
    let h = setup().await;
    let (_, token) = h.auth.login("lead-guide");

    let response = TestRequest::post("/")
        .bearer(&token)
        .json(json!({"tour": h.tour, "user": h.buyer, "price": 397}))
        .send(&h.router)
        .await;
    assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
    assert_eq!(response.body["data"]["booking"]["paid"], true);
    let id = response.body["data"]["booking"]["_id"].as_str().unwrap().to_string();

    let response = TestRequest::get(format!("/{id}")).bearer(&token).send(&h.router).await;
    assert_eq!(response.status, StatusCode::OK);
    let booking = &response.body["data"]["booking"];
    assert_eq!(
        booking["tour"],
        json!({"_id": h.tour.to_string(), "name": "The Forest Hiker"})
    );
    assert_eq!(booking["user"]["name"], "Lourdes Browning");
    assert!(booking["user"].get("password").is_none());
}

#[tokio::test]
async fn test_missing_price_is_rejected() {
    let h = setup().await;
    let (_, token) = h.auth.login("admin");

    let response = TestRequest::post("/")
        .bearer(&token)
        .json(json!({"tour": h.tour, "user": h.buyer}))
        .send(&h.router)
        .await;
    assert_error(&response, StatusCode::BAD_REQUEST, "Booking must have a price.");

    let response = TestRequest::get("/").bearer(&token).send(&h.router).await;
    assert_eq!(response.body["results"], 0);
}

#[tokio::test]
async fn test_update_filter_and_delete() {
    let h = setup().await;
    let (_, token) = h.auth.login("admin");

    for price in [397, 997] {
        let response = TestRequest::post("/")
            .bearer(&token)
            .json(json!({"tour": h.tour, "user": h.buyer, "price": price}))
            .send(&h.router)
            .await;
        assert_eq!(response.status, StatusCode::CREATED);
    }

    let response = TestRequest::get("/?sort=-price").bearer(&token).send(&h.router).await;
    let id = response.body["data"]["bookings"][0]["_id"].as_str().unwrap().to_string();
    assert_eq!(response.body["data"]["bookings"][0]["price"].as_f64(), Some(997.0));

    let response = TestRequest::patch(format!("/{id}"))
        .bearer(&token)
        .json(json!({"paid": false}))
        .send(&h.router)
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["booking"]["paid"], false);

    let response = TestRequest::get("/?paid=false").bearer(&token).send(&h.router).await;
    assert_eq!(response.body["results"], 1);

    let response = TestRequest::delete(format!("/{id}")).bearer(&token).send(&h.router).await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);
    let response = TestRequest::delete(format!("/{id}")).bearer(&token).send(&h.router).await;
    assert_error(&response, StatusCode::NOT_FOUND, "No booking found with that ID");
}
