use mongodb::bson::{Document, doc};
use natours_api::{api, dev_data::{DevData, ImportSummary}};
use resource_handler::{DocumentStore, InMemoryStore};
use std::path::PathBuf;
use std::sync::Arc;

fn data_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../dev-data")
}

async fn store() -> Arc<dyn DocumentStore> {
    let store: Arc<dyn DocumentStore> = Arc::new(InMemoryStore::new());
    api::ensure_indexes(&store).await.unwrap();
    store
}

#[tokio::test]
async fn test_import_loads_every_collection() {
    let store = store().await;

    let summary = DevData::new(store.clone()).import(&data_dir()).await.unwrap();

    assert_eq!(
        summary,
        ImportSummary {
            tours: 7,
            users: 14,
            reviews: 24
        }
    );
    let admin = store
        .find_one("users", doc! { "email": "admin@natours.io" })
        .await
        .unwrap()
        .unwrap();
    assert_eq!(admin.get_str("role").unwrap(), "admin");
    assert_ne!(admin.get_str("password").unwrap(), "test1234");
    assert!(!admin.contains_key("passwordConfirm"));

    let hiker = store
        .find_one("tours", doc! { "name": "The Forest Hiker" })
        .await
        .unwrap()
        .unwrap();
    assert_eq!(hiker.get_str("slug").unwrap(), "the-forest-hiker");
}

#[tokio::test]
async fn test_second_import_hits_unique_indexes() {
    let store = store().await;
    let data = DevData::new(store.clone());
    data.import(&data_dir()).await.unwrap();

    assert!(data.import(&data_dir()).await.is_err());
    assert_eq!(store.count("tours", Document::new()).await.unwrap(), 7);
}

#[tokio::test]
async fn test_delete_empties_the_collections() {
    let store = store().await;
    let data = DevData::new(store.clone());
    data.import(&data_dir()).await.unwrap();

    assert_eq!(data.delete().await.unwrap(), 45);
    for collection in ["tours", "users", "reviews"] {
        assert_eq!(store.count(collection, Document::new()).await.unwrap(), 0, "{collection}");
    }
}

#[tokio::test]
async fn test_missing_directory_is_reported() {
    let store = store().await;

    let err = DevData::new(store)
        .import(&data_dir().join("nowhere"))
        .await
        .unwrap_err();

    assert!(format!("{err:#}").contains("tours.json"), "{err:#}");
}
