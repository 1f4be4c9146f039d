//! Integration tests for the SurrealDB collection mapping store.

use serde_json::json;
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};

use basalt_core::store::SchemaStore;
use basalt_db::{SurrealSchemaStore, run_migrations};

async fn setup() -> SurrealSchemaStore<Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    run_migrations(&db).await.unwrap();
    SurrealSchemaStore::new(db)
}

fn car_mapping() -> serde_json::Value {
    json!({
        "car": {
            "dynamic": "strict",
            "_meta": { "car": { "color": { "_type": "string" } } },
            "properties": { "color": { "type": "keyword" } }
        }
    })
}

#[tokio::test]
async fn put_and_get_mapping_verbatim() {
    let store = setup().await;
    store.put_mapping("acme", "car", car_mapping()).await.unwrap();

    let found = store.get_mapping("acme", "car").await.unwrap().unwrap();
    assert_eq!(found, car_mapping());
}

#[tokio::test]
async fn get_mapping_is_tenant_scoped() {
    let store = setup().await;
    store.put_mapping("acme", "car", car_mapping()).await.unwrap();

    assert!(store.get_mapping("other", "car").await.unwrap().is_none());
    assert!(store.get_mapping("acme", "bike").await.unwrap().is_none());
}

#[tokio::test]
async fn put_mapping_replaces_existing() {
    let store = setup().await;
    store.put_mapping("acme", "car", car_mapping()).await.unwrap();

    let replacement = json!({
        "car": {
            "dynamic": "strict",
            "_meta": { "car": { "color": { "_type": "text" } } },
            "properties": { "color": { "type": "text", "analyzer": "standard" } }
        }
    });
    store
        .put_mapping("acme", "car", replacement.clone())
        .await
        .unwrap();

    let found = store.get_mapping("acme", "car").await.unwrap().unwrap();
    assert_eq!(found, replacement);

    // Still exactly one mapping for the type.
    let all = store.list_mappings("acme").await.unwrap();
    assert_eq!(all.len(), 1);
}

#[tokio::test]
async fn list_mappings_is_sorted_by_type_name() {
    let store = setup().await;
    store.put_mapping("acme", "car", car_mapping()).await.unwrap();
    store
        .put_mapping("acme", "bike", json!({"bike": {}}))
        .await
        .unwrap();
    store
        .put_mapping("other", "boat", json!({"boat": {}}))
        .await
        .unwrap();

    let all = store.list_mappings("acme").await.unwrap();
    let names: Vec<&str> = all.iter().map(|(name, _)| name.as_str()).collect();
    assert_eq!(names, vec!["bike", "car"]);
}

#[tokio::test]
async fn delete_mapping_removes_single_type() {
    let store = setup().await;
    store.put_mapping("acme", "car", car_mapping()).await.unwrap();
    store
        .put_mapping("acme", "bike", json!({"bike": {}}))
        .await
        .unwrap();

    store.delete_mapping("acme", "car").await.unwrap();

    assert!(store.get_mapping("acme", "car").await.unwrap().is_none());
    assert!(store.get_mapping("acme", "bike").await.unwrap().is_some());
}

#[tokio::test]
async fn delete_all_reports_count() {
    let store = setup().await;
    store.put_mapping("acme", "car", car_mapping()).await.unwrap();
    store
        .put_mapping("acme", "bike", json!({"bike": {}}))
        .await
        .unwrap();
    store
        .put_mapping("other", "boat", json!({"boat": {}}))
        .await
        .unwrap();

    let removed = store.delete_all("acme").await.unwrap();
    assert_eq!(removed, 2);
    assert!(store.list_mappings("acme").await.unwrap().is_empty());
    assert_eq!(store.list_mappings("other").await.unwrap().len(), 1);
}
