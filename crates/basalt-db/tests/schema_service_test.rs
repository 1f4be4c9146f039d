//! Schema service tests against the SurrealDB-backed mapping store.

use serde_json::json;
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};

use basalt_core::BasaltError;
use basalt_core::acl::{Permission, default_role_permissions};
use basalt_core::schema::SchemaService;
use basalt_db::{SurrealSchemaStore, run_migrations};

async fn setup() -> SchemaService<SurrealSchemaStore<Db>> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    run_migrations(&db).await.unwrap();
    SchemaService::new(SurrealSchemaStore::new(db))
}

fn car_schema() -> serde_json::Value {
    json!({
        "car": {
            "serialNumber": { "_type": "string", "_required": true },
            "color": { "_type": "enum" },
            "model": {
                "_type": "object",
                "description": { "_type": "text", "_language": "french" }
            }
        }
    })
}

#[tokio::test]
async fn set_and_get_schema_round_trips_verbatim() {
    let service = setup().await;
    service.set_schema("acme", "car", car_schema()).await.unwrap();

    let read_back = service.get_schema("acme", "car").await.unwrap().unwrap();
    assert_eq!(read_back, car_schema());
}

#[tokio::test]
async fn get_schema_absent_is_none() {
    let service = setup().await;
    assert!(service.get_schema("acme", "car").await.unwrap().is_none());
}

#[tokio::test]
async fn invalid_schema_never_reaches_the_store() {
    let service = setup().await;
    let bad = json!({ "car": { "color": { "_type": "XXX" } } });
    let err = service.set_schema("acme", "car", bad).await.unwrap_err();
    assert!(matches!(err, BasaltError::Validation { .. }));
    assert!(service.get_schema("acme", "car").await.unwrap().is_none());
}

#[tokio::test]
async fn incompatible_update_is_rejected_and_stored_schema_kept() {
    let service = setup().await;
    service.set_schema("acme", "car", car_schema()).await.unwrap();

    let mut changed = car_schema();
    changed["car"]["color"]["_type"] = json!("date");
    let err = service.set_schema("acme", "car", changed).await.unwrap_err();
    assert!(matches!(err, BasaltError::IncompatibleSchema { .. }));

    let read_back = service.get_schema("acme", "car").await.unwrap().unwrap();
    assert_eq!(read_back, car_schema());
}

#[tokio::test]
async fn compatible_update_replaces_schema() {
    let service = setup().await;
    service.set_schema("acme", "car", car_schema()).await.unwrap();

    let mut extended = car_schema();
    extended["car"]["nickname"] = json!({ "_type": "string" });
    service
        .set_schema("acme", "car", extended.clone())
        .await
        .unwrap();

    let read_back = service.get_schema("acme", "car").await.unwrap().unwrap();
    assert_eq!(read_back, extended);
}

#[tokio::test]
async fn delete_schema_removes_mapping() {
    let service = setup().await;
    service.set_schema("acme", "car", car_schema()).await.unwrap();
    service.delete_schema("acme", "car").await.unwrap();
    assert!(service.get_schema("acme", "car").await.unwrap().is_none());
}

#[tokio::test]
async fn acl_settings_default_for_types_without_acl() {
    let service = setup().await;
    service.set_schema("acme", "car", car_schema()).await.unwrap();

    let settings = service.acl_settings("acme").await.unwrap();
    assert_eq!(settings.len(), 1);
    assert_eq!(settings["car"], default_role_permissions());
}

#[tokio::test]
async fn set_acl_settings_replaces_matrix_wholesale() {
    let service = setup().await;
    service.set_schema("acme", "car", car_schema()).await.unwrap();

    let mut settings = service.acl_settings("acme").await.unwrap();
    let matrix = settings.get_mut("car").unwrap();
    matrix.clear();
    matrix.insert(
        "iron".to_string(),
        [Permission::ReadAll].into_iter().collect(),
    );
    service
        .set_acl_settings("acme", settings.clone())
        .await
        .unwrap();

    let read_back = service.acl_settings("acme").await.unwrap();
    assert_eq!(read_back["car"].len(), 1);
    assert!(read_back["car"]["iron"].contains(&Permission::ReadAll));

    // The schema document still round-trips with the _acl embedded.
    let schema = service.get_schema("acme", "car").await.unwrap().unwrap();
    assert!(schema["car"]["_acl"]["iron"].is_array());
}

#[tokio::test]
async fn set_acl_settings_for_undeclared_type_fails() {
    let service = setup().await;

    let mut settings = basalt_core::acl::AclSettings::new();
    settings.insert("ghost".to_string(), default_role_permissions());
    let err = service.set_acl_settings("acme", settings).await.unwrap_err();
    assert!(matches!(err, BasaltError::Validation { .. }));
}
