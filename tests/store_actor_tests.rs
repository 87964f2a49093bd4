mod common;

use serde_json::json;

use virtcol::db;
use virtcol::{Value, VirtcolError};

#[tokio::test]
async fn handle_finalizes_models_and_serves_records() {
    let (store, dir) = common::fresh_store("actor_crud").await;
    let handle = db::spawn(store.clone()).await.unwrap();

    let mut registry = common::demo_registry();
    let catalog = registry.finalize_all(&handle).await.unwrap();
    let user = catalog.model("User").unwrap();
    assert!(store.columns("users").await.unwrap().contains("properties"));

    let created = handle
        .create(&user, json!({"name": "Stef", "happiness": 1}))
        .await
        .unwrap();
    let id = created.id().unwrap();

    let mut found = handle.find(&user, id).await.unwrap().unwrap();
    assert_eq!(found.get("happiness").unwrap(), Value::Integer(1));

    found.set("happiness", 2).unwrap();
    let saved = handle.save(found).await.unwrap();
    assert_eq!(saved.id(), Some(id));

    let all = handle.all(&user).await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].get("happiness").unwrap(), Value::Integer(2));

    handle.stop();
    let _ = tokio::fs::remove_dir_all(&dir).await;
}

#[tokio::test]
async fn handle_reports_validation_errors_from_the_store() {
    let (store, dir) = common::fresh_store("actor_validation").await;
    let handle = db::spawn(store).await.unwrap();

    let mut registry = common::demo_registry();
    let user = registry.finalize("User", &handle).await.unwrap();

    let err = handle
        .create(&user, json!({"name": "Stef", "id": 7}))
        .await
        .unwrap_err();
    assert!(err.is_validation(), "got {err:?}");
    assert!(handle.all(&user).await.unwrap().is_empty());

    handle.stop();
    let _ = tokio::fs::remove_dir_all(&dir).await;
}

#[tokio::test]
async fn calls_after_stop_fail_with_actor_error() {
    let (store, dir) = common::fresh_store("actor_stopped").await;
    let handle = db::spawn(store).await.unwrap();

    let mut registry = common::demo_registry();
    let user = registry.finalize("User", &handle).await.unwrap();

    handle.stop();
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    let err = handle.all(&user).await.unwrap_err();
    assert!(matches!(err, VirtcolError::Actor(_)), "got {err:?}");

    let _ = tokio::fs::remove_dir_all(&dir).await;
}
