mod common;

use serde_json::json;

use virtcol::db::{Connector, SchemaMigrator, SqliteConnector};
use virtcol::{Access, RedeclarePolicy, Registry, ValueType};

#[tokio::test]
async fn finalize_adds_declared_and_implicit_columns() {
    let (store, dir) = common::fresh_store("finalize_columns").await;

    let mut registry = common::demo_registry();
    let catalog = registry.finalize_all(&store).await.unwrap();
    assert_eq!(catalog.len(), 2);

    let users = store.columns("users").await.unwrap();
    for column in ["id", "name", "properties", "created_at", "updated_at"] {
        assert!(users.contains(column), "users.{column} missing: {users:?}");
    }
    assert!(!users.contains("happiness"), "properties must not become columns");

    let ideas = store.columns("ideas").await.unwrap();
    for column in ["id", "name", "user_id", "properties", "created_at", "updated_at"] {
        assert!(ideas.contains(column), "ideas.{column} missing: {ideas:?}");
    }
    assert!(!ideas.contains("silliness"));
    assert!(!ideas.contains("originality"));

    common::cleanup(store, dir).await;
}

#[tokio::test]
async fn rerunning_declare_and_finalize_is_a_schema_noop() {
    let (store, dir) = common::fresh_store("finalize_noop").await;

    let mut first = common::demo_registry();
    let catalog = first.finalize_all(&store).await.unwrap();
    let user = catalog.model("User").unwrap();

    let report = store.apply_schema(&user).await.unwrap();
    assert!(report.is_noop(), "{report:?}");

    // A fresh process declaring the same models changes nothing either.
    let before = store.columns("users").await.unwrap();
    let mut second = common::demo_registry();
    second.finalize_all(&store).await.unwrap();
    assert_eq!(store.columns("users").await.unwrap(), before);

    common::cleanup(store, dir).await;
}

#[tokio::test]
async fn later_declarations_only_add_new_columns_and_keep_rows() {
    let (store, dir) = common::fresh_store("finalize_additive").await;

    let mut first = common::demo_registry();
    let catalog = first.finalize_all(&store).await.unwrap();
    let user = catalog.model("User").unwrap();
    let stef = store
        .create(&user, &json!({"name": "Stef", "happiness": 1}))
        .await
        .unwrap();

    let mut second = common::demo_registry();
    second
        .declare_column("User", "email", ValueType::String, Access::Accessible)
        .unwrap();
    let user_v2 = second.finalize("User", &store).await.unwrap();

    let report = store.apply_schema(&user_v2).await.unwrap();
    assert!(report.is_noop());
    assert!(store.columns("users").await.unwrap().contains("email"));

    let reloaded = store
        .find(&user_v2, stef.id().unwrap())
        .await
        .unwrap()
        .expect("row survives migration");
    assert_eq!(reloaded.get("name").unwrap().as_str(), Some("Stef"));
    assert!(reloaded.get("email").unwrap().is_null());
    assert_eq!(reloaded.get("happiness").unwrap().as_i64(), Some(1));

    common::cleanup(store, dir).await;
}

#[tokio::test]
async fn schema_report_lists_what_was_created() {
    let (store, dir) = common::fresh_store("finalize_report").await;

    let mut registry = Registry::new(RedeclarePolicy::Reject);
    registry
        .register("Category")
        .unwrap()
        .column("title", ValueType::Text, Access::Accessible)
        .unwrap()
        .prop("color", ValueType::String, Access::Accessible)
        .unwrap();
    let category = registry.finalize("Category", &store).await.unwrap();
    assert_eq!(category.table(), "categories");

    let columns = store.columns("categories").await.unwrap();
    assert_eq!(columns.len(), 5, "{columns:?}");

    common::cleanup(store, dir).await;
}

#[tokio::test]
async fn finalize_against_closed_store_is_connectivity_error_and_retryable() {
    let (store, dir) = common::fresh_store("finalize_offline").await;
    store.close().await;

    let mut registry = common::demo_registry();
    let err = registry.finalize("User", &store).await.unwrap_err();
    assert!(err.is_connectivity(), "got {err:?}");
    assert!(!registry.is_finalized("User"));

    let (store, dir2) = common::fresh_store("finalize_online").await;
    registry.finalize("User", &store).await.unwrap();
    assert!(registry.is_finalized("User"));

    common::cleanup(store, dir2).await;
    let _ = tokio::fs::remove_dir_all(&dir).await;
}

#[tokio::test]
async fn rows_written_after_finalize_read_back_across_pools() {
    for round in 0..5 {
        let (store, dir) = common::fresh_store("finalize_reread").await;
        let mut registry = common::demo_registry();
        let catalog = registry.finalize_all(&store).await.unwrap();
        let user = catalog.model("User").unwrap();

        let stef = store
            .create(&user, &json!({"name": "Stef", "happiness": round}))
            .await
            .unwrap();
        let id = stef.id().unwrap();
        assert!(store.find(&user, id).await.unwrap().is_some(), "round {round}");

        let v2 = {
            let mut next = common::demo_registry();
            next.declare_column("User", "email", ValueType::String, Access::Accessible)
                .unwrap();
            next.finalize("User", &store).await.unwrap()
        };
        let found = store.find(&v2, id).await.unwrap();
        assert!(found.is_some(), "round {round}: row lost after adding a column");
        assert_eq!(store.all(&v2).await.unwrap().len(), 1);
        store.close().await;

        let connector = SqliteConnector::new(&dir);
        let reopened = connector
            .connect(&common::database_config("test"))
            .await
            .unwrap();
        let found = reopened
            .find(&v2, id)
            .await
            .unwrap()
            .expect("row visible on a new pool");
        assert_eq!(found.get("happiness").unwrap().as_i64(), Some(round));
        assert!(found.get("email").unwrap().is_null());

        common::cleanup(reopened, dir).await;
    }
}
