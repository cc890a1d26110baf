//! State file round trips and recovery

use mib_agent::{Identity, ObjectStore, Value};
use tempfile::tempdir;

use crate::helpers::*;

#[tokio::test]
async fn test_fresh_store_writes_defaults() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("state.json");

    let store = ObjectStore::open(registry(), gate(), &path).await.unwrap();

    assert!(path.exists());
    let document: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(document["baseoid"], BASE_OID);
    assert_eq!(document["scalars"]["cpuThreshold"]["value"], 80);
    assert_eq!(document["scalars"]["manager"]["value"], "manager");

    assert_eq!(store.lookup_exact(&usage_oid()).await, Some(Value::Integer(10)));
}

#[tokio::test]
async fn test_writes_survive_restart() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("state.json");

    {
        let store = ObjectStore::open(registry(), gate(), &path).await.unwrap();
        store
            .write_batch(
                &[
                    (manager_oid(), Value::from("night shift")),
                    (threshold_oid(), Value::Integer(65)),
                ],
                &Identity::resolved("private"),
            )
            .await
            .unwrap();
        store
            .set_sampled_value(&usage_oid(), Value::Integer(33))
            .await
            .unwrap();
    }

    let store = ObjectStore::open(registry(), gate(), &path).await.unwrap();

    assert_eq!(
        store.values().await,
        vec![
            Value::from("night shift"),
            Value::from("operator@localhost"),
            Value::Integer(33),
            Value::Integer(65),
        ]
    );
}

#[tokio::test]
async fn test_save_then_load_is_idempotent() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("state.json");

    let store = ObjectStore::open(registry(), gate(), &path).await.unwrap();
    store.save().await.unwrap();
    let first = std::fs::read_to_string(&path).unwrap();

    let reopened = ObjectStore::open(registry(), gate(), &path).await.unwrap();
    reopened.save().await.unwrap();
    let second = std::fs::read_to_string(&path).unwrap();

    assert_eq!(first, second);
    assert_eq!(store.values().await, reopened.values().await);
}

#[tokio::test]
async fn test_rejected_batch_leaves_file_untouched() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("state.json");

    let store = ObjectStore::open(registry(), gate(), &path).await.unwrap();
    let before = std::fs::read_to_string(&path).unwrap();

    let result = store
        .write_batch(
            &[
                (manager_oid(), Value::from("ops")),
                (usage_oid(), Value::Integer(1)),
            ],
            &Identity::resolved("private"),
        )
        .await;

    assert!(result.is_err());
    assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
}

#[tokio::test]
async fn test_partial_document_falls_back_to_defaults() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("state.json");

    std::fs::write(
        &path,
        r#"{ "scalars": { "manager": { "value": "restored" }, "cpuThreshold": { "value": "high" } } }"#,
    )
    .unwrap();

    let store = ObjectStore::open(registry(), gate(), &path).await.unwrap();

    assert_eq!(store.lookup_exact(&manager_oid()).await, Some(Value::from("restored")));
    assert_eq!(store.lookup_exact(&threshold_oid()).await, Some(Value::Integer(80)));
    assert_eq!(
        store.lookup_exact(&email_oid()).await,
        Some(Value::from("operator@localhost"))
    );
}

#[tokio::test]
async fn test_corrupt_state_file_is_an_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("state.json");
    std::fs::write(&path, "not json").unwrap();

    assert!(ObjectStore::open(registry(), gate(), &path).await.is_err());
}
