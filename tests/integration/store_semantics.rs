//! Read, walk and write semantics through the request handlers

use mib_agent::{
    ErrorStatus, Identity, Operation, OperationHandler, Request, StoreHandlers, Value, VarBind,
    VarValue,
};
use pretty_assertions::assert_eq;

use crate::helpers::*;

fn handlers() -> StoreHandlers {
    StoreHandlers::new(memory_store())
}

fn read(operation: Operation, oid: mib_agent::Oid) -> Request {
    Request::new(operation, vec![(oid, Value::Null)], Identity::resolved("public"))
}

#[tokio::test]
async fn test_walk_visits_every_object_once_in_order() {
    let handlers = handlers();
    let mut cursor: mib_agent::Oid = "1".parse().unwrap();
    let mut visited = vec![];

    loop {
        let response = handlers.dispatch(&read(Operation::GetNext, cursor.clone())).await;
        let VarBind { oid, value } = response.varbinds[0].clone();

        match value {
            VarValue::EndOfMibView => {
                assert_eq!(oid, cursor);
                break;
            }
            VarValue::Value(_) => {
                assert!(oid > cursor);
                visited.push(oid.clone());
                cursor = oid;
            }
            VarValue::NoSuchObject => panic!("walk returned no_such_object"),
        }
    }

    assert_eq!(
        visited,
        vec![manager_oid(), email_oid(), usage_oid(), threshold_oid()]
    );

    let names: Vec<_> = handlers
        .store()
        .registry()
        .objects()
        .iter()
        .map(|object| object.name.as_str())
        .collect();
    assert_eq!(names, object_names());
}

#[tokio::test]
async fn test_get_of_unregistered_identifiers() {
    let handlers = handlers();

    for oid in [base(), base().child(&[1]), base().child(&[1, 0, 0]), base().child(&[5, 0])] {
        let response = handlers.dispatch(&read(Operation::Get, oid.clone())).await;
        assert_eq!(response.varbinds, vec![VarBind::new(oid, VarValue::NoSuchObject)]);
    }
}

#[tokio::test]
async fn test_read_only_object_is_never_writable() {
    let handlers = handlers();

    for value in [Value::Integer(5), Value::from("5"), Value::Null] {
        let response = handlers
            .dispatch(&Request::new(
                Operation::Set,
                vec![(usage_oid(), value)],
                Identity::resolved("private"),
            ))
            .await;

        assert_eq!(response.error_status, Some(ErrorStatus::NotWritable));
    }
}

#[tokio::test]
async fn test_unknown_identity_cannot_write() {
    let handlers = handlers();

    for identity in [Identity::Unresolved, Identity::resolved("intruder")] {
        let response = handlers
            .dispatch(&Request::new(
                Operation::Set,
                vec![(threshold_oid(), Value::Integer(50))],
                identity,
            ))
            .await;

        assert_eq!(response.error_status, Some(ErrorStatus::AuthorizationError));
        assert_eq!(response.error_index, 1);
    }

    assert_eq!(
        handlers.store().lookup_exact(&threshold_oid()).await,
        Some(Value::Integer(80))
    );
}

#[tokio::test]
async fn test_second_read_only_community() {
    let handlers = handlers();

    let response = handlers
        .dispatch(&Request::new(
            Operation::Set,
            vec![(manager_oid(), Value::from("ops"))],
            Identity::resolved("public-area"),
        ))
        .await;

    assert_eq!(response.error_status, Some(ErrorStatus::AuthorizationError));

    let response = handlers.dispatch(&read(Operation::Get, manager_oid())).await;
    assert!(response.is_success());
}

#[tokio::test]
async fn test_batch_with_failing_middle_item_commits_nothing() {
    let handlers = handlers();
    let before = handlers.store().values().await;

    let response = handlers
        .dispatch(&Request::new(
            Operation::Set,
            vec![
                (manager_oid(), Value::from("ops-team")),
                (threshold_oid(), Value::Integer(250)),
                (email_oid(), Value::from("noc@example.org")),
            ],
            Identity::resolved("private"),
        ))
        .await;

    assert_eq!(response.error_status, Some(ErrorStatus::WrongValue));
    assert_eq!(response.error_index, 2);
    assert_eq!(handlers.store().values().await, before);
}

#[tokio::test]
async fn test_valid_batch_commits_everything() {
    let handlers = handlers();

    let response = handlers
        .dispatch(&Request::new(
            Operation::Set,
            vec![
                (manager_oid(), Value::from("ops-team")),
                (threshold_oid(), Value::Integer(0)),
                (email_oid(), Value::from("noc@example.org")),
            ],
            Identity::resolved("private"),
        ))
        .await;

    assert!(response.is_success());

    let store = handlers.store();
    assert_eq!(store.lookup_exact(&manager_oid()).await, Some(Value::from("ops-team")));
    assert_eq!(store.lookup_exact(&threshold_oid()).await, Some(Value::Integer(0)));
    assert_eq!(
        store.lookup_exact(&email_oid()).await,
        Some(Value::from("noc@example.org"))
    );
}

#[tokio::test]
async fn test_email_length_bounds() {
    let handlers = handlers();

    let set = |value: &str| {
        Request::new(
            Operation::Set,
            vec![(email_oid(), Value::from(value))],
            Identity::resolved("private"),
        )
    };

    assert_eq!(
        handlers.dispatch(&set("a@b")).await.error_status,
        Some(ErrorStatus::WrongValue)
    );
    assert!(handlers.dispatch(&set("a@bc")).await.is_success());
}
