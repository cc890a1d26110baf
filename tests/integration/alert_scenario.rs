//! Sampler and dispatcher working together

use std::time::Duration;

use mib_agent::{
    Identity, Value,
    sampler::{Sampler, SamplerHandle, ThresholdEvaluation},
};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::helpers::*;

#[tokio::test]
async fn test_two_rising_edges_two_notifications() {
    let store = memory_store();
    let (dispatcher, recorders) = recording_dispatcher(store.registry());
    let mut sampler = Sampler::new(
        store.clone(),
        ScriptedCpu::boxed(&[70.0, 85.0, 90.0, 60.0, 95.0]),
        dispatcher,
    )
    .unwrap();

    for _ in 0..5 {
        sampler.sample_once().await.unwrap();
    }
    sampler.wait_for_notifications().await;

    let events = recorders.notifier.events.lock().unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].usage, 85);
    assert_eq!(events[1].usage, 95);
    assert!(events.iter().all(|event| event.threshold == 80));
    assert_eq!(events[0].trap_oid.to_string(), NOTIFICATION_OID);

    assert_eq!(recorders.mailer.messages.lock().unwrap().len(), 2);
    assert_eq!(store.lookup_exact(&usage_oid()).await, Some(Value::Integer(95)));
}

#[tokio::test]
async fn test_alert_goes_to_current_manager_email() {
    let store = memory_store();
    let (dispatcher, recorders) = recording_dispatcher(store.registry());
    let mut sampler =
        Sampler::new(store.clone(), ScriptedCpu::boxed(&[99.0]), dispatcher).unwrap();

    store
        .write_batch(
            &[(email_oid(), Value::from("noc@example.org"))],
            &Identity::resolved("private"),
        )
        .await
        .unwrap();

    sampler.sample_once().await.unwrap();
    sampler.wait_for_notifications().await;

    let messages = recorders.mailer.messages.lock().unwrap();
    assert_eq!(messages[0].to, "noc@example.org");
    assert_eq!(recorders.notifier.events.lock().unwrap()[0].address, "noc@example.org");
}

#[tokio::test]
async fn test_lowering_threshold_through_a_write_triggers_alert() {
    let store = memory_store();
    let (dispatcher, recorders) = recording_dispatcher(store.registry());
    let handle = SamplerHandle::spawn(
        Sampler::new(store.clone(), ScriptedCpu::boxed(&[50.0, 50.0]), dispatcher).unwrap(),
        Duration::from_secs(3600),
    );

    let first = handle.sample_now().await.unwrap();
    assert_eq!(first.evaluation, ThresholdEvaluation::Normal);

    store
        .write_batch(
            &[(threshold_oid(), Value::Integer(30))],
            &Identity::resolved("private"),
        )
        .await
        .unwrap();

    let second = handle.sample_now().await.unwrap();
    assert_eq!(second.evaluation, ThresholdEvaluation::StartsToExceed);

    handle.shutdown().await.unwrap();
    assert_eq!(recorders.notifier.events.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_webhook_receives_trap_event() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/traps"))
        .and(body_partial_json(serde_json::json!({
            "usage": 88,
            "threshold": 80,
            "address": "operator@localhost",
            "trap_oid": NOTIFICATION_OID
        })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;

    let store = memory_store();
    let dispatcher = mib_agent::notify::NotificationDispatcher::new(
        NOTIFICATION_OID.parse().unwrap(),
        store.registry(),
    )
    .unwrap()
    .with_notifier(
        std::sync::Arc::new(
            mib_agent::notify::WebhookNotifier::new(
                format!("{}/traps", mock_server.uri()),
                Duration::from_secs(2),
            )
            .unwrap(),
        ),
        Duration::from_secs(2),
    );

    let mut sampler = Sampler::new(store, ScriptedCpu::boxed(&[88.0]), dispatcher).unwrap();
    sampler.sample_once().await.unwrap();
    sampler.wait_for_notifications().await;
}

#[tokio::test]
async fn test_failing_transports_do_not_stop_sampling() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let store = memory_store();
    let dispatcher = mib_agent::notify::NotificationDispatcher::new(
        NOTIFICATION_OID.parse().unwrap(),
        store.registry(),
    )
    .unwrap()
    .with_notifier(
        std::sync::Arc::new(
            mib_agent::notify::WebhookNotifier::new(mock_server.uri(), Duration::from_secs(2))
                .unwrap(),
        ),
        Duration::from_secs(2),
    )
    .with_mailer(
        std::sync::Arc::new(
            mib_agent::notify::HttpMailRelay::new(mock_server.uri(), None, Duration::from_secs(2))
                .unwrap(),
        ),
        "agent@example.org",
        Duration::from_secs(2),
    );

    let mut sampler =
        Sampler::new(store.clone(), ScriptedCpu::boxed(&[90.0, 91.0]), dispatcher).unwrap();

    assert_eq!(
        sampler.sample_once().await.unwrap().evaluation,
        ThresholdEvaluation::StartsToExceed
    );
    assert_eq!(
        sampler.sample_once().await.unwrap().evaluation,
        ThresholdEvaluation::Exceeding
    );
    assert_eq!(store.lookup_exact(&usage_oid()).await, Some(Value::Integer(91)));

    sampler.wait_for_notifications().await;
    assert_eq!(sampler.pending_notifications(), 0);
}

#[tokio::test]
async fn test_stalled_webhook_does_not_delay_samples() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(204).set_delay(Duration::from_secs(30)))
        .mount(&mock_server)
        .await;

    let store = memory_store();
    let dispatcher = mib_agent::notify::NotificationDispatcher::new(
        NOTIFICATION_OID.parse().unwrap(),
        store.registry(),
    )
    .unwrap()
    .with_notifier(
        std::sync::Arc::new(
            mib_agent::notify::WebhookNotifier::new(mock_server.uri(), Duration::from_secs(20))
                .unwrap(),
        ),
        Duration::from_secs(20),
    );

    let handle = SamplerHandle::spawn(
        Sampler::new(
            store.clone(),
            ScriptedCpu::boxed(&[90.0, 40.0, 95.0, 41.0]),
            dispatcher,
        )
        .unwrap(),
        Duration::from_secs(3600),
    );

    let reports = tokio::time::timeout(Duration::from_secs(2), async {
        let mut reports = vec![];
        for _ in 0..4 {
            reports.push(handle.sample_now().await.unwrap().evaluation);
        }
        reports
    })
    .await
    .expect("samples were held up by the webhook");

    assert_eq!(
        reports,
        vec![
            ThresholdEvaluation::StartsToExceed,
            ThresholdEvaluation::BackToNormal,
            ThresholdEvaluation::StartsToExceed,
            ThresholdEvaluation::BackToNormal,
        ]
    );
    assert_eq!(store.lookup_exact(&usage_oid()).await, Some(Value::Integer(41)));
}
