use std::sync::Arc;

use crate::client_mock::MockNotificationSink;
use crate::models::notification::RenderedMessage;
use crate::models::user::Role;
use crate::services::notifier::Notifier;
use crate::tests::common::fixtures::user;
use crate::tests::common::test_utils::{settle, wait_for_sends, FailingSink, RecordingSink};

fn rendered() -> RenderedMessage {
    RenderedMessage {
        subject: "Meeting Scheduled: Blue Room".to_string(),
        text: "plain".to_string(),
        html: "<p>html</p>".to_string(),
    }
}

#[tokio::test]
async fn test_send_batch_delivers_to_all() {
    let sink = Arc::new(RecordingSink::new());
    let notifier = Notifier::new(sink.clone());

    let recipients = vec![user("carol", Role::Member), user("dave", Role::Member)];
    let delivered = notifier.send_batch(&recipients, &rendered()).await;

    assert_eq!(delivered, 2);
    assert_eq!(notifier.delivery_failures(), 0);

    let sent = sink.sent();
    assert_eq!(sent[0].to, "carol@example.com");
    assert_eq!(sent[1].to, "dave@example.com");
}

#[tokio::test]
async fn test_failure_does_not_block_siblings() {
    let sink = Arc::new(FailingSink::new(vec!["dave@example.com".to_string()]));
    let notifier = Notifier::new(sink.clone());

    let recipients = vec![
        user("carol", Role::Member),
        user("dave", Role::Member),
        user("erin", Role::Member),
    ];
    let delivered = notifier.send_batch(&recipients, &rendered()).await;

    // The failing recipient is logged and counted, the rest go through
    assert_eq!(delivered, 2);
    assert_eq!(notifier.delivery_failures(), 1);
    assert_eq!(sink.count(), 2);
    assert!(sink.sent().iter().all(|m| m.to != "dave@example.com"));
}

#[tokio::test]
async fn test_dispatch_runs_in_background() {
    let sink = Arc::new(RecordingSink::new());
    let notifier = Arc::new(Notifier::new(sink.clone()));

    notifier.dispatch(
        vec![user("carol", Role::Member), user("dave", Role::Member)],
        rendered(),
    );

    wait_for_sends(&sink, 2).await;
}

#[tokio::test]
async fn test_send_batch_passes_rendered_fields() {
    let mut mock = MockNotificationSink::new();
    mock.expect_send()
        .withf(|to, subject, text, html| {
            to == "carol@example.com"
                && subject.starts_with("Meeting Scheduled")
                && text == "plain"
                && html.contains("html")
        })
        .times(1)
        .returning(|_, _, _, _| Ok(()));

    let notifier = Notifier::new(Arc::new(mock));
    let delivered = notifier
        .send_batch(&[user("carol", Role::Member)], &rendered())
        .await;
    assert_eq!(delivered, 1);
}

#[tokio::test]
async fn test_dispatch_skips_empty_batches() {
    let sink = Arc::new(RecordingSink::new());
    let notifier = Arc::new(Notifier::new(sink.clone()));

    notifier.dispatch(Vec::new(), rendered());
    settle().await;

    assert_eq!(sink.count(), 0);
}
