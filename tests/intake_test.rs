mod common;

use common::Harness;
use relaybox::handlers::{Command, command_reply, enqueue_links};
use relaybox::queue::{Job, StatusScope, SubmitterId};
use std::time::Duration;

const ME: SubmitterId = SubmitterId(42);
const OTHER: SubmitterId = SubmitterId(7);

async fn wait_for_delivered(h: &Harness, count: u64) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while h.metrics.snapshot().jobs_delivered < count {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("jobs were not delivered in time");
}

#[tokio::test]
async fn test_links_are_queued_and_processed() {
    let h = Harness::new();

    let reply = enqueue_links(
        "grab these: https://a.example/1.mp4 https://b.example/2.zip, thanks",
        ME,
        &h.worker,
    );

    assert_eq!(reply, "✅ Added 2 link(s) to queue. Processing…");
    wait_for_delivered(&h, 2).await;
    assert_eq!(
        h.agent.delivered(),
        ["https://a.example/1.mp4", "https://b.example/2.zip"]
    );
}

#[tokio::test]
async fn test_message_without_links_is_rejected() {
    let h = Harness::new();

    let reply = enqueue_links("hello there ftp://nope.example/x", ME, &h.worker);

    assert_eq!(reply, "❌ No valid URLs found. Send again.");
    assert_eq!(h.worker.status(StatusScope::All).unwrap().pending, 0);
    assert_eq!(h.metrics.snapshot().jobs_enqueued, 0);
}

#[tokio::test]
async fn test_status_reply() {
    let h = Harness::new();
    h.worker.enqueue(Job::new(ME, "https://a.example/1")).unwrap();
    h.worker.enqueue(Job::new(OTHER, "https://a.example/2")).unwrap();
    h.worker.enqueue(Job::new(ME, "https://a.example/3")).unwrap();

    let reply = command_reply(&Command::Status, ME, &h.worker);

    assert_eq!(
        reply,
        "📊 Queue Status\n• Status: 🔴 Idle\n• Pending tasks: 3\n• Yours: 2"
    );
    assert_eq!(command_reply(&Command::QueueStatus, ME, &h.worker), reply);
}

#[tokio::test]
async fn test_clear_reply_counts_only_callers_jobs() {
    let h = Harness::new();
    h.worker.enqueue(Job::new(ME, "https://a.example/1")).unwrap();
    h.worker.enqueue(Job::new(OTHER, "https://a.example/2")).unwrap();
    h.worker.enqueue(Job::new(ME, "https://a.example/3")).unwrap();

    h.worker.request_cancel(ME).unwrap();

    let reply = command_reply(&Command::Clear, ME, &h.worker);

    assert_eq!(reply, "🧹 Queue cleared.\n2 pending task(s) removed.");
    assert_eq!(h.worker.status(StatusScope::All).unwrap().pending, 1);
    assert_eq!(
        h.worker.status(StatusScope::Submitter(OTHER)).unwrap().pending,
        1
    );
    assert!(!h.state.consume_if_set(ME).unwrap());
}

#[tokio::test]
async fn test_cancel_reply_sets_flag() {
    let h = Harness::new();

    let reply = command_reply(&Command::Cancel, ME, &h.worker);

    assert!(reply.starts_with("🛑"));
    assert!(h.state.consume_if_set(ME).unwrap());
    assert!(!h.state.consume_if_set(OTHER).unwrap());
}

#[tokio::test]
async fn test_static_replies() {
    let h = Harness::new();

    assert!(command_reply(&Command::Start, ME, &h.worker).contains("/help"));
    assert!(command_reply(&Command::Queue, ME, &h.worker).contains("separated by space"));

    let help = command_reply(&Command::Help, ME, &h.worker);
    for cmd in ["/start", "/queue", "/queue_status", "/cancel", "/clear"] {
        assert!(help.contains(cmd), "help is missing {cmd}");
    }
}
