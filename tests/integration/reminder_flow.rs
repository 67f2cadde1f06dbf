//! End-to-end reminder flow: create a task over HTTP, let the background
//! scheduler pick it up, and verify exactly one email goes out and the task
//! is marked notified.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use remindd_core::clock::SystemClock;
use remindd_core::notify::{MailTransport, MemoryDirectory, Notifier, NotifyError, ReminderEmail};
use remindd_core::scheduler::ReminderScheduler;
use remindd_core::service::TaskService;
use remindd_core::store::{MemoryStore, TaskStore};
use remindd_server::api::{self, AppState};
use serde_json::json;

/// Captures outbound mail instead of delivering it.
#[derive(Default)]
struct RecordingTransport {
    sent: Mutex<Vec<ReminderEmail>>,
}

impl RecordingTransport {
    fn sent(&self) -> Vec<ReminderEmail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl MailTransport for RecordingTransport {
    async fn send(&self, email: &ReminderEmail) -> Result<(), NotifyError> {
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }
}

struct Harness {
    addr: std::net::SocketAddr,
    transport: Arc<RecordingTransport>,
    _scheduler: remindd_core::scheduler::SchedulerHandle,
}

/// Starts the full server with a fast-ticking scheduler and a recording
/// transport.
async fn start_harness(scan_period: Duration) -> Harness {
    let clock = Arc::new(SystemClock);
    let store: Arc<dyn TaskStore> = Arc::new(MemoryStore::new(clock.clone()));
    let directory = Arc::new(MemoryDirectory::new());
    let transport = Arc::new(RecordingTransport::default());

    let notifier = Arc::new(Notifier::with_transport(
        directory.clone(),
        transport.clone(),
    ));
    let scheduler = Arc::new(
        ReminderScheduler::new(Arc::clone(&store), notifier, clock.clone())
            .with_timing(scan_period, chrono::Duration::minutes(5)),
    );
    let scheduler_handle = scheduler.start();

    let state = Arc::new(AppState {
        service: TaskService::new(store, clock),
        directory,
    });
    let (addr, _server) = api::start_server("127.0.0.1:0", state)
        .await
        .expect("failed to start test server");

    Harness {
        addr,
        transport,
        _scheduler: scheduler_handle,
    }
}

async fn create_task(
    client: &reqwest::Client,
    addr: std::net::SocketAddr,
    body: &serde_json::Value,
) -> serde_json::Value {
    let response = client
        .post(format!("http://{addr}/tasks"))
        .header("x-user-id", "alice")
        .header("x-user-name", "Alice")
        .header("x-user-email", "alice@example.com")
        .json(body)
        .send()
        .await
        .expect("send create");
    assert_eq!(response.status(), reqwest::StatusCode::CREATED);
    response.json().await.expect("create body")
}

#[tokio::test]
async fn reminder_inside_window_is_emailed_exactly_once() {
    let harness = start_harness(Duration::from_millis(50)).await;
    let client = reqwest::Client::new();
    let now = Utc::now();

    let created = create_task(
        &client,
        harness.addr,
        &json!({
            "title": "Submit expense report",
            "dueDate": now + chrono::Duration::hours(1),
            "reminderAt": now + chrono::Duration::minutes(2),
            "priority": "high",
        }),
    )
    .await;
    let id = created["data"]["id"].as_str().unwrap().to_string();

    // Give the scheduler a few scan periods to fire.
    tokio::time::sleep(Duration::from_millis(300)).await;

    let sent = harness.transport.sent();
    assert_eq!(sent.len(), 1, "expected exactly one reminder email");
    assert_eq!(sent[0].to, "alice@example.com");
    assert_eq!(sent[0].subject, "Reminder: Submit expense report");
    assert!(sent[0].html.contains("Submit expense report"));

    // The task is now flagged so later scans skip it.
    let response = client
        .get(format!("http://{}/tasks/{id}", harness.addr))
        .header("x-user-id", "alice")
        .send()
        .await
        .expect("get task");
    let body: serde_json::Value = response.json().await.expect("task body");
    assert_eq!(body["data"]["isNotified"], true);

    // More scan periods pass; still only one email.
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(harness.transport.sent().len(), 1);
}

#[tokio::test]
async fn reminder_outside_window_is_not_emailed() {
    let harness = start_harness(Duration::from_millis(50)).await;
    let client = reqwest::Client::new();
    let now = Utc::now();

    create_task(
        &client,
        harness.addr,
        &json!({
            "title": "Far-off task",
            "dueDate": now + chrono::Duration::days(2),
            "reminderAt": now + chrono::Duration::days(1),
        }),
    )
    .await;

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(harness.transport.sent().is_empty());
}

#[tokio::test]
async fn completed_task_is_not_emailed() {
    let harness = start_harness(Duration::from_millis(50)).await;
    let client = reqwest::Client::new();
    let now = Utc::now();

    let created = create_task(
        &client,
        harness.addr,
        &json!({
            "title": "Already handled",
            "dueDate": now + chrono::Duration::hours(1),
            "reminderAt": now + chrono::Duration::minutes(3),
        }),
    )
    .await;
    let id = created["data"]["id"].as_str().unwrap().to_string();

    let response = client
        .post(format!("http://{}/tasks/{id}/complete", harness.addr))
        .header("x-user-id", "alice")
        .send()
        .await
        .expect("complete");
    assert_eq!(response.status(), reqwest::StatusCode::OK);

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(harness.transport.sent().is_empty());
}
