//! End-to-end tests over the real router, in-memory stores, and a
//! recording chat transport.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use flock_api::auth::CredentialGate;
use flock_api::infrastructure::{
    EventStore, MemoryEventStore, MemoryPrincipalStore, PrincipalStore,
};
use flock_api::notifications::{ChatTransport, NotificationConfigStore};
use flock_api::pipeline::{NotificationDispatcher, PartitionedWriter, SubmissionPipeline};
use flock_api::{create_router, AppState};
use flock_core::{FlockError, Result};

struct RecordingTransport {
    messages: Mutex<Vec<String>>,
    fail: Mutex<bool>,
}

impl RecordingTransport {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            messages: Mutex::new(Vec::new()),
            fail: Mutex::new(false),
        })
    }

    async fn messages(&self) -> Vec<String> {
        self.messages.lock().await.clone()
    }
}

#[async_trait]
impl ChatTransport for RecordingTransport {
    async fn send(&self, message: &str) -> Result<()> {
        if *self.fail.lock().await {
            return Err(FlockError::Unavailable("channel down".to_string()));
        }
        self.messages.lock().await.push(message.to_string());
        Ok(())
    }
}

struct TestApp {
    base_url: String,
    client: reqwest::Client,
    events: Arc<MemoryEventStore>,
    config: Arc<NotificationConfigStore>,
    transport: Arc<RecordingTransport>,
}

impl TestApp {
    async fn spawn() -> Self {
        let principals: Arc<dyn PrincipalStore> = Arc::new(MemoryPrincipalStore::new());
        let events = Arc::new(MemoryEventStore::new());
        let config = Arc::new(NotificationConfigStore::default());
        let transport = RecordingTransport::new();

        let dispatcher =
            NotificationDispatcher::new(transport.clone(), Duration::from_secs(1));
        let pipeline = Arc::new(SubmissionPipeline::new(
            PartitionedWriter::new(events.clone()),
            dispatcher,
            config.clone(),
        ));

        let state = AppState {
            gate: Arc::new(CredentialGate::new(principals.clone())),
            principals,
            pipeline,
        };

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, create_router(state)).await.unwrap();
        });

        Self {
            base_url: format!("http://{addr}"),
            client: reqwest::Client::new(),
            events,
            config,
            transport,
        }
    }

    async fn register(&self, username: &str, name: &str) -> (reqwest::StatusCode, Value) {
        let response = self
            .client
            .post(format!("{}/register", self.base_url))
            .json(&json!({"username": username, "name": name}))
            .send()
            .await
            .unwrap();
        let status = response.status();
        (status, response.json().await.unwrap())
    }

    /// Register and return the issued auth token
    async fn register_ok(&self, username: &str, name: &str) -> String {
        let (status, body) = self.register(username, name).await;
        assert_eq!(status, 200);
        assert_eq!(body["error"], false);
        body["auth_token"].as_str().unwrap().to_string()
    }

    async fn submit(
        &self,
        path: &str,
        username: &str,
        token: &str,
        body: String,
    ) -> (reqwest::StatusCode, Value) {
        let response = self
            .client
            .post(format!("{}{path}", self.base_url))
            .basic_auth(username, Some(token))
            .header("Content-Type", "application/json")
            .body(body)
            .send()
            .await
            .unwrap();
        let status = response.status();
        let body = response.json().await.unwrap_or(Value::Null);
        (status, body)
    }

    async fn todays_records(&self) -> Vec<Value> {
        let partition = format!("flock-{}", Utc::now().format("%Y-%m-%d"));
        self.events
            .records(&partition)
            .await
            .into_iter()
            .map(|r| r.document)
            .collect()
    }
}

#[tokio::test]
async fn register_then_ping() {
    let app = TestApp::spawn().await;
    let token = app.register_ok("UUID1", "Nick Fury").await;
    assert_eq!(token.len(), 32);

    let response = app
        .client
        .get(format!("{}/ping", app.base_url))
        .basic_auth("UUID1", Some(&token))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({"error": false}));

    // registration itself is a notification
    let messages = app.transport.messages().await;
    assert_eq!(messages.len(), 1);
    assert!(messages[0].contains("A user has registered with the server"));
}

#[tokio::test]
async fn unauthenticated_requests_get_empty_401() {
    let app = TestApp::spawn().await;
    app.register_ok("UUID1", "").await;

    let ping = app
        .client
        .get(format!("{}/ping", app.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(ping.status(), 401);
    assert!(ping.bytes().await.unwrap().is_empty());

    let bad = app
        .client
        .post(format!("{}/submit", app.base_url))
        .basic_auth("UUID1", Some("wrong_token"))
        .json(&json!([]))
        .send()
        .await
        .unwrap();
    assert_eq!(bad.status(), 401);
}

#[tokio::test]
async fn register_rejects_bad_usernames() {
    let app = TestApp::spawn().await;

    let (status, body) = app.register("usernames can't have spaces", "").await;
    assert_eq!(status, 400);
    assert_eq!(body["error"], true);
    assert!(body["error_msg"].as_str().unwrap().contains("letters"));

    let (status, _) = app.register("but_they_can-have-dashes", "").await;
    assert_eq!(status, 200);
}

#[tokio::test]
async fn duplicate_registration_keeps_first_token() {
    let app = TestApp::spawn().await;
    let token = app.register_ok("UUID1", "First").await;

    let (status, body) = app.register("UUID1", "Second").await;
    assert_eq!(status, 400);
    assert_eq!(
        body["error_msg"],
        "Your computer (UUID1) is already registered with this server"
    );

    // the duplicate attempt is itself notified
    let messages = app.transport.messages().await;
    assert!(messages
        .iter()
        .any(|m| m.contains("tried to register with an existing username")));

    // the original token still authenticates
    let ping = app
        .client
        .get(format!("{}/ping", app.base_url))
        .basic_auth("UUID1", Some(&token))
        .send()
        .await
        .unwrap();
    assert_eq!(ping.status(), 200);
}

#[tokio::test]
async fn submit_writes_classifies_and_dispatches() {
    let app = TestApp::spawn().await;
    let token = app.register_ok("UUID1", "Nick Fury").await;

    let batch = json!([
        {"hostIdentifier": "UUID1", "name": "crontab", "action": "added", "unixTime": 1710266400},
        {"hostIdentifier": "UUID1", "name": "crontab", "action": "removed"},
        {"hostIdentifier": "UUID1", "name": "launchd", "action": "added",
         "calendarTime": "Tue Mar 12 18:00:00 2024 UTC", "columns": {"label": "com.evil"}},
        {"hostIdentifier": "UUID1"},
    ]);
    let (status, body) = app
        .submit("/submit", "UUID1", &token, batch.to_string())
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["processed_count"], 4);
    assert_eq!(body["error"], false);

    // all four records persisted to today's partition, stamped
    let records = app.todays_records().await;
    assert_eq!(records.len(), 4);
    assert!(records.iter().all(|r| r["username"] == "UUID1"));
    assert!(records.iter().all(|r| r["user_name"] == "Nick Fury"));
    assert_eq!(records[0]["@timestamp"], "2024-03-12T18:00:00.000Z");

    // one burst summary for crontab, one singleton for launchd, in
    // first-seen order after the registration notification
    let messages = app.transport.messages().await;
    assert_eq!(messages.len(), 3);
    assert!(messages[1].contains("Cron job has changed"));
    assert!(messages[1].contains("**1** added"));
    assert!(messages[1].contains("**1** removed"));
    assert!(messages[2].contains("Launch daemon has changed"));
    assert!(messages[2].contains("com.evil"));
}

#[tokio::test]
async fn cross_tenant_batch_is_rejected_before_any_write() {
    let app = TestApp::spawn().await;
    let token = app.register_ok("UUID1", "").await;

    let batch = json!([
        {"hostIdentifier": "UUID1", "name": "crontab", "action": "added"},
        {"hostIdentifier": "someone_else"},
    ]);
    let (status, body) = app
        .submit("/submit", "UUID1", &token, batch.to_string())
        .await;
    assert_eq!(status, 400);
    assert_eq!(
        body["error_msg"],
        "Item 1 does not contain the correct hostIdentifier"
    );

    // whole batch rejected: nothing written, nothing dispatched
    assert!(app.todays_records().await.is_empty());
    assert_eq!(app.transport.messages().await.len(), 1); // registration only
}

#[tokio::test]
async fn submit_rejects_non_array_bodies() {
    let app = TestApp::spawn().await;
    let token = app.register_ok("UUID1", "").await;

    let (status, body) = app
        .submit("/submit", "UUID1", &token, json!({"not": "an array"}).to_string())
        .await;
    assert_eq!(status, 400);
    assert_eq!(body["error_msg"], "Data is not an array");
    assert!(body.get("processed_count").is_none());

    let (status, body) = app
        .submit("/submit", "UUID1", &token, "not json".to_string())
        .await;
    assert_eq!(status, 400);
    assert_eq!(body["error_msg"], "Invalid JSON object");
}

#[tokio::test]
async fn flock_logs_validate_and_notify_per_record() {
    let app = TestApp::spawn().await;
    let token = app.register_ok("UUID1", "Nick Fury").await;

    // missing twig_id is rejected with the offending index
    let bad = json!([{"type": "enable_twig", "timestamp": 1}]);
    let (status, body) = app
        .submit("/submit_flock_logs", "UUID1", &token, bad.to_string())
        .await;
    assert_eq!(status, 400);
    assert_eq!(
        body["error_msg"],
        "Item 0 is about a twig, but does not contain a twig_id field"
    );

    let logs = json!([
        {"type": "server_enabled", "timestamp": 1},
        {"type": "twigs_disabled", "timestamp": 2, "twig_id": "t1", "twig_ids": ["t1"]},
        {"type": "heartbeat", "timestamp": 3},
    ]);
    let (status, body) = app
        .submit("/submit_flock_logs", "UUID1", &token, logs.to_string())
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["processed_count"], 3);

    let messages = app.transport.messages().await;
    assert_eq!(messages.len(), 3); // registration + two state changes
    assert!(messages[1].contains("A user has enabled the server"));
    assert!(messages[2].contains("A user has disabled twigs"));
    assert!(messages[2].contains("t1"));

    // log submissions are not persisted to the telemetry partitions
    assert!(app.todays_records().await.is_empty());
}

#[tokio::test]
async fn disabled_kind_is_suppressed_end_to_end() {
    let app = TestApp::spawn().await;
    let token = app.register_ok("UUID1", "").await;
    app.config.disable("crontab").unwrap();

    let batch = json!([{"hostIdentifier": "UUID1", "name": "crontab", "action": "added"}]);
    let (status, body) = app
        .submit("/submit", "UUID1", &token, batch.to_string())
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["processed_count"], 1);

    // written but never dispatched
    assert_eq!(app.todays_records().await.len(), 1);
    assert_eq!(app.transport.messages().await.len(), 1); // registration only
}

#[tokio::test]
async fn transport_failure_never_fails_the_submission() {
    let app = TestApp::spawn().await;
    let token = app.register_ok("UUID1", "").await;
    *app.transport.fail.lock().await = true;

    let batch = json!([{"hostIdentifier": "UUID1", "name": "crontab", "action": "added"}]);
    let (status, body) = app
        .submit("/submit", "UUID1", &token, batch.to_string())
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["processed_count"], 1);
    assert_eq!(app.todays_records().await.len(), 1);
}

#[tokio::test]
async fn identical_resubmission_duplicates_records() {
    let app = TestApp::spawn().await;
    let token = app.register_ok("UUID1", "").await;

    let batch = json!([{"hostIdentifier": "UUID1", "name": "launchd", "action": "added"}]);
    for _ in 0..2 {
        let (status, body) = app
            .submit("/submit", "UUID1", &token, batch.to_string())
            .await;
        assert_eq!(status, 200);
        assert_eq!(body["processed_count"], 1);
    }

    // no dedup: two copies stored, two notifications sent
    assert_eq!(app.todays_records().await.len(), 2);
    assert_eq!(app.transport.messages().await.len(), 3); // registration + 2
}

#[tokio::test]
async fn unknown_routes_are_404() {
    let app = TestApp::spawn().await;
    let response = app
        .client
        .get(format!("{}/", app.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
}
