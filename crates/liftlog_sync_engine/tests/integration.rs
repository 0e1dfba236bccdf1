//! End-to-end tests: two engine instances syncing through a shared server.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use liftlog_sync_engine::{
    run_with_retry, sync_once, sync_write, LocalStore, MemoryStore, SessionProvider, SyncError,
    SyncResult, SyncTransport,
};
use liftlog_sync_protocol::{
    PullRequest, PullResponse, PushRequest, PushResponse, TableRegistry, WriteOperation,
};
use liftlog_sync_server::{ServerConfig, ServerStore, SessionTokens, SyncServer};
use parking_lot::Mutex;
use serde_json::{json, Map, Value};

const SECRET: &[u8] = b"integration-secret";

fn map(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => unreachable!(),
    }
}

fn registry() -> TableRegistry {
    TableRegistry::workout_log()
}

fn server() -> Arc<SyncServer> {
    Arc::new(SyncServer::new(
        ServerConfig::default(),
        Arc::new(ServerStore::workout_log()),
        registry(),
        SECRET,
    ))
}

/// A transport calling the server in-process, holding the session token the
/// way an HTTP client would hold a bearer token.
struct InMemoryTransport {
    server: Arc<SyncServer>,
    token: Arc<Mutex<Vec<u8>>>,
}

impl InMemoryTransport {
    fn for_user(server: Arc<SyncServer>, user_id: &str) -> Self {
        let token = server.issue_token(user_id);
        Self {
            server,
            token: Arc::new(Mutex::new(token)),
        }
    }
}

impl SyncTransport for InMemoryTransport {
    async fn push(&self, request: PushRequest) -> SyncResult<PushResponse> {
        let token = self.token.lock().clone();
        self.server
            .push(&token, request)
            .map_err(|err| SyncError::from_code(err.code(), err.to_string()))
    }

    async fn pull(&self, request: PullRequest) -> SyncResult<PullResponse> {
        let token = self.token.lock().clone();
        self.server
            .pull(&token, request)
            .map_err(|err| SyncError::from_code(err.code(), err.to_string()))
    }
}

/// Re-authenticates by asking the server for a fresh token.
struct RefreshingSessions {
    server: Arc<SyncServer>,
    user_id: String,
    token: Arc<Mutex<Vec<u8>>>,
    refreshes: AtomicUsize,
}

impl SessionProvider for RefreshingSessions {
    async fn refresh_session(&self) -> SyncResult<()> {
        self.refreshes.fetch_add(1, Ordering::SeqCst);
        *self.token.lock() = self.server.issue_token(&self.user_id);
        Ok(())
    }
}

struct Device {
    store: MemoryStore,
    transport: InMemoryTransport,
}

impl Device {
    fn new(server: Arc<SyncServer>, user_id: &str) -> Self {
        Self {
            store: MemoryStore::new(),
            transport: InMemoryTransport::for_user(server, user_id),
        }
    }

    fn write(&self, table: &str, operation: WriteOperation) {
        sync_write(&self.store, &registry(), table, operation).unwrap();
    }

    async fn sync(&self) {
        sync_once(&self.store, &registry(), &self.transport)
            .await
            .unwrap();
    }
}

#[tokio::test]
async fn two_devices_replicate_through_the_server() {
    let server = server();
    let phone = Device::new(server.clone(), "u1");
    let laptop = Device::new(server, "u1");

    phone.write(
        "workouts",
        WriteOperation::Insert {
            row: map(json!({"id": "w1", "userId": "u1", "title": "Push Day"})),
        },
    );
    phone.sync().await;
    laptop.sync().await;

    let replicated = laptop.store.get_record("workouts", "w1").unwrap().unwrap();
    assert_eq!(replicated.fields["title"], "Push Day");
    assert!(phone.store.queue_entries().unwrap().is_empty());
    assert!(laptop.store.last_cursor().unwrap() > 0);
}

#[tokio::test]
async fn concurrent_edits_converge_to_the_newer_write() {
    let server = server();
    let phone = Device::new(server.clone(), "u1");
    let laptop = Device::new(server, "u1");

    phone.write(
        "workouts",
        WriteOperation::Insert {
            row: map(json!({"id": "w1", "userId": "u1", "title": "Original"})),
        },
    );
    phone.sync().await;
    laptop.sync().await;

    // Both devices edit the same record; the laptop writes later.
    phone.write(
        "workouts",
        WriteOperation::Update {
            id: "w1".into(),
            fields: map(json!({"title": "Phone Edit"})),
        },
    );
    tokio::time::sleep(Duration::from_millis(5)).await;
    laptop.write(
        "workouts",
        WriteOperation::Update {
            id: "w1".into(),
            fields: map(json!({"title": "Laptop Edit"})),
        },
    );

    phone.sync().await;
    laptop.sync().await;
    phone.sync().await;

    let on_phone = phone.store.get_record("workouts", "w1").unwrap().unwrap();
    let on_laptop = laptop.store.get_record("workouts", "w1").unwrap().unwrap();
    assert_eq!(on_phone.fields["title"], "Laptop Edit");
    assert_eq!(on_phone.fields["title"], on_laptop.fields["title"]);
}

#[tokio::test]
async fn partial_updates_do_not_erase_other_fields() {
    let server = server();
    let phone = Device::new(server.clone(), "u1");
    let laptop = Device::new(server, "u1");

    phone.write(
        "workouts",
        WriteOperation::Insert {
            row: map(json!({"id": "w1", "userId": "u1", "title": "Deadlift Day", "notes": "heavy"})),
        },
    );
    phone.sync().await;

    tokio::time::sleep(Duration::from_millis(5)).await;
    phone.write(
        "workouts",
        WriteOperation::Update {
            id: "w1".into(),
            fields: map(json!({"title": "Renamed"})),
        },
    );
    phone.sync().await;
    laptop.sync().await;

    let replicated = laptop.store.get_record("workouts", "w1").unwrap().unwrap();
    assert_eq!(replicated.fields["title"], "Renamed");
    assert_eq!(replicated.fields["notes"], "heavy");
    assert!(replicated.created_at.is_some());
}

#[tokio::test]
async fn deletes_replicate_as_tombstones() {
    let server = server();
    let phone = Device::new(server.clone(), "u1");
    let laptop = Device::new(server, "u1");

    phone.write(
        "exercises",
        WriteOperation::Insert {
            row: map(json!({"id": "e1", "userId": "u1", "name": "Squat"})),
        },
    );
    phone.sync().await;
    laptop.sync().await;
    assert_eq!(laptop.store.live_records("exercises").len(), 1);

    tokio::time::sleep(Duration::from_millis(5)).await;
    phone.write("exercises", WriteOperation::Delete { id: "e1".into() });
    phone.sync().await;
    laptop.sync().await;

    let on_laptop = laptop.store.get_record("exercises", "e1").unwrap().unwrap();
    assert!(on_laptop.is_tombstoned());
    assert!(laptop.store.live_records("exercises").is_empty());
}

#[tokio::test]
async fn repeated_sync_is_idempotent() {
    let server = server();
    let device = Device::new(server, "u1");

    device.write(
        "workouts",
        WriteOperation::Insert {
            row: map(json!({"id": "w1", "userId": "u1", "title": "A"})),
        },
    );
    device.sync().await;
    let after_first = device.store.get_record("workouts", "w1").unwrap().unwrap();
    let cursor_after_first = device.store.last_cursor().unwrap();

    device.sync().await;
    device.sync().await;

    let after_third = device.store.get_record("workouts", "w1").unwrap().unwrap();
    assert_eq!(after_first, after_third);
    assert_eq!(device.store.last_cursor().unwrap(), cursor_after_first);
}

#[tokio::test]
async fn users_never_see_each_others_data() {
    let server = server();
    let alice = Device::new(server.clone(), "alice");
    let bob = Device::new(server, "bob");

    alice.write(
        "workouts",
        WriteOperation::Insert {
            row: map(json!({"id": "w1", "userId": "alice", "title": "Secret Plan"})),
        },
    );
    alice.sync().await;
    bob.sync().await;

    assert!(bob.store.get_record("workouts", "w1").unwrap().is_none());
    assert_eq!(bob.store.last_cursor().unwrap(), 0);
}

#[tokio::test]
async fn expired_session_refreshes_once_and_completes() {
    let server = server();
    let device = Device::new(server.clone(), "u1");

    // Replace the live token with one issued far in the past.
    let stale_issuer = SessionTokens::new(SECRET, ServerConfig::default().token_ttl);
    let stale = stale_issuer.issue("u1", Utc::now() - chrono::Duration::days(30));
    *device.transport.token.lock() = stale;

    let sessions = RefreshingSessions {
        server,
        user_id: "u1".into(),
        token: Arc::clone(&device.transport.token),
        refreshes: AtomicUsize::new(0),
    };

    device.write(
        "workouts",
        WriteOperation::Insert {
            row: map(json!({"id": "w1", "userId": "u1", "title": "A"})),
        },
    );
    run_with_retry(&device.store, &registry(), &device.transport, &sessions)
        .await
        .unwrap();

    assert_eq!(sessions.refreshes.load(Ordering::SeqCst), 1);
    assert!(device.store.queue_entries().unwrap().is_empty());
}

#[tokio::test]
async fn rejected_batch_stays_queued_for_retry() {
    let server = server();
    let device = Device::new(server, "u1");

    // A session referencing a workout the server has never seen.
    device.write(
        "sessions",
        WriteOperation::Insert {
            row: map(json!({"id": "s1", "userId": "u1", "workoutId": "nonexistent"})),
        },
    );

    let err = device
        .transport
        .push(PushRequest {
            changes: device
                .store
                .queue_entries()
                .unwrap()
                .iter()
                .map(|entry| entry.to_change())
                .collect(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::Rejected(_)));

    // The outbox still holds the entry; fixing the data is up to the app.
    assert_eq!(device.store.queue_entries().unwrap().len(), 1);
}

#[tokio::test]
async fn parent_and_child_in_one_batch_sync_together() {
    let server = server();
    let phone = Device::new(server.clone(), "u1");
    let laptop = Device::new(server, "u1");

    phone.write(
        "workouts",
        WriteOperation::Insert {
            row: map(json!({"id": "w1", "userId": "u1", "title": "Legs"})),
        },
    );
    phone.write(
        "sessions",
        WriteOperation::Insert {
            row: map(json!({"id": "s1", "userId": "u1", "workoutId": "w1"})),
        },
    );
    phone.sync().await;
    laptop.sync().await;

    assert!(laptop.store.get_record("workouts", "w1").unwrap().is_some());
    assert!(laptop.store.get_record("sessions", "s1").unwrap().is_some());
}
