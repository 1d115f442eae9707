//! Reconnect loop behaviour with a scripted connector and a paused clock.

mod common;

use std::{sync::Arc, time::Duration};

use common::{EventLog, FakeConnector, StubExecutor, transport_pair, transport_pair_with};
use dogent_core::{SessionConfig, SessionState};
use dogent_session::{SessionError, SessionManager};
use serde_json::json;
use tokio::time::timeout;
use tokio_test::assert_ok;
use tokio_util::sync::CancellationToken;

const BACKOFF: Duration = Duration::from_secs(5);
const WAIT: Duration = Duration::from_secs(120);

fn config() -> SessionConfig {
    SessionConfig::new("ws://127.0.0.1:8765/agent", "tok", "srv-1")
}

type Manager = SessionManager<FakeConnector, StubExecutor>;

fn spawn_manager(
    manager: Manager,
) -> (
    Arc<Manager>,
    CancellationToken,
    tokio::task::JoinHandle<Result<(), SessionError>>,
) {
    let manager = Arc::new(manager);
    let shutdown = CancellationToken::new();
    let handle = tokio::spawn({
        let manager = Arc::clone(&manager);
        let shutdown = shutdown.clone();
        async move { manager.run(shutdown).await }
    });
    (manager, shutdown, handle)
}

#[tokio::test(start_paused = true)]
async fn test_dial_failures_back_off_then_authenticate_once() {
    let connector = FakeConnector::default();
    let (transport, mut server) = transport_pair();
    connector.fail();
    connector.fail();
    connector.fail();
    connector.succeed(transport);

    let (manager, shutdown, handle) =
        spawn_manager(SessionManager::new(config(), connector.clone(), StubExecutor::ok("")));

    let auth = timeout(WAIT, server.outbound.recv()).await.unwrap().unwrap();
    let auth: serde_json::Value = serde_json::from_str(&auth).unwrap();
    assert_eq!(auth, json!({ "token": "tok", "server_id": "srv-1" }));

    let mut states = manager.subscribe();
    timeout(WAIT, states.wait_for(|s| *s == SessionState::Serving))
        .await
        .unwrap()
        .unwrap();

    let attempts = connector.attempts();
    assert_eq!(attempts.len(), 4);
    for pair in attempts.windows(2) {
        assert!(pair[1] - pair[0] >= BACKOFF, "dials only {:?} apart", pair[1] - pair[0]);
    }

    shutdown.cancel();
    assert_ok!(handle.await.unwrap());
    assert!(server.drain().is_empty());
    assert_eq!(server.close_count(), 1);
    assert_eq!(manager.state(), SessionState::Disconnected);
}

#[tokio::test(start_paused = true)]
async fn test_invalid_endpoint_is_fatal_without_dialing() {
    let connector = FakeConnector::default();
    let manager = SessionManager::new(
        SessionConfig::new("http//missing-colon", "tok", "srv-1"),
        connector.clone(),
        StubExecutor::ok(""),
    );

    let result = manager.run(CancellationToken::new()).await;
    assert!(matches!(result, Err(SessionError::Config(_))));
    assert!(connector.attempts().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_auth_write_failure_redials_without_delay() {
    let connector = FakeConnector::default();
    let (broken, broken_server) = transport_pair_with(EventLog::default(), true);
    let (healthy, mut healthy_server) = transport_pair();
    connector.succeed(broken);
    connector.succeed(healthy);

    let (_manager, shutdown, handle) =
        spawn_manager(SessionManager::new(config(), connector.clone(), StubExecutor::ok("")));

    timeout(WAIT, healthy_server.outbound.recv())
        .await
        .unwrap()
        .unwrap();

    let attempts = connector.attempts();
    assert_eq!(attempts.len(), 2);
    assert!(attempts[1] - attempts[0] < BACKOFF);
    assert_eq!(broken_server.close_count(), 1);

    shutdown.cancel();
    assert_ok!(handle.await.unwrap());
}

#[tokio::test(start_paused = true)]
async fn test_lost_connection_reconnects_and_reauthenticates() {
    let connector = FakeConnector::default();
    let (first, mut first_server) = transport_pair();
    let (second, mut second_server) = transport_pair();
    connector.succeed(first);
    connector.succeed(second);

    let (_manager, shutdown, handle) = spawn_manager(SessionManager::new(
        config(),
        connector.clone(),
        StubExecutor::ok("hi\n"),
    ));

    timeout(WAIT, first_server.outbound.recv()).await.unwrap().unwrap();
    first_server.push(r#"{"type":"command","content":"echo hi"}"#);
    let reply = timeout(WAIT, first_server.outbound.recv()).await.unwrap().unwrap();
    assert_eq!(reply, r#"{"type":"command_result","content":"hi\n"}"#);
    first_server.hang_up();

    let auth = timeout(WAIT, second_server.outbound.recv()).await.unwrap().unwrap();
    assert!(auth.contains("\"token\":\"tok\""));
    assert_eq!(first_server.close_count(), 1);

    let attempts = connector.attempts();
    assert_eq!(attempts.len(), 2);
    assert!(attempts[1] - attempts[0] < BACKOFF);

    second_server.push(r#"{"type":"command","content":"echo hi"}"#);
    let reply = timeout(WAIT, second_server.outbound.recv()).await.unwrap().unwrap();
    assert!(reply.contains("command_result"));

    shutdown.cancel();
    assert_ok!(handle.await.unwrap());
    assert_eq!(second_server.close_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_during_backoff_stops_run() {
    let connector = FakeConnector::default();
    connector.fail();

    let (manager, shutdown, handle) =
        spawn_manager(SessionManager::new(config(), connector.clone(), StubExecutor::ok("")));

    let mut states = manager.subscribe();
    timeout(WAIT, states.wait_for(|s| *s == SessionState::Disconnected && !connector.attempts().is_empty()))
        .await
        .unwrap()
        .unwrap();

    shutdown.cancel();
    assert_ok!(timeout(WAIT, handle).await.unwrap().unwrap());
    assert_eq!(connector.attempts().len(), 1);
}

#[test]
fn test_new_manager_starts_disconnected() {
    let manager = SessionManager::new(config(), FakeConnector::default(), StubExecutor::ok(""));
    assert_eq!(manager.state(), SessionState::Disconnected);
    assert_eq!(manager.config().server_id, "srv-1");
}
