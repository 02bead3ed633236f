//! Session store selection behavior

use mediq_eda::eda::EdaController;
use mediq_eda::session::SessionCreate;
use mediq_eda::testing::{sample_session, MockEdaApi};
use mediq_eda::Error;
use std::sync::Arc;

fn list_response(sessions: &[mediq_eda::session::ResearchSession]) -> serde_json::Value {
    serde_json::json!({
        "sessions": sessions,
        "total": sessions.len(),
        "limit": 50,
        "offset": 0
    })
}

#[tokio::test]
async fn test_fetch_selects_first_session_when_none_active() {
    let api = Arc::new(MockEdaApi::new());
    let a = sample_session("a", "Study A");
    let b = sample_session("b", "Study B");
    api.queue_ok("list_sessions", list_response(&[a.clone(), b.clone()]))
        .await;
    let controller = EdaController::new(api);

    controller.fetch_sessions().await.unwrap();

    assert_eq!(controller.sessions().await.len(), 2);
    assert_eq!(controller.active_session().await.map(|s| s.id), Some("a".to_string()));
}

#[tokio::test]
async fn test_fetch_is_idempotent_on_selection() {
    let api = Arc::new(MockEdaApi::new());
    let a = sample_session("a", "Study A");
    let b = sample_session("b", "Study B");
    api.queue_ok("list_sessions", list_response(&[a.clone(), b.clone()]))
        .await;
    api.queue_ok("list_sessions", list_response(&[a.clone(), b.clone()]))
        .await;
    let controller = EdaController::new(api);

    controller.fetch_sessions().await.unwrap();
    assert_eq!(controller.active_session().await.map(|s| s.id), Some("a".to_string()));

    // A second fetch must not reset the selection to the first element
    controller.fetch_sessions().await.unwrap();
    assert_eq!(controller.active_session().await.map(|s| s.id), Some("a".to_string()));
}

#[tokio::test]
async fn test_fetch_keeps_manual_selection() {
    let api = Arc::new(MockEdaApi::new());
    let a = sample_session("a", "Study A");
    let b = sample_session("b", "Study B");
    api.queue_ok("list_sessions", list_response(&[a.clone(), b.clone()]))
        .await;
    api.queue_ok("list_sessions", list_response(&[a.clone(), b.clone()]))
        .await;
    let controller = EdaController::new(api);

    controller.fetch_sessions().await.unwrap();
    controller.set_active_session(Some(b.clone())).await;

    controller.fetch_sessions().await.unwrap();
    assert_eq!(controller.active_session().await.map(|s| s.id), Some("b".to_string()));
}

#[tokio::test]
async fn test_fetch_with_empty_list_leaves_no_selection() {
    let api = Arc::new(MockEdaApi::new());
    api.queue_ok("list_sessions", list_response(&[])).await;
    let controller = EdaController::new(api);

    controller.fetch_sessions().await.unwrap();

    assert!(controller.sessions().await.is_empty());
    assert!(controller.active_session().await.is_none());
}

#[tokio::test]
async fn test_create_prepends_and_overrides_selection() {
    let api = Arc::new(MockEdaApi::new());
    let a = sample_session("a", "Study A");
    let b = sample_session("b", "Study B");
    let c = sample_session("c", "Study C");
    api.queue_ok("list_sessions", list_response(&[a.clone(), b.clone()]))
        .await;
    api.queue_ok("create_session", serde_json::to_value(&c).unwrap())
        .await;
    let controller = EdaController::new(api);

    controller.fetch_sessions().await.unwrap();
    assert_eq!(controller.active_session().await.map(|s| s.id), Some("a".to_string()));

    let draft = SessionCreate {
        title: "Study C".to_string(),
        purpose: "x".to_string(),
        requested_fields: vec!["age".to_string()],
        ..Default::default()
    };
    let created = controller.create_session(&draft).await.unwrap();
    assert_eq!(created.id, "c");

    // Newest first, and the new session is unconditionally active
    let ids: Vec<String> = controller.sessions().await.iter().map(|s| s.id.clone()).collect();
    assert_eq!(ids, vec!["c", "a", "b"]);
    assert_eq!(controller.active_session().await.map(|s| s.id), Some("c".to_string()));
}

#[tokio::test]
async fn test_failed_fetch_leaves_prior_state_untouched() {
    let api = Arc::new(MockEdaApi::new());
    let a = sample_session("a", "Study A");
    api.queue_ok("list_sessions", list_response(&[a.clone()])).await;
    api.queue_err("list_sessions", Error::Request("boom".to_string()))
        .await;
    let controller = EdaController::new(api);

    controller.fetch_sessions().await.unwrap();
    assert_eq!(controller.sessions().await.len(), 1);

    let result = controller.fetch_sessions().await;
    assert!(result.is_err());

    // List and selection unchanged; user-facing error surfaced
    assert_eq!(controller.sessions().await.len(), 1);
    assert_eq!(controller.active_session().await.map(|s| s.id), Some("a".to_string()));
    let snapshot = controller.snapshot().await;
    assert_eq!(snapshot.error.as_deref(), Some("Failed to load sessions"));
}

#[tokio::test]
async fn test_failed_create_leaves_prior_state_untouched() {
    let api = Arc::new(MockEdaApi::new());
    let a = sample_session("a", "Study A");
    api.queue_ok("list_sessions", list_response(&[a.clone()])).await;
    api.queue_err("create_session", Error::Request("boom".to_string()))
        .await;
    let controller = EdaController::new(api);

    controller.fetch_sessions().await.unwrap();

    let draft = SessionCreate {
        title: "Study C".to_string(),
        purpose: "x".to_string(),
        requested_fields: vec![],
        ..Default::default()
    };
    let result = controller.create_session(&draft).await;
    assert!(result.is_err());

    assert_eq!(controller.sessions().await.len(), 1);
    assert_eq!(controller.active_session().await.map(|s| s.id), Some("a".to_string()));
    let snapshot = controller.snapshot().await;
    assert_eq!(snapshot.error.as_deref(), Some("Failed to create session"));
}
