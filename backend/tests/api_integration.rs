//! Backend API Integration Tests
//!
//! Tests for the Axum HTTP endpoints using Router::oneshot pattern.

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use backend::api::{self, AppState};
use backend::engine::{Engine, EngineError, EngineFactory};
use backend::store::GameStore;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

/// Replies from a fixed script, then reports no move
struct ScriptedEngine {
    replies: Vec<String>,
    quits: Arc<AtomicUsize>,
}

#[async_trait]
impl Engine for ScriptedEngine {
    async fn best_move(&mut self, _fen: &str) -> Result<Option<String>, EngineError> {
        Ok((!self.replies.is_empty()).then(|| self.replies.remove(0)))
    }

    async fn quit(&mut self) -> Result<(), EngineError> {
        self.quits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct ScriptedFactory {
    quits: Arc<AtomicUsize>,
}

#[async_trait]
impl EngineFactory for ScriptedFactory {
    async fn spawn(&self, _skill_level: u8) -> Result<Box<dyn Engine>, EngineError> {
        Ok(Box::new(ScriptedEngine {
            replies: vec!["e7e5".into(), "b8c6".into()],
            quits: self.quits.clone(),
        }))
    }
}

struct TestApp {
    router: Router,
    games_dir: TempDir,
    engine_quits: Arc<AtomicUsize>,
}

fn test_app() -> TestApp {
    let games_dir = tempfile::tempdir().expect("tempdir");
    let engine_quits = Arc::new(AtomicUsize::new(0));
    let factory = ScriptedFactory {
        quits: engine_quits.clone(),
    };
    let store = Arc::new(GameStore::new(Arc::new(factory)));
    let router = api::router(AppState::new(store, games_dir.path()));
    TestApp {
        router,
        games_dir,
        engine_quits,
    }
}

async fn send(app: &TestApp, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(match body {
            Some(body) => Body::from(body.to_string()),
            None => Body::empty(),
        })
        .unwrap();

    let response = app.router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, body)
}

async fn create_game(app: &TestApp, body: Value) -> String {
    let (status, body) = send(app, "POST", "/api/game/create", Some(body)).await;
    assert_eq!(status, StatusCode::OK);
    body["game_id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_index_lists_endpoints() {
    let app = test_app();
    let response = app
        .router
        .clone()
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let html = String::from_utf8(body.to_vec()).unwrap();
    assert!(html.contains("/api/game/create"));
}

#[tokio::test]
async fn test_create_game_defaults() {
    let app = test_app();
    let (status, body) = send(&app, "POST", "/api/game/create", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["type"], "multiplayer");
    assert!(body["elo_rating"].is_null());
    assert_eq!(body["game_id"].as_str().unwrap().len(), 36);
}

#[tokio::test]
async fn test_create_computer_game_reports_elo() {
    let app = test_app();
    let (status, body) = send(
        &app,
        "POST",
        "/api/game/create",
        Some(json!({"type": "vs_computer", "elo_rating": 2200})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["type"], "vs_computer");
    assert_eq!(body["elo_rating"], 2200);
}

#[tokio::test]
async fn test_create_game_rejects_bad_elo() {
    let app = test_app();
    for elo in [json!(500), json!(3500), json!("strong")] {
        let (status, body) = send(
            &app,
            "POST",
            "/api/game/create",
            Some(json!({"type": "vs_computer", "elo_rating": elo})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "ELO rating must be between 800 and 3000");
    }
}

#[tokio::test]
async fn test_join_assigns_colors_and_generates_ids() {
    let app = test_app();
    let game_id = create_game(&app, json!({})).await;
    let uri = format!("/api/game/{game_id}/join");

    let (status, first) = send(&app, "POST", &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["color"], "white");
    assert_eq!(first["player_id"].as_str().unwrap().len(), 36);
    assert_eq!(
        first["game_state"]["board"],
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"
    );

    let (_, second) = send(&app, "POST", &uri, Some(json!({"player_id": "bob"}))).await;
    assert_eq!(second["color"], "black");
    assert_eq!(second["game_state"]["players"]["bob"], "black");

    let (status, third) = send(&app, "POST", &uri, Some(json!({"player_id": "carol"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(third["error"], "Cannot join game");
}

#[tokio::test]
async fn test_unknown_game_is_404() {
    let app = test_app();
    for (method, path) in [
        ("POST", "/api/game/nope/join"),
        ("POST", "/api/game/nope/move"),
        ("GET", "/api/game/nope/state"),
        ("GET", "/api/game/nope/pgn"),
        ("POST", "/api/game/nope/resign"),
        ("DELETE", "/api/game/nope"),
    ] {
        let (status, body) = send(&app, method, path, Some(json!({}))).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{method} {path}");
        assert_eq!(body["error"], "Game not found");
    }
}

#[tokio::test]
async fn test_move_flow_and_rejections() {
    let app = test_app();
    let game_id = create_game(&app, json!({})).await;
    let join = format!("/api/game/{game_id}/join");
    send(&app, "POST", &join, Some(json!({"player_id": "w"}))).await;
    send(&app, "POST", &join, Some(json!({"player_id": "b"}))).await;
    let uri = format!("/api/game/{game_id}/move");

    let (status, body) = send(&app, "POST", &uri, Some(json!({"move": "e2e4", "player_id": "w"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["move"], "e2e4");
    assert_eq!(body["current_turn"], "black");
    assert_eq!(body["move_history"], json!(["e2e4"]));

    let (status, body) = send(&app, "POST", &uri, Some(json!({"move": "d2d4", "player_id": "w"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Not your turn");

    let (_, body) = send(&app, "POST", &uri, Some(json!({"move": "e7e4", "player_id": "b"}))).await;
    assert_eq!(body["error"], "Invalid move");

    let (status, _) = send(&app, "POST", &uri, Some(json!({"player_id": "b"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_computer_reply_lands_in_state() {
    let app = test_app();
    let game_id = create_game(&app, json!({"type": "vs_computer", "elo_rating": 1000})).await;
    let (_, joined) = send(&app, "POST", &format!("/api/game/{game_id}/join"), None).await;
    let player_id = joined["player_id"].as_str().unwrap().to_string();

    let (_, body) = send(
        &app,
        "POST",
        &format!("/api/game/{game_id}/move"),
        Some(json!({"move": "e2e4", "player_id": player_id})),
    )
    .await;
    // The reply describes the human move only
    assert_eq!(body["move"], "e2e4");

    let (_, state) = send(&app, "GET", &format!("/api/game/{game_id}/state"), None).await;
    assert_eq!(state["success"], true);
    assert_eq!(state["game_state"]["move_history"], json!(["e2e4", "e7e5"]));
    assert_eq!(state["game_state"]["current_turn"], "white");
}

#[tokio::test]
async fn test_resign() {
    let app = test_app();
    let game_id = create_game(&app, json!({})).await;
    send(&app, "POST", &format!("/api/game/{game_id}/join"), Some(json!({"player_id": "w"}))).await;
    let uri = format!("/api/game/{game_id}/resign");

    let (status, body) = send(&app, "POST", &uri, Some(json!({"player_id": "ghost"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Player not in game");

    let (status, body) = send(&app, "POST", &uri, Some(json!({"player_id": "w"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["resigned_by"], "white");
    assert_eq!(body["game_state"]["game_result"], "0-1");
}

#[tokio::test]
async fn test_pgn_export_writes_file() {
    let app = test_app();
    let game_id = create_game(&app, json!({"type": "vs_computer"})).await;
    send(&app, "POST", &format!("/api/game/{game_id}/move"), Some(json!({"move": "e2e4"}))).await;

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/api/game/{game_id}/pgn"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "text/plain");
    let disposition = response.headers()[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.starts_with(&format!("attachment; filename=\"chess_game_{}_", &game_id[..8])));

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let pgn = String::from_utf8(body.to_vec()).unwrap();
    assert!(pgn.contains("[Event \"3D Chess Game\"]"));
    assert!(pgn.contains("[ComputerLevel \"ELO 1500\"]"));
    assert!(pgn.contains("1. e4 e5 *"));

    let files: Vec<_> = std::fs::read_dir(app.games_dir.path()).unwrap().collect();
    assert_eq!(files.len(), 1);
}

#[tokio::test]
async fn test_delete_game() {
    let app = test_app();
    let game_id = create_game(&app, json!({})).await;
    let uri = format!("/api/game/{game_id}");

    let (status, body) = send(&app, "DELETE", &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let (status, _) = send(&app, "GET", &format!("{uri}/state"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_computer_game_stops_engine() {
    let app = test_app();
    let game_id = create_game(&app, json!({"type": "vs_computer", "elo_rating": 1200})).await;

    let (status, _) = send(&app, "DELETE", &format!("/api/game/{game_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.engine_quits.load(Ordering::SeqCst), 1);
}
