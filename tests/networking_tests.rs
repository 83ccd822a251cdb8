//! Networking Tests
//!
//! Runs the real server router on an ephemeral port with a scripted engine
//! and drives it through `ChessGameClient`, over plain HTTP and over the
//! event socket.

use async_trait::async_trait;
use backend::api::{self, AppState};
use backend::engine::{Engine, EngineError, EngineFactory};
use backend::store::GameStore;
use chess3d::networking::{ChessGameClient, ClientError, MoveOutcome, SocketEvent, SocketEventKind};
use shared::protocol::{GameResult, GameType, PlayerColor};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::mpsc;

const WAIT: Duration = Duration::from_secs(5);

struct ScriptedEngine(Vec<String>);

#[async_trait]
impl Engine for ScriptedEngine {
    async fn best_move(&mut self, _fen: &str) -> Result<Option<String>, EngineError> {
        Ok((!self.0.is_empty()).then(|| self.0.remove(0)))
    }

    async fn quit(&mut self) -> Result<(), EngineError> {
        Ok(())
    }
}

struct ScriptedFactory;

#[async_trait]
impl EngineFactory for ScriptedFactory {
    async fn spawn(&self, _skill_level: u8) -> Result<Box<dyn Engine>, EngineError> {
        Ok(Box::new(ScriptedEngine(vec!["e7e5".into(), "b8c6".into()])))
    }
}

struct TestServer {
    url: String,
    _games_dir: TempDir,
}

async fn start_server() -> TestServer {
    let games_dir = tempfile::tempdir().unwrap();
    let store = Arc::new(GameStore::new(Arc::new(ScriptedFactory)));
    let router = api::router(AppState::new(store, games_dir.path()));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    TestServer {
        url: format!("http://{}", addr),
        _games_dir: games_dir,
    }
}

/// Forward every socket event of the listed kinds into a channel
fn record_events(client: &ChessGameClient) -> mpsc::UnboundedReceiver<SocketEvent> {
    let (tx, rx) = mpsc::unbounded_channel();
    for kind in [
        SocketEventKind::MoveMade,
        SocketEventKind::GameUpdate,
        SocketEventKind::Error,
        SocketEventKind::Disconnect,
    ] {
        let tx = tx.clone();
        client.on(kind, move |event| {
            tx.send(event.clone())?;
            Ok(())
        });
    }
    rx
}

async fn next_matching<F>(events: &mut mpsc::UnboundedReceiver<SocketEvent>, mut pred: F) -> SocketEvent
where
    F: FnMut(&SocketEvent) -> bool,
{
    tokio::time::timeout(WAIT, async {
        loop {
            let event = events.recv().await.expect("event channel closed");
            if pred(&event) {
                return event;
            }
        }
    })
    .await
    .expect("timed out waiting for socket event")
}

#[tokio::test(flavor = "multi_thread")]
async fn test_http_game_flow_without_socket() {
    let server = start_server().await;
    let mut white = ChessGameClient::new(&server.url).unwrap();
    let mut black = ChessGameClient::new(&server.url).unwrap();

    let created = white.create_game(GameType::Multiplayer, None).await.unwrap();
    assert_eq!(created.game_type, GameType::Multiplayer);
    assert_eq!(created.elo_rating, None);

    let joined = white.join_game(&created.game_id, None, None).await.unwrap();
    assert_eq!(joined.color, PlayerColor::White);
    let joined = black.join_game(&created.game_id, None, None).await.unwrap();
    assert_eq!(joined.color, PlayerColor::Black);
    assert!(!white.is_connected());

    let outcome = white.make_move("e2e4").await.unwrap();
    let MoveOutcome::Applied(result) = outcome else {
        panic!("expected an HTTP move, got {:?}", outcome);
    };
    assert_eq!(result.uci, "e2e4");
    assert_eq!(result.current_turn, PlayerColor::Black);

    // Out of turn
    match white.make_move("d2d4").await {
        Err(ClientError::Server(message)) => assert_eq!(message, "Not your turn"),
        other => panic!("expected a rejection, got {:?}", other),
    }

    let state = black.get_game_state().await.unwrap();
    assert_eq!(state.move_history, vec!["e2e4".to_string()]);
    assert!(black.is_my_turn(&state));
    assert!(!white.is_my_turn(&state));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_resign_and_export_pgn() {
    let server = start_server().await;
    let mut client = ChessGameClient::new(&server.url).unwrap();
    let created = client.create_game(GameType::Multiplayer, None).await.unwrap();
    client.join_game(&created.game_id, None, None).await.unwrap();
    client.make_move("e2e4").await.unwrap();

    let resigned = client.resign().await.unwrap();
    assert_eq!(resigned.resigned_by, PlayerColor::White);
    assert_eq!(resigned.game_state.game_result, GameResult::BlackWins);

    let export = client.export_pgn().await.unwrap();
    assert!(export.from_server);
    assert!(export.filename.ends_with(".pgn"));
    let text = String::from_utf8(export.contents).unwrap();
    assert!(text.contains("[Result \"0-1\"]"));
    assert!(text.contains("1. e4"));

    let downloads = tempfile::tempdir().unwrap();
    let path = client.save_pgn(downloads.path()).await.unwrap();
    assert!(path.starts_with(downloads.path()));
    assert!(std::fs::read_to_string(path).unwrap().contains("0-1"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_computer_replies_after_human_move() {
    let server = start_server().await;
    let mut client = ChessGameClient::new(&server.url).unwrap();
    let created = client.create_game(GameType::VsComputer, Some(1200)).await.unwrap();
    assert_eq!(created.elo_rating, Some(1200));
    let joined = client.join_game(&created.game_id, None, None).await.unwrap();
    assert_eq!(joined.color, PlayerColor::White);

    client.make_move("e2e4").await.unwrap();
    let state = client.get_game_state().await.unwrap();
    assert_eq!(state.move_history, vec!["e2e4".to_string(), "e7e5".to_string()]);
    assert_eq!(state.current_turn, PlayerColor::White);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_unknown_game_is_reported() {
    let server = start_server().await;
    let mut client = ChessGameClient::new(&server.url).unwrap();
    match client.join_game("no-such-game", None, None).await {
        Err(ClientError::Server(message)) => assert_eq!(message, "Game not found"),
        other => panic!("expected Game not found, got {:?}", other.map(|r| r.color)),
    }
    assert!(client.game_id().is_none());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_socket_relays_moves_and_errors() {
    let server = start_server().await;

    let mut white = ChessGameClient::new(&server.url).unwrap();
    let mut events = record_events(&white);
    white.connect().await.unwrap();
    assert!(white.is_connected());

    let created = white.create_game(GameType::Multiplayer, None).await.unwrap();
    white.join_game(&created.game_id, None, None).await.unwrap();
    // The server confirms the room subscription with a state snapshot
    next_matching(&mut events, |e| matches!(e, SocketEvent::GameUpdate(_))).await;

    let mut black = ChessGameClient::new(&server.url).unwrap();
    black.join_game(&created.game_id, None, None).await.unwrap();

    assert_eq!(white.make_move("e2e4").await.unwrap(), MoveOutcome::Relayed);
    let made = next_matching(&mut events, |e| matches!(e, SocketEvent::MoveMade(_))).await;
    let SocketEvent::MoveMade(result) = made else { unreachable!() };
    assert_eq!(result.uci, "e2e4");

    // A move made over HTTP by the opponent is broadcast to the room
    black.make_move("e7e5").await.unwrap();
    let made = next_matching(&mut events, |e| matches!(e, SocketEvent::MoveMade(_))).await;
    let SocketEvent::MoveMade(result) = made else { unreachable!() };
    assert_eq!(result.uci, "e7e5");
    assert_eq!(result.current_turn, PlayerColor::White);

    // The e-pawn has already moved, so this is illegal
    assert_eq!(white.make_move("e2e4").await.unwrap(), MoveOutcome::Relayed);
    let error = next_matching(&mut events, |e| matches!(e, SocketEvent::Error(_))).await;
    assert_eq!(error, SocketEvent::Error("Invalid move".into()));

    white.disconnect().await;
    next_matching(&mut events, |e| matches!(e, SocketEvent::Disconnect)).await;
    assert!(!white.is_connected());
    assert!(white.game_id().is_none());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_switching_games_leaves_previous_room() {
    let server = start_server().await;

    let mut client = ChessGameClient::new(&server.url).unwrap();
    let mut events = record_events(&client);
    client.connect().await.unwrap();

    let first = client.create_game(GameType::Multiplayer, None).await.unwrap();
    client.join_game(&first.game_id, None, None).await.unwrap();
    next_matching(&mut events, |e| matches!(e, SocketEvent::GameUpdate(_))).await;

    let second = client.create_game(GameType::Multiplayer, None).await.unwrap();
    client.join_game(&second.game_id, None, None).await.unwrap();
    next_matching(&mut events, |e| matches!(e, SocketEvent::GameUpdate(_))).await;

    // The white seat of the first game was given up
    let mut other = ChessGameClient::new(&server.url).unwrap();
    let joined = other.join_game(&first.game_id, None, None).await.unwrap();
    assert_eq!(joined.color, PlayerColor::White);
    other.make_move("e2e4").await.unwrap();

    assert_eq!(client.make_move("d2d4").await.unwrap(), MoveOutcome::Relayed);
    let made = next_matching(&mut events, |e| matches!(e, SocketEvent::MoveMade(_))).await;
    let SocketEvent::MoveMade(result) = made else { unreachable!() };
    assert_eq!(result.uci, "d2d4");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_connect_fails_without_server() {
    // Bind then drop to get a port nobody listens on
    let addr = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };
    let mut client = ChessGameClient::new(&format!("http://{}", addr)).unwrap();
    assert!(matches!(client.connect().await, Err(ClientError::Socket(_))));
    assert!(!client.is_connected());
}
