use axum::{
    body::Bytes,
    extract::{Path, State},
    http::header,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use shared::protocol::{
    CreateGameResponse, Envelope, GameType, JoinGameRequest, JoinGameResponse, MoveRequest,
    MoveResult, ResignRequest, ResignResponse, StateResponse, DEFAULT_ELO, MAX_ELO, MIN_ELO,
};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use uuid::Uuid;

use crate::error::ApiError;
use crate::store::{GameStore, StoreError};
use crate::ws;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<GameStore>,
    /// Exported PGN files land here
    pub games_dir: PathBuf,
}

impl AppState {
    pub fn new(store: Arc<GameStore>, games_dir: impl Into<PathBuf>) -> Self {
        Self {
            store,
            games_dir: games_dir.into(),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/game/create", post(create_game))
        .route("/api/game/{game_id}/join", post(join_game))
        .route("/api/game/{game_id}/move", post(make_move))
        .route("/api/game/{game_id}/state", get(game_state))
        .route("/api/game/{game_id}/pgn", get(export_pgn))
        .route("/api/game/{game_id}/resign", post(resign_game))
        .route("/api/game/{game_id}", axum::routing::delete(delete_game))
        .route("/ws", get(ws::ws_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html>
<head>
    <title>3D Chess Backend</title>
</head>
<body>
    <h1>3D Chess Backend API</h1>
    <p>Backend is running successfully!</p>
    <h2>Available Endpoints:</h2>
    <ul>
        <li>POST /api/game/create - Create a new game</li>
        <li>POST /api/game/{game_id}/join - Join a game</li>
        <li>POST /api/game/{game_id}/move - Make a move</li>
        <li>GET /api/game/{game_id}/state - Get game state</li>
        <li>GET /api/game/{game_id}/pgn - Export PGN</li>
        <li>POST /api/game/{game_id}/resign - Resign game</li>
        <li>DELETE /api/game/{game_id} - Delete game</li>
        <li>GET /ws - Game event socket</li>
    </ul>
</body>
</html>
"#;

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// Decode an optional JSON body; an empty body yields the default request
fn parse_body<T: DeserializeOwned + Default>(body: &Bytes) -> Result<T, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(|e| ApiError::BadRequest(format!("Invalid JSON body: {e}")))
}

fn parse_elo(raw: &Value) -> Result<u32, ApiError> {
    match raw.get("elo_rating") {
        None | Some(Value::Null) => Ok(DEFAULT_ELO),
        Some(value) => value
            .as_u64()
            .filter(|elo| (MIN_ELO as u64..=MAX_ELO as u64).contains(elo))
            .map(|elo| elo as u32)
            .ok_or_else(|| {
                ApiError::BadRequest(format!(
                    "ELO rating must be between {} and {}",
                    MIN_ELO, MAX_ELO
                ))
            }),
    }
}

fn parse_game_type(raw: &Value) -> Result<GameType, ApiError> {
    match raw.get("type") {
        None | Some(Value::Null) => Ok(GameType::default()),
        Some(value) => serde_json::from_value(value.clone())
            .map_err(|_| ApiError::BadRequest(format!("Unknown game type: {value}"))),
    }
}

async fn create_game(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<Envelope<CreateGameResponse>>, ApiError> {
    let raw: Value = parse_body(&body)?;
    let game_type = parse_game_type(&raw)?;
    let elo_rating = parse_elo(&raw)?;

    let game_id = state.store.create(game_type, elo_rating).await;

    Ok(Json(Envelope::ok(CreateGameResponse {
        game_id,
        game_type,
        elo_rating: (game_type == GameType::VsComputer).then_some(elo_rating),
    })))
}

async fn join_game(
    State(state): State<AppState>,
    Path(game_id): Path<String>,
    body: Bytes,
) -> Result<Json<Envelope<JoinGameResponse>>, ApiError> {
    let request: JoinGameRequest = parse_body(&body)?;
    let player_id = request
        .player_id
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let (color, game_state) = state.store.join(&game_id, &player_id, request.color).await?;

    Ok(Json(Envelope::ok(JoinGameResponse {
        player_id,
        color,
        game_state,
    })))
}

async fn make_move(
    State(state): State<AppState>,
    Path(game_id): Path<String>,
    body: Bytes,
) -> Result<Json<Envelope<MoveResult>>, ApiError> {
    state.store.get(&game_id)?;
    let request: MoveRequest = parse_body(&body)?;
    let uci = request
        .uci
        .ok_or_else(|| ApiError::BadRequest("Missing move".to_string()))?;

    let result = state
        .store
        .submit_move(&game_id, &uci, request.player_id.as_deref())
        .await?;
    Ok(Json(Envelope::ok(result)))
}

async fn game_state(
    State(state): State<AppState>,
    Path(game_id): Path<String>,
) -> Result<Json<Envelope<StateResponse>>, ApiError> {
    let game_state = state.store.state(&game_id).await?;
    Ok(Json(Envelope::ok(StateResponse { game_state })))
}

/// `chess_game_<first 8 chars of id>_<local timestamp>.pgn`
pub fn pgn_filename(game_id: &str) -> String {
    let prefix: String = game_id.chars().take(8).collect();
    format!(
        "chess_game_{}_{}.pgn",
        prefix,
        chrono::Local::now().format("%Y%m%d_%H%M%S")
    )
}

async fn export_pgn(
    State(state): State<AppState>,
    Path(game_id): Path<String>,
) -> Result<Response, ApiError> {
    let pgn = state.store.pgn(&game_id).await?;
    let filename = pgn_filename(&game_id);
    let path = state.games_dir.join(&filename);

    let written = async {
        tokio::fs::create_dir_all(&state.games_dir).await?;
        tokio::fs::write(&path, &pgn).await
    };
    written
        .await
        .map_err(|e| ApiError::Internal(format!("Failed to create PGN file: {e}")))?;
    tracing::info!("[API] Exported {} to {}", game_id, path.display());

    Ok((
        [
            (header::CONTENT_TYPE, "text/plain".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        pgn,
    )
        .into_response())
}

async fn resign_game(
    State(state): State<AppState>,
    Path(game_id): Path<String>,
    body: Bytes,
) -> Result<Json<Envelope<ResignResponse>>, ApiError> {
    let request: ResignRequest = parse_body(&body)?;
    let (resigned_by, game_state) = state
        .store
        .resign(&game_id, request.player_id.as_deref())
        .await
        .map_err(|e| match e {
            StoreError::Move(reason) => ApiError::BadRequest(reason.to_string()),
            other => other.into(),
        })?;

    Ok(Json(Envelope::ok(ResignResponse {
        game_state,
        resigned_by,
    })))
}

async fn delete_game(
    State(state): State<AppState>,
    Path(game_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    if state.store.remove(&game_id).await {
        Ok(Json(json!({ "success": true })))
    } else {
        Err(ApiError::GameNotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_body_empty_is_default() {
        let request: JoinGameRequest = parse_body(&Bytes::new()).unwrap();
        assert!(request.player_id.is_none());
        let request: JoinGameRequest = parse_body(&Bytes::from_static(b"  \n")).unwrap();
        assert!(request.color.is_none());
    }

    #[test]
    fn test_parse_body_rejects_garbage() {
        let result: Result<JoinGameRequest, _> = parse_body(&Bytes::from_static(b"{nope"));
        assert!(matches!(result, Err(ApiError::BadRequest(_))));
    }

    #[test]
    fn test_parse_elo() {
        assert_eq!(parse_elo(&json!({})).unwrap(), DEFAULT_ELO);
        assert_eq!(parse_elo(&json!({"elo_rating": 800})).unwrap(), 800);
        assert_eq!(parse_elo(&json!({"elo_rating": 3000})).unwrap(), 3000);
        for bad in [json!(799), json!(3001), json!("1500"), json!(1500.5), json!(-1)] {
            let err = parse_elo(&json!({ "elo_rating": bad })).unwrap_err();
            assert_eq!(err.to_string(), "ELO rating must be between 800 and 3000");
        }
    }

    #[test]
    fn test_parse_game_type() {
        assert_eq!(parse_game_type(&json!({})).unwrap(), GameType::Multiplayer);
        assert_eq!(
            parse_game_type(&json!({"type": "vs_computer"})).unwrap(),
            GameType::VsComputer
        );
        assert!(parse_game_type(&json!({"type": "blitz"})).is_err());
    }

    #[test]
    fn test_pgn_filename() {
        let name = pgn_filename("abcdef12-3456-7890");
        assert!(name.starts_with("chess_game_abcdef12_"));
        assert!(name.ends_with(".pgn"));
        // chess_game_ + 8 + _ + YYYYmmdd_HHMMSS + .pgn
        assert_eq!(name.len(), 11 + 8 + 1 + 15 + 4);
    }
}
