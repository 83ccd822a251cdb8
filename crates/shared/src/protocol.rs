//! Wire protocol between the chess client and the game server
//!
//! Two transports carry the same payloads:
//!
//! - HTTP JSON bodies under `/api/game/...`, always wrapped in an
//!   [`Envelope`] (`{"success": true, ...}`) or an [`ErrorBody`]
//! - WebSocket text frames on `/ws`, encoded as `{"event": .., "data": ..}`
//!   ([`ClientEvent`] upstream, [`ServerEvent`] downstream)

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Lowest computer strength accepted when creating a game
pub const MIN_ELO: u32 = 800;
/// Highest computer strength accepted when creating a game
pub const MAX_ELO: u32 = 3000;
/// Strength used when the request does not name one
pub const DEFAULT_ELO: u32 = 1500;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerColor {
    White,
    Black,
}

impl PlayerColor {
    pub fn opposite(self) -> Self {
        match self {
            PlayerColor::White => PlayerColor::Black,
            PlayerColor::Black => PlayerColor::White,
        }
    }

    /// Capitalized name, as used in status lines ("White wins.")
    pub fn title(self) -> &'static str {
        match self {
            PlayerColor::White => "White",
            PlayerColor::Black => "Black",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PlayerColor::White => "white",
            PlayerColor::Black => "black",
        }
    }
}

impl fmt::Display for PlayerColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameType {
    #[default]
    Multiplayer,
    VsComputer,
}

impl GameType {
    pub fn as_str(self) -> &'static str {
        match self {
            GameType::Multiplayer => "multiplayer",
            GameType::VsComputer => "vs_computer",
        }
    }
}

/// Outcome token in PGN notation
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameResult {
    #[default]
    #[serde(rename = "*")]
    Ongoing,
    #[serde(rename = "1-0")]
    WhiteWins,
    #[serde(rename = "0-1")]
    BlackWins,
    #[serde(rename = "1/2-1/2")]
    Draw,
}

impl GameResult {
    pub fn is_over(self) -> bool {
        self != GameResult::Ongoing
    }

    pub fn win_for(color: PlayerColor) -> Self {
        match color {
            PlayerColor::White => GameResult::WhiteWins,
            PlayerColor::Black => GameResult::BlackWins,
        }
    }

    pub fn winner(self) -> Option<PlayerColor> {
        match self {
            GameResult::WhiteWins => Some(PlayerColor::White),
            GameResult::BlackWins => Some(PlayerColor::Black),
            GameResult::Ongoing | GameResult::Draw => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            GameResult::Ongoing => "*",
            GameResult::WhiteWins => "1-0",
            GameResult::BlackWins => "0-1",
            GameResult::Draw => "1/2-1/2",
        }
    }
}

impl fmt::Display for GameResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Full snapshot of a game as the server sees it
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameStateView {
    /// Position in FEN
    pub board: String,
    pub current_turn: PlayerColor,
    pub is_check: bool,
    pub is_checkmate: bool,
    pub is_stalemate: bool,
    /// Every move played so far, in UCI notation
    pub move_history: Vec<String>,
    #[serde(default)]
    pub players: BTreeMap<String, PlayerColor>,
    pub game_result: GameResult,
}

/// Outcome of one accepted move
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MoveResult {
    pub board: String,
    #[serde(rename = "move")]
    pub uci: String,
    pub current_turn: PlayerColor,
    pub is_check: bool,
    pub is_checkmate: bool,
    pub is_stalemate: bool,
    pub move_history: Vec<String>,
    pub game_result: GameResult,
}

/// Snapshot pushed to a room, optionally annotated (resignations)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameUpdate {
    #[serde(flatten)]
    pub state: GameStateView,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resigned_by: Option<PlayerColor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl From<GameStateView> for GameUpdate {
    fn from(state: GameStateView) -> Self {
        Self {
            state,
            resigned_by: None,
            message: None,
        }
    }
}

// === HTTP bodies ===

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CreateGameRequest {
    #[serde(rename = "type", default)]
    pub game_type: GameType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elo_rating: Option<u32>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CreateGameResponse {
    pub game_id: String,
    #[serde(rename = "type")]
    pub game_type: GameType,
    /// Only set for games against the computer
    pub elo_rating: Option<u32>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct JoinGameRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<PlayerColor>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JoinGameResponse {
    pub player_id: String,
    pub color: PlayerColor,
    pub game_state: GameStateView,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct MoveRequest {
    #[serde(rename = "move", default)]
    pub uci: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player_id: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ResignRequest {
    #[serde(default)]
    pub player_id: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResignResponse {
    pub game_state: GameStateView,
    pub resigned_by: PlayerColor,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StateResponse {
    pub game_state: GameStateView,
}

/// Successful reply: `{"success": true, ...fields of T}`
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(flatten)]
    pub data: T,
}

impl<T> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Failed reply: `{"success": false, "error": "..."}`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub success: bool,
    pub error: String,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
        }
    }
}

// === Socket events ===

/// Client → Server
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientEvent {
    JoinGame {
        game_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        player_id: Option<String>,
    },
    LeaveGame {
        game_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        player_id: Option<String>,
    },
    MakeMove {
        game_id: String,
        #[serde(rename = "move")]
        uci: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        player_id: Option<String>,
    },
}

/// Server → Client (room broadcasts and direct replies)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    MoveMade(MoveResult),
    GameUpdate(GameUpdate),
    Error { message: String },
}

impl ServerEvent {
    pub fn error(message: impl Into<String>) -> Self {
        ServerEvent::Error {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn sample_state() -> GameStateView {
        GameStateView {
            board: "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1".to_string(),
            current_turn: PlayerColor::Black,
            is_check: false,
            is_checkmate: false,
            is_stalemate: false,
            move_history: vec!["e2e4".to_string()],
            players: BTreeMap::from([("p1".to_string(), PlayerColor::White)]),
            game_result: GameResult::Ongoing,
        }
    }

    #[test]
    fn test_game_result_tokens() {
        assert_eq!(serde_json::to_value(GameResult::Ongoing).unwrap(), json!("*"));
        assert_eq!(serde_json::to_value(GameResult::WhiteWins).unwrap(), json!("1-0"));
        assert_eq!(serde_json::to_value(GameResult::BlackWins).unwrap(), json!("0-1"));
        assert_eq!(serde_json::to_value(GameResult::Draw).unwrap(), json!("1/2-1/2"));

        let parsed: GameResult = serde_json::from_str("\"1/2-1/2\"").unwrap();
        assert_eq!(parsed, GameResult::Draw);
    }

    #[test]
    fn test_game_result_winner() {
        assert_eq!(GameResult::win_for(PlayerColor::Black), GameResult::BlackWins);
        assert_eq!(GameResult::WhiteWins.winner(), Some(PlayerColor::White));
        assert_eq!(GameResult::Draw.winner(), None);
        assert!(!GameResult::Ongoing.is_over());
        assert!(GameResult::Draw.is_over());
    }

    #[test]
    fn test_player_color_lowercase_on_wire() {
        assert_eq!(serde_json::to_value(PlayerColor::White).unwrap(), json!("white"));
        assert_eq!(PlayerColor::White.opposite(), PlayerColor::Black);
        assert_eq!(PlayerColor::Black.title(), "Black");
    }

    #[test]
    fn test_create_request_defaults_to_multiplayer() {
        let request: CreateGameRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(request.game_type, GameType::Multiplayer);
        assert_eq!(request.elo_rating, None);

        let request: CreateGameRequest =
            serde_json::from_value(json!({"type": "vs_computer", "elo_rating": 2000})).unwrap();
        assert_eq!(request.game_type, GameType::VsComputer);
        assert_eq!(request.elo_rating, Some(2000));
    }

    #[test]
    fn test_move_result_uses_move_key() {
        let result = MoveResult {
            board: "fen".to_string(),
            uci: "e2e4".to_string(),
            current_turn: PlayerColor::Black,
            is_check: false,
            is_checkmate: false,
            is_stalemate: false,
            move_history: vec!["e2e4".to_string()],
            game_result: GameResult::Ongoing,
        };
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["move"], "e2e4");
        assert_eq!(value["game_result"], "*");
        assert!(value.get("uci").is_none());
    }

    #[test]
    fn test_envelope_flattens_payload() {
        let reply = Envelope::ok(StateResponse {
            game_state: sample_state(),
        });
        let value = serde_json::to_value(&reply).unwrap();
        assert_eq!(value["success"], true);
        assert_eq!(value["game_state"]["current_turn"], "black");
        assert_eq!(value["game_state"]["players"]["p1"], "white");
    }

    #[test]
    fn test_error_body_shape() {
        let value = serde_json::to_value(ErrorBody::new("Game not found")).unwrap();
        assert_eq!(value, json!({"success": false, "error": "Game not found"}));
    }

    #[test]
    fn test_client_event_encoding() {
        let event = ClientEvent::MakeMove {
            game_id: "g1".to_string(),
            uci: "e2e4".to_string(),
            player_id: Some("p1".to_string()),
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(
            value,
            json!({"event": "make_move", "data": {"game_id": "g1", "move": "e2e4", "player_id": "p1"}})
        );

        let decoded: ClientEvent =
            serde_json::from_value(json!({"event": "join_game", "data": {"game_id": "g2"}}))
                .unwrap();
        assert_eq!(
            decoded,
            ClientEvent::JoinGame {
                game_id: "g2".to_string(),
                player_id: None
            }
        );
    }

    #[test]
    fn test_game_update_flattens_state_and_annotations() {
        let update = GameUpdate {
            state: sample_state(),
            resigned_by: Some(PlayerColor::White),
            message: Some("White player has resigned".to_string()),
        };
        let value = serde_json::to_value(ServerEvent::GameUpdate(update.clone())).unwrap();
        assert_eq!(value["event"], "game_update");
        let data: &Value = &value["data"];
        assert_eq!(data["resigned_by"], "white");
        assert_eq!(data["board"], sample_state().board);

        let decoded: ServerEvent = serde_json::from_value(value).unwrap();
        assert_eq!(decoded, ServerEvent::GameUpdate(update));
    }

    #[test]
    fn test_plain_game_update_omits_annotations() {
        let value = serde_json::to_value(GameUpdate::from(sample_state())).unwrap();
        assert!(value.get("resigned_by").is_none());
        assert!(value.get("message").is_none());
    }

    #[test]
    fn test_server_error_event() {
        let value = serde_json::to_value(ServerEvent::error("Not your turn")).unwrap();
        assert_eq!(
            value,
            json!({"event": "error", "data": {"message": "Not your turn"}})
        );
    }
}
