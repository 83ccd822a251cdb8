//! Client-side view of the game being played
//!
//! The server is authoritative. [`GameSession`] only mirrors what it last
//! reported, and [`apply_network_events`] is the single writer.

use bevy::prelude::*;
use shared::protocol::{
    GameResult, GameStateView, GameType, GameUpdate, MoveResult, PlayerColor, ResignResponse,
};

use crate::networking::NetEvent;
use crate::ui::notifications::Notifications;

pub const STARTING_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Last known flags of the position and the outcome
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameStatus {
    pub current_turn: PlayerColor,
    pub is_check: bool,
    pub is_checkmate: bool,
    pub is_stalemate: bool,
    pub game_result: GameResult,
    pub resigned_by: Option<PlayerColor>,
}

impl Default for GameStatus {
    fn default() -> Self {
        Self {
            current_turn: PlayerColor::White,
            is_check: false,
            is_checkmate: false,
            is_stalemate: false,
            game_result: GameResult::Ongoing,
            resigned_by: None,
        }
    }
}

impl GameStatus {
    pub fn is_over(&self) -> bool {
        self.game_result.is_over()
    }
}

#[derive(Resource, Debug, Clone)]
pub struct GameSession {
    pub connected: bool,
    pub game_id: Option<String>,
    pub player_color: Option<PlayerColor>,
    pub game_type: Option<GameType>,
    /// Engine strength, for games against the computer
    pub elo_rating: Option<u32>,
    pub fen: String,
    pub move_history: Vec<String>,
    pub status: GameStatus,
}

impl Default for GameSession {
    fn default() -> Self {
        Self {
            connected: false,
            game_id: None,
            player_color: None,
            game_type: None,
            elo_rating: None,
            fen: STARTING_FEN.to_string(),
            move_history: Vec::new(),
            status: GameStatus::default(),
        }
    }
}

impl GameSession {
    pub fn in_game(&self) -> bool {
        self.game_id.is_some()
    }

    pub fn enter_game(
        &mut self,
        game_id: String,
        color: PlayerColor,
        game_type: Option<GameType>,
        elo_rating: Option<u32>,
        state: &GameStateView,
    ) {
        self.game_id = Some(game_id);
        self.player_color = Some(color);
        self.game_type = game_type;
        self.elo_rating = elo_rating;
        self.status.resigned_by = None;
        self.apply_state(state);
    }

    pub fn apply_state(&mut self, state: &GameStateView) {
        self.fen = state.board.clone();
        self.move_history = state.move_history.clone();
        self.status = GameStatus {
            current_turn: state.current_turn,
            is_check: state.is_check,
            is_checkmate: state.is_checkmate,
            is_stalemate: state.is_stalemate,
            game_result: state.game_result,
            // A bare snapshot does not say who resigned; keep what we know
            resigned_by: if state.game_result.is_over() {
                self.status.resigned_by
            } else {
                None
            },
        };
    }

    pub fn apply_move(&mut self, result: &MoveResult) {
        self.fen = result.board.clone();
        self.move_history = result.move_history.clone();
        self.status.current_turn = result.current_turn;
        self.status.is_check = result.is_check;
        self.status.is_checkmate = result.is_checkmate;
        self.status.is_stalemate = result.is_stalemate;
        self.status.game_result = result.game_result;
    }

    pub fn apply_update(&mut self, update: &GameUpdate) {
        self.apply_state(&update.state);
        if update.resigned_by.is_some() {
            self.status.resigned_by = update.resigned_by;
        }
    }

    pub fn apply_resignation(&mut self, response: &ResignResponse) {
        self.apply_state(&response.game_state);
        self.status.resigned_by = Some(response.resigned_by);
    }

    pub fn is_my_turn(&self) -> bool {
        self.player_color == Some(self.status.current_turn)
    }

    pub fn can_move(&self) -> bool {
        self.in_game() && self.is_my_turn() && !self.status.is_over()
    }

    pub fn can_resign(&self) -> bool {
        self.in_game() && !self.status.is_over()
    }

    /// Forget the game but keep the connection state
    pub fn leave(&mut self) {
        *self = Self {
            connected: self.connected,
            ..Self::default()
        };
    }
}

/// Fold network results into the session and raise user-facing alerts
pub fn apply_network_events(
    mut events: MessageReader<NetEvent>,
    mut session: ResMut<GameSession>,
    mut notifications: ResMut<Notifications>,
) {
    for event in events.read() {
        match event {
            NetEvent::Connected => {
                info!("[SESSION] Connected to chess server");
                session.connected = true;
            }
            NetEvent::Disconnected => {
                warn!("[SESSION] Disconnected from chess server");
                session.connected = false;
            }
            NetEvent::ConnectFailed(message) => {
                warn!("[SESSION] Live updates unavailable: {}", message);
                session.connected = false;
            }
            NetEvent::GameEntered {
                game_id,
                color,
                game_type,
                elo_rating,
                state,
                notice,
            } => {
                info!("[SESSION] Entered game {} as {}", game_id, color);
                session.enter_game(game_id.clone(), *color, *game_type, *elo_rating, state);
                notifications.push(notice.clone());
            }
            NetEvent::MoveMade(result) => {
                debug!("[SESSION] Move {} applied", result.uci);
                session.apply_move(result);
            }
            NetEvent::GameUpdate(update) => {
                session.apply_update(update);
                if let Some(message) = &update.message {
                    notifications.push(message.clone());
                }
            }
            NetEvent::ServerError(message) => {
                notifications.push(format!("Game error: {}", message));
            }
            NetEvent::Resigned(response) => {
                session.apply_resignation(response);
                notifications.push("You have resigned from the game.");
            }
            NetEvent::PgnSaved(path) => {
                notifications.push(format!(
                    "PGN file exported successfully! Saved to {}",
                    path.display()
                ));
            }
            NetEvent::Left => session.leave(),
            NetEvent::Failure { action, message } => {
                warn!("[SESSION] Failed to {}: {}", action, message);
                notifications.push(format!("Failed to {}: {}", action, message));
            }
        }
    }
}
