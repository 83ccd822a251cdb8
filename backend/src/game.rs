//! One chess game: seats, position, history and result
//!
//! Legality is delegated to `shakmaty`; this type only adds the seating
//! and turn-ownership rules of a two-player game and the bookkeeping the
//! client needs (UCI history, result token, timestamps).

use chrono::{DateTime, Local};
use shakmaty::fen::Fen;
use shakmaty::uci::UciMove;
use shakmaty::{Chess, Color, EnPassantMode, Position};
use shared::pgn::{write_pgn, PgnHeaders};
use shared::protocol::{
    GameResult, GameStateView, GameType, MoveResult, PlayerColor, MAX_ELO, MIN_ELO,
};
use thiserror::Error;

const SKILL_LEVELS: u32 = 20;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MoveError {
    #[error("Player not in game")]
    NotInGame,

    #[error("Not your turn")]
    NotYourTurn,

    #[error("Game is over")]
    GameOver,

    #[error("Invalid move format: {0}")]
    InvalidFormat(String),

    #[error("Invalid move")]
    Illegal,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum JoinError {
    #[error("Game is full")]
    GameFull,

    #[error("Color {0} is already taken")]
    ColorTaken(PlayerColor),
}

/// Map an ELO rating onto the engine's 0-20 skill scale
pub fn elo_to_skill_level(elo: u32) -> u8 {
    if elo <= MIN_ELO {
        0
    } else if elo >= MAX_ELO {
        SKILL_LEVELS as u8
    } else {
        ((elo - MIN_ELO) * SKILL_LEVELS / (MAX_ELO - MIN_ELO)) as u8
    }
}

fn to_player_color(color: Color) -> PlayerColor {
    match color {
        Color::White => PlayerColor::White,
        Color::Black => PlayerColor::Black,
    }
}

#[derive(Debug, Clone)]
pub struct ChessGame {
    pub game_id: String,
    pub game_type: GameType,
    pub elo_rating: u32,
    position: Chess,
    /// Seats in join order
    players: Vec<(String, PlayerColor)>,
    move_history: Vec<String>,
    game_result: GameResult,
    started_at: DateTime<Local>,
    ended_at: Option<DateTime<Local>>,
}

impl ChessGame {
    pub fn new(game_id: impl Into<String>, game_type: GameType, elo_rating: u32) -> Self {
        Self {
            game_id: game_id.into(),
            game_type,
            elo_rating,
            position: Chess::default(),
            players: Vec::new(),
            move_history: Vec::new(),
            game_result: GameResult::Ongoing,
            started_at: Local::now(),
            ended_at: None,
        }
    }

    pub fn player_color(&self, player_id: &str) -> Option<PlayerColor> {
        self.players
            .iter()
            .find(|(id, _)| id == player_id)
            .map(|(_, color)| *color)
    }

    fn color_taken(&self, color: PlayerColor) -> bool {
        self.players.iter().any(|(_, c)| *c == color)
    }

    pub fn add_player(
        &mut self,
        player_id: &str,
        color: Option<PlayerColor>,
    ) -> Result<PlayerColor, JoinError> {
        if let Some(existing) = self.player_color(player_id) {
            return Ok(existing);
        }
        if self.players.len() >= 2 {
            return Err(JoinError::GameFull);
        }

        let color = match color {
            Some(requested) if self.color_taken(requested) => {
                return Err(JoinError::ColorTaken(requested));
            }
            Some(requested) => requested,
            None if !self.color_taken(PlayerColor::White) => PlayerColor::White,
            None => PlayerColor::Black,
        };

        self.players.push((player_id.to_string(), color));
        Ok(color)
    }

    pub fn remove_player(&mut self, player_id: &str) {
        self.players.retain(|(id, _)| id != player_id);
    }

    pub fn current_turn(&self) -> PlayerColor {
        to_player_color(self.position.turn())
    }

    pub fn result(&self) -> GameResult {
        self.game_result
    }

    pub fn move_history(&self) -> &[String] {
        &self.move_history
    }

    pub fn fen(&self) -> String {
        Fen::from_position(self.position.clone(), EnPassantMode::Legal).to_string()
    }

    /// Validate and play `uci`.
    ///
    /// Seating and turn ownership are only enforced for multiplayer games;
    /// computer games accept moves from the engine without a player id.
    pub fn make_move(
        &mut self,
        uci: &str,
        player_id: Option<&str>,
    ) -> Result<MoveResult, MoveError> {
        if self.game_result.is_over() {
            return Err(MoveError::GameOver);
        }

        if self.game_type == GameType::Multiplayer {
            let color = player_id
                .and_then(|id| self.player_color(id))
                .ok_or(MoveError::NotInGame)?;
            if color != self.current_turn() {
                return Err(MoveError::NotYourTurn);
            }
        }

        let parsed: UciMove = uci
            .trim()
            .parse()
            .map_err(|e| MoveError::InvalidFormat(format!("{e}")))?;
        let m = parsed
            .to_move(&self.position)
            .map_err(|_| MoveError::Illegal)?;

        let mover = self.current_turn();
        self.position.play_unchecked(&m);
        let uci = parsed.to_string();
        self.move_history.push(uci.clone());

        if self.position.is_checkmate() {
            self.finish(GameResult::win_for(mover));
        } else if self.position.is_stalemate() || self.position.is_insufficient_material() {
            self.finish(GameResult::Draw);
        }

        Ok(MoveResult {
            board: self.fen(),
            uci,
            current_turn: self.current_turn(),
            is_check: self.position.is_check(),
            is_checkmate: self.position.is_checkmate(),
            is_stalemate: self.position.is_stalemate(),
            move_history: self.move_history.clone(),
            game_result: self.game_result,
        })
    }

    /// Concede on behalf of a seated player; returns the resigning colour
    pub fn resign(&mut self, player_id: Option<&str>) -> Result<PlayerColor, MoveError> {
        let color = player_id
            .and_then(|id| self.player_color(id))
            .ok_or(MoveError::NotInGame)?;
        if self.game_result.is_over() {
            return Err(MoveError::GameOver);
        }
        self.finish(GameResult::win_for(color.opposite()));
        Ok(color)
    }

    fn finish(&mut self, result: GameResult) {
        self.game_result = result;
        self.ended_at = Some(Local::now());
    }

    pub fn state(&self) -> GameStateView {
        GameStateView {
            board: self.fen(),
            current_turn: self.current_turn(),
            is_check: self.position.is_check(),
            is_checkmate: self.position.is_checkmate(),
            is_stalemate: self.position.is_stalemate(),
            move_history: self.move_history.clone(),
            players: self.players.iter().cloned().collect(),
            game_result: self.game_result,
        }
    }

    pub fn pgn_headers(&self) -> PgnHeaders {
        let vs_computer = self.game_type == GameType::VsComputer;
        let mut headers = PgnHeaders::default();
        headers.event = "3D Chess Game".to_string();
        headers.site = "3D Chess Web Application".to_string();
        headers.date = self.started_at.format("%Y.%m.%d").to_string();
        headers.round = "1".to_string();
        headers.white = "Player".to_string();
        headers.black = if vs_computer { "Computer" } else { "Player" }.to_string();
        headers.result = self.game_result;
        headers.push_tag("GameId", self.game_id.clone());
        headers.push_tag("TimeControl", "-");

        if vs_computer {
            headers.push_tag("BlackElo", self.elo_rating.to_string());
            headers.push_tag("ComputerLevel", format!("ELO {}", self.elo_rating));
        }
        if let Some(ended_at) = self.ended_at {
            headers.push_tag("EndTime", ended_at.format("%H:%M:%S").to_string());
        }
        headers
    }

    pub fn pgn(&self) -> String {
        write_pgn(&self.pgn_headers(), &self.move_history)
    }
}
