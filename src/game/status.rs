//! Human-readable game status, move table rows and engine strength labels

use shared::protocol::{GameResult, PlayerColor};

use super::session::GameStatus;

/// Status line shown in the info panel
pub fn status_text(status: &GameStatus) -> String {
    if status.game_result.is_over() {
        if let Some(color) = status.resigned_by {
            format!("Game Over - {} resigned", color.title())
        } else if status.is_checkmate {
            // The side to move is the one that got mated
            format!("Checkmate! {} wins.", status.current_turn.opposite().title())
        } else if status.is_stalemate {
            "Stalemate! Game drawn.".to_string()
        } else if status.game_result == GameResult::Draw {
            "Game drawn.".to_string()
        } else {
            let winner = status.game_result.winner().unwrap_or(PlayerColor::Black);
            format!("Game Over - {} wins.", winner.title())
        }
    } else if status.is_check {
        "Check!".to_string()
    } else {
        "Game in progress".to_string()
    }
}

/// One row of the move table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovePair {
    pub number: usize,
    pub white: String,
    pub black: Option<String>,
}

pub fn move_pairs(history: &[String]) -> Vec<MovePair> {
    history
        .chunks(2)
        .enumerate()
        .map(|(i, pair)| MovePair {
            number: i + 1,
            white: pair[0].clone(),
            black: pair.get(1).cloned(),
        })
        .collect()
}

/// Strength label for the ELO slider
pub fn elo_level(elo: u32) -> &'static str {
    match elo {
        0..=999 => "Beginner",
        1000..=1299 => "Novice",
        1300..=1699 => "Intermediate",
        1700..=2199 => "Advanced",
        2200..=2699 => "Expert",
        _ => "Master",
    }
}
