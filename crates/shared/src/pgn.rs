//! PGN game record writer
//!
//! Replays UCI move history from the initial position and renders it as
//! SAN movetext. Moves that do not parse or are illegal in the replayed
//! position are skipped with a warning, so a damaged history still yields a
//! readable record of the legal prefix.

use crate::protocol::GameResult;
use shakmaty::san::SanPlus;
use shakmaty::uci::UciMove;
use shakmaty::{Chess, Position};
use std::fmt::Write;

const LINE_WIDTH: usize = 80;

/// Ordered tag pairs: the seven-tag roster first, then extras in insertion order
#[derive(Clone, Debug)]
pub struct PgnHeaders {
    pub event: String,
    pub site: String,
    pub date: String,
    pub round: String,
    pub white: String,
    pub black: String,
    pub result: GameResult,
    extra: Vec<(String, String)>,
}

impl Default for PgnHeaders {
    fn default() -> Self {
        Self {
            event: "?".to_string(),
            site: "?".to_string(),
            date: "????.??.??".to_string(),
            round: "?".to_string(),
            white: "?".to_string(),
            black: "?".to_string(),
            result: GameResult::Ongoing,
            extra: Vec::new(),
        }
    }
}

impl PgnHeaders {
    pub fn with_tag(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.push_tag(name, value);
        self
    }

    pub fn push_tag(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.extra.push((name.into(), value.into()));
    }

    fn tags(&self) -> Vec<(&str, String)> {
        let mut tags = vec![
            ("Event", self.event.clone()),
            ("Site", self.site.clone()),
            ("Date", self.date.clone()),
            ("Round", self.round.clone()),
            ("White", self.white.clone()),
            ("Black", self.black.clone()),
            ("Result", self.result.to_string()),
        ];
        tags.extend(self.extra.iter().map(|(k, v)| (k.as_str(), v.clone())));
        tags
    }
}

fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// SAN tokens for the legal prefix of `moves`
pub fn san_moves<S: AsRef<str>>(moves: &[S]) -> Vec<String> {
    let mut position = Chess::default();
    let mut sans = Vec::with_capacity(moves.len());
    for uci in moves {
        let uci = uci.as_ref();
        let parsed = match uci.parse::<UciMove>() {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("[PGN] Skipping unparsable move {}: {}", uci, e);
                continue;
            }
        };
        match parsed.to_move(&position) {
            Ok(m) => {
                let san = SanPlus::from_move_and_play_unchecked(&mut position, &m);
                sans.push(san.to_string());
            }
            Err(e) => {
                tracing::warn!("[PGN] Skipping illegal move {}: {}", uci, e);
            }
        }
    }
    sans
}

/// Render a complete PGN record
pub fn write_pgn<S: AsRef<str>>(headers: &PgnHeaders, moves: &[S]) -> String {
    let mut out = String::new();
    for (name, value) in headers.tags() {
        let _ = writeln!(out, "[{} \"{}\"]", name, escape(&value));
    }
    out.push('\n');

    let mut tokens = Vec::new();
    for (ply, san) in san_moves(moves).into_iter().enumerate() {
        if ply % 2 == 0 {
            tokens.push(format!("{}.", ply / 2 + 1));
        }
        tokens.push(san);
    }
    tokens.push(headers.result.to_string());

    let mut line_len = 0;
    for token in tokens {
        if line_len > 0 && line_len + 1 + token.len() > LINE_WIDTH {
            out.push('\n');
            line_len = 0;
        }
        if line_len > 0 {
            out.push(' ');
            line_len += 1;
        }
        line_len += token.len();
        out.push_str(&token);
    }
    out.push('\n');
    out
}
