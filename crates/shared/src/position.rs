//! Board grid as consumed by the renderer
//!
//! The grid is indexed `[row][file]` with row 0 holding rank 8, so iterating
//! rows walks the board from Black's back rank towards White's.

use crate::protocol::PlayerColor;
use shakmaty::fen::Fen;
use shakmaty::{CastlingMode, Chess, Color, File, Position, Rank, Role, Square};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PositionError {
    #[error("Invalid FEN '{fen}': {reason}")]
    InvalidFen { fen: String, reason: String },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PieceKind {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl From<Role> for PieceKind {
    fn from(role: Role) -> Self {
        match role {
            Role::Pawn => PieceKind::Pawn,
            Role::Knight => PieceKind::Knight,
            Role::Bishop => PieceKind::Bishop,
            Role::Rook => PieceKind::Rook,
            Role::Queen => PieceKind::Queen,
            Role::King => PieceKind::King,
        }
    }
}

impl PieceKind {
    fn letter(self) -> char {
        match self {
            PieceKind::Pawn => 'p',
            PieceKind::Knight => 'n',
            PieceKind::Bishop => 'b',
            PieceKind::Rook => 'r',
            PieceKind::Queen => 'q',
            PieceKind::King => 'k',
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GridPiece {
    pub color: PlayerColor,
    pub kind: PieceKind,
}

impl GridPiece {
    /// FEN letter: uppercase for White, lowercase for Black
    pub fn symbol(&self) -> char {
        let letter = self.kind.letter();
        match self.color {
            PlayerColor::White => letter.to_ascii_uppercase(),
            PlayerColor::Black => letter,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BoardGrid {
    cells: [[Option<GridPiece>; 8]; 8],
}

impl BoardGrid {
    pub fn from_fen(fen: &str) -> Result<Self, PositionError> {
        let invalid = |reason: String| PositionError::InvalidFen {
            fen: fen.to_string(),
            reason,
        };
        let parsed: Fen = fen.trim().parse().map_err(|e| invalid(format!("{e}")))?;
        let position: Chess = parsed
            .into_position(CastlingMode::Standard)
            .map_err(|e| invalid(format!("{e}")))?;
        Ok(Self::from_position(&position))
    }

    pub fn starting() -> Self {
        Self::from_position(&Chess::default())
    }

    pub fn from_position(position: &Chess) -> Self {
        let mut cells = [[None; 8]; 8];
        let board = position.board();
        for (row, cells_row) in cells.iter_mut().enumerate() {
            let rank = Rank::new(7 - row as u32);
            for (file, cell) in cells_row.iter_mut().enumerate() {
                let square = Square::from_coords(File::new(file as u32), rank);
                *cell = board.piece_at(square).map(|piece| GridPiece {
                    color: match piece.color {
                        Color::White => PlayerColor::White,
                        Color::Black => PlayerColor::Black,
                    },
                    kind: piece.role.into(),
                });
            }
        }
        Self { cells }
    }

    /// Piece at `file` (0 = a) and `row` (0 = rank 8)
    pub fn get(&self, file: usize, row: usize) -> Option<GridPiece> {
        self.cells.get(row).and_then(|r| r.get(file)).copied().flatten()
    }

    /// Occupied squares as `(file, row, piece)`
    pub fn pieces(&self) -> impl Iterator<Item = (usize, usize, GridPiece)> + '_ {
        self.cells.iter().enumerate().flat_map(|(row, cells)| {
            cells
                .iter()
                .enumerate()
                .filter_map(move |(file, cell)| cell.map(|piece| (file, row, piece)))
        })
    }

    pub fn rows(&self) -> &[[Option<GridPiece>; 8]; 8] {
        &self.cells
    }
}
