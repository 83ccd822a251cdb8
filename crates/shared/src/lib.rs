//! Types shared by the chess server and the 3D client
//!
//! - `protocol` - JSON bodies of the HTTP API and the socket events
//! - `position` - FEN to renderer grid conversion
//! - `pgn` - game record writer

pub mod pgn;
pub mod position;
pub mod protocol;

pub use position::{BoardGrid, GridPiece, PieceKind, PositionError};
pub use protocol::{GameResult, GameType, PlayerColor};
