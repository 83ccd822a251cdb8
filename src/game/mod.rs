//! Game module - the client's mirror of the server-side game
//!
//! - `session` - `GameSession` resource and the system that applies network
//!   results to it
//! - `status` - status line, move table rows and ELO labels for the UI
//! - `plugin` - `GamePlugin`

pub mod plugin;
pub mod session;
pub mod status;

pub use plugin::GamePlugin;
pub use session::{apply_network_events, GameSession, GameStatus, STARTING_FEN};
pub use status::{elo_level, move_pairs, status_text, MovePair};
