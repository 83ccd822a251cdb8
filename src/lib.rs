//! 3D chess client
//!
//! - `core` - command line and environment configuration
//! - `networking` - HTTP/WebSocket client for the game server and its Bevy bridge
//! - `game` - client-side session mirroring the server's game
//! - `rendering` - mountain board, pieces, labels and camera
//! - `ui` - egui control panel and alerts

pub mod core;
pub mod game;
pub mod networking;
pub mod rendering;
pub mod ui;
