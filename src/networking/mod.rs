//! Networking module - talks to the chess server over HTTP and WebSocket
//!
//! - `client` - async `ChessGameClient` (REST calls plus the event socket)
//! - `callbacks` - per-event handler registry used by the socket task
//! - `bridge` - `NetworkingPlugin`, which runs the client on its own tokio
//!   runtime and exchanges `NetCommand`/`NetEvent` with the ECS
//! - `error` - `ClientError`

pub mod bridge;
pub mod callbacks;
pub mod client;
pub mod error;

pub use bridge::{NetCommand, NetEvent, NetworkChannels, NetworkingPlugin};
pub use callbacks::{EventHandlers, HandlerId, SocketEvent, SocketEventKind};
pub use client::{ChessGameClient, MoveOutcome, PgnExport};
pub use error::{ClientError, ClientResult};
