//! Server configuration from command line, environment and `.env`

use clap::Parser;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug, Clone)]
#[command(name = "backend", about = "Game server for the 3D chess client")]
pub struct ServerConfig {
    /// Interface to bind
    #[arg(long, env = "CHESS_HOST", default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub host: IpAddr,

    #[arg(long, env = "CHESS_PORT", default_value_t = 5001)]
    pub port: u16,

    /// Directory receiving exported PGN files
    #[arg(long, env = "GAMES_DIR", default_value = "games")]
    pub games_dir: PathBuf,

    /// UCI engine binary; looked up in common install locations when unset
    #[arg(long, env = "STOCKFISH_PATH")]
    pub stockfish_path: Option<PathBuf>,

    /// Thinking time granted to the engine per move
    #[arg(long, env = "ENGINE_MOVE_TIME_MS", default_value_t = 1000)]
    pub engine_move_time_ms: u64,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn engine_move_time(&self) -> Duration {
        Duration::from_millis(self.engine_move_time_ms)
    }
}
