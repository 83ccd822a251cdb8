//! Client configuration from command line, environment and `.env`

use bevy::prelude::*;
use clap::Parser;
use std::path::PathBuf;

pub const DEFAULT_SERVER_URL: &str = "http://localhost:5001";

#[derive(Parser, Resource, Debug, Clone)]
#[command(name = "chess3d", about = "3D chess client")]
pub struct ClientConfig {
    /// Base URL of the game server; the socket lives at `<url>/ws`
    #[arg(long, env = "CHESS_SERVER_URL", default_value = DEFAULT_SERVER_URL)]
    pub server_url: String,

    /// Where exported PGN files are saved
    #[arg(long, env = "CHESS_DOWNLOAD_DIR")]
    pub download_dir: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            download_dir: None,
        }
    }
}

impl ClientConfig {
    /// Configured directory, else the platform downloads folder, else `.`
    pub fn download_dir(&self) -> PathBuf {
        self.download_dir
            .clone()
            .or_else(dirs::download_dir)
            .unwrap_or_else(|| PathBuf::from("."))
    }
}
