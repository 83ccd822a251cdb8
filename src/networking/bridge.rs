//! Bevy side of the networking layer
//!
//! The [`ChessGameClient`] lives on a dedicated thread that owns a tokio
//! runtime. Systems talk to it through [`NetworkChannels`]: commands go down
//! one crossbeam channel, results and socket events come back up another and
//! are re-emitted as [`NetEvent`] messages once per frame.

use bevy::prelude::*;
use crossbeam_channel::{Receiver, Sender};
use shared::protocol::{GameStateView, GameType, GameUpdate, MoveResult, PlayerColor, ResignResponse};
use std::path::{Path, PathBuf};

use super::callbacks::{SocketEvent, SocketEventKind};
use super::client::{ChessGameClient, MoveOutcome};
use super::error::ClientResult;

/// Requests from the UI to the network thread
#[derive(Debug, Clone, PartialEq)]
pub enum NetCommand {
    Connect,
    /// Create a game and take a seat in it
    CreateGame {
        game_type: GameType,
        elo_rating: Option<u32>,
    },
    JoinGame {
        game_id: String,
    },
    MakeMove(String),
    Resign,
    ExportPgn,
    Leave,
}

/// Results and socket events delivered to the ECS
#[derive(Message, Debug, Clone, PartialEq)]
pub enum NetEvent {
    Connected,
    Disconnected,
    ConnectFailed(String),
    GameEntered {
        game_id: String,
        color: PlayerColor,
        game_type: Option<GameType>,
        elo_rating: Option<u32>,
        state: GameStateView,
        notice: String,
    },
    MoveMade(MoveResult),
    GameUpdate(GameUpdate),
    /// `error` event pushed by the server over the socket
    ServerError(String),
    Resigned(ResignResponse),
    PgnSaved(PathBuf),
    Left,
    Failure {
        action: String,
        message: String,
    },
}

#[derive(Resource, Clone)]
pub struct NetworkChannels {
    commands: Sender<NetCommand>,
    events: Receiver<NetEvent>,
}

impl NetworkChannels {
    /// Channels with no worker attached; the caller plays the network thread
    pub fn detached() -> (Self, Receiver<NetCommand>, Sender<NetEvent>) {
        let (command_tx, command_rx) = crossbeam_channel::unbounded();
        let (event_tx, event_rx) = crossbeam_channel::unbounded();
        (
            Self {
                commands: command_tx,
                events: event_rx,
            },
            command_rx,
            event_tx,
        )
    }

    pub fn send(&self, command: NetCommand) {
        if self.commands.send(command).is_err() {
            error!("[NETWORK] Network thread is gone; command dropped");
        }
    }
}

pub struct NetworkingPlugin {
    pub server_url: String,
    pub download_dir: PathBuf,
}

impl Plugin for NetworkingPlugin {
    fn build(&self, app: &mut App) {
        let (channels, commands, events) = NetworkChannels::detached();

        let server_url = self.server_url.clone();
        let download_dir = self.download_dir.clone();
        let spawned = std::thread::Builder::new()
            .name("chess-network".into())
            .spawn(move || run_network_thread(server_url, download_dir, commands, events));
        if let Err(e) = spawned {
            error!("[NETWORK] Failed to start network thread: {}", e);
        }

        channels.send(NetCommand::Connect);
        app.insert_resource(channels)
            .add_message::<NetEvent>()
            .add_systems(PreUpdate, drain_network_events);

        info!("NetworkingPlugin loaded");
    }
}

/// Forward everything the network thread produced since the last frame
pub fn drain_network_events(channels: Res<NetworkChannels>, mut writer: MessageWriter<NetEvent>) {
    for event in channels.events.try_iter() {
        writer.write(event);
    }
}

fn run_network_thread(
    server_url: String,
    download_dir: PathBuf,
    commands: Receiver<NetCommand>,
    events: Sender<NetEvent>,
) {
    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            let _ = events.send(NetEvent::ConnectFailed(format!("runtime: {e}")));
            return;
        }
    };

    let mut client = match ChessGameClient::new(&server_url) {
        Ok(client) => client,
        Err(e) => {
            let _ = events.send(NetEvent::ConnectFailed(e.to_string()));
            return;
        }
    };
    register_handlers(&client, &events);

    // Commands run one at a time; the socket task keeps running on the
    // runtime's workers in between.
    while let Ok(command) = commands.recv() {
        if let Some(event) = runtime.block_on(execute(&mut client, command, &download_dir)) {
            if events.send(event).is_err() {
                break;
            }
        }
    }

    runtime.block_on(client.disconnect());
    tracing::info!("[NETWORK] Network thread stopped");
}

fn register_handlers(client: &ChessGameClient, events: &Sender<NetEvent>) {
    let kinds = [
        SocketEventKind::MoveMade,
        SocketEventKind::GameUpdate,
        SocketEventKind::Error,
        SocketEventKind::Disconnect,
    ];
    for kind in kinds {
        let events = events.clone();
        client.on(kind, move |event| {
            let event = match event.clone() {
                SocketEvent::MoveMade(result) => NetEvent::MoveMade(result),
                SocketEvent::GameUpdate(update) => NetEvent::GameUpdate(update),
                SocketEvent::Error(message) => NetEvent::ServerError(message),
                SocketEvent::Disconnect => NetEvent::Disconnected,
            };
            events
                .send(event)
                .map_err(|_| anyhow::anyhow!("ECS side of the network channel is closed"))
        });
    }
}

async fn execute(
    client: &mut ChessGameClient,
    command: NetCommand,
    download_dir: &Path,
) -> Option<NetEvent> {
    let event = match command {
        NetCommand::Connect => match client.connect().await {
            Ok(()) => NetEvent::Connected,
            Err(e) => {
                tracing::warn!("[NETWORK] Failed to connect to chess server: {}", e);
                NetEvent::ConnectFailed(e.to_string())
            }
        },
        NetCommand::CreateGame {
            game_type,
            elo_rating,
        } => {
            let action = match game_type {
                GameType::Multiplayer => "create multiplayer game",
                GameType::VsComputer => "create computer game",
            };
            create_and_join(client, game_type, elo_rating)
                .await
                .unwrap_or_else(|e| failure(action, e))
        }
        NetCommand::JoinGame { game_id } => match client.join_game(&game_id, None, None).await {
            Ok(joined) => NetEvent::GameEntered {
                notice: format!("Joined game as {} player!", joined.color),
                game_id,
                color: joined.color,
                game_type: client.game_type(),
                elo_rating: None,
                state: joined.game_state,
            },
            Err(e) => failure("join game", e),
        },
        NetCommand::MakeMove(uci) => match client.make_move(&uci).await {
            Ok(MoveOutcome::Relayed) => return None,
            Ok(MoveOutcome::Applied(result)) => NetEvent::MoveMade(result),
            Err(e) => failure("make move", e),
        },
        NetCommand::Resign => match client.resign().await {
            Ok(response) => NetEvent::Resigned(response),
            Err(e) => failure("resign", e),
        },
        NetCommand::ExportPgn => match client.save_pgn(download_dir).await {
            Ok(path) => NetEvent::PgnSaved(path),
            Err(e) => failure("export PGN file", e),
        },
        NetCommand::Leave => {
            client.leave_game();
            NetEvent::Left
        }
    };
    Some(event)
}

async fn create_and_join(
    client: &mut ChessGameClient,
    game_type: GameType,
    elo_rating: Option<u32>,
) -> ClientResult<NetEvent> {
    let created = client.create_game(game_type, elo_rating).await?;
    let joined = client.join_game(&created.game_id, None, None).await?;

    let notice = match created.elo_rating {
        Some(elo) => format!("Created game vs computer ({} ELO)!", elo),
        None => format!(
            "Created multiplayer game! Share this Game ID with another player: {}",
            created.game_id
        ),
    };
    Ok(NetEvent::GameEntered {
        game_id: created.game_id,
        color: joined.color,
        game_type: Some(created.game_type),
        elo_rating: created.elo_rating,
        state: joined.game_state,
        notice,
    })
}

fn failure(action: &str, error: impl std::fmt::Display) -> NetEvent {
    NetEvent::Failure {
        action: action.to_string(),
        message: error.to_string(),
    }
}
