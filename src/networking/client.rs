//! Async client for the chess server
//!
//! REST calls go through `reqwest`; live updates arrive on a WebSocket at
//! `<server>/ws` and are dispatched to the [`EventHandlers`]. When the socket
//! is up, moves are relayed over it and their outcome comes back as a
//! `move_made` or `error` event; otherwise the move is POSTed and the server's
//! answer is returned directly.

use futures::{SinkExt, StreamExt};
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use shared::pgn::{write_pgn, PgnHeaders};
use shared::protocol::{
    ClientEvent, CreateGameRequest, CreateGameResponse, GameStateView, GameType,
    JoinGameRequest, JoinGameResponse, MoveRequest, MoveResult, PlayerColor, ResignRequest,
    ResignResponse, ServerEvent, StateResponse,
};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use url::Url;

use super::callbacks::{dispatch, EventHandlers, HandlerId, SocketEvent, SocketEventKind};
use super::error::{ClientError, ClientResult};

/// How a move left the client
#[derive(Debug, Clone, PartialEq)]
pub enum MoveOutcome {
    /// Sent over the socket; the result arrives as an event
    Relayed,
    /// Applied over HTTP
    Applied(MoveResult),
}

/// A PGN record ready to be saved
#[derive(Debug, Clone, PartialEq)]
pub struct PgnExport {
    pub filename: String,
    pub contents: Vec<u8>,
    /// False when the server export failed and the record was built locally
    pub from_server: bool,
}

struct SocketHandle {
    outgoing: mpsc::UnboundedSender<ClientEvent>,
    connected: Arc<AtomicBool>,
    task: JoinHandle<()>,
}

pub struct ChessGameClient {
    server_url: Url,
    http: reqwest::Client,
    handlers: Arc<RwLock<EventHandlers>>,
    socket: Option<SocketHandle>,
    game_id: Option<String>,
    player_id: Option<String>,
    player_color: Option<PlayerColor>,
    game_type: Option<GameType>,
}

impl ChessGameClient {
    pub fn new(server_url: &str) -> ClientResult<Self> {
        let server_url = Url::parse(server_url)?;
        if !matches!(server_url.scheme(), "http" | "https") {
            return Err(ClientError::InvalidUrl(format!(
                "unsupported scheme '{}'",
                server_url.scheme()
            )));
        }
        Ok(Self {
            server_url,
            http: reqwest::Client::new(),
            handlers: Arc::new(RwLock::new(EventHandlers::default())),
            socket: None,
            game_id: None,
            player_id: None,
            player_color: None,
            game_type: None,
        })
    }

    pub fn server_url(&self) -> &Url {
        &self.server_url
    }

    pub fn game_id(&self) -> Option<&str> {
        self.game_id.as_deref()
    }

    pub fn player_id(&self) -> Option<&str> {
        self.player_id.as_deref()
    }

    pub fn player_color(&self) -> Option<PlayerColor> {
        self.player_color
    }

    pub fn game_type(&self) -> Option<GameType> {
        self.game_type
    }

    pub fn is_connected(&self) -> bool {
        self.socket
            .as_ref()
            .is_some_and(|socket| socket.connected.load(Ordering::SeqCst))
    }

    pub fn on<F>(&self, kind: SocketEventKind, handler: F) -> HandlerId
    where
        F: Fn(&SocketEvent) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.handlers.write().on(kind, handler)
    }

    pub fn off(&self, kind: SocketEventKind, id: HandlerId) -> bool {
        self.handlers.write().off(kind, id)
    }

    /// `http(s)://host/...` → `ws(s)://host/ws`
    pub fn socket_url(&self) -> ClientResult<Url> {
        let mut url = self.server_url.clone();
        let scheme = if url.scheme() == "https" { "wss" } else { "ws" };
        url.set_scheme(scheme)
            .map_err(|_| ClientError::InvalidUrl(format!("cannot use {} for a socket", url)))?;
        url.set_path("/ws");
        url.set_query(None);
        Ok(url)
    }

    fn api_url(&self, path: &str) -> ClientResult<Url> {
        Ok(self.server_url.join(path)?)
    }

    fn current_game(&self) -> ClientResult<&str> {
        self.game_id.as_deref().ok_or(ClientError::NotInGame)
    }

    /// Open the event socket. Replaces any previous socket.
    pub async fn connect(&mut self) -> ClientResult<()> {
        let url = self.socket_url()?;
        let builder = websocket::ClientBuilder::new()
            .uri(url.as_str())
            .map_err(|e| ClientError::InvalidUrl(e.to_string()))?;
        let (mut stream, _) = builder
            .connect()
            .await
            .map_err(|e| ClientError::Socket(e.to_string()))?;

        let (outgoing, mut queue) = mpsc::unbounded_channel::<ClientEvent>();
        let connected = Arc::new(AtomicBool::new(true));
        let handlers = self.handlers.clone();
        let flag = connected.clone();

        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    frame = stream.next() => {
                        let message = match frame {
                            Some(Ok(message)) => message,
                            Some(Err(e)) => {
                                tracing::warn!("[NETWORK] Socket error: {}", e);
                                break;
                            }
                            None => break,
                        };
                        if message.is_close() {
                            break;
                        }
                        let Some(text) = message.as_text() else {
                            continue;
                        };
                        match serde_json::from_str::<ServerEvent>(text) {
                            Ok(event) => {
                                dispatch(&handlers, &event.into());
                            }
                            Err(e) => tracing::warn!("[NETWORK] Undecodable event {}: {}", text, e),
                        }
                    }
                    command = queue.recv() => {
                        let Some(command) = command else {
                            let _ = stream.close().await;
                            break;
                        };
                        let text = match serde_json::to_string(&command) {
                            Ok(text) => text,
                            Err(e) => {
                                tracing::error!("[NETWORK] Failed to encode {:?}: {}", command, e);
                                continue;
                            }
                        };
                        if let Err(e) = stream.send(websocket::Message::text(text)).await {
                            tracing::warn!("[NETWORK] Send failed: {}", e);
                            break;
                        }
                    }
                }
            }
            flag.store(false, Ordering::SeqCst);
            dispatch(&handlers, &SocketEvent::Disconnect);
            tracing::info!("[NETWORK] Socket closed");
        });

        if let Some(previous) = self.socket.take() {
            previous.task.abort();
        }
        self.socket = Some(SocketHandle {
            outgoing,
            connected,
            task,
        });
        tracing::info!("[NETWORK] Connected to {}", url);
        Ok(())
    }

    /// Queue an event on the socket; false when there is no live socket
    fn emit(&self, event: ClientEvent) -> bool {
        match &self.socket {
            Some(socket) if socket.connected.load(Ordering::SeqCst) => {
                socket.outgoing.send(event).is_ok()
            }
            _ => false,
        }
    }

    async fn post<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> ClientResult<T> {
        let response = self.http.post(self.api_url(path)?).json(body).send().await?;
        read_envelope(response).await
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        let response = self.http.get(self.api_url(path)?).send().await?;
        read_envelope(response).await
    }

    pub async fn create_game(
        &mut self,
        game_type: GameType,
        elo_rating: Option<u32>,
    ) -> ClientResult<CreateGameResponse> {
        let request = CreateGameRequest {
            game_type,
            elo_rating,
        };
        let response: CreateGameResponse = self.post("/api/game/create", &request).await?;
        self.leave_game();
        self.game_id = Some(response.game_id.clone());
        self.game_type = Some(response.game_type);
        tracing::info!("[NETWORK] Created {} game {}", game_type.as_str(), response.game_id);
        Ok(response)
    }

    pub async fn join_game(
        &mut self,
        game_id: &str,
        player_id: Option<&str>,
        color: Option<PlayerColor>,
    ) -> ClientResult<JoinGameResponse> {
        let request = JoinGameRequest {
            player_id: player_id.map(str::to_string),
            color,
        };
        let response: JoinGameResponse = self
            .post(&format!("/api/game/{}/join", game_id), &request)
            .await?;

        // Switching games: stop following the old room
        if self.game_id.as_deref() != Some(game_id) {
            self.leave_game();
        }
        self.game_id = Some(game_id.to_string());
        self.player_id = Some(response.player_id.clone());
        self.player_color = Some(response.color);

        self.emit(ClientEvent::JoinGame {
            game_id: game_id.to_string(),
            player_id: Some(response.player_id.clone()),
        });
        tracing::info!("[NETWORK] Joined {} as {}", game_id, response.color);
        Ok(response)
    }

    pub async fn make_move(&self, uci: &str) -> ClientResult<MoveOutcome> {
        let game_id = self.current_game()?.to_string();

        let relayed = self.emit(ClientEvent::MakeMove {
            game_id: game_id.clone(),
            uci: uci.to_string(),
            player_id: self.player_id.clone(),
        });
        if relayed {
            return Ok(MoveOutcome::Relayed);
        }

        let request = MoveRequest {
            uci: Some(uci.to_string()),
            player_id: self.player_id.clone(),
        };
        let result: MoveResult = self
            .post(&format!("/api/game/{}/move", game_id), &request)
            .await?;
        Ok(MoveOutcome::Applied(result))
    }

    pub async fn get_game_state(&self) -> ClientResult<GameStateView> {
        let game_id = self.current_game()?;
        let response: StateResponse = self.get(&format!("/api/game/{}/state", game_id)).await?;
        Ok(response.game_state)
    }

    pub async fn resign(&self) -> ClientResult<ResignResponse> {
        let game_id = self.current_game()?;
        let request = ResignRequest {
            player_id: self.player_id.clone(),
        };
        self.post(&format!("/api/game/{}/resign", game_id), &request)
            .await
    }

    /// Fetch the server's PGN export, or build one from the move history
    pub async fn export_pgn(&self) -> ClientResult<PgnExport> {
        let game_id = self.current_game()?;
        match self.fetch_server_pgn(game_id).await {
            Ok(export) => Ok(export),
            Err(e) => {
                tracing::warn!("[NETWORK] Server PGN export failed, building locally: {}", e);
                let state = self.get_game_state().await?;
                Ok(local_pgn(game_id, self.game_type, &state))
            }
        }
    }

    async fn fetch_server_pgn(&self, game_id: &str) -> ClientResult<PgnExport> {
        let response = self
            .http
            .get(self.api_url(&format!("/api/game/{}/pgn", game_id))?)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let filename = response
            .headers()
            .get(reqwest::header::CONTENT_DISPOSITION)
            .and_then(|value| value.to_str().ok())
            .and_then(attachment_filename)
            .unwrap_or_else(|| pgn_filename(game_id));
        let contents = response.bytes().await?.to_vec();
        Ok(PgnExport {
            filename,
            contents,
            from_server: true,
        })
    }

    /// Export and write the record into `dir`
    pub async fn save_pgn(&self, dir: &Path) -> ClientResult<PathBuf> {
        let export = self.export_pgn().await?;
        let filename = plain_file_name(&export.filename)
            .unwrap_or_else(|| pgn_filename(self.game_id.as_deref().unwrap_or_default()));
        tokio::fs::create_dir_all(dir).await?;
        let path = dir.join(filename);
        tokio::fs::write(&path, &export.contents).await?;
        tracing::info!("[NETWORK] Saved PGN to {}", path.display());
        Ok(path)
    }

    pub fn leave_game(&mut self) {
        if let Some(game_id) = self.game_id.take() {
            self.emit(ClientEvent::LeaveGame {
                game_id,
                player_id: self.player_id.clone(),
            });
        }
        self.player_id = None;
        self.player_color = None;
        self.game_type = None;
    }

    /// Leave the current game and close the socket
    pub async fn disconnect(&mut self) {
        self.leave_game();
        if let Some(socket) = self.socket.take() {
            let SocketHandle {
                outgoing,
                connected: _,
                task,
            } = socket;
            // Closing the queue makes the task send a close frame and exit
            drop(outgoing);
            let _ = task.await;
        }
    }

    pub fn is_my_turn(&self, state: &GameStateView) -> bool {
        self.player_color == Some(state.current_turn)
    }
}

impl Drop for ChessGameClient {
    fn drop(&mut self) {
        if let Some(socket) = self.socket.take() {
            socket.task.abort();
        }
    }
}

/// Decode `{"success": true, ...}` into `T`, or surface the server's error
async fn read_envelope<T: DeserializeOwned>(response: reqwest::Response) -> ClientResult<T> {
    let status = response.status();
    let body: Value = response.json().await?;
    if body.get("success").and_then(Value::as_bool) == Some(true) {
        return Ok(serde_json::from_value(body)?);
    }
    Err(server_error(status, &body))
}

async fn error_from_response(response: reqwest::Response) -> ClientError {
    let status = response.status();
    match response.json::<Value>().await {
        Ok(body) => server_error(status, &body),
        Err(e) => e.into(),
    }
}

fn server_error(status: reqwest::StatusCode, body: &Value) -> ClientError {
    let message = body
        .get("error")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| format!("Server returned {}", status));
    ClientError::Server(message)
}

/// `attachment; filename="x.pgn"` → `x.pgn`
fn attachment_filename(header: &str) -> Option<String> {
    header.split(';').find_map(|part| {
        let value = part.trim().strip_prefix("filename=")?;
        plain_file_name(value.trim_matches('"'))
    })
}

/// Last path component of `name`; directories in it are dropped
fn plain_file_name(name: &str) -> Option<String> {
    let file_name = Path::new(name).file_name()?.to_str()?;
    (!file_name.is_empty() && file_name != "..").then(|| file_name.to_string())
}

pub fn pgn_filename(game_id: &str) -> String {
    let prefix: String = game_id.chars().take(8).collect();
    format!(
        "chess_game_{}_{}.pgn",
        prefix,
        chrono::Local::now().format("%Y%m%d_%H%M%S")
    )
}

fn local_pgn(game_id: &str, game_type: Option<GameType>, state: &GameStateView) -> PgnExport {
    let mut headers = PgnHeaders::default();
    headers.event = "3D Chess Game".to_string();
    headers.site = "3D Chess Web Application".to_string();
    headers.date = chrono::Local::now().format("%Y.%m.%d").to_string();
    headers.round = "1".to_string();
    headers.white = "Player".to_string();
    headers.black = match game_type {
        Some(GameType::VsComputer) => "Computer",
        _ => "Player",
    }
    .to_string();
    headers.result = state.game_result;
    headers.push_tag("GameId", game_id);

    PgnExport {
        filename: pgn_filename(game_id),
        contents: write_pgn(&headers, &state.move_history).into_bytes(),
        from_server: false,
    }
}
