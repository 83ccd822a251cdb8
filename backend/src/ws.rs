//! `/ws` socket: room subscriptions and client events
//!
//! Frames are JSON text `{"event": .., "data": ..}`. Each connection has a
//! single writer task fed by an unbounded queue; every joined room adds a
//! forwarding task from the room's broadcast channel into that queue.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use shared::protocol::{ClientEvent, ServerEvent};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

use crate::api::AppState;
use crate::store::GameStore;

type Outbox = mpsc::UnboundedSender<ServerEvent>;

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state.store))
}

/// Forwarding tasks for the rooms this connection has joined
#[derive(Default)]
struct Rooms(HashMap<String, JoinHandle<()>>);

impl Rooms {
    fn join(&mut self, game_id: &str, mut room: broadcast::Receiver<ServerEvent>, outbox: Outbox) {
        if self.0.contains_key(game_id) {
            return;
        }
        let id = game_id.to_string();
        let task = tokio::spawn(async move {
            loop {
                match room.recv().await {
                    Ok(event) => {
                        if outbox.send(event).is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!("[WS] Subscriber of {} lagged by {} events", id, skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });
        self.0.insert(game_id.to_string(), task);
    }

    fn leave(&mut self, game_id: &str) {
        if let Some(task) = self.0.remove(game_id) {
            task.abort();
        }
    }
}

impl Drop for Rooms {
    fn drop(&mut self) {
        for (_, task) in self.0.drain() {
            task.abort();
        }
    }
}

async fn handle_socket(socket: WebSocket, store: Arc<GameStore>) {
    let (mut sink, mut stream) = socket.split();
    let (outbox, mut queue) = mpsc::unbounded_channel::<ServerEvent>();

    let writer = tokio::spawn(async move {
        while let Some(event) = queue.recv().await {
            let text = match serde_json::to_string(&event) {
                Ok(text) => text,
                Err(e) => {
                    tracing::error!("[WS] Failed to encode event: {}", e);
                    continue;
                }
            };
            if sink.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    tracing::debug!("[WS] Client connected");
    let mut rooms = Rooms::default();

    while let Some(frame) = stream.next().await {
        let frame = match frame {
            Ok(frame) => frame,
            Err(e) => {
                tracing::debug!("[WS] Receive error: {}", e);
                break;
            }
        };
        match frame {
            Message::Text(text) => handle_text(&store, &mut rooms, &outbox, text.as_str()).await,
            Message::Close(_) => break,
            _ => {}
        }
    }

    drop(rooms);
    writer.abort();
    tracing::debug!("[WS] Client disconnected");
}

async fn handle_text(store: &GameStore, rooms: &mut Rooms, outbox: &Outbox, text: &str) {
    let event: ClientEvent = match serde_json::from_str(text) {
        Ok(event) => event,
        Err(e) => {
            let _ = outbox.send(ServerEvent::error(format!("Malformed event: {e}")));
            return;
        }
    };

    match event {
        ClientEvent::JoinGame { game_id, player_id } => {
            tracing::debug!("[WS] join_game {} ({:?})", game_id, player_id);
            // Subscribe before reading state so no move slips between the two
            let Ok(room) = store.subscribe(&game_id) else {
                return;
            };
            rooms.join(&game_id, room, outbox.clone());
            if let Ok(state) = store.state(&game_id).await {
                let _ = outbox.send(ServerEvent::GameUpdate(state.into()));
            }
        }
        ClientEvent::LeaveGame { game_id, player_id } => {
            rooms.leave(&game_id);
            if let Some(player_id) = player_id {
                if let Err(e) = store.leave(&game_id, &player_id).await {
                    tracing::debug!("[WS] leave_game {}: {}", game_id, e);
                }
            }
        }
        ClientEvent::MakeMove {
            game_id,
            uci,
            player_id,
        } => {
            if let Err(e) = store
                .submit_move(&game_id, &uci, player_id.as_deref())
                .await
            {
                let _ = outbox.send(ServerEvent::error(e.to_string()));
            }
        }
    }
}
