//! In-memory game table
//!
//! Every game is an [`GameEntry`]: the game itself behind an async mutex
//! (engine searches run while it is held, so a computer reply is applied
//! before the next human move is looked at) and a broadcast channel that
//! acts as the game's room. Socket connections subscribe to the room; both
//! the HTTP and the socket move paths publish to it.

use parking_lot::RwLock;
use shared::protocol::{GameStateView, GameType, GameUpdate, MoveResult, PlayerColor, ServerEvent};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{broadcast, Mutex};
use uuid::Uuid;

use crate::engine::{Engine, EngineFactory};
use crate::game::{elo_to_skill_level, ChessGame, JoinError, MoveError};

/// Backlog a slow room subscriber may fall behind before it starts losing events
const ROOM_CAPACITY: usize = 64;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Game not found")]
    NotFound,

    #[error("Cannot join game")]
    Join(#[from] JoinError),

    #[error(transparent)]
    Move(#[from] MoveError),
}

struct GameSlot {
    game: ChessGame,
    engine: Option<Box<dyn Engine>>,
}

pub struct GameEntry {
    slot: Mutex<GameSlot>,
    room: broadcast::Sender<ServerEvent>,
}

impl GameEntry {
    fn new(game: ChessGame, engine: Option<Box<dyn Engine>>) -> Self {
        let (room, _) = broadcast::channel(ROOM_CAPACITY);
        Self {
            slot: Mutex::new(GameSlot { game, engine }),
            room,
        }
    }

    fn publish(&self, event: ServerEvent) {
        // No subscribers is fine: HTTP-only players poll the state instead
        let _ = self.room.send(event);
    }
}

pub struct GameStore {
    games: RwLock<HashMap<String, Arc<GameEntry>>>,
    engines: Arc<dyn EngineFactory>,
}

impl GameStore {
    pub fn new(engines: Arc<dyn EngineFactory>) -> Self {
        Self {
            games: RwLock::new(HashMap::new()),
            engines,
        }
    }

    pub fn len(&self) -> usize {
        self.games.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.games.read().is_empty()
    }

    /// Register a new game and return its id.
    ///
    /// Computer games get an engine; if it cannot be started the game is
    /// still created and the computer simply never replies.
    pub async fn create(&self, game_type: GameType, elo_rating: u32) -> String {
        let game_id = Uuid::new_v4().to_string();

        let engine = if game_type == GameType::VsComputer {
            let skill = elo_to_skill_level(elo_rating);
            match self.engines.spawn(skill).await {
                Ok(engine) => Some(engine),
                Err(e) => {
                    tracing::warn!("[STORE] Game {} has no engine: {}", game_id, e);
                    None
                }
            }
        } else {
            None
        };

        let game = ChessGame::new(game_id.clone(), game_type, elo_rating);
        self.games
            .write()
            .insert(game_id.clone(), Arc::new(GameEntry::new(game, engine)));

        tracing::info!(
            "[STORE] Created {} game {} (ELO {})",
            game_type.as_str(),
            game_id,
            elo_rating
        );
        game_id
    }

    pub fn get(&self, game_id: &str) -> Result<Arc<GameEntry>, StoreError> {
        self.games
            .read()
            .get(game_id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    /// Drop a game and shut its engine down
    pub async fn remove(&self, game_id: &str) -> bool {
        let removed = self.games.write().remove(game_id);
        let Some(entry) = removed else {
            return false;
        };
        // Waits for a running search to finish before quitting
        let engine = entry.slot.lock().await.engine.take();
        if let Some(mut engine) = engine {
            if let Err(e) = engine.quit().await {
                tracing::warn!("[STORE] Engine for {} did not quit cleanly: {}", game_id, e);
            }
        }
        tracing::info!("[STORE] Deleted game {}", game_id);
        true
    }

    pub fn subscribe(&self, game_id: &str) -> Result<broadcast::Receiver<ServerEvent>, StoreError> {
        Ok(self.get(game_id)?.room.subscribe())
    }

    pub async fn join(
        &self,
        game_id: &str,
        player_id: &str,
        color: Option<PlayerColor>,
    ) -> Result<(PlayerColor, GameStateView), StoreError> {
        let entry = self.get(game_id)?;
        let mut slot = entry.slot.lock().await;
        let color = slot.game.add_player(player_id, color)?;
        tracing::info!("[STORE] {} joined {} as {}", player_id, game_id, color);
        Ok((color, slot.game.state()))
    }

    pub async fn leave(&self, game_id: &str, player_id: &str) -> Result<(), StoreError> {
        let entry = self.get(game_id)?;
        entry.slot.lock().await.game.remove_player(player_id);
        tracing::info!("[STORE] {} left {}", player_id, game_id);
        Ok(())
    }

    pub async fn state(&self, game_id: &str) -> Result<GameStateView, StoreError> {
        let entry = self.get(game_id)?;
        let slot = entry.slot.lock().await;
        Ok(slot.game.state())
    }

    /// Play a move and publish it, followed by the computer's reply if due.
    /// Returns the result of `uci` itself.
    pub async fn submit_move(
        &self,
        game_id: &str,
        uci: &str,
        player_id: Option<&str>,
    ) -> Result<MoveResult, StoreError> {
        let entry = self.get(game_id)?;
        let mut slot = entry.slot.lock().await;

        let result = slot.game.make_move(uci, player_id)?;
        entry.publish(ServerEvent::MoveMade(result.clone()));

        let computer_to_move = slot.game.game_type == GameType::VsComputer
            && slot.game.current_turn() == PlayerColor::Black
            && !slot.game.result().is_over();
        if computer_to_move {
            if let Some(reply) = Self::computer_reply(&mut slot).await {
                entry.publish(ServerEvent::MoveMade(reply));
            }
        }

        Ok(result)
    }

    async fn computer_reply(slot: &mut GameSlot) -> Option<MoveResult> {
        let fen = slot.game.fen();
        let engine = slot.engine.as_mut()?;
        let best = match engine.best_move(&fen).await {
            Ok(Some(best)) => best,
            Ok(None) => return None,
            Err(e) => {
                tracing::error!("[STORE] Engine failed in game {}: {}", slot.game.game_id, e);
                if e.is_fatal() {
                    tracing::warn!("[STORE] Dropping engine for {}", slot.game.game_id);
                    slot.engine = None;
                }
                return None;
            }
        };

        match slot.game.make_move(&best, None) {
            Ok(result) => {
                tracing::debug!("[STORE] Computer played {} in {}", best, slot.game.game_id);
                Some(result)
            }
            Err(e) => {
                tracing::error!("[STORE] Engine move {} rejected: {}", best, e);
                None
            }
        }
    }

    /// Concede for a seated player and announce it to the room
    pub async fn resign(
        &self,
        game_id: &str,
        player_id: Option<&str>,
    ) -> Result<(PlayerColor, GameStateView), StoreError> {
        let entry = self.get(game_id)?;
        let mut slot = entry.slot.lock().await;
        let color = slot.game.resign(player_id)?;
        let state = slot.game.state();

        entry.publish(ServerEvent::GameUpdate(GameUpdate {
            state: state.clone(),
            resigned_by: Some(color),
            message: Some(format!("{} player has resigned", color.title())),
        }));
        tracing::info!("[STORE] {} resigned game {}", color, game_id);
        Ok((color, state))
    }

    pub async fn pgn(&self, game_id: &str) -> Result<String, StoreError> {
        let entry = self.get(game_id)?;
        let slot = entry.slot.lock().await;
        Ok(slot.game.pgn())
    }
}
