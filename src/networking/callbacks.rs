//! Socket event handler registry
//!
//! Handlers are registered per event kind and run in registration order on
//! the socket task. A failing handler is logged and the remaining handlers
//! still run.

use parking_lot::RwLock;
use shared::protocol::{GameUpdate, MoveResult, ServerEvent};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SocketEventKind {
    MoveMade,
    GameUpdate,
    Error,
    Disconnect,
}

/// Everything a socket can report to the application
#[derive(Clone, Debug, PartialEq)]
pub enum SocketEvent {
    MoveMade(MoveResult),
    GameUpdate(GameUpdate),
    Error(String),
    Disconnect,
}

impl SocketEvent {
    pub fn kind(&self) -> SocketEventKind {
        match self {
            SocketEvent::MoveMade(_) => SocketEventKind::MoveMade,
            SocketEvent::GameUpdate(_) => SocketEventKind::GameUpdate,
            SocketEvent::Error(_) => SocketEventKind::Error,
            SocketEvent::Disconnect => SocketEventKind::Disconnect,
        }
    }
}

impl From<ServerEvent> for SocketEvent {
    fn from(event: ServerEvent) -> Self {
        match event {
            ServerEvent::MoveMade(result) => SocketEvent::MoveMade(result),
            ServerEvent::GameUpdate(update) => SocketEvent::GameUpdate(update),
            ServerEvent::Error { message } => SocketEvent::Error(message),
        }
    }
}

pub type Handler = Arc<dyn Fn(&SocketEvent) -> anyhow::Result<()> + Send + Sync>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

#[derive(Default)]
pub struct EventHandlers {
    next_id: u64,
    handlers: HashMap<SocketEventKind, Vec<(HandlerId, Handler)>>,
}

impl EventHandlers {
    pub fn on<F>(&mut self, kind: SocketEventKind, handler: F) -> HandlerId
    where
        F: Fn(&SocketEvent) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let id = HandlerId(self.next_id);
        self.next_id += 1;
        self.handlers
            .entry(kind)
            .or_default()
            .push((id, Arc::new(handler)));
        id
    }

    /// Unregister one handler; returns whether it was registered
    pub fn off(&mut self, kind: SocketEventKind, id: HandlerId) -> bool {
        let Some(list) = self.handlers.get_mut(&kind) else {
            return false;
        };
        let before = list.len();
        list.retain(|(handler_id, _)| *handler_id != id);
        list.len() != before
    }

    /// Handlers currently registered for `kind`
    pub fn handlers_for(&self, kind: SocketEventKind) -> Vec<(HandlerId, Handler)> {
        self.handlers.get(&kind).cloned().unwrap_or_default()
    }

    /// Run every handler for the event's kind; returns how many succeeded
    pub fn trigger(&self, event: &SocketEvent) -> usize {
        run_handlers(&self.handlers_for(event.kind()), event)
    }
}

/// Trigger `event` on a shared registry without holding its lock, so
/// handlers may register or remove handlers themselves
pub fn dispatch(handlers: &RwLock<EventHandlers>, event: &SocketEvent) -> usize {
    let list = handlers.read().handlers_for(event.kind());
    run_handlers(&list, event)
}

fn run_handlers(list: &[(HandlerId, Handler)], event: &SocketEvent) -> usize {
    list.iter()
        .filter(|(id, handler)| match handler(event) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!("[NETWORK] Handler {:?} for {:?} failed: {:#}", id, event.kind(), e);
                false
            }
        })
        .count()
}
