//! Game plugin - session state and network result handling
//!
//! Depends on [`crate::networking::NetworkingPlugin`] for the `NetEvent`
//! source in the running client. The message type is registered here too so
//! the plugin also works in headless apps that feed events by hand.

use super::session::{apply_network_events, GameSession};
use crate::networking::NetEvent;
use crate::ui::notifications::Notifications;
use bevy::prelude::*;

pub struct GamePlugin;

impl Plugin for GamePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<GameSession>()
            .init_resource::<Notifications>()
            .add_message::<NetEvent>()
            .add_systems(Update, apply_network_events);
    }
}
