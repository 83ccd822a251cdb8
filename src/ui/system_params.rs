//! System parameter group for the control panel

use crate::game::GameSession;
use crate::networking::NetworkChannels;
use crate::rendering::{BoardShape, BoardTransition, PointerOverUi, ToggleBoardShape};
use crate::ui::notifications::Notifications;
use crate::ui::panel::PanelState;
use bevy::ecs::system::SystemParam;
use bevy::prelude::*;
use bevy_egui::EguiContexts;

#[derive(SystemParam)]
pub struct PanelParams<'w, 's> {
    pub contexts: EguiContexts<'w, 's>,
    pub session: Res<'w, GameSession>,
    pub network: Res<'w, NetworkChannels>,
    pub notifications: ResMut<'w, Notifications>,
    pub panel: ResMut<'w, PanelState>,
    pub shape: Res<'w, BoardShape>,
    pub transition: Res<'w, BoardTransition>,
    pub toggles: MessageWriter<'w, ToggleBoardShape>,
    pub pointer_over_ui: ResMut<'w, PointerOverUi>,
}
