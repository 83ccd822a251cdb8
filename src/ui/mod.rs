//! UI module - egui control panel and alerts
//!
//! - **panel**: side panel for creating/joining games, entering moves,
//!   exporting PGN, resigning and switching the board shape
//! - **notifications**: queued modal alerts
//! - **system_params**: resource group used by the panel
//! - **styles**: panel colours
//!
//! Both systems run in `EguiPrimaryContextPass`.

pub mod notifications;
pub mod panel;
pub mod styles;
pub mod system_params;

pub use notifications::Notifications;
pub use panel::PanelState;

use bevy::prelude::*;
use bevy_egui::EguiPrimaryContextPass;

pub struct UiPlugin;

impl Plugin for UiPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<PanelState>()
            .init_resource::<Notifications>()
            .add_systems(
                EguiPrimaryContextPass,
                (panel::control_panel_ui, notifications::notifications_ui).chain(),
            );
    }
}
