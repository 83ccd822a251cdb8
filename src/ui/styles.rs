//! Colours for the control panel

use bevy_egui::egui;

pub struct UiColors;

impl UiColors {
    pub const CONNECTED: egui::Color32 = egui::Color32::from_rgb(40, 180, 40);
    pub const DISCONNECTED: egui::Color32 = egui::Color32::from_rgb(220, 50, 50);
    pub const TEXT_SECONDARY: egui::Color32 = egui::Color32::from_rgb(170, 170, 180);
    pub const DANGER: egui::Color32 = egui::Color32::from_rgb(220, 50, 50);
}
