//! Modal alerts
//!
//! Anything the user must acknowledge (server notices, failures, export
//! results) is queued here and shown one at a time.

use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts};
use std::collections::VecDeque;

#[derive(Resource, Debug, Default)]
pub struct Notifications {
    queue: VecDeque<String>,
}

impl Notifications {
    pub fn push(&mut self, message: impl Into<String>) {
        let message = message.into();
        info!("[UI] Alert: {}", message);
        self.queue.push_back(message);
    }

    /// Alert currently on screen
    pub fn current(&self) -> Option<&str> {
        self.queue.front().map(String::as_str)
    }

    pub fn dismiss(&mut self) -> Option<String> {
        self.queue.pop_front()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

pub fn notifications_ui(mut contexts: EguiContexts, mut notifications: ResMut<Notifications>) {
    let Some(message) = notifications.current().map(str::to_owned) else {
        return;
    };
    let Ok(ctx) = contexts.ctx_mut() else {
        return;
    };

    let mut dismissed = false;
    let response = egui::Modal::new(egui::Id::new("alert_modal")).show(ctx, |ui| {
        ui.set_max_width(360.0);
        ui.label(message);
        ui.add_space(8.0);
        if ui.button("OK").clicked() || ui.input(|i| i.key_pressed(egui::Key::Enter)) {
            dismissed = true;
        }
    });
    if dismissed || response.should_close() {
        notifications.dismiss();
    }
}
