//! Control panel - game setup, move entry and move history
//!
//! Buttons only queue [`NetCommand`]s; the panel never changes the session
//! itself. Results come back as network events and show up on the next
//! frame.

use crate::game::{elo_level, move_pairs, status_text};
use crate::networking::NetCommand;
use crate::rendering::ToggleBoardShape;
use crate::ui::styles::UiColors;
use crate::ui::system_params::PanelParams;
use bevy::prelude::*;
use bevy_egui::egui;
use shared::protocol::{GameType, DEFAULT_ELO, MAX_ELO, MIN_ELO};

#[derive(Resource, Debug, Clone)]
pub struct PanelState {
    pub game_id_input: String,
    pub move_input: String,
    pub elo: u32,
    pub elo_picker_open: bool,
    pub confirm_resign: bool,
}

impl Default for PanelState {
    fn default() -> Self {
        Self {
            game_id_input: String::new(),
            move_input: String::new(),
            elo: DEFAULT_ELO,
            elo_picker_open: false,
            confirm_resign: false,
        }
    }
}

/// Trimmed, lowercased move text, or `None` when blank
pub fn normalize_move_input(input: &str) -> Option<String> {
    let uci = input.trim().to_ascii_lowercase();
    (!uci.is_empty()).then_some(uci)
}

pub fn toggle_label(mountain: bool) -> &'static str {
    if mountain {
        "Switch to Flat Board"
    } else {
        "Switch to Mountain View"
    }
}

pub fn control_panel_ui(params: PanelParams) {
    let PanelParams {
        mut contexts,
        session,
        network,
        mut notifications,
        mut panel,
        shape,
        transition,
        mut toggles,
        mut pointer_over_ui,
    } = params;
    let Ok(ctx) = contexts.ctx_mut() else {
        return;
    };

    egui::SidePanel::left("control_panel")
        .resizable(false)
        .default_width(300.0)
        .show(ctx, |ui| {
            ui.add_space(6.0);
            ui.heading("3D Chess");

            ui.horizontal(|ui| {
                let (color, text) = if session.connected {
                    (UiColors::CONNECTED, "Connected")
                } else {
                    (UiColors::DISCONNECTED, "Disconnected")
                };
                ui.label(egui::RichText::new("●").color(color));
                ui.label(text);
            });
            ui.separator();

            // === GAME SETUP ===
            if panel.elo_picker_open {
                ui.label("Computer strength");
                ui.add(egui::Slider::new(&mut panel.elo, MIN_ELO..=MAX_ELO).step_by(50.0));
                ui.label(format!("{} ELO ({})", panel.elo, elo_level(panel.elo)));
                ui.horizontal(|ui| {
                    if ui.button("Start Game").clicked() {
                        network.send(NetCommand::CreateGame {
                            game_type: GameType::VsComputer,
                            elo_rating: Some(panel.elo),
                        });
                        panel.elo_picker_open = false;
                    }
                    if ui.button("Cancel").clicked() {
                        panel.elo_picker_open = false;
                    }
                });
            } else {
                if ui.button("Create Multiplayer Game").clicked() {
                    network.send(NetCommand::CreateGame {
                        game_type: GameType::Multiplayer,
                        elo_rating: None,
                    });
                }
                if ui.button("Play vs Computer").clicked() {
                    panel.elo_picker_open = true;
                }
            }

            ui.add_space(6.0);
            ui.horizontal(|ui| {
                ui.add(
                    egui::TextEdit::singleline(&mut panel.game_id_input)
                        .hint_text("Game ID")
                        .desired_width(170.0),
                );
                if ui.button("Join Game").clicked() {
                    let game_id = panel.game_id_input.trim().to_string();
                    if game_id.is_empty() {
                        notifications.push("Please enter a Game ID");
                    } else {
                        network.send(NetCommand::JoinGame { game_id });
                    }
                }
            });

            // === CURRENT GAME ===
            if let Some(game_id) = &session.game_id {
                ui.separator();
                egui::Grid::new("game_info").num_columns(2).show(ui, |ui| {
                    ui.label("Game ID:");
                    ui.add(egui::Label::new(game_id.as_str()).selectable(true));
                    ui.end_row();

                    ui.label("You play:");
                    ui.label(session.player_color.map(|c| c.title()).unwrap_or("-"));
                    ui.end_row();

                    if let (Some(GameType::VsComputer), Some(elo)) =
                        (session.game_type, session.elo_rating)
                    {
                        ui.label("Opponent:");
                        ui.label(format!("Computer ({} ELO)", elo));
                        ui.end_row();
                    }

                    ui.label("Turn:");
                    ui.label(session.status.current_turn.title());
                    ui.end_row();

                    ui.label("Status:");
                    ui.label(status_text(&session.status));
                    ui.end_row();
                });

                ui.add_space(6.0);
                let can_move = session.can_move();
                ui.horizontal(|ui| {
                    let response = ui.add_enabled(
                        can_move,
                        egui::TextEdit::singleline(&mut panel.move_input)
                            .hint_text("e2e4")
                            .desired_width(120.0),
                    );
                    let submitted = response.lost_focus()
                        && ui.input(|i| i.key_pressed(egui::Key::Enter));
                    let clicked = ui.add_enabled(can_move, egui::Button::new("Make Move")).clicked();
                    if can_move && (submitted || clicked) {
                        match normalize_move_input(&panel.move_input) {
                            Some(uci) => {
                                network.send(NetCommand::MakeMove(uci));
                                panel.move_input.clear();
                            }
                            None => notifications.push("Please enter a move (e.g., e2e4)"),
                        }
                    }
                });

                ui.horizontal(|ui| {
                    if ui.button("Export PGN").clicked() {
                        network.send(NetCommand::ExportPgn);
                    }
                    let resign = egui::Button::new(
                        egui::RichText::new("Resign").color(UiColors::DANGER),
                    );
                    if ui.add_enabled(session.can_resign(), resign).clicked() {
                        panel.confirm_resign = true;
                    }
                    if ui.button("Leave Game").clicked() {
                        network.send(NetCommand::Leave);
                    }
                });
            }

            // === BOARD VIEW ===
            ui.separator();
            let animating = transition.is_animating();
            if ui
                .add_enabled(!animating, egui::Button::new(toggle_label(shape.mountain)))
                .clicked()
            {
                toggles.write(ToggleBoardShape);
            }
            if animating {
                ui.label(egui::RichText::new("Animating...").color(UiColors::TEXT_SECONDARY));
            }

            // === MOVE HISTORY ===
            ui.separator();
            ui.label(egui::RichText::new("Move History").strong());
            egui::ScrollArea::vertical()
                .auto_shrink([false, true])
                .stick_to_bottom(true)
                .show(ui, |ui| {
                    egui::Grid::new("move_history")
                        .num_columns(3)
                        .striped(true)
                        .show(ui, |ui| {
                            for row in move_pairs(&session.move_history) {
                                ui.label(format!("{}.", row.number));
                                ui.label(row.white);
                                ui.label(row.black.unwrap_or_default());
                                ui.end_row();
                            }
                        });
                });
        });

    if panel.confirm_resign {
        let mut close = false;
        let response = egui::Modal::new(egui::Id::new("confirm_resign")).show(ctx, |ui| {
            ui.label("Are you sure you want to resign? This will end the game.");
            ui.add_space(8.0);
            ui.horizontal(|ui| {
                if ui.button("Resign").clicked() {
                    network.send(NetCommand::Resign);
                    close = true;
                }
                if ui.button("Cancel").clicked() {
                    close = true;
                }
            });
        });
        if close || response.should_close() {
            panel.confirm_resign = false;
        }
    }

    pointer_over_ui.0 = ctx.wants_pointer_input() || ctx.is_pointer_over_area();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_move_input() {
        assert_eq!(normalize_move_input("  E2E4 "), Some("e2e4".to_string()));
        assert_eq!(normalize_move_input("e7e8Q"), Some("e7e8q".to_string()));
        assert_eq!(normalize_move_input("   "), None);
    }

    #[test]
    fn test_toggle_label_follows_shape() {
        assert_eq!(toggle_label(true), "Switch to Flat Board");
        assert_eq!(toggle_label(false), "Switch to Mountain View");
    }

    #[test]
    fn test_default_elo_is_in_range() {
        let state = PanelState::default();
        assert!((MIN_ELO..=MAX_ELO).contains(&state.elo));
        assert!(!state.elo_picker_open);
    }
}
