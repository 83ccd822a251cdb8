//! Mountain/flat board transition
//!
//! A toggle starts a fixed-length animation from whatever heights the board
//! has now to the other shape's heights. Toggles that arrive while an
//! animation is running are dropped. The [`BoardShape`] flag only flips when
//! the animation completes.

use super::board::{target_elevation, BoardElevations, BoardShape};
use bevy::prelude::*;

pub const TRANSITION_SECONDS: f32 = 1.5;

/// Request to animate to the other board shape
#[derive(Message, Debug, Clone, Copy, Default)]
pub struct ToggleBoardShape;

#[derive(Debug, Clone, PartialEq)]
struct ActiveTransition {
    elapsed: f32,
    from: [[f32; 8]; 8],
    to_mountain: bool,
}

#[derive(Resource, Debug, Clone, PartialEq)]
pub struct BoardTransition {
    pub duration: f32,
    active: Option<ActiveTransition>,
}

impl Default for BoardTransition {
    fn default() -> Self {
        Self {
            duration: TRANSITION_SECONDS,
            active: None,
        }
    }
}

impl BoardTransition {
    pub fn is_animating(&self) -> bool {
        self.active.is_some()
    }

    /// Linear progress in `0..=1`, if animating
    pub fn progress(&self) -> Option<f32> {
        self.active
            .as_ref()
            .map(|active| (active.elapsed / self.duration).clamp(0.0, 1.0))
    }
}

/// `4t³` for the first half, `1 - (-2t + 2)³ / 2` for the second
pub fn ease_in_out_cubic(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}

fn interpolate(from: &[[f32; 8]; 8], to_mountain: bool, eased: f32) -> [[f32; 8]; 8] {
    let mut heights = *from;
    for (file, column) in heights.iter_mut().enumerate() {
        for (row, height) in column.iter_mut().enumerate() {
            let target = target_elevation(file, row, to_mountain);
            *height = from[file][row] + (target - from[file][row]) * eased;
        }
    }
    heights
}

pub(crate) fn start_board_transition(
    mut toggles: MessageReader<ToggleBoardShape>,
    shape: Res<BoardShape>,
    elevations: Res<BoardElevations>,
    mut transition: ResMut<BoardTransition>,
) {
    for _ in toggles.read() {
        if transition.is_animating() {
            debug!("[BOARD] Toggle ignored while animating");
            continue;
        }
        let to_mountain = !shape.mountain;
        info!(
            "[BOARD] Animating to {} board",
            if to_mountain { "mountain" } else { "flat" }
        );
        transition.active = Some(ActiveTransition {
            elapsed: 0.0,
            from: elevations.0,
            to_mountain,
        });
    }
}

pub(crate) fn advance_board_transition(
    time: Res<Time>,
    mut transition: ResMut<BoardTransition>,
    mut elevations: ResMut<BoardElevations>,
    mut shape: ResMut<BoardShape>,
) {
    let duration = transition.duration;
    let Some(active) = transition.active.as_mut() else {
        return;
    };

    active.elapsed += time.delta_secs();
    let progress = (active.elapsed / duration).min(1.0);
    elevations.0 = interpolate(&active.from, active.to_mountain, ease_in_out_cubic(progress));

    if progress >= 1.0 {
        shape.mountain = active.to_mountain;
        // Land exactly on the targets
        *elevations = BoardElevations::for_shape(shape.mountain);
        transition.active = None;
        info!("[BOARD] Transition complete");
    }
}

/// Shape state, the toggle message and the animation systems
pub struct BoardTransitionPlugin;

impl Plugin for BoardTransitionPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<BoardShape>()
            .init_resource::<BoardElevations>()
            .init_resource::<BoardTransition>()
            .add_message::<ToggleBoardShape>()
            .add_systems(
                Update,
                (start_board_transition, advance_board_transition).chain(),
            );
    }
}
