//! Rendering module - the 3D mountain board
//!
//! # Architecture
//!
//! - `board` - 64 translucent square boxes, ring elevations, coordinate labels
//! - `transition` - eased animation between the mountain and flat shapes
//! - `pieces` - piece bases and letter labels rebuilt from the session FEN
//! - `labels` - world-anchored screen-space text
//! - `camera` - orbit camera with damped zoom
//! - `scene` - background colour and lights
//!
//! [`BoardElevations`] is the single source of square heights. Squares,
//! piece bases and labels all follow it, so the transition only has to
//! write one resource.

pub mod board;
pub mod camera;
pub mod labels;
pub mod pieces;
pub mod scene;
pub mod transition;

pub use board::{
    ring_elevation, square_position, target_elevation, BoardElevations, BoardShape, BoardSquare,
};
pub use camera::{orbit_translation, OrbitCamera, PointerOverUi};
pub use labels::WorldLabel;
pub use pieces::{BoardPiece, PieceAssets, PiecesPlugin};
pub use transition::{ease_in_out_cubic, BoardTransition, BoardTransitionPlugin, ToggleBoardShape};

use bevy::prelude::*;

pub struct RenderingPlugin;

impl Plugin for RenderingPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins((BoardTransitionPlugin, PiecesPlugin))
            .insert_resource(ClearColor(scene::BACKGROUND))
            .init_resource::<PointerOverUi>()
            .register_type::<OrbitCamera>()
            .add_systems(
                Startup,
                (
                    camera::spawn_camera,
                    scene::spawn_lights,
                    board::create_board,
                    board::create_coordinate_labels,
                ),
            )
            .add_systems(
                Update,
                (
                    (camera::orbit_camera_input, camera::apply_orbit_camera).chain(),
                    board::sync_square_heights.after(transition::advance_board_transition),
                ),
            )
            .add_systems(
                PostUpdate,
                labels::position_world_labels.after(bevy::transform::TransformSystems::Propagate),
            );
    }
}
