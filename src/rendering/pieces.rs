//! Piece rendering from the session FEN
//!
//! Every occupied square gets a tapered base and a floating letter label.
//! Whenever the session position changes, all piece entities are despawned
//! and rebuilt.

use super::board::{square_position, BoardElevations};
use super::labels::WorldLabel;
use super::transition::advance_board_transition;
use crate::game::GameSession;
use bevy::prelude::*;
use shared::{BoardGrid, PlayerColor};

/// Height of the base centre above its square
pub const BASE_LIFT: f32 = 0.8;
/// Height of the letter label above its square
pub const LABEL_LIFT: f32 = 2.2;

/// Square a piece entity (base or label) belongs to
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardPiece {
    pub file: usize,
    pub row: usize,
}

/// Piece entities that track the session position and the square heights
pub struct PiecesPlugin;

impl Plugin for PiecesPlugin {
    fn build(&self, app: &mut App) {
        // Both systems read this frame's heights, never last frame's
        app.init_resource::<PieceAssets>().add_systems(
            Update,
            (rebuild_pieces, follow_square_heights).after(advance_board_transition),
        );
    }
}

#[derive(Resource)]
pub struct PieceAssets {
    pub base_mesh: Handle<Mesh>,
    pub white: Handle<StandardMaterial>,
    pub black: Handle<StandardMaterial>,
}

impl FromWorld for PieceAssets {
    fn from_world(world: &mut World) -> Self {
        let base_mesh = world.resource_mut::<Assets<Mesh>>().add(ConicalFrustum {
            radius_top: 0.4,
            radius_bottom: 0.5,
            height: 0.8,
        });
        let mut materials = world.resource_mut::<Assets<StandardMaterial>>();
        Self {
            base_mesh,
            white: materials.add(Color::srgb_u8(0xff, 0xff, 0xff)),
            black: materials.add(Color::srgb_u8(0x22, 0x22, 0x22)),
        }
    }
}

pub(crate) fn rebuild_pieces(
    mut commands: Commands,
    session: Res<GameSession>,
    assets: Res<PieceAssets>,
    elevations: Res<BoardElevations>,
    existing: Query<Entity, With<BoardPiece>>,
    mut shown_fen: Local<Option<String>>,
) {
    if shown_fen.as_deref() == Some(session.fen.as_str()) {
        return;
    }
    let grid = match BoardGrid::from_fen(&session.fen) {
        Ok(grid) => grid,
        Err(e) => {
            warn!("[PIECES] Keeping previous pieces: {}", e);
            *shown_fen = Some(session.fen.clone());
            return;
        }
    };

    for entity in existing.iter() {
        commands.entity(entity).despawn();
    }

    let mut count = 0;
    for (file, row, piece) in grid.pieces() {
        let xz = square_position(file, row);
        let elevation = elevations.get(file, row);
        let (material, label_color) = match piece.color {
            PlayerColor::White => (assets.white.clone(), Color::BLACK),
            PlayerColor::Black => (assets.black.clone(), Color::WHITE),
        };

        commands.spawn((
            Mesh3d(assets.base_mesh.clone()),
            MeshMaterial3d(material),
            Transform::from_xyz(xz.x, elevation + BASE_LIFT, xz.y),
            BoardPiece { file, row },
            Name::new(format!("Piece {}", piece.symbol())),
        ));
        commands.spawn((
            WorldLabel::bundle(
                piece.symbol().to_string(),
                Vec3::new(xz.x, elevation + LABEL_LIFT, xz.y),
                label_color,
            ),
            BoardPiece { file, row },
        ));
        count += 1;
    }

    debug!("[PIECES] Rebuilt {} pieces", count);
    *shown_fen = Some(session.fen.clone());
}

/// Keep bases and labels on their square while the board moves
pub(crate) fn follow_square_heights(
    elevations: Res<BoardElevations>,
    mut bases: Query<(&BoardPiece, &mut Transform), With<Mesh3d>>,
    mut labels: Query<(&BoardPiece, &mut WorldLabel)>,
) {
    if !elevations.is_changed() {
        return;
    }
    for (piece, mut transform) in bases.iter_mut() {
        transform.translation.y = elevations.get(piece.file, piece.row) + BASE_LIFT;
    }
    for (piece, mut label) in labels.iter_mut() {
        label.anchor.y = elevations.get(piece.file, piece.row) + LABEL_LIFT;
    }
}
