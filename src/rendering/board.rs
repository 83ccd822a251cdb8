//! Board creation and square heights
//!
//! Squares are addressed by `file` (0 = a, along X) and `row` (0 = rank 8,
//! along Z). The mountain shape raises concentric rings towards the centre;
//! the flat shape keeps every square at ground level.

use super::labels::WorldLabel;
use bevy::prelude::*;

/// Distance between neighbouring square centres
pub const SQUARE_PITCH: f32 = 2.0;
pub const SQUARE_SIZE: f32 = 1.9;
pub const SQUARE_THICKNESS: f32 = 0.3;

const LIGHT_SQUARE: Color = Color::srgba(0.941, 0.941, 0.941, 0.7);
const DARK_SQUARE: Color = Color::srgba(0.627, 0.627, 0.627, 0.7);

/// Coordinate labels sit this far from the centre, slightly raised
const LABEL_OFFSET: f32 = 10.0;
const LABEL_HEIGHT: f32 = 0.5;

#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardSquare {
    pub file: usize,
    pub row: usize,
}

impl BoardSquare {
    pub fn is_light(&self) -> bool {
        (self.file + self.row) % 2 == 0
    }
}

/// Shape the board currently rests in
#[derive(Resource, Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardShape {
    pub mountain: bool,
}

impl Default for BoardShape {
    fn default() -> Self {
        Self { mountain: true }
    }
}

/// Live height of every square, indexed `[file][row]`
///
/// Squares and pieces read their Y coordinate from here; the transition
/// system is the only writer once the board exists.
#[derive(Resource, Debug, Clone, PartialEq)]
pub struct BoardElevations(pub [[f32; 8]; 8]);

impl Default for BoardElevations {
    fn default() -> Self {
        Self::for_shape(BoardShape::default().mountain)
    }
}

impl BoardElevations {
    pub fn for_shape(mountain: bool) -> Self {
        let mut heights = [[0.0; 8]; 8];
        for (file, column) in heights.iter_mut().enumerate() {
            for (row, height) in column.iter_mut().enumerate() {
                *height = target_elevation(file, row, mountain);
            }
        }
        Self(heights)
    }

    pub fn get(&self, file: usize, row: usize) -> f32 {
        self.0[file][row]
    }
}

/// Centre of a square on the XZ plane
pub fn square_position(file: usize, row: usize) -> Vec2 {
    Vec2::new(
        (file as f32 - 3.5) * SQUARE_PITCH,
        (row as f32 - 3.5) * SQUARE_PITCH,
    )
}

/// Mountain height from the square's ring: 6, 4, 2 then 0 at the edge
pub fn ring_elevation(file: usize, row: usize) -> f32 {
    let distance = (file as f32 - 3.5).abs().max((row as f32 - 3.5).abs());
    if distance < 1.0 {
        6.0
    } else if distance < 2.0 {
        4.0
    } else if distance < 3.0 {
        2.0
    } else {
        0.0
    }
}

pub fn target_elevation(file: usize, row: usize, mountain: bool) -> f32 {
    if mountain {
        ring_elevation(file, row)
    } else {
        0.0
    }
}

pub(crate) fn create_board(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    elevations: Res<BoardElevations>,
) {
    let mesh = meshes.add(Cuboid::new(SQUARE_SIZE, SQUARE_THICKNESS, SQUARE_SIZE));
    let light = materials.add(StandardMaterial {
        base_color: LIGHT_SQUARE,
        alpha_mode: AlphaMode::Blend,
        ..default()
    });
    let dark = materials.add(StandardMaterial {
        base_color: DARK_SQUARE,
        alpha_mode: AlphaMode::Blend,
        ..default()
    });

    let squares: Vec<_> = (0..8)
        .flat_map(|file| (0..8).map(move |row| BoardSquare { file, row }))
        .map(|square| {
            let xz = square_position(square.file, square.row);
            let material = if square.is_light() { light.clone() } else { dark.clone() };
            let name = format!(
                "Square {}{}",
                (b'a' + square.file as u8) as char,
                8 - square.row
            );
            (
                Mesh3d(mesh.clone()),
                MeshMaterial3d(material),
                Transform::from_xyz(xz.x, elevations.get(square.file, square.row), xz.y),
                square,
                Name::new(name),
            )
        })
        .collect();
    for square_bundle in squares {
        commands.spawn(square_bundle);
    }

    info!("[BOARD] Spawned 64 squares");
}

/// Files a-h on both Z edges, ranks 8..1 on both X edges
pub(crate) fn create_coordinate_labels(mut commands: Commands) {
    for i in 0..8 {
        let along = square_position(i, i).x;
        let file = ((b'a' + i as u8) as char).to_string();
        let rank = (8 - i).to_string();

        for z in [-LABEL_OFFSET, LABEL_OFFSET] {
            commands.spawn(WorldLabel::bundle(
                file.clone(),
                Vec3::new(along, LABEL_HEIGHT, z),
                Color::WHITE,
            ));
        }
        for x in [-LABEL_OFFSET, LABEL_OFFSET] {
            commands.spawn(WorldLabel::bundle(
                rank.clone(),
                Vec3::new(x, LABEL_HEIGHT, along),
                Color::WHITE,
            ));
        }
    }
}

pub(crate) fn sync_square_heights(
    elevations: Res<BoardElevations>,
    mut squares: Query<(&BoardSquare, &mut Transform)>,
) {
    if !elevations.is_changed() {
        return;
    }
    for (square, mut transform) in squares.iter_mut() {
        transform.translation.y = elevations.get(square.file, square.row);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ring_counts() {
        let mut counts = std::collections::BTreeMap::new();
        for file in 0..8 {
            for row in 0..8 {
                *counts.entry(ring_elevation(file, row) as i32).or_insert(0) += 1;
            }
        }
        assert_eq!(counts.get(&6), Some(&4));
        assert_eq!(counts.get(&4), Some(&12));
        assert_eq!(counts.get(&2), Some(&20));
        assert_eq!(counts.get(&0), Some(&28));
    }

    #[test]
    fn test_square_positions_are_centred() {
        assert_eq!(square_position(0, 0), Vec2::new(-7.0, -7.0));
        assert_eq!(square_position(7, 7), Vec2::new(7.0, 7.0));
        assert_eq!(square_position(4, 3), Vec2::new(1.0, -1.0));
    }

    #[test]
    fn test_flat_shape_is_level() {
        let flat = BoardElevations::for_shape(false);
        assert!(flat.0.iter().flatten().all(|h| *h == 0.0));
        assert_eq!(BoardElevations::default().get(3, 4), 6.0);
    }

    #[test]
    fn test_a8_is_light() {
        assert!(BoardSquare { file: 0, row: 0 }.is_light());
        assert!(!BoardSquare { file: 1, row: 0 }.is_light());
    }
}
