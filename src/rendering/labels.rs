//! Screen-space text pinned to points in the world
//!
//! Each label is an absolutely positioned UI text node. Once per frame its
//! anchor is projected through the 3D camera and the node is moved there.

use bevy::prelude::*;

const LABEL_FONT_SIZE: f32 = 22.0;

#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct WorldLabel {
    pub anchor: Vec3,
}

impl WorldLabel {
    pub fn bundle(
        text: impl Into<String>,
        anchor: Vec3,
        color: Color,
    ) -> (WorldLabel, Text, TextFont, TextColor, Node, Visibility) {
        (
            WorldLabel { anchor },
            Text::new(text),
            TextFont {
                font_size: LABEL_FONT_SIZE,
                ..default()
            },
            TextColor(color),
            Node {
                position_type: PositionType::Absolute,
                ..default()
            },
            Visibility::Hidden,
        )
    }
}

/// Rough top-left offset that centres a one or two character label
fn centring_offset() -> Vec2 {
    Vec2::new(LABEL_FONT_SIZE * 0.3, LABEL_FONT_SIZE * 0.6)
}

pub(crate) fn position_world_labels(
    cameras: Query<(&Camera, &GlobalTransform), With<Camera3d>>,
    mut labels: Query<(&WorldLabel, &mut Node, &mut Visibility)>,
) {
    let Ok((camera, camera_transform)) = cameras.single() else {
        return;
    };

    for (label, mut node, mut visibility) in labels.iter_mut() {
        match camera.world_to_viewport(camera_transform, label.anchor) {
            Ok(screen) => {
                let top_left = screen - centring_offset();
                node.left = Val::Px(top_left.x);
                node.top = Val::Px(top_left.y);
                *visibility = Visibility::Inherited;
            }
            // Behind the camera or outside the viewport
            Err(_) => *visibility = Visibility::Hidden,
        }
    }
}
