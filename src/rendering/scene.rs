use bevy::prelude::*;

/// Pale green backdrop
pub const BACKGROUND: Color = Color::srgb(0.91, 0.96, 0.91);

pub(crate) fn spawn_lights(mut commands: Commands) {
    commands.spawn((
        DirectionalLight {
            illuminance: 12_000.0,
            shadows_enabled: true,
            ..default()
        },
        Transform::from_xyz(20.0, 30.0, 20.0).looking_at(Vec3::ZERO, Vec3::Y),
        Name::new("Key Light"),
    ));

    // Soft fill from the opposite side so shaded faces stay readable
    commands.spawn((
        DirectionalLight {
            illuminance: 3_000.0,
            shadows_enabled: false,
            ..default()
        },
        Transform::from_xyz(-15.0, 20.0, -25.0).looking_at(Vec3::ZERO, Vec3::Y),
        Name::new("Fill Light"),
    ));
}
