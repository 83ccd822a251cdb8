//! Orbit camera around the board centre
//!
//! - **Left drag**: orbit (ignored while the pointer is over the panel)
//! - **Mouse wheel**: zoom, eased towards the target distance
//!
//! Panning is not supported; the camera always looks at the origin.

use bevy::{
    input::mouse::{AccumulatedMouseMotion, AccumulatedMouseScroll, MouseScrollUnit},
    prelude::*,
};
use std::f32::consts::FRAC_PI_2;

pub const CAMERA_START: Vec3 = Vec3::new(0.0, 25.0, 35.0);
pub const CAMERA_FOV_DEGREES: f32 = 45.0;

/// Radians per mouse movement dot
pub const RADIANS_PER_DOT: f32 = 1.0 / 180.0;

/// Set by the UI each frame when egui wants the pointer
#[derive(Resource, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PointerOverUi(pub bool);

#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct OrbitCamera {
    pub radius: f32,
    pub target_radius: f32,
    pub min_radius: f32,
    pub max_radius: f32,
    /// Rotation around Y, 0 looks from +Z
    pub yaw: f32,
    /// Angle from the +Y axis; `π/2` is level with the board
    pub polar: f32,
    pub sensitivity: f32,
    /// Distance change per wheel line
    pub zoom_speed: f32,
    /// Exponential approach rate towards `target_radius`, per second
    pub damping: f32,
}

impl OrbitCamera {
    pub fn from_position(position: Vec3) -> Self {
        let radius = position.length().max(f32::EPSILON);
        Self {
            radius,
            target_radius: radius,
            min_radius: 15.0,
            max_radius: 60.0,
            yaw: position.x.atan2(position.z),
            polar: (position.y / radius).clamp(-1.0, 1.0).acos(),
            sensitivity: 1.0,
            zoom_speed: 2.0,
            damping: 8.0,
        }
    }
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self::from_position(CAMERA_START)
    }
}

/// Camera position for a distance and spherical angles around the origin
pub fn orbit_translation(radius: f32, yaw: f32, polar: f32) -> Vec3 {
    Vec3::new(
        radius * polar.sin() * yaw.sin(),
        radius * polar.cos(),
        radius * polar.sin() * yaw.cos(),
    )
}

pub(crate) fn spawn_camera(mut commands: Commands) {
    commands.spawn((
        Camera3d::default(),
        Projection::Perspective(PerspectiveProjection {
            fov: CAMERA_FOV_DEGREES.to_radians(),
            ..default()
        }),
        Transform::from_translation(CAMERA_START).looking_at(Vec3::ZERO, Vec3::Y),
        OrbitCamera::default(),
        Name::new("Orbit Camera"),
    ));
    info!("[CAMERA] Spawned at {:?}", CAMERA_START);
}

pub(crate) fn orbit_camera_input(
    mouse_button: Res<ButtonInput<MouseButton>>,
    mouse_motion: Res<AccumulatedMouseMotion>,
    mouse_scroll: Res<AccumulatedMouseScroll>,
    pointer_over_ui: Res<PointerOverUi>,
    mut cameras: Query<&mut OrbitCamera>,
) {
    if pointer_over_ui.0 {
        return;
    }

    let scroll = match mouse_scroll.unit {
        MouseScrollUnit::Line => mouse_scroll.delta.y,
        MouseScrollUnit::Pixel => mouse_scroll.delta.y / 40.0,
    };

    for mut camera in cameras.iter_mut() {
        if mouse_button.pressed(MouseButton::Left) && mouse_motion.delta != Vec2::ZERO {
            let step = RADIANS_PER_DOT * camera.sensitivity;
            camera.yaw -= mouse_motion.delta.x * step;
            // Never dip below the board plane
            camera.polar = (camera.polar - mouse_motion.delta.y * step).clamp(0.01, FRAC_PI_2);
        }
        if scroll != 0.0 {
            camera.target_radius = (camera.target_radius - scroll * camera.zoom_speed)
                .clamp(camera.min_radius, camera.max_radius);
        }
    }
}

pub(crate) fn apply_orbit_camera(
    time: Res<Time>,
    mut cameras: Query<(&mut Transform, &mut OrbitCamera)>,
) {
    for (mut transform, mut camera) in cameras.iter_mut() {
        let blend = 1.0 - (-camera.damping * time.delta_secs()).exp();
        camera.radius += (camera.target_radius - camera.radius) * blend;

        let translation = orbit_translation(camera.radius, camera.yaw, camera.polar);
        if translation != transform.translation {
            *transform = Transform::from_translation(translation).looking_at(Vec3::ZERO, Vec3::Y);
        }
    }
}
