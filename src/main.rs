use bevy::prelude::*;
use bevy::window::WindowResolution;
use bevy_egui::EguiPlugin;
use clap::Parser;

use chess3d::core::ClientConfig;
use chess3d::game::GamePlugin;
use chess3d::networking::NetworkingPlugin;
use chess3d::rendering::RenderingPlugin;
use chess3d::ui::UiPlugin;

const WINDOW_WIDTH: u32 = 1366;
const WINDOW_HEIGHT: u32 = 768;

fn main() {
    dotenvy::dotenv().ok();
    let config = ClientConfig::parse();

    let window = Window {
        title: "3D Chess".into(),
        resolution: WindowResolution::new(WINDOW_WIDTH, WINDOW_HEIGHT),
        ..default()
    };

    App::new()
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(window),
            ..default()
        }))
        .add_plugins(EguiPlugin::default())
        .add_plugins(NetworkingPlugin {
            server_url: config.server_url.clone(),
            download_dir: config.download_dir(),
        })
        .add_plugins((GamePlugin, RenderingPlugin, UiPlugin))
        .insert_resource(config)
        .run();
}
