pub mod api;
pub mod config;
pub mod engine;
pub mod error;
pub mod game;
pub mod store;
pub mod ws;
