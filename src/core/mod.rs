//! Core module - client configuration
//!
//! - [`ClientConfig`] - server address and download directory, read from the
//!   command line and environment, inserted as a resource at startup

pub mod config;

pub use config::ClientConfig;
