//! SongPin server library
//!
//! Members pin songs to places and collect pins into playlists. This crate
//! holds the pin engine, its SQLite persistence, token authentication and the
//! HTTP layer.

pub mod auth;
pub mod catalog;
pub mod config;
pub mod error;
pub mod member;
pub mod pin;
pub mod place;
pub mod playlist;
pub mod server;
pub mod sqlite_persistence;
pub mod store;

// Re-export commonly used types for convenience
pub use error::{SongPinError, SongPinResult};
pub use pin::{EngineSettings, PinEngine};
pub use server::{run_server, RequestsLoggingLevel};
pub use store::SongPinStore;
