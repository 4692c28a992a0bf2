pub mod config;
mod http_layers;
pub mod metrics;
mod pin_routes;
mod place_routes;
mod playlist_routes;
pub mod server;
pub(self) mod session;
pub mod state;

pub use config::ServerConfig;
pub use http_layers::*;
pub(self) use pin_routes::make_pin_routes;
pub(self) use place_routes::make_place_routes;
pub(self) use playlist_routes::make_playlist_routes;
pub use server::{make_app, run_server};
