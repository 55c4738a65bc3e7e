pub mod config;
mod http_layers;
pub mod server;
mod stats_routes;
pub mod state;

pub use config::ServerConfig;
pub use http_layers::*;
pub use server::{make_app, run_server};
pub(self) use stats_routes::make_stats_routes;
