pub mod config;
mod download_routes;
mod http_layers;
pub mod response;
pub mod server;
pub mod session;
pub mod state;
mod upload_routes;

pub use config::ServerConfig;
pub use http_layers::*;
pub use server::{make_app, run_server};
pub use session::{AllowListTokenValidator, TokenValidator, HEADER_ACCESS_TOKEN_KEY};
