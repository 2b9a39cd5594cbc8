pub mod config;
mod error;
mod http_layers;
mod reviews;
pub mod server;
pub(self) mod session;
mod songs;
pub mod state;
mod views;

pub use config::ServerConfig;
pub use http_layers::*;
pub use server::{make_app, run_server};
pub use session::{Author, AUTHOR_HEADER};
pub use state::ServerState;
