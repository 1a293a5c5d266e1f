pub mod config;
pub mod handlers;
pub mod logging;
pub mod server;
pub mod state;

pub use config::ServerConfig;
pub use server::{configure, run_server};
pub use state::AppState;
