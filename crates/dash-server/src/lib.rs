//! Wiring for the code checker and trading dashboard server.
//!
//! - `config`: TOML configuration with env and CLI overrides
//! - `app`: HTTP router assembly (routes, static files, CORS)

pub mod app;
pub mod config;

pub use app::build_app;
pub use config::ServerConfig;
