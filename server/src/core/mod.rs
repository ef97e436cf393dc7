//! Process-level plumbing: CLI, configuration, constants, shutdown

pub mod cli;
pub mod config;
pub mod constants;
pub mod shutdown;

pub use crate::app::App;
pub use cli::{CliConfig, Commands};
pub use config::{AppConfig, ServerConfig};
pub use shutdown::ShutdownService;
