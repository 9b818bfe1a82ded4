pub mod app;
pub mod commands;
pub mod config;

pub use app::{format_result, App};
pub use commands::{parse_parameter, Cli, Commands, ConfigCommand, RequestArgs};
pub use config::Config;
