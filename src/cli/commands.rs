use crate::request::{Parameters, Verb};
use clap::{Args, Parser, Subcommand};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "networking")]
#[command(about = "Issue JSON HTTP requests against a base URL")]
pub struct Cli {
    /// Base URL overriding the configured one
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Request timeout in seconds overriding the configured one
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Send a GET request
    Get(RequestArgs),
    /// Send a POST request with parameters as a JSON body
    Post(RequestArgs),
    /// Send a PUT request with parameters as a JSON body
    Put(RequestArgs),
    /// Send a PATCH request with parameters as a JSON body
    Patch(RequestArgs),
    /// Send a DELETE request
    Delete(RequestArgs),
    /// Configuration management commands
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

impl Commands {
    /// Verb and arguments for request subcommands.
    pub fn request(&self) -> Option<(Verb, &RequestArgs)> {
        match self {
            Commands::Get(args) => Some((Verb::Get, args)),
            Commands::Post(args) => Some((Verb::Post, args)),
            Commands::Put(args) => Some((Verb::Put, args)),
            Commands::Patch(args) => Some((Verb::Patch, args)),
            Commands::Delete(args) => Some((Verb::Delete, args)),
            Commands::Config { .. } => None,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct RequestArgs {
    /// Path relative to the base URL, or an absolute URL
    pub path: String,

    /// Request parameter as key=value; values that parse as JSON are sent as JSON
    #[arg(short = 'p', long = "param", value_parser = parse_parameter)]
    pub params: Vec<(String, Value)>,
}

impl RequestArgs {
    pub fn parameters(&self) -> Parameters {
        self.params.iter().cloned().collect()
    }
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show the configuration file path
    Path,
    /// Print the active configuration
    Show,
    /// Write the default configuration, replacing any existing file
    Init,
}

/// Parse `key=value`. `userId=25` yields a number, `name=Elvis` a string.
pub fn parse_parameter(raw: &str) -> Result<(String, Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{}'", raw))?;
    if key.is_empty() {
        return Err(format!("parameter '{}' has an empty key", raw));
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.to_string(), value))
}
