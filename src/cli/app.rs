use super::commands::{ConfigCommand, RequestArgs};
use super::config::Config;
use crate::network::Networking;
use crate::request::Verb;
use crate::response::CompletionResult;
use anyhow::{Context, Result};
use tokio::runtime::Handle;
use tracing::{debug, info};

/// Main application state
pub struct App {
    /// Application configuration
    pub config: Config,
}

impl App {
    /// Load configuration and apply command-line overrides
    pub fn new(base_url: Option<String>, timeout: Option<u64>) -> Result<Self> {
        let mut config =
            Config::load_or_create_default().context("Failed to initialize configuration")?;
        if let Some(base_url) = base_url {
            config.base_url = base_url;
        }
        if let Some(timeout) = timeout {
            config.timeout_secs = timeout;
        }
        Ok(Self { config })
    }

    pub fn with_config(config: Config) -> Self {
        Self { config }
    }

    /// Handle a request subcommand. Returns whether the request succeeded.
    pub async fn handle_request(&self, verb: Verb, args: &RequestArgs) -> Result<bool> {
        let networking = self
            .config
            .build_client(Handle::current())
            .context("Failed to create HTTP client")?;
        self.run_request(&networking, verb, args).await
    }

    /// Issue the request on `networking` and print the outcome.
    pub async fn run_request(&self, networking: &Networking, verb: Verb, args: &RequestArgs) -> Result<bool> {
        let parameters = args.parameters();
        let url = networking
            .url(verb, &args.path, &parameters)
            .map_err(|e| anyhow::anyhow!("Invalid request URL: {}", e))?;
        info!("{} {}", verb, url);

        let result = networking.fetch(verb, &args.path, &parameters).await;
        println!("{}", format_result(&result)?);
        Ok(result.is_success())
    }

    /// Handle the 'config' subcommands
    pub fn handle_config(&self, command: &ConfigCommand) -> Result<()> {
        match command {
            ConfigCommand::Path => {
                let path = Config::default_config_file().context("Failed to determine config path")?;
                println!("{}", path.display());
            }
            ConfigCommand::Show => {
                let content =
                    toml::to_string_pretty(&self.config).context("Failed to serialize configuration")?;
                print!("{}", content);
            }
            ConfigCommand::Init => {
                Config::default().save().context("Failed to write configuration")?;
                let path = Config::default_config_file().context("Failed to determine config path")?;
                debug!("Default configuration written");
                println!("Wrote default configuration to {}", path.display());
            }
        }
        Ok(())
    }
}

/// Render a completion for the terminal: status line, headers, then the
/// pretty-printed payload or the error.
pub fn format_result(result: &CompletionResult) -> Result<String> {
    let mut out = String::new();
    match result.status {
        Some(status) => out.push_str(&format!("Status: {}\n", status)),
        None => out.push_str("Status: -\n"),
    }
    for (name, value) in result.headers.iter() {
        out.push_str(&format!("{}: {}\n", name, value));
    }
    out.push('\n');

    match &result.result {
        Ok(payload) => {
            let body = serde_json::to_string_pretty(payload).context("Failed to format payload")?;
            out.push_str(&body);
        }
        Err(error) => {
            out.push_str(&format!("Error {}: {}", error.code, error.message));
        }
    }
    Ok(out)
}
