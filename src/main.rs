use anyhow::Result;
use clap::Parser;
use networking::cli::{App, Cli, Commands};
use tracing::error;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("networking=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let app = App::new(cli.base_url.clone(), cli.timeout)?;

    if let Commands::Config { command } = &cli.command {
        return app.handle_config(command);
    }

    if let Some((verb, args)) = cli.command.request() {
        let succeeded = app.handle_request(verb, args).await?;
        if !succeeded {
            error!("{} {} failed", verb, args.path);
            std::process::exit(1);
        }
    }

    Ok(())
}
