mod cli;
mod demo;

use addonbox::Addon;
use addonbox::config::AddonConfig;
use clap::Parser;
use cli::{Cli, Commands, ServeArgs};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve(args) => serve(args).await?,
    }

    Ok(())
}

async fn serve(args: ServeArgs) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut config = match args.config {
        Some(path) => AddonConfig::load_from_path(path)?,
        None => AddonConfig::load()?,
    };
    demo::apply_cache_defaults(&mut config);

    // RUST_LOG wins over logging.level
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let address = args.address.unwrap_or(config.server.bind_addr);

    let addon = Addon::builder(demo::manifest())
        .catalog("movie", demo::movie_catalog)
        .stream("movie", demo::movie_streams)
        .config(config)
        .build()?;

    addon.run_on(address).await?;

    Ok(())
}
