use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use eddy::app::AppContext;
use eddy::cli::{commands, Cli, Commands};
use eddy::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let ctx = AppContext::new(config)?;

    commands::initialize(&ctx).await?;

    match cli.command {
        Commands::Pages => commands::list_pages(&ctx)?,
        Commands::Feeds { page } => commands::list_feeds(&ctx, page)?,
        Commands::Items { page, feed, refresh } => {
            commands::list_items(&ctx, page, feed, refresh).await?
        }
        Commands::Read { page, feed, item } => commands::read_item(&ctx, page, feed, item)?,
        Commands::Search { page, feed, query } => commands::search(&ctx, page, feed, &query)?,
        Commands::Hide { page, index } => commands::set_visibility(&ctx, page, index, false)?,
        Commands::Show { page, index } => commands::set_visibility(&ctx, page, index, true)?,
    }

    ctx.service.persist_cache()?;
    Ok(())
}
