mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use streamdex::config::default_providers_dir;
use streamdex::Catalog;

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut catalog = if cli.no_cache {
        Catalog::uncached()?
    } else {
        Catalog::connect(cli.cache_db.as_deref(), true).await?
    };

    let dir = cli
        .providers
        .or_else(default_providers_dir)
        .context("no --providers directory given and no config directory available")?;
    catalog.load_providers_from_directory(&dir)?;

    match cli.command {
        Commands::Providers => print_json(&catalog.list_providers())?,
        Commands::Home { provider, page } => print_json(&catalog.home(&provider, page).await)?,
        Commands::Browse { provider, page_ref, page } => {
            print_json(&catalog.browse(&provider, &page_ref, page).await)?
        }
        Commands::Search { query, provider: Some(provider) } => {
            print_json(&catalog.search(&provider, &query).await)?
        }
        Commands::Search { query, provider: None } => {
            print_json(&catalog.search_all(&query).await)?
        }
        Commands::Detail { provider, reference } => {
            print_json(&catalog.load_detail(&provider, &reference).await)?
        }
        Commands::Streams { provider, episode_ref } => {
            print_json(&catalog.resolve_streams(&provider, &episode_ref).await)?
        }
        Commands::ClearCache { prefix, vacuum } => {
            let removed = catalog.clear_cache_prefix(prefix.as_deref()).await?;
            if vacuum {
                catalog.purge_expired().await?;
                catalog.vacuum_db().await?;
            }
            eprintln!("Removed {removed} cached entries");
        }
    }
    Ok(())
}
