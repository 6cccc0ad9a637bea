use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Browse normalized movie/anime catalogs from the command line
#[derive(Parser)]
#[command(name = "streamdex")]
#[command(about = "Query configured catalog providers and print normalized JSON", long_about = None)]
pub struct Cli {
    /// Directory of provider `*.toml` configs
    #[arg(long, global = true)]
    pub providers: Option<PathBuf>,

    /// Fetch cache database URL (defaults to the user data directory)
    #[arg(long, global = true)]
    pub cache_db: Option<String>,

    /// Fetch straight from upstreams without the persistent cache
    #[arg(long, global = true)]
    pub no_cache: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List loaded providers
    Providers,
    /// Every home section of a provider
    Home {
        provider: String,
        #[arg(short, long, default_value_t = 1)]
        page: u32,
    },
    /// One page of a listing
    Browse {
        provider: String,
        /// Listing path or URL
        page_ref: String,
        #[arg(short, long, default_value_t = 1)]
        page: u32,
    },
    /// Search one provider, or all of them when none is given
    Search {
        query: String,
        #[arg(short, long)]
        provider: Option<String>,
    },
    /// Full detail record of a title
    Detail {
        provider: String,
        reference: String,
    },
    /// Stream mirrors of an episode reference
    Streams {
        provider: String,
        episode_ref: String,
    },
    /// Drop cached fetches, optionally only keys with a prefix
    ClearCache {
        #[arg(long)]
        prefix: Option<String>,
        /// Also drop expired entries and compact the database
        #[arg(long)]
        vacuum: bool,
    },
}
