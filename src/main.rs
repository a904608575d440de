//! CLI entry point for trendforge

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use trendforge::commands::search::SearchOptions;
use trendforge::TrendForge;

#[derive(Parser)]
#[command(name = "trendforge")]
#[command(version)]
#[command(about = "Browse, search and serve TrendForge markdown articles", long_about = None)]
struct Cli {
    /// Set the base directory (defaults to current directory)
    #[arg(short, long, global = true)]
    cwd: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List site information
    #[command(alias = "ls")]
    List {
        /// Type of content to list (article, category, tag, slug)
        #[arg(default_value = "article")]
        r#type: String,
    },

    /// Search articles by title, excerpt and tags
    Search {
        /// Text to look for; omit to list everything
        #[arg(default_value = "")]
        query: String,

        /// Only show articles in this category
        #[arg(short, long)]
        category: Option<String>,

        /// Page number, starting at 1
        #[arg(short, long, default_value = "1")]
        page: usize,

        /// Articles per page (defaults to per_page from _config.yml)
        #[arg(long)]
        page_size: Option<usize>,

        /// Print the result page as JSON
        #[arg(long)]
        json: bool,
    },

    /// Render a single article
    Show {
        /// Article slug (file name without .md)
        slug: String,

        /// Print the article record as JSON
        #[arg(long)]
        json: bool,
    },

    /// Start the JSON API server
    #[command(alias = "s")]
    Server {
        /// Port to listen on
        #[arg(short, long, default_value = "4000")]
        port: u16,

        /// IP address to bind to
        #[arg(short, long, default_value = "localhost")]
        ip: String,

        /// Disable watching the content directory
        #[arg(long)]
        r#static: bool,
    },

    /// Display version information
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.debug {
        "trendforge=debug,info"
    } else {
        "trendforge=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Determine base directory
    let base_dir = match cli.cwd {
        Some(dir) => dir,
        None => std::env::current_dir().context("Cannot determine current directory")?,
    };

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Commands::List { r#type } => {
            let forge = TrendForge::new(&base_dir)?;
            trendforge::commands::list::run(&forge, &r#type, &mut out)?;
        }

        Commands::Search {
            query,
            category,
            page,
            page_size,
            json,
        } => {
            let forge = TrendForge::new(&base_dir)?;
            let options = SearchOptions {
                query,
                category,
                page,
                page_size,
                json,
            };
            trendforge::commands::search::run(&forge, &options, &mut out)?;
        }

        Commands::Show { slug, json } => {
            let forge = TrendForge::new(&base_dir)?;
            trendforge::commands::show::run(&forge, &slug, json, &mut out)?;
        }

        Commands::Server { port, ip, r#static } => {
            drop(out);
            let forge = TrendForge::new(&base_dir)?;
            tracing::info!("Starting server at http://{}:{}", ip, port);
            trendforge::server::start(&forge, &ip, port, !r#static).await?;
        }

        Commands::Version => {
            println!("trendforge version {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
