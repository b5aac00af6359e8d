use anyhow::Context;
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;

use gleaner::api::create_router;
use gleaner::config::Config;
use gleaner::pipeline::Pipeline;
use gleaner::tokens::Truncator;

#[derive(Debug, Parser)]
#[command(version, about = "Search the web and extract the top result pages as text")]
struct Cli {
    /// Address to serve on; overrides GLEANER_BIND_ADDR.
    #[arg(long)]
    bind: Option<SocketAddr>,

    /// Run a single query, print the report and exit.
    #[arg(long)]
    query: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing subscriber (handles both tracing and log crate)
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(true)
        .init();

    let cli = Cli::parse();
    let mut config = Config::from_env();
    if let Some(bind) = cli.bind {
        config.bind_addr = bind;
    }
    if config.serper_api_key.is_none() {
        tracing::warn!("SERPER_API_KEY is not set; every search will come back empty");
    }
    if config.scraper_auth_header.is_none() {
        tracing::warn!("SCRAPER_AUTH_HEADER is not set; every page fetch will come back empty");
    }

    let truncator = Truncator::tiktoken(config.max_tokens_per_page);
    let bind_addr = config.bind_addr;
    let pipeline = Arc::new(Pipeline::new(config, truncator));

    if let Some(query) = cli.query {
        println!("{}", pipeline.search_and_extract(&query).await);
        return Ok(());
    }

    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;
    tracing::info!("listening on {}", bind_addr);
    axum::serve(listener, create_router(pipeline))
        .await
        .context("server error")?;
    Ok(())
}
