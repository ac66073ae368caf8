use clap::Parser;
use tracing::{error, warn};

use relay_skills::search::{SearchClient, SearchOptions, SearchResponse};

/// Search the web using DuckDuckGo.
#[derive(Parser)]
#[command(name = "websearch")]
struct Args {
    /// Search query string.
    query: String,

    /// Maximum number of results to return (capped at 10).
    #[arg(long, default_value_t = 5)]
    max_results: usize,

    /// Filter results by time: d=day, w=week, m=month, y=year.
    #[arg(long, value_parser = ["d", "w", "m", "y"])]
    time_range: Option<String>,

    /// Search news instead of general web.
    #[arg(long)]
    news: bool,

    /// Region code for localized results.
    #[arg(long, default_value = "us-en")]
    region: String,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "relay=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    if args.query.trim().is_empty() {
        eprintln!("Error: Query cannot be empty");
        std::process::exit(1);
    }

    let opts = SearchOptions {
        max_results: args.max_results,
        time_range: args.time_range.clone(),
        region: args.region.clone(),
        news: args.news,
    };

    let output = match SearchClient::new().search(&args.query, &opts).await {
        Ok(response) => response,
        Err(e) => {
            // Transport errors surface on stderr; the document stays well-formed.
            error!("search failed: {e:#}");
            SearchResponse {
                results: Vec::new(),
                query: args.query.clone(),
                result_count: 0,
            }
        }
    };

    println!(
        "{}",
        serde_json::to_string_pretty(&output).unwrap_or_default()
    );

    if output.result_count == 0 {
        warn!("no results found");
    }
}
