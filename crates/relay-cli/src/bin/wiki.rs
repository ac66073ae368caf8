use clap::Parser;
use serde_json::json;

use relay_skills::wiki::WikiClient;

const SEARCH_LIMIT: usize = 10;

/// Search and fetch content from Wikipedia.
#[derive(Parser)]
#[command(name = "wiki")]
struct Args {
    /// Search term or page title.
    query: String,

    /// Operation mode: search for titles, get summary, or get full content.
    #[arg(long, default_value = "summary", value_parser = ["search", "summary", "full"])]
    mode: String,

    /// Number of sentences for summary mode.
    #[arg(long, default_value_t = 5)]
    sentences: usize,

    /// Language code.
    #[arg(long, default_value = "en")]
    lang: String,
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

    let client = WikiClient::new(&args.lang);
    let outcome = match args.mode.as_str() {
        "search" => client.search(&args.query, SEARCH_LIMIT).await,
        "full" => client.full(&args.query).await,
        _ => client.summary(&args.query, args.sentences).await,
    };

    let result = match outcome {
        Ok(doc) => doc,
        Err(e) => json!({
            "mode": args.mode,
            "title": args.query,
            "exists": false,
            "error": format!("{e:#}"),
        }),
    };

    println!(
        "{}",
        serde_json::to_string_pretty(&result).unwrap_or_default()
    );

    if result.get("error").is_some() {
        std::process::exit(1);
    }
}
