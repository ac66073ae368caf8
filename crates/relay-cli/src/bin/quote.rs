use clap::Parser;
use serde_json::json;

use relay_skills::finance::QuoteClient;

/// Fetch a quote summary for a stock, ETF, or cryptocurrency.
#[derive(Parser)]
#[command(name = "quote")]
struct Args {
    /// Ticker symbol, e.g. AAPL or BTC-USD.
    symbol: String,
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
    let symbol = args.symbol.to_uppercase();

    match QuoteClient::new().summary(&symbol).await {
        Ok(summary) => {
            println!(
                "{}",
                serde_json::to_string_pretty(&summary).unwrap_or_default()
            );
        }
        Err(e) => {
            println!(
                "{}",
                json!({ "error": format!("Failed to fetch data for {symbol}: {e:#}") })
            );
            std::process::exit(1);
        }
    }
}
