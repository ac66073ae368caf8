use anyhow::{anyhow, Result};
use chrono::{Duration, NaiveDate, Utc};
use serde::Serialize;
use serde_json::Value;

const CHART: &str = "https://query1.finance.yahoo.com/v8/finance/chart";

/// One trading day from the chart series.
#[derive(Debug, Clone, Copy)]
pub struct Candle {
    pub date: NaiveDate,
    pub open: Option<f64>,
    pub close: Option<f64>,
}

/// Reshaped quote data printed by the `quote` CLI.
#[derive(Debug, Clone, Serialize)]
pub struct QuoteSummary {
    pub symbol: String,
    pub current_price: f64,
    pub change_vs_open_pct: Option<f64>,
    pub last_close: f64,
    pub last_week_close: Option<f64>,
    pub last_week_change_pct: Option<f64>,
    pub three_month_change_pct: Option<f64>,
    pub one_year_change_pct: Option<f64>,
}

pub struct QuoteClient {
    http: reqwest::Client,
}

impl QuoteClient {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::builder()
                .user_agent("relay-quote/0.1")
                .build()
                .unwrap_or_default(),
        }
    }

    /// Fetch a year of daily candles for `symbol` and reduce them to a summary.
    pub async fn summary(&self, symbol: &str) -> Result<QuoteSummary> {
        let url = format!("{CHART}/{}?range=1y&interval=1d", urlencoding::encode(symbol));
        let body: Value = self
            .http
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        let (market_price, candles) = parse_chart(&body)?;
        summarize(symbol, market_price, &candles, Utc::now().date_naive())
    }
}

impl Default for QuoteClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Extract the regular market price and the daily candle series from a
/// chart API response.
pub fn parse_chart(body: &Value) -> Result<(Option<f64>, Vec<Candle>)> {
    let result = body
        .pointer("/chart/result/0")
        .ok_or_else(|| anyhow!("chart response has no result"))?;

    let market_price = result
        .pointer("/meta/regularMarketPrice")
        .and_then(Value::as_f64);

    let timestamps: Vec<i64> = result
        .get("timestamp")
        .and_then(Value::as_array)
        .map(|a| a.iter().filter_map(Value::as_i64).collect())
        .unwrap_or_default();

    let series = |field: &str| -> Vec<Option<f64>> {
        result
            .pointer(&format!("/indicators/quote/0/{field}"))
            .and_then(Value::as_array)
            .map(|a| a.iter().map(Value::as_f64).collect())
            .unwrap_or_default()
    };
    let opens = series("open");
    let closes = series("close");

    let candles = timestamps
        .iter()
        .enumerate()
        .filter_map(|(i, ts)| {
            let date = chrono::DateTime::from_timestamp(*ts, 0)?.date_naive();
            Some(Candle {
                date,
                open: opens.get(i).copied().flatten(),
                close: closes.get(i).copied().flatten(),
            })
        })
        .collect();

    Ok((market_price, candles))
}

/// Reduce a candle series to the summary shape.
///
/// Reference prices one week / three months / one year back are the close on
/// the nearest trading day at or before the target date (at most seven days
/// earlier); when the series does not reach that far the corresponding
/// change fields are null.
pub fn summarize(
    symbol: &str,
    market_price: Option<f64>,
    candles: &[Candle],
    today: NaiveDate,
) -> Result<QuoteSummary> {
    let closes: Vec<(NaiveDate, f64)> = candles
        .iter()
        .filter_map(|c| c.close.map(|close| (c.date, close)))
        .collect();

    let current_price = market_price
        .or_else(|| closes.last().map(|(_, c)| *c))
        .ok_or_else(|| anyhow!("could not determine current price for {symbol}"))?;

    let last_close = if closes.len() >= 2 {
        closes[closes.len() - 2].1
    } else {
        current_price
    };

    let todays_open = candles.iter().rev().find_map(|c| c.open);
    let change_vs_open_pct = todays_open.and_then(|open| change_pct(current_price, open));

    let last_week_close = close_on_or_before(candles, today - Duration::days(7));
    let three_month_close = close_on_or_before(candles, today - Duration::days(90));
    let one_year_close = close_on_or_before(candles, today - Duration::days(365));

    Ok(QuoteSummary {
        symbol: symbol.to_string(),
        current_price: round2(current_price),
        change_vs_open_pct: change_vs_open_pct.map(round2),
        last_close: round2(last_close),
        last_week_close: last_week_close.map(round2),
        last_week_change_pct: last_week_close
            .and_then(|p| change_pct(current_price, p))
            .map(round2),
        three_month_change_pct: three_month_close
            .and_then(|p| change_pct(current_price, p))
            .map(round2),
        one_year_change_pct: one_year_close
            .and_then(|p| change_pct(current_price, p))
            .map(round2),
    })
}

/// Close on the nearest trading day at or before `target`, looking back at
/// most seven days (markets close on weekends and holidays).
pub fn close_on_or_before(candles: &[Candle], target: NaiveDate) -> Option<f64> {
    let floor = target - Duration::days(7);
    candles
        .iter()
        .filter(|c| c.date <= target && c.date >= floor)
        .filter_map(|c| c.close.map(|close| (c.date, close)))
        .max_by_key(|(date, _)| *date)
        .map(|(_, close)| close)
}

/// Percentage change from `previous` to `current`; None when the reference
/// price is zero.
pub fn change_pct(current: f64, previous: f64) -> Option<f64> {
    if previous == 0.0 {
        return None;
    }
    Some((current - previous) / previous * 100.0)
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
