// Quote-summary math over canned candle series (no network).

use chrono::NaiveDate;
use serde_json::json;

use relay_skills::finance::{
    change_pct, close_on_or_before, parse_chart, summarize, Candle,
};

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn candle(date: NaiveDate, open: Option<f64>, close: Option<f64>) -> Candle {
    Candle { date, open, close }
}

#[test]
fn summarize_computes_all_change_fields() {
    let today = day(2026, 6, 12);
    let candles = vec![
        candle(day(2025, 6, 10), None, Some(55.0)),  // one year back
        candle(day(2026, 3, 13), None, Some(80.0)),  // ~three months back
        candle(day(2026, 6, 5), None, Some(90.0)),   // one week back
        candle(day(2026, 6, 11), None, Some(105.0)), // previous close
        candle(day(2026, 6, 12), Some(100.0), Some(108.0)),
    ];

    let summary = summarize("TEST", Some(110.0), &candles, today).unwrap();

    assert_eq!(summary.symbol, "TEST");
    assert_eq!(summary.current_price, 110.0);
    // (110 - 100) / 100
    assert_eq!(summary.change_vs_open_pct, Some(10.0));
    assert_eq!(summary.last_close, 105.0);
    assert_eq!(summary.last_week_close, Some(90.0));
    // (110 - 90) / 90 = 22.22...
    assert_eq!(summary.last_week_change_pct, Some(22.22));
    // (110 - 80) / 80
    assert_eq!(summary.three_month_change_pct, Some(37.5));
    // (110 - 55) / 55
    assert_eq!(summary.one_year_change_pct, Some(100.0));
}

#[test]
fn summarize_short_history_leaves_fields_null() {
    let today = day(2026, 6, 12);
    let candles = vec![
        candle(day(2026, 6, 11), None, Some(105.0)),
        candle(day(2026, 6, 12), Some(100.0), Some(108.0)),
    ];

    let summary = summarize("NEW", Some(110.0), &candles, today).unwrap();

    assert_eq!(summary.three_month_change_pct, None);
    assert_eq!(summary.one_year_change_pct, None);
}

#[test]
fn summarize_falls_back_to_last_close_when_meta_price_missing() {
    let today = day(2026, 6, 12);
    let candles = vec![
        candle(day(2026, 6, 11), None, Some(105.0)),
        candle(day(2026, 6, 12), Some(100.0), Some(108.0)),
    ];

    let summary = summarize("TEST", None, &candles, today).unwrap();
    assert_eq!(summary.current_price, 108.0);
    assert_eq!(summary.last_close, 105.0);
}

#[test]
fn summarize_with_no_prices_is_an_error() {
    let today = day(2026, 6, 12);
    assert!(summarize("EMPTY", None, &[], today).is_err());
}

#[test]
fn summarize_single_close_uses_it_for_last_close() {
    let today = day(2026, 6, 12);
    let candles = vec![candle(day(2026, 6, 12), None, Some(42.0))];

    let summary = summarize("ONE", None, &candles, today).unwrap();
    assert_eq!(summary.current_price, 42.0);
    assert_eq!(summary.last_close, 42.0);
}

#[test]
fn close_on_or_before_picks_nearest_trading_day() {
    // Target is a Sunday; the nearest close is the preceding Friday.
    let candles = vec![
        candle(day(2026, 6, 4), None, Some(88.0)),
        candle(day(2026, 6, 5), None, Some(90.0)),
    ];
    assert_eq!(close_on_or_before(&candles, day(2026, 6, 7)), Some(90.0));
}

#[test]
fn close_on_or_before_respects_seven_day_lookback() {
    let candles = vec![candle(day(2026, 5, 20), None, Some(70.0))];
    // More than seven days before the target → no reference price.
    assert_eq!(close_on_or_before(&candles, day(2026, 6, 7)), None);
}

#[test]
fn change_pct_guards_division_by_zero() {
    assert_eq!(change_pct(100.0, 0.0), None);
    let pct = change_pct(110.0, 100.0).unwrap();
    assert!((pct - 10.0).abs() < 1e-9);
}

#[test]
fn parse_chart_extracts_meta_price_and_candles() {
    // 2026-06-11T00:00:00Z and 2026-06-12T00:00:00Z
    let body = json!({
        "chart": {
            "result": [{
                "meta": { "regularMarketPrice": 110.25 },
                "timestamp": [1781136000, 1781222400],
                "indicators": {
                    "quote": [{
                        "open": [100.0, 101.5],
                        "close": [105.0, null]
                    }]
                }
            }],
            "error": null
        }
    });

    let (price, candles) = parse_chart(&body).unwrap();
    assert_eq!(price, Some(110.25));
    assert_eq!(candles.len(), 2);
    assert_eq!(candles[0].close, Some(105.0));
    assert_eq!(candles[0].open, Some(100.0));
    assert_eq!(candles[1].close, None);
    assert!(candles[1].date > candles[0].date);
}

#[test]
fn parse_chart_without_result_is_an_error() {
    let body = json!({ "chart": { "result": null, "error": { "code": "Not Found" } } });
    assert!(parse_chart(&body).is_err());
}

#[test]
fn summarize_rounds_to_two_decimals() {
    let today = day(2026, 6, 12);
    let candles = vec![
        candle(day(2026, 6, 11), None, Some(3.0)),
        candle(day(2026, 6, 12), Some(3.0), Some(3.333_333)),
    ];

    let summary = summarize("RND", None, &candles, today).unwrap();
    assert_eq!(summary.current_price, 3.33);
    // (3.333333 - 3) / 3 * 100 = 11.11...
    assert_eq!(summary.change_vs_open_pct, Some(11.11));
}
