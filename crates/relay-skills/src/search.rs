use anyhow::Result;
use regex::Regex;
use serde::Serialize;
use tracing::debug;

const HTML_ENDPOINT: &str = "https://html.duckduckgo.com/html/";
/// Result count is capped regardless of what the caller asks for.
pub const MAX_RESULTS: usize = 10;

#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

/// Document printed by the `websearch` CLI.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    pub results: Vec<SearchResult>,
    pub query: String,
    pub result_count: usize,
}

#[derive(Debug, Clone)]
pub struct SearchOptions {
    pub max_results: usize,
    /// Time filter: d=day, w=week, m=month, y=year.
    pub time_range: Option<String>,
    /// Region code for localized results, e.g. "us-en".
    pub region: String,
    /// Search the news vertical instead of general web.
    pub news: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            max_results: 5,
            time_range: None,
            region: "us-en".to_string(),
            news: false,
        }
    }
}

pub struct SearchClient {
    http: reqwest::Client,
}

impl SearchClient {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::builder()
                .user_agent("Mozilla/5.0 (compatible; relay-websearch/0.1)")
                .build()
                .unwrap_or_default(),
        }
    }

    /// Query DuckDuckGo's HTML endpoint and extract organic results.
    pub async fn search(&self, query: &str, opts: &SearchOptions) -> Result<SearchResponse> {
        let mut form: Vec<(&str, String)> =
            vec![("q", query.to_string()), ("kl", opts.region.clone())];
        if let Some(df) = &opts.time_range {
            form.push(("df", df.clone()));
        }
        if opts.news {
            form.push(("ia", "news".to_string()));
            form.push(("iar", "news".to_string()));
        }

        let html = self
            .http
            .post(HTML_ENDPOINT)
            .form(&form)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let results = parse_results(&html, opts.max_results.min(MAX_RESULTS));
        debug!(query, count = results.len(), "search done");
        Ok(SearchResponse {
            result_count: results.len(),
            results,
            query: query.to_string(),
        })
    }
}

impl Default for SearchClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Extract up to `max` results from a DuckDuckGo HTML results page.
pub fn parse_results(html: &str, max: usize) -> Vec<SearchResult> {
    let Ok(anchor_re) = Regex::new(r#"(?s)<a\b([^>]*class="result__a"[^>]*)>(.*?)</a>"#) else {
        return Vec::new();
    };
    let Ok(snippet_re) = Regex::new(r#"(?s)<a\b[^>]*class="result__snippet"[^>]*>(.*?)</a>"#)
    else {
        return Vec::new();
    };
    let Ok(href_re) = Regex::new(r#"href="([^"]+)""#) else {
        return Vec::new();
    };

    let snippets: Vec<String> = snippet_re
        .captures_iter(html)
        .map(|c| clean_text(&c[1]))
        .collect();

    anchor_re
        .captures_iter(html)
        .take(max)
        .enumerate()
        .filter_map(|(i, c)| {
            let href = href_re.captures(&c[1]).map(|h| h[1].to_string())?;
            Some(SearchResult {
                title: clean_text(&c[2]),
                url: clean_url(&href),
                snippet: snippets.get(i).cloned().unwrap_or_default(),
            })
        })
        .collect()
}

/// Strip markup and decode the handful of entities DuckDuckGo emits.
fn clean_text(fragment: &str) -> String {
    let Ok(tag_re) = Regex::new(r"<[^>]+>") else {
        return fragment.to_string();
    };
    let text = tag_re.replace_all(fragment, "");
    decode_entities(text.trim())
}

fn decode_entities(text: &str) -> String {
    text.replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#x27;", "'")
        .replace("&#39;", "'")
        .replace("&nbsp;", " ")
}

/// Resolve DuckDuckGo's redirect wrapper to the destination URL.
///
/// Result hrefs look like `//duckduckgo.com/l/?uddg=<encoded>&rut=...`; the
/// real target is the percent-encoded `uddg` parameter.
fn clean_url(href: &str) -> String {
    if let Some(idx) = href.find("uddg=") {
        let rest = &href[idx + "uddg=".len()..];
        let encoded = rest.split('&').next().unwrap_or(rest);
        if let Ok(decoded) = urlencoding::decode(encoded) {
            return decoded.into_owned();
        }
    }
    if let Some(stripped) = href.strip_prefix("//") {
        return format!("https://{stripped}");
    }
    decode_entities(href)
}
