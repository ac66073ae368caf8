use anyhow::Result;
use serde_json::{json, Value};

const MAX_CATEGORIES: usize = 10;
const MAX_LINKS: usize = 50;
const MAX_SECTION_CHARS: usize = 5000;

/// MediaWiki API client for one language edition.
pub struct WikiClient {
    http: reqwest::Client,
    lang: String,
}

impl WikiClient {
    pub fn new(lang: &str) -> Self {
        Self {
            http: reqwest::Client::builder()
                .user_agent("relay-wiki/0.1")
                .build()
                .unwrap_or_default(),
            lang: lang.to_string(),
        }
    }

    fn api_url(&self) -> String {
        format!("https://{}.wikipedia.org/w/api.php", self.lang)
    }

    async fn get_json(&self, params: &[(&str, &str)]) -> Result<Value> {
        Ok(self
            .http
            .get(self.api_url())
            .query(params)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?)
    }

    /// Search for page titles matching the query (OpenSearch).
    pub async fn search(&self, query: &str, limit: usize) -> Result<Value> {
        let limit = limit.to_string();
        let body = self
            .get_json(&[
                ("action", "opensearch"),
                ("search", query),
                ("limit", limit.as_str()),
                ("format", "json"),
            ])
            .await?;
        Ok(reshape_opensearch(query, &body))
    }

    /// Plain-text intro of a page, truncated to `sentences` sentences.
    pub async fn summary(&self, title: &str, sentences: usize) -> Result<Value> {
        let body = self
            .get_json(&[
                ("action", "query"),
                ("format", "json"),
                ("redirects", "1"),
                ("titles", title),
                ("prop", "extracts|categories|info"),
                ("explaintext", "1"),
                ("exintro", "1"),
                ("inprop", "url"),
                ("cllimit", "10"),
            ])
            .await?;
        Ok(reshape_summary(title, &body, sentences))
    }

    /// Full plain-text content of a page, split into sections.
    pub async fn full(&self, title: &str) -> Result<Value> {
        let body = self
            .get_json(&[
                ("action", "query"),
                ("format", "json"),
                ("redirects", "1"),
                ("titles", title),
                ("prop", "extracts|categories|links|info"),
                ("explaintext", "1"),
                ("exsectionformat", "wiki"),
                ("inprop", "url"),
                ("cllimit", "10"),
                ("pllimit", "50"),
            ])
            .await?;
        Ok(reshape_full(title, &body))
    }
}

fn first_page(body: &Value) -> Option<&Value> {
    body.pointer("/query/pages")?.as_object()?.values().next()
}

fn page_exists(page: &Value) -> bool {
    page.get("missing").is_none() && page.get("invalid").is_none()
}

fn string_list(page: &Value, field: &str, cap: usize) -> Vec<String> {
    page.get(field)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|i| i.get("title").and_then(Value::as_str))
                .map(str::to_string)
                .take(cap)
                .collect()
        })
        .unwrap_or_default()
}

/// Reshape an OpenSearch response (`[query, [titles], [descriptions],
/// [urls]]`) into the `search` output document.
pub fn reshape_opensearch(query: &str, body: &Value) -> Value {
    let empty = Vec::new();
    let arr = body.as_array().unwrap_or(&empty);
    let column = |i: usize| arr.get(i).and_then(Value::as_array).cloned().unwrap_or_default();

    let titles = column(1);
    let descriptions = column(2);
    let urls = column(3);

    let results: Vec<Value> = titles
        .iter()
        .enumerate()
        .map(|(i, title)| {
            json!({
                "title": title.as_str().unwrap_or(""),
                "description": descriptions.get(i).and_then(Value::as_str).unwrap_or(""),
                "url": urls.get(i).and_then(Value::as_str).unwrap_or(""),
            })
        })
        .collect();

    json!({
        "mode": "search",
        "query": query,
        "count": results.len(),
        "results": results,
    })
}

/// Reshape a `prop=extracts` intro response into the `summary` document.
pub fn reshape_summary(title: &str, body: &Value, sentences: usize) -> Value {
    let Some(page) = first_page(body).filter(|p| page_exists(p)) else {
        return json!({
            "mode": "summary",
            "title": title,
            "exists": false,
            "error": "Page not found",
        });
    };

    let extract = page.get("extract").and_then(Value::as_str).unwrap_or("");
    json!({
        "mode": "summary",
        "title": page.get("title").and_then(Value::as_str).unwrap_or(title),
        "exists": true,
        "url": page.get("fullurl").and_then(Value::as_str).unwrap_or(""),
        "summary": truncate_sentences(extract, sentences),
        "categories": string_list(page, "categories", MAX_CATEGORIES),
    })
}

/// Reshape a full plain-text extract response into the `full` document.
pub fn reshape_full(title: &str, body: &Value) -> Value {
    let Some(page) = first_page(body).filter(|p| page_exists(p)) else {
        return json!({
            "mode": "full",
            "title": title,
            "exists": false,
            "error": "Page not found",
        });
    };

    let extract = page.get("extract").and_then(Value::as_str).unwrap_or("");
    let (summary, sections) = split_sections(extract);
    let sections_json: Vec<Value> = sections
        .into_iter()
        .map(|s| json!({ "title": s.title, "level": s.level, "text": s.text }))
        .collect();

    json!({
        "mode": "full",
        "title": page.get("title").and_then(Value::as_str).unwrap_or(title),
        "exists": true,
        "url": page.get("fullurl").and_then(Value::as_str).unwrap_or(""),
        "summary": summary,
        "sections": sections_json,
        "categories": string_list(page, "categories", MAX_CATEGORIES),
        "links": string_list(page, "links", MAX_LINKS),
    })
}

/// Truncate plain text to the first `n` sentences.
///
/// Naive on purpose: `!` and `?` are folded into `.` before splitting, so
/// abbreviations are not handled. Matches the CLI's documented behavior.
pub fn truncate_sentences(text: &str, n: usize) -> String {
    if text.is_empty() || n == 0 {
        return String::new();
    }
    let window: String = text.chars().take(n * 200).collect();
    let folded = window.replace(['!', '?'], ".");
    let sentences: Vec<&str> = folded
        .split('.')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();
    if sentences.is_empty() {
        return String::new();
    }
    let mut out = sentences[..sentences.len().min(n)].join(". ");
    out.push('.');
    out
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub title: String,
    /// 0 for top-level (`== Heading ==`), +1 per extra `=` pair.
    pub level: usize,
    pub text: String,
}

/// Split a wiki-style plain-text extract into the leading summary and its
/// sections. Heading lines look like `== Title ==`; section text is capped
/// at 5000 characters.
pub fn split_sections(extract: &str) -> (String, Vec<Section>) {
    let mut summary = String::new();
    let mut sections: Vec<Section> = Vec::new();
    let mut current: Option<Section> = None;

    for line in extract.lines() {
        if let Some((level, title)) = parse_heading(line) {
            if let Some(mut done) = current.take() {
                done.text = trim_section(&done.text);
                sections.push(done);
            }
            current = Some(Section {
                title,
                level,
                text: String::new(),
            });
            continue;
        }
        match &mut current {
            Some(section) => {
                if !section.text.is_empty() {
                    section.text.push('\n');
                }
                section.text.push_str(line);
            }
            None => {
                if !summary.is_empty() {
                    summary.push('\n');
                }
                summary.push_str(line);
            }
        }
    }
    if let Some(mut done) = current.take() {
        done.text = trim_section(&done.text);
        sections.push(done);
    }

    (summary.trim().to_string(), sections)
}

fn parse_heading(line: &str) -> Option<(usize, String)> {
    let trimmed = line.trim();
    if !trimmed.starts_with("==") || !trimmed.ends_with("==") || trimmed.len() < 4 {
        return None;
    }
    let leading = trimmed.chars().take_while(|c| *c == '=').count();
    let trailing = trimmed.chars().rev().take_while(|c| *c == '=').count();
    let eqs = leading.min(trailing);
    if eqs < 2 || trimmed.len() < eqs * 2 {
        return None;
    }
    let title = trimmed[eqs..trimmed.len() - eqs].trim();
    if title.is_empty() {
        return None;
    }
    Some((eqs - 2, title.to_string()))
}

fn trim_section(text: &str) -> String {
    text.trim().chars().take(MAX_SECTION_CHARS).collect()
}
