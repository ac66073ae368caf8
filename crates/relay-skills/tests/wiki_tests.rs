// Reshaping tests over canned MediaWiki responses (no network).

use serde_json::json;

use relay_skills::wiki::{
    reshape_full, reshape_opensearch, reshape_summary, split_sections, truncate_sentences,
};

// ── sentence truncation ──────────────────────────────────────────────────

#[test]
fn truncate_keeps_first_n_sentences() {
    let text = "One. Two! Three? Four. Five.";
    assert_eq!(truncate_sentences(text, 2), "One. Two.");
    assert_eq!(truncate_sentences(text, 3), "One. Two. Three.");
}

#[test]
fn truncate_handles_fewer_sentences_than_requested() {
    assert_eq!(truncate_sentences("Only one here.", 5), "Only one here.");
}

#[test]
fn truncate_empty_input() {
    assert_eq!(truncate_sentences("", 5), "");
    assert_eq!(truncate_sentences("Anything.", 0), "");
}

#[test]
fn truncate_text_without_terminators_gets_one() {
    assert_eq!(truncate_sentences("no punctuation at all", 3), "no punctuation at all.");
}

// ── section splitting ────────────────────────────────────────────────────

const EXTRACT: &str = "Rust is a programming language.\nIt is fast.\n\
== History ==\nStarted at Mozilla.\nFirst release in 2015.\n\
=== Early years ===\nGraydon's side project.\n\
== Design ==\nOwnership and borrowing.";

#[test]
fn split_sections_separates_summary_and_sections() {
    let (summary, sections) = split_sections(EXTRACT);

    assert_eq!(summary, "Rust is a programming language.\nIt is fast.");
    assert_eq!(sections.len(), 3);

    assert_eq!(sections[0].title, "History");
    assert_eq!(sections[0].level, 0);
    assert_eq!(sections[0].text, "Started at Mozilla.\nFirst release in 2015.");

    assert_eq!(sections[1].title, "Early years");
    assert_eq!(sections[1].level, 1);
    assert_eq!(sections[1].text, "Graydon's side project.");

    assert_eq!(sections[2].title, "Design");
    assert_eq!(sections[2].level, 0);
}

#[test]
fn split_sections_without_headings_is_all_summary() {
    let (summary, sections) = split_sections("Just intro text.\nMore intro.");
    assert_eq!(summary, "Just intro text.\nMore intro.");
    assert!(sections.is_empty());
}

#[test]
fn split_sections_caps_section_text() {
    let long = "x".repeat(6000);
    let extract = format!("Intro.\n== Big ==\n{long}");
    let (_, sections) = split_sections(&extract);
    assert_eq!(sections[0].text.chars().count(), 5000);
}

// ── opensearch reshaping ─────────────────────────────────────────────────

#[test]
fn opensearch_reshapes_parallel_arrays() {
    let body = json!([
        "rust",
        ["Rust", "Rust (fungus)"],
        ["A language", "A plant disease"],
        ["https://en.wikipedia.org/wiki/Rust", "https://en.wikipedia.org/wiki/Rust_(fungus)"]
    ]);

    let doc = reshape_opensearch("rust", &body);

    assert_eq!(doc["mode"], "search");
    assert_eq!(doc["query"], "rust");
    assert_eq!(doc["count"], 2);
    assert_eq!(doc["results"][0]["title"], "Rust");
    assert_eq!(doc["results"][0]["description"], "A language");
    assert_eq!(doc["results"][1]["url"], "https://en.wikipedia.org/wiki/Rust_(fungus)");
}

#[test]
fn opensearch_tolerates_short_columns() {
    let body = json!(["q", ["Only title"], [], []]);
    let doc = reshape_opensearch("q", &body);
    assert_eq!(doc["count"], 1);
    assert_eq!(doc["results"][0]["description"], "");
    assert_eq!(doc["results"][0]["url"], "");
}

#[test]
fn opensearch_malformed_body_yields_empty_results() {
    let doc = reshape_opensearch("q", &json!({"unexpected": true}));
    assert_eq!(doc["count"], 0);
}

// ── summary / full reshaping ─────────────────────────────────────────────

fn page_body(extract: &str) -> serde_json::Value {
    json!({
        "query": {
            "pages": {
                "123": {
                    "pageid": 123,
                    "title": "Rust (programming language)",
                    "fullurl": "https://en.wikipedia.org/wiki/Rust_(programming_language)",
                    "extract": extract,
                    "categories": [
                        { "title": "Category:Programming languages" },
                        { "title": "Category:Systems programming languages" }
                    ],
                    "links": [
                        { "title": "Mozilla" },
                        { "title": "Memory safety" }
                    ]
                }
            }
        }
    })
}

#[test]
fn summary_reshapes_existing_page() {
    let body = page_body("First. Second. Third. Fourth.");
    let doc = reshape_summary("rust", &body, 2);

    assert_eq!(doc["mode"], "summary");
    assert_eq!(doc["exists"], true);
    assert_eq!(doc["title"], "Rust (programming language)");
    assert_eq!(doc["summary"], "First. Second.");
    assert_eq!(
        doc["categories"][0],
        "Category:Programming languages"
    );
}

#[test]
fn summary_missing_page_reports_not_found() {
    let body = json!({ "query": { "pages": { "-1": { "missing": "" } } } });
    let doc = reshape_summary("Nonexistent page", &body, 5);

    assert_eq!(doc["exists"], false);
    assert_eq!(doc["title"], "Nonexistent page");
    assert_eq!(doc["error"], "Page not found");
}

#[test]
fn full_reshapes_sections_and_links() {
    let body = page_body(EXTRACT);
    let doc = reshape_full("rust", &body);

    assert_eq!(doc["mode"], "full");
    assert_eq!(doc["exists"], true);
    assert_eq!(doc["summary"], "Rust is a programming language.\nIt is fast.");
    assert_eq!(doc["sections"][0]["title"], "History");
    assert_eq!(doc["sections"][1]["level"], 1);
    assert_eq!(doc["links"][0], "Mozilla");
    assert_eq!(doc["links"][1], "Memory safety");
}

#[test]
fn full_missing_page_reports_not_found() {
    let body = json!({ "query": { "pages": { "-1": { "missing": "" } } } });
    let doc = reshape_full("gone", &body);
    assert_eq!(doc["exists"], false);
    assert_eq!(doc["error"], "Page not found");
}
