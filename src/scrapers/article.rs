//! Generic article page scraper.
//!
//! Essays and blog posts rarely share markup, so rather than per-site
//! selectors this scraper takes every visible text node under the document
//! and normalizes whitespace. Text inside `script`, `style`, `noscript`,
//! `template`, and `head` is ignored.

use crate::models::Article;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::header::USER_AGENT;
use scraper::{Html, Node};
use std::error::Error;
use tracing::{debug, info, instrument};

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

const HIDDEN_ELEMENTS: [&str; 5] = ["script", "style", "noscript", "template", "head"];

/// Fetch `url` and extract its cleaned text.
///
/// # Errors
///
/// Returns an error on transport failure or a non-success status.
#[instrument(level = "info", skip(client, title), fields(%url))]
pub async fn fetch_article(
    client: &reqwest::Client,
    url: &str,
    title: &str,
) -> Result<Article, Box<dyn Error>> {
    let html = client
        .get(url)
        .header(USER_AGENT, concat!("article_podcast/", env!("CARGO_PKG_VERSION")))
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;
    debug!(bytes = html.len(), "Downloaded article page");

    let raw_text = extract_text(&html);
    let cleaned_text = clean_text(&raw_text);
    info!(
        raw_bytes = raw_text.len(),
        cleaned_chars = cleaned_text.chars().count(),
        "Parsed article"
    );

    Ok(Article {
        url: url.to_string(),
        title: title.to_string(),
        raw_text,
        cleaned_text,
    })
}

/// Collect visible text nodes, one per line.
pub fn extract_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut lines = Vec::new();
    for node in document.tree.root().descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };
        let hidden = node.ancestors().any(|a| {
            a.value()
                .as_element()
                .is_some_and(|e| HIDDEN_ELEMENTS.contains(&e.name()))
        });
        if !hidden {
            let text: &str = text;
            lines.push(text.to_string());
        }
    }
    lines.join("\n")
}

/// Normalize scraped text for narration.
///
/// Lines are trimmed, blank lines dropped, the rest joined with single
/// spaces, and any remaining whitespace runs collapsed.
pub fn clean_text(text: &str) -> String {
    let joined = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    WHITESPACE_RUN.replace_all(&joined, " ").into_owned()
}
