//! The list of articles to narrate.
//!
//! The catalogue is a JSON file passed in explicitly:
//!
//! ```json
//! { "blog_posts": [ { "url": "https://paulgraham.com/greatwork.html", "title": "How to Do Great Work" } ] }
//! ```

use crate::models::BlogPost;
use serde::Deserialize;
use std::error::Error;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument, warn};
use url::Url;

/// A catalogue entry that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    pub url: String,
    pub title: String,
}

#[derive(Debug, Deserialize)]
struct CatalogueFile {
    #[serde(default)]
    blog_posts: Vec<BlogPost>,
}

/// Parse catalogue JSON, dropping invalid entries with a warning.
pub fn parse_catalogue(json: &str) -> Result<Vec<WorkItem>, Box<dyn Error>> {
    let file: CatalogueFile = serde_json::from_str(json)?;
    let total = file.blog_posts.len();
    let items: Vec<WorkItem> = file
        .blog_posts
        .into_iter()
        .filter_map(|post| match validate(&post) {
            Some(item) => Some(item),
            None => {
                warn!(?post, "Skipping invalid blog post entry");
                None
            }
        })
        .collect();
    info!(total, valid = items.len(), "Parsed catalogue");
    Ok(items)
}

fn validate(post: &BlogPost) -> Option<WorkItem> {
    let url = post.url.as_deref()?.trim();
    let title = post.title.as_deref()?.trim();
    if title.is_empty() || Url::parse(url).is_err() {
        return None;
    }
    Some(WorkItem {
        url: url.to_string(),
        title: title.to_string(),
    })
}

/// Read and parse the catalogue at `path`.
#[instrument(level = "info", fields(path = %path.display()))]
pub async fn load_catalogue(path: &Path) -> Result<Vec<WorkItem>, Box<dyn Error>> {
    let json = fs::read_to_string(path).await?;
    parse_catalogue(&json)
}
