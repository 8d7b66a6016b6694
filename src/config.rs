//! Podcast feed configuration.
//!
//! Feed metadata can come from an optional YAML file; command-line flags
//! override individual fields. Anything unset falls back to
//! [`PodcastConfig::default`].
//!
//! ```yaml
//! title: Paul Graham Essays
//! description: Essays by Paul Graham, narrated.
//! website_url: https://paulgraham.com
//! base_url: https://example.github.io/pgpod/
//! author: Paul Graham
//! ```

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

/// Channel-level metadata for the generated feed.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct PodcastConfig {
    pub title: String,
    pub description: String,
    /// Channel `<link>`.
    pub website_url: String,
    /// Public URL the output directory is served from; enclosure URLs are
    /// built by joining audio file names onto it.
    pub base_url: String,
    pub language: String,
    pub author: String,
    pub image_url: Option<String>,
    pub explicit: bool,
}

impl Default for PodcastConfig {
    fn default() -> Self {
        Self {
            title: "Blog to Podcast".to_string(),
            description: "Converted blog posts to audio".to_string(),
            website_url: "https://example.com".to_string(),
            base_url: "https://example.com/podcast/".to_string(),
            language: "en-us".to_string(),
            author: "Blog to Podcast".to_string(),
            image_url: None,
            explicit: false,
        }
    }
}

/// Command-line overrides applied on top of the YAML file.
#[derive(Debug, Default, Clone)]
pub struct ConfigOverrides {
    pub title: Option<String>,
    pub description: Option<String>,
    pub website_url: Option<String>,
    pub base_url: Option<String>,
}

impl PodcastConfig {
    /// Parse a YAML document.
    pub fn from_yaml(yaml: &str) -> Result<Self, Box<dyn Error>> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Apply any overrides that are set.
    pub fn with_overrides(mut self, overrides: ConfigOverrides) -> Self {
        if let Some(title) = overrides.title {
            self.title = title;
        }
        if let Some(description) = overrides.description {
            self.description = description;
        }
        if let Some(website_url) = overrides.website_url {
            self.website_url = website_url;
        }
        if let Some(base_url) = overrides.base_url {
            self.base_url = base_url;
        }
        self
    }
}

/// Load the podcast configuration, reading `path` if given.
#[instrument(level = "info", skip(overrides))]
pub async fn load_config(
    path: Option<&Path>,
    overrides: ConfigOverrides,
) -> Result<PodcastConfig, Box<dyn Error>> {
    let base = match path {
        Some(path) => {
            let yaml = fs::read_to_string(path).await?;
            let config = PodcastConfig::from_yaml(&yaml)?;
            info!(path = %path.display(), "Loaded podcast configuration");
            config
        }
        None => PodcastConfig::default(),
    };
    Ok(base.with_overrides(overrides))
}
