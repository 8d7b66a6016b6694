//! Episode ledger persisted as JSON.
//!
//! The feed is rebuilt from this ledger on every run, which is what makes a
//! new episode an append rather than a replacement of the previous feed.

use crate::models::EpisodeRecord;
use chrono::{DateTime, Utc};
use itertools::Itertools;
use std::collections::HashMap;
use std::error::Error;
use std::path::Path;
use tokio::fs;
use tracing::{error, info, instrument};

/// File name of the ledger inside the output directory.
pub const LEDGER_FILE: &str = "episodes.json";

/// Load previously published episodes. A missing ledger is empty.
#[instrument(level = "info", fields(path = %path.display()))]
pub async fn load_episodes(path: &Path) -> Result<Vec<EpisodeRecord>, Box<dyn Error>> {
    let json = match fs::read_to_string(path).await {
        Ok(json) => json,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            info!("No episode ledger yet");
            return Ok(Vec::new());
        }
        Err(e) => return Err(e.into()),
    };
    let episodes: Vec<EpisodeRecord> = serde_json::from_str(&json)?;
    info!(count = episodes.len(), "Loaded episode ledger");
    Ok(episodes)
}

/// Merge `new` into `existing`, newest first.
///
/// Episodes sharing a guid collapse to the new record, which keeps the
/// ledger's original `pub_date` so a re-run does not republish it.
pub fn merge_episodes(existing: Vec<EpisodeRecord>, new: Vec<EpisodeRecord>) -> Vec<EpisodeRecord> {
    let published: HashMap<String, DateTime<Utc>> = existing
        .iter()
        .map(|e| (e.guid.clone(), e.pub_date))
        .collect();
    new.into_iter()
        .map(|mut episode| {
            if let Some(first) = published.get(&episode.guid) {
                episode.pub_date = *first;
            }
            episode
        })
        .chain(existing)
        .sorted_by(|a, b| b.pub_date.cmp(&a.pub_date))
        .unique_by(|e| e.guid.clone())
        .collect()
}

/// Write the ledger, pretty-printed.
#[instrument(level = "info", skip(episodes), fields(path = %path.display(), count = episodes.len()))]
pub async fn write_episodes(episodes: &[EpisodeRecord], path: &Path) -> Result<(), Box<dyn Error>> {
    let json = serde_json::to_string_pretty(episodes)?;
    if let Err(e) = fs::write(path, json).await {
        error!(error = %e, "Failed to write episode ledger");
        return Err(e.into());
    }
    info!("Wrote episode ledger");
    Ok(())
}
