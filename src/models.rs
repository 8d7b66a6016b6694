//! Data models for articles, text chunks, and podcast episodes.
//!
//! This module defines the core data structures used throughout the application:
//! - [`BlogPost`]: One catalogue entry naming an article to narrate
//! - [`Article`]: Scraped and cleaned article text
//! - [`TextChunk`]: A bounded-size slice of article text, the unit of synthesis
//! - [`ChunkArtifact`]: The on-disk state of one synthesized chunk
//! - [`EpisodeRecord`]: A finished episode as consumed by feed generation

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A single catalogue entry.
///
/// Both fields are optional at the serde level so that one malformed entry
/// does not reject the whole catalogue; [`crate::catalogue`] skips entries
/// missing either field.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct BlogPost {
    /// The article URL to scrape.
    pub url: Option<String>,
    /// The episode title.
    pub title: Option<String>,
}

/// An article as produced by the content-fetch collaborator.
///
/// Immutable once produced; consumed once by the chunker.
#[derive(Debug, Clone)]
pub struct Article {
    /// The page the article was scraped from.
    pub url: String,
    /// The title taken from the catalogue entry.
    pub title: String,
    /// Visible page text before cleaning.
    pub raw_text: String,
    /// Whitespace-normalized text ready for chunking.
    pub cleaned_text: String,
}

/// A bounded-size slice of article text.
///
/// `index` is the sole ordering key. Joining chunk texts in index order with
/// the sentence delimiter reconstructs the source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChunk {
    pub index: usize,
    pub text: String,
}

impl TextChunk {
    /// Length in characters, the unit providers bill and limit by.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// Lifecycle of one chunk within a single run.
///
/// `Failed` is terminal: chunks are never retried automatically.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkStatus {
    Pending,
    Succeeded,
    Failed,
}

/// The on-disk artifact for one chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkArtifact {
    pub index: usize,
    pub file_path: PathBuf,
    pub status: ChunkStatus,
}

/// A finished episode handed to the feed builder.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct EpisodeRecord {
    /// Episode title shown in podcast apps.
    pub title: String,
    /// Episode description.
    pub description: String,
    /// The source article URL.
    pub link: String,
    /// File name of the audio inside the output directory.
    pub audio_file: String,
    /// Public URL of the audio, used as the enclosure URL.
    pub audio_url: String,
    /// Size of the audio file, required by the RSS enclosure element.
    pub length_bytes: u64,
    /// Publication timestamp.
    pub pub_date: DateTime<Utc>,
    /// Stable identifier; the enclosure URL.
    pub guid: String,
}
