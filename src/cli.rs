//! Command-line interface definitions.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! Provider settings can also come from environment variables, which are
//! loaded from a `.env` file when present.

use crate::config::ConfigOverrides;
use crate::tts::AudioSettings;
use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments for the article podcast generator.
///
/// # Examples
///
/// ```sh
/// # Narrate every post in blog_posts.json into ./output
/// article_podcast --input-file blog_posts.json --output-dir output
///
/// # Spread requests over three API keys, two in flight per key
/// ELEVENLABS_API_KEYS=key1,key2,key3 article_podcast --workers-per-credential 2
///
/// # Finish an interrupted run from the chunk files on disk
/// article_podcast --recombine output/how_to_do_great_work.mp3
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// JSON file containing blog posts
    #[arg(short, long, default_value = "blog_posts.json")]
    pub input_file: PathBuf,

    /// Directory to save audio, the episode ledger, and the feed
    #[arg(short, long, default_value = "output")]
    pub output_dir: PathBuf,

    /// ElevenLabs voice id
    #[arg(long, env = "ELEVENLABS_VOICE", default_value = "21m00Tcm4TlvDq8ikWAM")]
    pub voice: String,

    /// ElevenLabs model id
    #[arg(long, env = "ELEVENLABS_MODEL", default_value = "eleven_monolingual_v1")]
    pub model: String,

    /// Comma-separated ElevenLabs API keys
    #[arg(long, env = "ELEVENLABS_API_KEYS", hide_env_values = true)]
    pub api_keys: Option<String>,

    /// Single ElevenLabs API key, used when no key list is given
    #[arg(long, env = "ELEVENLABS_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Optional YAML file with podcast metadata
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Title of the podcast
    #[arg(long)]
    pub podcast_title: Option<String>,

    /// Description of the podcast
    #[arg(long)]
    pub podcast_description: Option<String>,

    /// Website URL for the podcast
    #[arg(long)]
    pub website_url: Option<String>,

    /// Public URL the output directory is served from
    #[arg(long, env = "PODCAST_BASE_URL")]
    pub base_url: Option<String>,

    /// Maximum characters per synthesis request
    #[arg(long, default_value_t = 2500)]
    pub max_chunk_chars: usize,

    /// Concurrent requests per API key
    #[arg(long, default_value_t = 1)]
    pub workers_per_credential: usize,

    /// Treat existing audio file names case-insensitively
    #[arg(long)]
    pub case_insensitive_audio_lookup: bool,

    /// Re-synthesize episodes whose audio already exists
    #[arg(long)]
    pub force: bool,

    /// Combine leftover chunk files for this output path and exit
    #[arg(long, value_name = "PATH")]
    pub recombine: Option<PathBuf>,

    /// List the voices available to the API key and exit
    #[arg(long)]
    pub list_voices: bool,
}

impl Cli {
    /// The credential list: `--api-keys` if set, else `--api-key`.
    pub fn credentials_csv(&self) -> Option<&str> {
        self.api_keys
            .as_deref()
            .filter(|keys| !keys.trim().is_empty())
            .or(self.api_key.as_deref())
    }

    pub fn audio_settings(&self) -> AudioSettings {
        AudioSettings {
            voice: self.voice.clone(),
            max_chunk_chars: self.max_chunk_chars,
            workers_per_credential: self.workers_per_credential,
            case_insensitive_audio_lookup: self.case_insensitive_audio_lookup,
            force: self.force,
        }
    }

    pub fn config_overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            title: self.podcast_title.clone(),
            description: self.podcast_description.clone(),
            website_url: self.website_url.clone(),
            base_url: self.base_url.clone(),
        }
    }
}
