//! # Article Podcast
//!
//! Turns web-published articles into narrated podcast episodes. Each article
//! is scraped, cleaned, narrated through a speech-synthesis provider in
//! parallel chunks, reassembled into one MP3, and appended to an RSS 2.0
//! feed with iTunes extensions.
//!
//! ## Usage
//!
//! ```sh
//! ELEVENLABS_API_KEYS=key1,key2 article_podcast -i blog_posts.json -o output
//! ```
//!
//! ## Architecture
//!
//! The application follows a pipeline architecture:
//! 1. **Catalogue**: Read the list of articles to narrate
//! 2. **Fetching**: Download and clean each article's text
//! 3. **Narration**: Chunk, synthesize concurrently across API keys, and
//!    combine in order (see [`tts`])
//! 4. **Output**: Update the episode ledger and rewrite the feed

use chrono::Utc;
use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod api;
mod catalogue;
mod cli;
mod config;
mod models;
mod outputs;
mod scrapers;
mod tts;
mod utils;

use api::ElevenLabsSynthesizer;
use cli::Cli;
use outputs::{feed, json};
use tts::credentials::CredentialPool;
use tts::{AudioPipeline, PipelineStage};
use utils::{ensure_writable_dir, slugify_title};

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // A missing .env is normal; real environment variables still apply.
    let dotenv = dotenvy::dotenv();

    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("article_podcast starting up");
    match dotenv {
        Ok(path) => debug!(path = %path.display(), "Loaded .env"),
        Err(e) => debug!(error = %e, "No .env loaded"),
    }

    let args = Cli::parse();
    debug!(?args.input_file, ?args.output_dir, "Parsed CLI arguments");

    // ---- Resume entry point: combine leftovers and exit ----
    if let Some(output_path) = &args.recombine {
        info!(stage = %PipelineStage::Resuming, path = %output_path.display(), "Recombining chunk files");
        if tts::resume::recombine(output_path).await {
            info!(path = %output_path.display(), "Recombined audio");
            return Ok(());
        }
        return Err(format!("nothing recombined for {}", output_path.display()).into());
    }

    let Some(csv) = args.credentials_csv() else {
        error!("No API key configured; set ELEVENLABS_API_KEYS or ELEVENLABS_API_KEY");
        return Err("missing ElevenLabs API key".into());
    };
    let pool = CredentialPool::from_csv(csv)?;
    info!(credentials = pool.len(), "Loaded credential pool");

    let synthesizer = ElevenLabsSynthesizer::new(&args.model);

    if args.list_voices {
        for voice in synthesizer.list_voices(pool.first()).await? {
            println!("{}\t{}", voice.voice_id, voice.name);
        }
        return Ok(());
    }

    if let Err(e) = ensure_writable_dir(&args.output_dir).await {
        error!(
            path = %args.output_dir.display(),
            error = %e,
            "Output directory is not writable (fix perms or choose a different path)"
        );
        return Err(e);
    }

    let podcast = config::load_config(args.config.as_deref(), args.config_overrides()).await?;
    info!(title = %podcast.title, base_url = %podcast.base_url, "Loaded podcast configuration");

    let posts = catalogue::load_catalogue(&args.input_file).await?;
    if posts.is_empty() {
        warn!("No blog posts found in the input file");
        return Ok(());
    }

    let client = reqwest::Client::new();
    let pipeline = AudioPipeline::new(synthesizer, pool, args.audio_settings());

    // ---- Narrate articles one at a time; chunks within each run in parallel ----
    let mut new_episodes = Vec::new();
    for post in &posts {
        match narrate(&client, &pipeline, &podcast, &args, post).await {
            Ok(Some(episode)) => new_episodes.push(episode),
            Ok(None) => warn!(title = %post.title, "Article produced no audio"),
            Err(e) => error!(title = %post.title, url = %post.url, error = %e, "Failed to narrate article"),
        }
    }

    info!(
        processed = new_episodes.len(),
        total = posts.len(),
        "Finished narrating articles"
    );

    if new_episodes.is_empty() {
        warn!("No blog posts were successfully processed; feed left unchanged");
        return Ok(());
    }

    // ---- Ledger + feed ----
    let ledger_path = args.output_dir.join(json::LEDGER_FILE);
    let existing = json::load_episodes(&ledger_path).await?;
    let episodes = json::merge_episodes(existing, new_episodes);
    json::write_episodes(&episodes, &ledger_path).await?;

    let feed_path = args.output_dir.join("feed.xml");
    feed::write_feed(&podcast, &episodes, &feed_path).await?;
    info!(
        path = %feed_path.display(),
        url = %feed::enclosure_url(&podcast.base_url, "feed.xml")?,
        "Podcast feed ready"
    );

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );

    Ok(())
}

/// Fetch, narrate, and describe one catalogue entry.
#[instrument(level = "info", skip_all, fields(title = %post.title))]
async fn narrate(
    client: &reqwest::Client,
    pipeline: &AudioPipeline<ElevenLabsSynthesizer>,
    podcast: &config::PodcastConfig,
    args: &Cli,
    post: &catalogue::WorkItem,
) -> Result<Option<models::EpisodeRecord>, Box<dyn Error>> {
    let article = scrapers::article::fetch_article(client, &post.url, &post.title).await?;
    info!(
        raw_bytes = article.raw_text.len(),
        chars = article.cleaned_text.chars().count(),
        preview = %utils::truncate_for_log(&article.cleaned_text, 120),
        "Fetched article"
    );

    let audio_path = args
        .output_dir
        .join(format!("{}.mp3", slugify_title(&article.title)));
    let Some(audio_path) = pipeline.generate(&article.cleaned_text, &audio_path).await? else {
        return Ok(None);
    };

    let episode = feed::episode_for(podcast, &article.title, &article.url, &audio_path, Utc::now()).await?;
    info!(audio = %episode.audio_file, bytes = episode.length_bytes, "Episode ready");
    Ok(Some(episode))
}
