//! Single-chunk synthesis with atomic persistence.
//!
//! Audio is written to `{output}.partN.staging` and renamed onto
//! `{output}.partN` only after every byte is on disk, so a part file that
//! exists is always complete.

use crate::api::SpeechSynthesizer;
use crate::models::TextChunk;
use crate::tts::error::SynthesisError;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, instrument, warn};

const PART_MARKER: &str = ".part";
const STAGING_SUFFIX: &str = ".staging";

/// Path of the part file holding chunk `index` (0-based) of `output_path`.
///
/// Suffixes are 1-based (`.part1` for chunk 0) so resume discovery can
/// probe upward from 1.
pub fn chunk_path(output_path: &Path, index: usize) -> PathBuf {
    part_path(output_path, index + 1)
}

/// Path of the part file with the given 1-based `suffix`.
pub fn part_path(output_path: &Path, suffix: usize) -> PathBuf {
    with_suffix(output_path, &format!("{PART_MARKER}{suffix}"))
}

/// Parse the 1-based part suffix from a file name belonging to `output_name`.
///
/// Staging files and anything else that is not exactly
/// `{output_name}.part{N}` yield `None`.
pub fn parse_part_suffix(output_name: &str, file_name: &str) -> Option<usize> {
    let rest = file_name.strip_prefix(output_name)?.strip_prefix(PART_MARKER)?;
    if rest.is_empty() || !rest.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    rest.parse().ok().filter(|n| *n > 0)
}

pub(crate) fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

/// Synthesize one chunk and persist it to `destination`.
///
/// Any existing file at `destination` is replaced. On failure nothing is
/// left at `destination` by this call and the staging file is removed.
#[instrument(level = "info", skip_all, fields(index = chunk.index, chars = chunk.char_len(), path = %destination.display()))]
pub async fn synthesize_chunk<S: SpeechSynthesizer>(
    synthesizer: &S,
    chunk: &TextChunk,
    destination: &Path,
    credential: &str,
    voice: &str,
) -> Result<PathBuf, SynthesisError> {
    let t0 = Instant::now();
    let audio = synthesizer.synthesize(&chunk.text, voice, credential).await?;

    let staging = with_suffix(destination, STAGING_SUFFIX);
    if let Err(e) = persist(&staging, destination, &audio).await {
        warn!(error = %e, "Failed to persist chunk audio");
        let _ = fs::remove_file(&staging).await;
        return Err(e.into());
    }

    debug!(
        bytes = audio.len(),
        elapsed_ms = t0.elapsed().as_millis() as u64,
        "Chunk audio written"
    );
    Ok(destination.to_path_buf())
}

async fn persist(staging: &Path, destination: &Path, audio: &[u8]) -> std::io::Result<()> {
    let mut file = fs::File::create(staging).await?;
    file.write_all(audio).await?;
    file.sync_all().await?;
    drop(file);
    fs::rename(staging, destination).await
}
