//! Ordered reassembly of chunk audio into the final artifact.
//!
//! The combiner is the only writer of the final audio file. Chunk files are
//! sorted by index, streamed byte-for-byte into `{output}.combining`, and the
//! result is renamed onto the output path. A single chunk is renamed
//! directly. Part files are removed only after the final artifact exists;
//! on any failure they stay on disk for inspection or resume.

use crate::tts::error::CombineError;
use crate::tts::synthesizer::with_suffix;
use itertools::Itertools;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{info, instrument, warn};

const COMBINING_SUFFIX: &str = ".combining";

/// Indices in `0..expected` with no entry in `chunks`.
pub fn missing_indices(chunks: &BTreeMap<usize, PathBuf>, expected: usize) -> Vec<usize> {
    (0..expected).filter(|i| !chunks.contains_key(i)).collect()
}

/// Combine chunk files `0..expected` into `output_path`.
///
/// # Errors
///
/// - [`CombineError::Missing`] if any index in `0..expected` is absent; no
///   output is written and no chunk file is touched.
/// - [`CombineError::Io`] if reading a chunk or writing the output fails;
///   chunk files are retained.
#[instrument(level = "info", skip(chunks), fields(available = chunks.len(), output = %output_path.display()))]
pub async fn combine(
    chunks: &BTreeMap<usize, PathBuf>,
    expected: usize,
    output_path: &Path,
) -> Result<PathBuf, CombineError> {
    let missing = missing_indices(chunks, expected);
    if !missing.is_empty() || expected == 0 {
        warn!(?missing, "Refusing to combine an incomplete chunk set");
        return Err(CombineError::Missing { missing });
    }

    let ordered: Vec<&PathBuf> = chunks
        .iter()
        .filter(|(i, _)| **i < expected)
        .sorted_by_key(|(i, _)| **i)
        .map(|(_, p)| p)
        .collect();

    concatenate(&ordered, output_path).await?;
    cleanup(&ordered).await;
    Ok(output_path.to_path_buf())
}

/// Write `parts` in order to `output_path` without deleting them.
pub(crate) async fn concatenate(parts: &[&PathBuf], output_path: &Path) -> Result<(), CombineError> {
    if let [only] = parts {
        fs::rename(only, output_path)
            .await
            .map_err(|e| CombineError::io(only.as_path(), e))?;
        info!("Single chunk moved into place without re-encoding");
        return Ok(());
    }

    let staging = with_suffix(output_path, COMBINING_SUFFIX);
    match append_all(parts, &staging).await {
        Ok(bytes) => {
            fs::rename(&staging, output_path)
                .await
                .map_err(|e| CombineError::io(output_path, e))?;
            info!(parts = parts.len(), bytes, "Combined chunk audio");
            Ok(())
        }
        Err(e) => {
            let _ = fs::remove_file(&staging).await;
            Err(e)
        }
    }
}

async fn append_all(parts: &[&PathBuf], staging: &Path) -> Result<u64, CombineError> {
    let mut out = fs::File::create(staging)
        .await
        .map_err(|e| CombineError::io(staging, e))?;
    let mut written = 0u64;
    for part in parts {
        let mut input = fs::File::open(part)
            .await
            .map_err(|e| CombineError::io(part.as_path(), e))?;
        written += tokio::io::copy(&mut input, &mut out)
            .await
            .map_err(|e| CombineError::io(part.as_path(), e))?;
    }
    out.flush().await.map_err(|e| CombineError::io(staging, e))?;
    out.sync_all().await.map_err(|e| CombineError::io(staging, e))?;
    Ok(written)
}

/// Remove part files after a successful combine. Failures only warn.
pub(crate) async fn cleanup(parts: &[&PathBuf]) {
    for part in parts {
        match fs::remove_file(part).await {
            Ok(()) => {}
            // Already moved into place by the single-chunk rename.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %part.display(), error = %e, "Failed to delete chunk file"),
        }
    }
}
