//! Recombining part files left behind by an interrupted run.
//!
//! Discovery probes `{output}.part1`, `{output}.part2`, ... until the first
//! missing suffix, then scans the parent directory for stray higher
//! suffixes. A gap followed by more parts is reported as
//! [`CombineError::Gap`] instead of producing a truncated episode.

use crate::tts::combiner::{cleanup, concatenate};
use crate::tts::error::CombineError;
use crate::tts::synthesizer::{parse_part_suffix, part_path};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{error, info, instrument, warn};

/// Find the contiguous run of part files for `output_path`, starting at 1.
///
/// # Errors
///
/// Returns [`CombineError::Gap`] if part files exist past a missing suffix.
pub async fn discover_parts(output_path: &Path) -> Result<Vec<PathBuf>, CombineError> {
    let mut parts = Vec::new();
    let mut suffix = 1;
    loop {
        let candidate = part_path(output_path, suffix);
        if !fs::try_exists(&candidate)
            .await
            .map_err(|e| CombineError::io(&candidate, e))?
        {
            break;
        }
        parts.push(candidate);
        suffix += 1;
    }

    let stray = stray_suffixes_above(output_path, parts.len()).await?;
    if let Some(highest) = stray.iter().max() {
        let missing: Vec<usize> = (parts.len() + 1..*highest)
            .filter(|s| !stray.contains(s))
            .collect();
        return Err(CombineError::Gap { missing });
    }
    Ok(parts)
}

async fn stray_suffixes_above(output_path: &Path, contiguous: usize) -> Result<Vec<usize>, CombineError> {
    let Some(output_name) = output_path.file_name().and_then(|n| n.to_str()) else {
        return Ok(Vec::new());
    };
    let dir = match output_path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let mut entries = match fs::read_dir(&dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(CombineError::io(&dir, e)),
    };

    let mut stray = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| CombineError::io(&dir, e))?
    {
        if let Some(suffix) = entry
            .file_name()
            .to_str()
            .and_then(|name| parse_part_suffix(output_name, name))
            && suffix > contiguous
        {
            stray.push(suffix);
        }
    }
    Ok(stray)
}

/// Delete part files whose suffix is above `expected`.
///
/// A rerun that splits into fewer chunks than an earlier failed run would
/// otherwise leave those higher parts behind, and a later recombine would
/// report them as a gap. Returns how many files were removed.
pub async fn remove_stale_parts(output_path: &Path, expected: usize) -> Result<usize, CombineError> {
    let mut removed = 0;
    for suffix in stray_suffixes_above(output_path, expected).await? {
        let stale = part_path(output_path, suffix);
        match fs::remove_file(&stale).await {
            Ok(()) => {
                warn!(path = %stale.display(), "Removed chunk file from an earlier run");
                removed += 1;
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(CombineError::io(&stale, e)),
        }
    }
    Ok(removed)
}

/// Combine whatever part files exist for `output_path`.
///
/// Returns `Ok(None)` when there are no part files, `Ok(Some(path))` after a
/// successful combine and cleanup.
#[instrument(level = "info", fields(output = %output_path.display()))]
pub async fn try_recombine(output_path: &Path) -> Result<Option<PathBuf>, CombineError> {
    let parts = discover_parts(output_path).await?;
    if parts.is_empty() {
        info!("No chunk files to recombine");
        return Ok(None);
    }

    info!(parts = parts.len(), "Recombining chunk files from disk");
    let ordered: Vec<&PathBuf> = parts.iter().collect();
    concatenate(&ordered, output_path).await?;
    cleanup(&ordered).await;
    Ok(Some(output_path.to_path_buf()))
}

/// Boolean form of [`try_recombine`]: `true` only if an artifact was written.
pub async fn recombine(output_path: &Path) -> bool {
    match try_recombine(output_path).await {
        Ok(Some(path)) => {
            info!(path = %path.display(), "Recombined audio");
            true
        }
        Ok(None) => false,
        Err(e) => {
            error!(output = %output_path.display(), error = %e, "Recombine failed; chunk files kept");
            false
        }
    }
}
