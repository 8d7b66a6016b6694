//! Utility functions for string manipulation and file system checks.
//!
//! This module provides helper functions used throughout the application:
//! - String truncation for logging provider responses
//! - Title slugification for audio file names
//! - Output directory validation
//! - Existing-audio detection with optional case-insensitive matching

use std::error::Error;
use std::fs as stdfs;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, instrument};

/// Truncate a string for logging purposes.
///
/// Long strings are cut at the last character boundary at or before `max`
/// bytes, with an ellipsis and a byte count appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
}

/// Convert an episode title to an audio file stem.
///
/// Lowercases the title, drops punctuation, and joins words with
/// underscores: `"How to Do Great Work"` becomes `"how_to_do_great_work"`.
pub fn slugify_title(title: &str) -> String {
    title
        .to_lowercase()
        .replace(|c: char| !c.is_alphanumeric() && !c.is_whitespace() && c != '-' && c != '_', "")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
}

/// Ensure a directory exists and is writable.
///
/// Creates the directory if needed, then writes and deletes a probe file.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or written to.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn ensure_writable_dir(path: &Path) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(path).await?;
    let probe_path = path.join("..__probe_write__");
    stdfs::File::create(&probe_path)?;
    let _ = stdfs::remove_file(&probe_path);
    info!("Output directory is writable");
    Ok(())
}

/// Locate finished audio for `path`, returning the file that actually exists.
///
/// With `case_insensitive`, a file in the same directory whose name equals
/// the target name ignoring case also matches; its real path is returned.
pub async fn find_existing_audio(path: &Path, case_insensitive: bool) -> Option<PathBuf> {
    if fs::try_exists(path).await.unwrap_or(false) {
        return Some(path.to_path_buf());
    }
    if !case_insensitive {
        return None;
    }

    let target = path.file_name().and_then(|n| n.to_str())?;
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut entries = fs::read_dir(dir).await.ok()?;
    while let Ok(Some(entry)) = entries.next_entry().await {
        if let Some(name) = entry.file_name().to_str()
            && name.eq_ignore_ascii_case(target)
        {
            debug!(found = %name, wanted = %target, "Matched existing audio ignoring case");
            return Some(entry.path());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_for_log_short_string() {
        let s = "Hello, world!";
        assert_eq!(truncate_for_log(s, 100), "Hello, world!");
    }

    #[test]
    fn test_truncate_for_log_long_string() {
        let s = "a".repeat(500);
        let result = truncate_for_log(&s, 100);
        assert!(result.starts_with(&"a".repeat(100)));
        assert!(result.contains("…(+400 bytes)"));
    }

    #[test]
    fn test_truncate_for_log_respects_char_boundaries() {
        let s = "ééééé";
        // Byte 3 falls inside the second 'é'.
        assert_eq!(truncate_for_log(s, 3), "é…(+8 bytes)");
    }

    #[test]
    fn test_slugify_title() {
        assert_eq!(slugify_title("How to Do Great Work"), "how_to_do_great_work");
        assert_eq!(slugify_title("Do Things that Don't Scale"), "do_things_that_dont_scale");
        assert_eq!(slugify_title("Multiple   Spaces"), "multiple_spaces");
        assert_eq!(slugify_title("Cities & Ambition"), "cities_ambition");
        assert_eq!(slugify_title("Hackers-and-Painters"), "hackers-and-painters");
    }

    #[tokio::test]
    async fn test_ensure_writable_dir_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("output").join("audio");
        ensure_writable_dir(&nested).await.unwrap();
        assert!(nested.is_dir());
        assert!(!nested.join("..__probe_write__").exists());
    }

    #[tokio::test]
    async fn test_find_existing_audio_case_sensitivity_is_configurable() {
        let dir = tempfile::tempdir().unwrap();
        let actual = dir.path().join("How_To_Do_Great_Work.MP3");
        std::fs::write(&actual, b"x").unwrap();
        let wanted = dir.path().join("how_to_do_great_work.mp3");

        // A case-insensitive filesystem reports the file either way.
        let fs_folds_case = wanted.exists();
        assert_eq!(find_existing_audio(&wanted, false).await.is_some(), fs_folds_case);

        let found = find_existing_audio(&wanted, true).await.unwrap();
        assert!(found.exists());
        if !fs_folds_case {
            assert_eq!(found, actual);
        }
    }

    #[tokio::test]
    async fn test_find_existing_audio_exact_match_returns_same_path() {
        let dir = tempfile::tempdir().unwrap();
        let wanted = dir.path().join("cities.mp3");
        std::fs::write(&wanted, b"x").unwrap();
        assert_eq!(find_existing_audio(&wanted, true).await, Some(wanted.clone()));
        assert_eq!(find_existing_audio(&wanted, false).await, Some(wanted));
    }

    #[tokio::test]
    async fn test_find_existing_audio_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let wanted = dir.path().join("absent.mp3");
        assert_eq!(find_existing_audio(&wanted, false).await, None);
        assert_eq!(find_existing_audio(&wanted, true).await, None);
    }
}
