//! Sentence-preserving text chunking.
//!
//! Providers cap the request size, so article text is split on the sentence
//! delimiter and sentences are packed greedily into chunks of at most
//! `max_chars` characters. A sentence is never broken: one that alone exceeds
//! the limit becomes an oversize chunk and the provider decides whether to
//! accept it.

use crate::models::TextChunk;
use crate::tts::error::PipelineError;
use tracing::{debug, instrument, warn};

/// Delimiter used both to split sentences and to join them back.
pub const SENTENCE_DELIMITER: &str = ". ";

/// Split `text` into an ordered sequence of chunks.
///
/// The length of a chunk is measured on its joined form, delimiters
/// included, so every chunk except a lone oversize sentence satisfies
/// `char_len() <= max_chars`. Empty or whitespace-only text yields no chunks.
///
/// # Errors
///
/// Returns [`PipelineError::Chunking`] if `max_chars` is zero.
#[instrument(level = "debug", skip(text), fields(text_len = text.len()))]
pub fn split(text: &str, max_chars: usize) -> Result<Vec<TextChunk>, PipelineError> {
    if max_chars == 0 {
        return Err(PipelineError::Chunking(
            "max_chars must be greater than zero".to_string(),
        ));
    }

    let delimiter_len = SENTENCE_DELIMITER.chars().count();
    let mut chunks = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut current_len = 0usize;

    for sentence in text
        .split(SENTENCE_DELIMITER)
        .map(str::trim)
        .filter(|s| !s.is_empty())
    {
        let sentence_len = sentence.chars().count();

        if current.is_empty() {
            current.push(sentence);
            current_len = sentence_len;
        } else if current_len + delimiter_len + sentence_len <= max_chars {
            current.push(sentence);
            current_len += delimiter_len + sentence_len;
        } else {
            seal(&mut chunks, &current, current_len, max_chars);
            current.clear();
            current.push(sentence);
            current_len = sentence_len;
        }
    }

    if !current.is_empty() {
        seal(&mut chunks, &current, current_len, max_chars);
    }

    debug!(count = chunks.len(), max_chars, "Split text into chunks");
    Ok(chunks)
}

fn seal(chunks: &mut Vec<TextChunk>, sentences: &[&str], len: usize, max_chars: usize) {
    if len > max_chars {
        warn!(
            index = chunks.len(),
            len, max_chars, "Single sentence exceeds chunk limit; keeping it whole"
        );
    }
    chunks.push(TextChunk {
        index: chunks.len(),
        text: sentences.join(SENTENCE_DELIMITER),
    });
}

/// Join chunk texts back together in index order.
pub fn join(chunks: &[TextChunk]) -> String {
    let mut ordered: Vec<&TextChunk> = chunks.iter().collect();
    ordered.sort_by_key(|c| c.index);
    ordered
        .iter()
        .map(|c| c.text.as_str())
        .collect::<Vec<_>>()
        .join(SENTENCE_DELIMITER)
}
