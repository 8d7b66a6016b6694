//! Error taxonomy for the audio pipeline.
//!
//! Per-chunk [`SynthesisError`]s are captured by the dispatcher and never
//! cross its boundary. The combiner's missing-index check is where a partial
//! failure becomes a [`PipelineError`].

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failure of a single chunk's synthesis. Local to that chunk.
#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("provider returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("failed to persist chunk audio: {0}")]
    Io(#[from] io::Error),
}

impl From<reqwest::Error> for SynthesisError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => SynthesisError::Status {
                status: status.as_u16(),
                body: err.to_string(),
            },
            None => SynthesisError::Transport(err.to_string()),
        }
    }
}

/// Failure to produce the final artifact. Chunk files are kept on disk.
#[derive(Debug, Error)]
pub enum CombineError {
    #[error("missing or failed chunk index(es): {missing:?}")]
    Missing { missing: Vec<usize> },
    #[error("gap in chunk files on disk, missing part suffix(es): {missing:?}")]
    Gap { missing: Vec<usize> },
    #[error("i/o error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl CombineError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        CombineError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Fatal errors for one article's audio pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid chunking configuration: {0}")]
    Chunking(String),
    #[error("credential pool is empty")]
    CredentialConfig,
    #[error(transparent)]
    Combine(#[from] CombineError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combine_error_names_missing_indices() {
        let err = CombineError::Missing { missing: vec![2] };
        assert_eq!(err.to_string(), "missing or failed chunk index(es): [2]");
    }

    #[test]
    fn test_pipeline_error_wraps_combine_transparently() {
        let err: PipelineError = CombineError::Gap { missing: vec![3] }.into();
        assert!(err.to_string().contains("missing part suffix(es): [3]"));
    }
}
