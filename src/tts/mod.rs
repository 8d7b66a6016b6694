//! Chunked text-to-speech pipeline.
//!
//! Long articles exceed provider request limits, so narration runs as a
//! fork-join over text chunks:
//!
//! ```text
//! text ─► chunker ─► dispatcher ─┬─► synthesizer (chunk 0, credential 0) ─┐
//!                                ├─► synthesizer (chunk 1, credential 1) ─┼─► combiner ─► episode.mp3
//!                                └─► synthesizer (chunk n, credential k) ─┘
//! ```
//!
//! # Submodules
//!
//! - [`chunker`]: Sentence-preserving split into bounded chunks
//! - [`credentials`]: Round-robin credential assignment
//! - [`synthesizer`]: One chunk to one atomically written part file
//! - [`dispatcher`]: Bounded concurrent fan-out, results in completion order
//! - [`combiner`]: Index-ordered concatenation and part cleanup
//! - [`resume`]: Recombine part files left by an interrupted run
//! - [`error`]: Error taxonomy

pub mod chunker;
pub mod combiner;
pub mod credentials;
pub mod dispatcher;
pub mod error;
pub mod resume;
pub mod synthesizer;

use crate::api::SpeechSynthesizer;
use crate::models::ChunkStatus;
use crate::utils::find_existing_audio;
use credentials::CredentialPool;
use error::PipelineError;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn};

/// Stages of one article's audio pipeline.
///
/// `Resuming` is an alternate entry that goes straight to `Combining`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    NotStarted,
    Chunking,
    Dispatching,
    Combining,
    Resuming,
    Done,
    Failed,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineStage::NotStarted => "not_started",
            PipelineStage::Chunking => "chunking",
            PipelineStage::Dispatching => "dispatching",
            PipelineStage::Combining => "combining",
            PipelineStage::Resuming => "resuming",
            PipelineStage::Done => "done",
            PipelineStage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Tunables for narration.
#[derive(Debug, Clone)]
pub struct AudioSettings {
    /// Provider voice identifier, passed through unmodified.
    pub voice: String,
    /// Upper bound on chunk length in characters.
    pub max_chunk_chars: usize,
    /// Concurrent requests allowed per credential.
    pub workers_per_credential: usize,
    /// Match existing audio file names case-insensitively.
    pub case_insensitive_audio_lookup: bool,
    /// Re-synthesize even if the final audio already exists.
    pub force: bool,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            voice: "21m00Tcm4TlvDq8ikWAM".to_string(),
            max_chunk_chars: 2500,
            workers_per_credential: 1,
            case_insensitive_audio_lookup: false,
            force: false,
        }
    }
}

/// Narrates article text into one audio file.
pub struct AudioPipeline<S> {
    synthesizer: S,
    pool: CredentialPool,
    settings: AudioSettings,
}

impl<S: SpeechSynthesizer> AudioPipeline<S> {
    pub fn new(synthesizer: S, pool: CredentialPool, settings: AudioSettings) -> Self {
        Self {
            synthesizer,
            pool,
            settings,
        }
    }

    #[cfg(test)]
    pub fn synthesizer(&self) -> &S {
        &self.synthesizer
    }

    /// Narrate `text` into `output_path`.
    ///
    /// Returns `Ok(None)` when `text` produces no chunks. If the final audio
    /// already exists and `force` is off, it is reused as-is.
    ///
    /// # Errors
    ///
    /// - [`PipelineError::Chunking`] for an invalid chunk size, before any
    ///   request is made.
    /// - [`PipelineError::Combine`] if any chunk failed; part files of the
    ///   successful chunks are left on disk.
    #[instrument(level = "info", skip_all, fields(output = %output_path.display(), text_len = text.len()))]
    pub async fn generate(
        &self,
        text: &str,
        output_path: &Path,
    ) -> Result<Option<PathBuf>, PipelineError> {
        let t0 = Instant::now();
        let mut stage = PipelineStage::NotStarted;

        if !self.settings.force
            && let Some(existing) =
                find_existing_audio(output_path, self.settings.case_insensitive_audio_lookup).await
        {
            info!(%stage, path = %existing.display(), "Audio already exists; skipping synthesis");
            return Ok(Some(existing));
        }

        stage = PipelineStage::Chunking;
        let chunks = chunker::split(text, self.settings.max_chunk_chars)?;
        info!(%stage, count = chunks.len(), "Chunked article text");
        debug!(
            source_chars = text.chars().count(),
            chunked_chars = chunker::join(&chunks).chars().count(),
            "Chunk coverage"
        );
        if chunks.is_empty() {
            info!("No text to narrate");
            return Ok(None);
        }

        match resume::remove_stale_parts(output_path, chunks.len()).await {
            Ok(0) => {}
            Ok(removed) => info!(removed, "Cleared chunk files beyond the current chunk count"),
            Err(e) => warn!(error = %e, "Could not clear chunk files from an earlier run"),
        }

        stage = PipelineStage::Dispatching;
        let workers = dispatcher::worker_limit(
            chunks.len(),
            self.pool.len(),
            self.settings.workers_per_credential,
        );
        info!(%stage, workers, credentials = self.pool.len(), "Starting synthesis");
        let outcome = dispatcher::run(
            &self.synthesizer,
            &chunks,
            output_path,
            &self.pool,
            &self.settings.voice,
            workers,
        )
        .await;

        stage = PipelineStage::Combining;
        info!(%stage, failed = ?outcome.failed_indices(), "Combining chunk audio");
        match combiner::combine(&outcome.succeeded(), chunks.len(), output_path).await {
            Ok(path) => {
                stage = PipelineStage::Done;
                info!(
                    %stage,
                    elapsed_ms = t0.elapsed().as_millis() as u64,
                    "Audio generated"
                );
                Ok(Some(path))
            }
            Err(e) => {
                stage = PipelineStage::Failed;
                for artifact in outcome
                    .artifacts(output_path)
                    .iter()
                    .filter(|a| a.status != ChunkStatus::Succeeded)
                {
                    warn!(
                        index = artifact.index,
                        path = %artifact.file_path.display(),
                        status = ?artifact.status,
                        "Chunk unavailable for combine"
                    );
                }
                error!(%stage, error = %e, "Audio generation failed; chunk files kept");
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tts::error::CombineError;
    use crate::tts::synthesizer::chunk_path;
    use crate::tts::synthesizer::tests::{ScriptedSynthesizer, fake_audio};

    fn pipeline(
        synth: ScriptedSynthesizer,
        keys: &[&str],
        max_chunk_chars: usize,
    ) -> AudioPipeline<ScriptedSynthesizer> {
        AudioPipeline::new(
            synth,
            CredentialPool::new(keys.iter().copied()).unwrap(),
            AudioSettings {
                voice: "Rachel".to_string(),
                max_chunk_chars,
                ..Default::default()
            },
        )
    }

    #[tokio::test]
    async fn test_end_to_end_four_chunks_two_credentials() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("essay.mp3");
        let pipeline = pipeline(ScriptedSynthesizer::default(), &["cred0", "cred1"], 3);

        let result = pipeline.generate("A. B. C. D.", &output).await.unwrap();

        assert_eq!(result, Some(output.clone()));
        let expected: Vec<u8> = ["A", "B", "C", "D."]
            .iter()
            .flat_map(|t| fake_audio(t))
            .collect();
        assert_eq!(std::fs::read(&output).unwrap(), expected);

        let mut calls = pipeline.synthesizer().credentials_by_text();
        calls.sort();
        let credentials: Vec<&str> = calls.iter().map(|(_, c)| c.as_str()).collect();
        assert_eq!(credentials, vec!["cred0", "cred1", "cred0", "cred1"]);
        for i in 0..4 {
            assert!(!chunk_path(&output, i).exists());
        }
    }

    #[tokio::test]
    async fn test_output_independent_of_completion_order() {
        let text: String = (0..30)
            .map(|i| format!("Sentence number {i} of the essay"))
            .collect::<Vec<_>>()
            .join(". ");

        let dir = tempfile::tempdir().unwrap();
        let ordered_output = dir.path().join("ordered.mp3");
        let sequential = pipeline(ScriptedSynthesizer::default(), &["k"], 80);
        sequential.generate(&text, &ordered_output).await.unwrap();
        let baseline = std::fs::read(&ordered_output).unwrap();

        for run in 0..3 {
            let output = dir.path().join(format!("shuffled-{run}.mp3"));
            let jittered = pipeline(
                ScriptedSynthesizer {
                    max_delay_ms: 15,
                    ..Default::default()
                },
                &["a", "b", "c", "d"],
                80,
            );
            jittered.generate(&text, &output).await.unwrap();
            assert_eq!(std::fs::read(&output).unwrap(), baseline);
        }
    }

    #[tokio::test]
    async fn test_partial_failure_aborts_and_keeps_parts() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("essay.mp3");
        let pipeline = pipeline(ScriptedSynthesizer::failing(&["C"]), &["k0", "k1"], 1);

        let err = pipeline
            .generate("A. B. C. D. E.", &output)
            .await
            .unwrap_err();

        match err {
            PipelineError::Combine(CombineError::Missing { missing }) => {
                assert_eq!(missing, vec![2])
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(!output.exists());
        for i in [0, 1, 3, 4] {
            assert!(chunk_path(&output, i).exists());
        }
        assert!(!chunk_path(&output, 2).exists());
    }

    #[tokio::test]
    async fn test_rerun_after_failure_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("essay.mp3");
        let text = "A. B. C. D. E.";

        let flaky = pipeline(ScriptedSynthesizer::failing(&["C"]), &["k"], 1);
        assert!(flaky.generate(text, &output).await.is_err());

        let healthy = pipeline(ScriptedSynthesizer::default(), &["k"], 1);
        healthy.generate(text, &output).await.unwrap();

        let expected: Vec<u8> = ["A", "B", "C", "D", "E."]
            .iter()
            .flat_map(|t| fake_audio(t))
            .collect();
        assert_eq!(std::fs::read(&output).unwrap(), expected);
    }

    #[tokio::test]
    async fn test_single_chunk_matches_raw_audio() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("short.mp3");
        let pipeline = pipeline(ScriptedSynthesizer::default(), &["k"], 1000);

        pipeline
            .generate("Just one short paragraph. Nothing more.", &output)
            .await
            .unwrap();

        assert_eq!(
            std::fs::read(&output).unwrap(),
            fake_audio("Just one short paragraph. Nothing more.")
        );
    }

    #[tokio::test]
    async fn test_empty_text_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("empty.mp3");
        let pipeline = pipeline(ScriptedSynthesizer::default(), &["k"], 100);

        assert_eq!(pipeline.generate("", &output).await.unwrap(), None);
        assert!(!output.exists());
        assert!(pipeline.synthesizer().credentials_by_text().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_chunk_size_fails_before_requests() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("essay.mp3");
        let pipeline = pipeline(ScriptedSynthesizer::default(), &["k"], 0);

        let err = pipeline.generate("A. B.", &output).await.unwrap_err();

        assert!(matches!(err, PipelineError::Chunking(_)));
        assert!(pipeline.synthesizer().credentials_by_text().is_empty());
    }

    #[tokio::test]
    async fn test_existing_audio_is_reused() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("essay.mp3");
        std::fs::write(&output, b"already narrated").unwrap();
        let pipeline = pipeline(ScriptedSynthesizer::default(), &["k"], 100);

        let result = pipeline.generate("A. B.", &output).await.unwrap();

        assert_eq!(result, Some(output.clone()));
        assert_eq!(std::fs::read(&output).unwrap(), b"already narrated");
        assert!(pipeline.synthesizer().credentials_by_text().is_empty());
    }

    #[tokio::test]
    async fn test_case_insensitive_reuse_returns_real_file() {
        let dir = tempfile::tempdir().unwrap();
        let actual = dir.path().join("Essay.MP3");
        std::fs::write(&actual, b"already narrated").unwrap();
        let requested = dir.path().join("essay.mp3");
        let pipeline = AudioPipeline::new(
            ScriptedSynthesizer::default(),
            CredentialPool::new(["k"]).unwrap(),
            AudioSettings {
                max_chunk_chars: 100,
                case_insensitive_audio_lookup: true,
                ..Default::default()
            },
        );

        let result = pipeline.generate("A. B.", &requested).await.unwrap().unwrap();

        assert!(result.exists());
        assert_eq!(std::fs::metadata(&result).unwrap().len(), 16);
        assert_eq!(std::fs::read(&result).unwrap(), b"already narrated");
        assert!(pipeline.synthesizer().credentials_by_text().is_empty());
    }

    #[tokio::test]
    async fn test_shorter_rerun_clears_leftover_parts() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("essay.mp3");

        let flaky = pipeline(ScriptedSynthesizer::failing(&["B"]), &["k"], 1);
        assert!(flaky.generate("A. B. C. D. E.", &output).await.is_err());
        assert!(chunk_path(&output, 4).exists());

        let healthy = pipeline(ScriptedSynthesizer::default(), &["k"], 100);
        healthy.generate("A. B.", &output).await.unwrap();

        assert_eq!(std::fs::read(&output).unwrap(), fake_audio("A. B."));
        for i in 0..5 {
            assert!(!chunk_path(&output, i).exists());
        }
        assert_eq!(resume::try_recombine(&output).await.unwrap(), None);
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(PipelineStage::Dispatching.to_string(), "dispatching");
        assert_eq!(PipelineStage::Failed.to_string(), "failed");
    }
}
