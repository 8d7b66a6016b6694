//! Concurrent fan-out of chunk synthesis.
//!
//! One future per chunk, at most `workers` in flight, collected in
//! completion order. A failing chunk never cancels its siblings; the
//! dispatcher waits for every chunk to settle and hands back the complete
//! result map. Reordering is the combiner's job.

use crate::api::SpeechSynthesizer;
use crate::models::{ChunkArtifact, ChunkStatus, TextChunk};
use crate::tts::credentials::CredentialPool;
use crate::tts::error::SynthesisError;
use crate::tts::synthesizer::{chunk_path, synthesize_chunk};
use futures::stream::{self, StreamExt};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, instrument};

/// Worker count policy: one worker per credential, scaled by
/// `workers_per_credential`, never more than there are chunks, never zero.
pub fn worker_limit(chunk_count: usize, pool_len: usize, workers_per_credential: usize) -> usize {
    pool_len
        .saturating_mul(workers_per_credential.max(1))
        .min(chunk_count)
        .max(1)
}

/// Settled results of one dispatch.
#[derive(Debug, Default)]
pub struct DispatchOutcome {
    /// Result per chunk index, failures included.
    pub results: HashMap<usize, Result<PathBuf, SynthesisError>>,
    /// Chunk indices in the order their synthesis settled.
    pub completion_order: Vec<usize>,
    /// Number of chunks dispatched.
    pub total: usize,
}

impl DispatchOutcome {
    /// Successfully written chunk files keyed by index.
    pub fn succeeded(&self) -> BTreeMap<usize, PathBuf> {
        self.results
            .iter()
            .filter_map(|(i, r)| r.as_ref().ok().map(|p| (*i, p.clone())))
            .collect()
    }

    /// Indices whose synthesis failed, ascending.
    pub fn failed_indices(&self) -> Vec<usize> {
        let mut failed: Vec<usize> = self
            .results
            .iter()
            .filter(|(_, r)| r.is_err())
            .map(|(i, _)| *i)
            .collect();
        failed.sort_unstable();
        failed
    }

    /// Per-chunk artifact state, ascending by index.
    ///
    /// Indices that were dispatched but have no result stay `Pending`.
    pub fn artifacts(&self, output_path: &Path) -> Vec<ChunkArtifact> {
        (0..self.total)
            .map(|index| ChunkArtifact {
                index,
                file_path: chunk_path(output_path, index),
                status: match self.results.get(&index) {
                    Some(Ok(_)) => ChunkStatus::Succeeded,
                    Some(Err(_)) => ChunkStatus::Failed,
                    None => ChunkStatus::Pending,
                },
            })
            .collect()
    }
}

/// Synthesize every chunk of `output_path` concurrently.
///
/// Chunk `i` is written to [`chunk_path`]`(output_path, i)` using
/// `pool.for_chunk(i)`. At most `workers` requests are in flight.
#[instrument(level = "info", skip_all, fields(chunks = chunks.len(), output = %output_path.display()))]
pub async fn run<S: SpeechSynthesizer>(
    synthesizer: &S,
    chunks: &[TextChunk],
    output_path: &Path,
    pool: &CredentialPool,
    voice: &str,
    workers: usize,
) -> DispatchOutcome {
    let workers = workers.max(1);
    info!(workers, "Dispatching chunk synthesis");

    let settled: Vec<(usize, Result<PathBuf, SynthesisError>)> = stream::iter(chunks)
        .map(|chunk| {
            let destination = chunk_path(output_path, chunk.index);
            let credential = pool.for_chunk(chunk.index);
            let credential_slot = pool.slot(chunk.index);
            async move {
                let result =
                    synthesize_chunk(synthesizer, chunk, &destination, credential, voice).await;
                match &result {
                    Ok(_) => info!(index = chunk.index, credential_slot, "Chunk synthesized"),
                    Err(e) => error!(
                        index = chunk.index,
                        credential_slot,
                        error = %e,
                        "Chunk synthesis failed"
                    ),
                }
                (chunk.index, result)
            }
        })
        .buffer_unordered(workers)
        .collect()
        .await;

    let mut outcome = DispatchOutcome {
        total: chunks.len(),
        ..Default::default()
    };
    for (index, result) in settled {
        outcome.completion_order.push(index);
        outcome.results.insert(index, result);
    }

    debug!(order = ?outcome.completion_order, "Completion order");
    info!(
        total = outcome.total,
        succeeded = outcome.total - outcome.failed_indices().len(),
        failed = outcome.failed_indices().len(),
        "Dispatch settled"
    );
    outcome
}
