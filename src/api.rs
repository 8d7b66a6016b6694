//! Speech-synthesis provider interaction.
//!
//! This module defines the capability interface the audio pipeline depends
//! on, plus the ElevenLabs implementation used by the binary.
//!
//! # Architecture
//!
//! - [`SpeechSynthesizer`]: Core trait turning one text chunk into audio bytes
//! - [`ElevenLabsSynthesizer`]: Direct-HTTP implementation against the
//!   ElevenLabs REST API
//!
//! The transport is swappable: the pipeline only sees the trait, so an SDK
//! client or a test double can stand in for the HTTP implementation.
//!
//! No retries: a failed call fails its chunk for the current run.

use crate::tts::error::SynthesisError;
use crate::utils::truncate_for_log;
use reqwest::Client;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

/// Default ElevenLabs API root.
pub const ELEVENLABS_API_BASE: &str = "https://api.elevenlabs.io";

/// Trait for turning text into audio.
///
/// Implementors receive one chunk of text, an opaque voice identifier, and
/// the credential assigned to the chunk, and return the complete audio
/// payload.
pub trait SpeechSynthesizer {
    /// Synthesize `text` with `voice`, authenticating with `credential`.
    ///
    /// # Errors
    ///
    /// Returns a [`SynthesisError`] on transport failure or a non-success
    /// provider response.
    async fn synthesize(
        &self,
        text: &str,
        voice: &str,
        credential: &str,
    ) -> Result<Vec<u8>, SynthesisError>;
}

#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    text: &'a str,
    model_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct VoicesResponse {
    voices: Vec<Voice>,
}

/// A voice available to the account.
#[derive(Debug, Clone, Deserialize)]
pub struct Voice {
    pub voice_id: String,
    pub name: String,
}

/// ElevenLabs text-to-speech over plain HTTP.
pub struct ElevenLabsSynthesizer {
    client: Client,
    base_url: String,
    model_id: String,
}

impl ElevenLabsSynthesizer {
    /// Create a synthesizer for `model_id` (e.g. `eleven_monolingual_v1`).
    pub fn new(model_id: impl Into<String>) -> Self {
        Self::with_base_url(ELEVENLABS_API_BASE, model_id)
    }

    /// Create a synthesizer against a non-default API root.
    pub fn with_base_url(base_url: impl Into<String>, model_id: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model_id: model_id.into(),
        }
    }

    fn speech_url(&self, voice: &str) -> String {
        format!(
            "{}/v1/text-to-speech/{}",
            self.base_url,
            urlencoding::encode(voice)
        )
    }

    /// List the voices available to `credential`.
    #[instrument(level = "info", skip_all)]
    pub async fn list_voices(&self, credential: &str) -> Result<Vec<Voice>, Box<dyn Error>> {
        let url = format!("{}/v1/voices", self.base_url);
        let body = self
            .client
            .get(&url)
            .header("xi-api-key", credential)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;
        let parsed: VoicesResponse = serde_json::from_slice(&body)?;
        info!(count = parsed.voices.len(), "Fetched available voices");
        Ok(parsed.voices)
    }
}

impl fmt::Debug for ElevenLabsSynthesizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElevenLabsSynthesizer")
            .field("base_url", &self.base_url)
            .field("model_id", &self.model_id)
            .finish()
    }
}

impl SpeechSynthesizer for ElevenLabsSynthesizer {
    #[instrument(level = "info", skip_all, fields(voice = %voice, text_len = text.len()))]
    async fn synthesize(
        &self,
        text: &str,
        voice: &str,
        credential: &str,
    ) -> Result<Vec<u8>, SynthesisError> {
        let t0 = Instant::now();
        let payload = serde_json::to_vec(&SpeechRequest {
            text,
            model_id: &self.model_id,
        })
        .map_err(|e| SynthesisError::Transport(e.to_string()))?;

        let response = self
            .client
            .post(self.speech_url(voice))
            .header("xi-api-key", credential)
            .header(ACCEPT, "audio/mpeg")
            .header(CONTENT_TYPE, "application/json")
            .body(payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(
                status = status.as_u16(),
                elapsed_ms = t0.elapsed().as_millis() as u64,
                body = %truncate_for_log(&body, 300),
                "Synthesis request rejected"
            );
            return Err(SynthesisError::Status {
                status: status.as_u16(),
                body: truncate_for_log(&body, 300),
            });
        }

        let audio = response.bytes().await?;
        debug!(
            bytes = audio.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Synthesis request succeeded"
        );
        Ok(audio.to_vec())
    }
}
