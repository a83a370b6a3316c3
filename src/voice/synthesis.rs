//! Speech synthesis
//!
//! Wraps the platform speech engine. The engine renders asynchronously, so
//! [`SpeechSynthesizer::speak`] returns as soon as the utterance is queued.

use tts::Tts;

use crate::config::SpeechConfig;
use crate::{Error, Result};

/// An utterance queued for the synthesizer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeakRequest {
    /// Text to render as speech
    pub text: String,
    /// Whether to cut off anything currently being spoken
    pub flush: bool,
}

/// Renders text to speech on the platform engine
pub struct SpeechSynthesizer {
    inner: Tts,
}

impl SpeechSynthesizer {
    /// Construct the platform speech engine
    ///
    /// # Errors
    ///
    /// Returns error if no speech engine is available
    pub fn new(speech: &SpeechConfig) -> Result<Self> {
        let mut inner = Tts::default().map_err(|e| Error::Synthesis(e.to_string()))?;

        if let Some(rate) = speech.rate {
            if let Err(e) = inner.set_rate(rate) {
                tracing::warn!(rate, error = %e, "speech rate not applied");
            }
        }

        tracing::info!("speech synthesizer ready");

        Ok(Self { inner })
    }

    /// Queue an utterance, optionally flushing whatever is playing
    ///
    /// # Errors
    ///
    /// Returns error if the engine rejects the utterance
    pub fn speak(&mut self, request: SpeakRequest) -> Result<()> {
        tracing::debug!(text = %request.text, flush = request.flush, "speaking");

        self.inner
            .speak(request.text, request.flush)
            .map(|_| ())
            .map_err(|e| Error::Synthesis(e.to_string()))
    }

    /// Whether the engine is still rendering an utterance
    pub fn is_speaking(&mut self) -> bool {
        self.inner.is_speaking().unwrap_or(false)
    }

    /// Cut off any active or queued speech
    pub fn stop(&mut self) {
        if let Err(e) = self.inner.stop() {
            tracing::warn!(error = %e, "failed to stop speech");
        }
    }
}
