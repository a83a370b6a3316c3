//! Offline speech recognition
//!
//! Wraps the Vosk engine: a [`RecognitionModel`] loaded from the provisioned
//! model directory, and a [`ListeningSession`] that owns microphone capture
//! and decoding on a dedicated worker thread. Hypotheses are delivered as
//! [`Transcript`] values over a channel.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tokio::sync::mpsc;
use vosk::{DecodingState, Model, Recognizer};

use crate::config::AudioConfig;
use crate::voice::capture::AudioCapture;
use crate::{Error, Result};

/// A recognition hypothesis emitted by the listening session
///
/// The payload is a JSON document of the form `{"text": "..."}`, the wire
/// shape the recognizer reports hypotheses in. Partial hypotheses carry
/// `is_final = false` and are re-emitted only when the text changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transcript {
    /// JSON payload carrying the recognized text
    pub payload: String,
    /// Whether this hypothesis closes the current utterance
    pub is_final: bool,
}

/// Handle to a loaded offline recognition model
///
/// Kept alive for the whole time a session runs; sessions borrow it only
/// long enough to construct their recognizer.
pub struct RecognitionModel {
    inner: Model,
    dir: PathBuf,
}

impl RecognitionModel {
    /// Load the model from a provisioned directory
    ///
    /// # Errors
    ///
    /// Returns error if the directory is missing or the engine rejects it
    pub fn open(dir: &Path) -> Result<Self> {
        if !dir.is_dir() {
            return Err(Error::Engine(format!(
                "model directory missing: {}",
                dir.display()
            )));
        }

        // Vosk logs its full loading banner at INFO; keep it quiet
        vosk::set_log_level(vosk::LogLevel::Error);

        let inner = Model::new(dir.to_string_lossy()).ok_or_else(|| {
            Error::Engine(format!("failed to load model from {}", dir.display()))
        })?;

        tracing::info!(path = %dir.display(), "recognition model loaded");

        Ok(Self {
            inner,
            dir: dir.to_path_buf(),
        })
    }

    /// Directory the model was loaded from
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl fmt::Debug for RecognitionModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecognitionModel")
            .field("dir", &self.dir)
            .finish_non_exhaustive()
    }
}

/// A running recognition session
///
/// Owns a worker thread that polls the microphone and feeds the recognizer.
/// At most one session runs at a time; the lifecycle controller enforces
/// this by holding the only handle.
pub struct ListeningSession {
    stop: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
    sample_rate: u32,
}

impl ListeningSession {
    /// Start listening and deliver hypotheses to `transcripts`
    ///
    /// The microphone is opened on the worker thread; startup failures are
    /// reported back before this returns.
    ///
    /// # Errors
    ///
    /// Returns error if the recognizer cannot be constructed or the audio
    /// device cannot be opened at the configured sample rate
    #[allow(clippy::cast_precision_loss)]
    pub fn start(
        model: &RecognitionModel,
        audio: AudioConfig,
        transcripts: mpsc::Sender<Transcript>,
    ) -> Result<Self> {
        let mut recognizer = Recognizer::new(&model.inner, audio.sample_rate as f32)
            .ok_or_else(|| Error::Engine("failed to construct recognizer".to_string()))?;
        recognizer.set_words(true);
        recognizer.set_partial_words(true);

        let stop = Arc::new(AtomicBool::new(false));
        let poll = Duration::from_millis(audio.poll_interval_ms);
        let (ready_tx, ready_rx) = std::sync::mpsc::sync_channel::<Result<()>>(1);

        let worker_stop = Arc::clone(&stop);
        let worker = thread::Builder::new()
            .name("hark-listen".to_string())
            .spawn(move || {
                // The capture stream is thread-bound, so it lives here
                let mut capture = match open_capture(audio) {
                    Ok(capture) => {
                        ready_tx.send(Ok(())).ok();
                        capture
                    }
                    Err(e) => {
                        ready_tx.send(Err(e)).ok();
                        return;
                    }
                };

                recognize_loop(&mut capture, &mut recognizer, &worker_stop, poll, &transcripts);
                capture.stop();
            })?;

        match ready_rx.recv() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                worker.join().ok();
                return Err(e);
            }
            Err(_) => {
                worker.join().ok();
                return Err(Error::Audio(
                    "capture worker exited before startup".to_string(),
                ));
            }
        }

        tracing::info!(sample_rate = audio.sample_rate, "listening session started");

        Ok(Self {
            stop,
            worker: Some(worker),
            sample_rate: audio.sample_rate,
        })
    }

    /// Stop the session and wait for the worker to finish
    ///
    /// Safe to call more than once; later calls are no-ops.
    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);

        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                tracing::warn!("listening worker panicked during shutdown");
            }
            tracing::info!("listening session stopped");
        }
    }

    /// Check whether the session worker is still running
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.worker.is_some()
    }

    /// Sample rate the session was started at
    #[must_use]
    pub const fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

impl Drop for ListeningSession {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Open and start microphone capture for the worker thread
fn open_capture(audio: AudioConfig) -> Result<AudioCapture> {
    let mut capture = AudioCapture::new(audio)?;
    capture.start()?;
    Ok(capture)
}

/// Poll captured audio and emit hypotheses until stopped
fn recognize_loop(
    capture: &mut AudioCapture,
    recognizer: &mut Recognizer,
    stop: &AtomicBool,
    poll: Duration,
    transcripts: &mpsc::Sender<Transcript>,
) {
    let mut last_partial = String::new();

    while !stop.load(Ordering::Relaxed) {
        thread::sleep(poll);

        let samples = capture.take_samples();
        if samples.is_empty() {
            continue;
        }

        match recognizer.accept_waveform(&samples) {
            Ok(DecodingState::Finalized) => {
                let text = recognizer
                    .result()
                    .single()
                    .map(|r| r.text.to_string())
                    .unwrap_or_default();
                last_partial.clear();

                if !text.is_empty() {
                    tracing::debug!(%text, "final hypothesis");
                    if !emit(transcripts, &text, true) {
                        return;
                    }
                }
            }
            Ok(DecodingState::Running) => {
                let partial = recognizer.partial_result().partial.to_string();

                if partial_changed(&mut last_partial, &partial) {
                    tracing::trace!(%partial, "partial hypothesis");
                    if !emit(transcripts, &partial, false) {
                        return;
                    }
                }
            }
            Ok(DecodingState::Failed) => {
                tracing::warn!("recognizer failed to decode buffered audio");
            }
            Err(e) => {
                tracing::warn!(error = ?e, "recognizer rejected waveform");
            }
        }
    }

    // Flush whatever the recognizer is still holding
    let text = recognizer
        .final_result()
        .single()
        .map(|r| r.text.to_string())
        .unwrap_or_default();

    if !text.is_empty() {
        emit(transcripts, &text, true);
    }
}

/// Send a hypothesis, returning false when the receiver is gone
fn emit(transcripts: &mpsc::Sender<Transcript>, text: &str, is_final: bool) -> bool {
    let transcript = Transcript {
        payload: hypothesis_payload(text),
        is_final,
    };

    if transcripts.blocking_send(transcript).is_err() {
        tracing::debug!("transcript receiver dropped, ending session");
        return false;
    }

    true
}

/// Encode a hypothesis as the JSON payload carried by a [`Transcript`]
fn hypothesis_payload(text: &str) -> String {
    serde_json::json!({ "text": text }).to_string()
}

/// Record the latest partial hypothesis, returning true when it differs
/// from the previous one. Empty partials never fire.
fn partial_changed(last: &mut String, partial: &str) -> bool {
    if partial.is_empty() || partial == last {
        return false;
    }

    last.clear();
    last.push_str(partial);
    true
}
