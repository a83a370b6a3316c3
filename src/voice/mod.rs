//! Voice processing module
//!
//! Handles microphone capture, offline recognition, and speech synthesis.
//! Transcripts flow to the command router through the daemon (see `daemon.rs`)

mod capture;
mod recognizer;
mod synthesis;

pub use capture::{AudioCapture, samples_to_wav};
pub use recognizer::{ListeningSession, RecognitionModel, Transcript};
pub use synthesis::{SpeakRequest, SpeechSynthesizer};
