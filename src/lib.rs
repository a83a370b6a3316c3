//! Hark - background voice command listener
//!
//! This library provides the core functionality for the hark daemon:
//! - Model asset provisioning (bundled directory -> writable mirror)
//! - Offline speech recognition on a dedicated capture thread
//! - Keyword routing of transcripts to spoken replies and device actions
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                 Microphone (16 kHz)                  │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │               Listening Session                      │
//! │   capture thread  │  recognizer  │  transcripts     │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │                Command Router                        │
//! │   time  │  camera  │  share text  │  (none)         │
//! └──────┬─────────────────────────────────┬────────────┘
//!        │                                 │
//!   speech synthesis               launched actions
//! ```

pub mod actions;
pub mod assets;
pub mod config;
pub mod daemon;
pub mod error;
pub mod lifecycle;
pub mod router;
pub mod service;
pub mod voice;

pub use actions::{ActionLauncher, ActionRequest};
pub use assets::AssetProvisioner;
pub use config::Config;
pub use daemon::Daemon;
pub use error::{Error, Result};
pub use lifecycle::{EngineResources, LifecycleController, ServiceState};
pub use router::{CommandIntent, CommandRouter};
pub use voice::{ListeningSession, RecognitionModel, SpeakRequest, SpeechSynthesizer, Transcript};
