//! Daemon lifecycle control
//!
//! Drives the state machine Stopped → Elevating → Provisioning → Listening
//! and back down through ShuttingDown. The controller owns every engine
//! handle; teardown releases them in a fixed order, each at most once.

use std::fmt;

use tokio::sync::mpsc;

use crate::assets::AssetProvisioner;
use crate::config::Config;
use crate::voice::{
    ListeningSession, RecognitionModel, SpeakRequest, SpeechSynthesizer, Transcript,
};
use crate::{Error, Result};

/// Lifecycle state of the daemon
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceState {
    /// Nothing acquired
    Stopped,
    /// Coming to the foreground and acquiring the speech engine
    Elevating,
    /// Mirroring model assets into the writable directory
    Provisioning,
    /// Recognition session running
    Listening,
    /// Releasing engine handles
    ShuttingDown,
}

impl fmt::Display for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Stopped => "stopped",
            Self::Elevating => "elevating",
            Self::Provisioning => "provisioning",
            Self::Listening => "listening",
            Self::ShuttingDown => "shutting-down",
        };

        write!(f, "{label}")
    }
}

/// Engine handles owned by the running daemon
///
/// Release order is fixed: listening session, then recognition model, then
/// synthesizer. Handles released once stay released.
#[derive(Default)]
pub struct EngineResources {
    pub(crate) session: Option<ListeningSession>,
    pub(crate) model: Option<RecognitionModel>,
    pub(crate) synthesizer: Option<SpeechSynthesizer>,
}

impl EngineResources {
    /// Release every handle still held, newest first
    pub fn release(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.stop();
        }

        if let Some(model) = self.model.take() {
            tracing::info!(path = %model.dir().display(), "recognition model released");
        }

        if let Some(mut synthesizer) = self.synthesizer.take() {
            synthesizer.stop();
            tracing::info!("speech synthesizer released");
        }
    }

    /// Whether any engine handle is still held
    #[must_use]
    pub const fn any_acquired(&self) -> bool {
        self.session.is_some() || self.model.is_some() || self.synthesizer.is_some()
    }
}

/// Drives the daemon through its lifecycle states
pub struct LifecycleController {
    config: Config,
    state: ServiceState,
    resources: EngineResources,
}

impl LifecycleController {
    /// Create a controller in the stopped state
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            state: ServiceState::Stopped,
            resources: EngineResources::default(),
        }
    }

    /// Current lifecycle state
    #[must_use]
    pub const fn state(&self) -> ServiceState {
        self.state
    }

    /// Bring the daemon up: acquire speech, provision assets, start listening
    ///
    /// Transcripts from the session are delivered to `transcripts`. On
    /// failure, everything acquired so far is released before the error is
    /// returned.
    ///
    /// # Errors
    ///
    /// Returns error if provisioning fails or the recognition engine cannot
    /// be constructed. An unavailable synthesizer is not fatal.
    pub fn start(&mut self, transcripts: mpsc::Sender<Transcript>) -> Result<()> {
        match self.start_inner(transcripts) {
            Ok(()) => Ok(()),
            Err(e) => {
                tracing::error!(error = %e, state = %self.state, "startup failed, releasing");
                self.stop();
                Err(e)
            }
        }
    }

    fn start_inner(&mut self, transcripts: mpsc::Sender<Transcript>) -> Result<()> {
        self.transition(ServiceState::Elevating);
        tracing::info!("running in the foreground as a keyword listener");

        // Listening works without a voice; spoken responses are just dropped.
        match SpeechSynthesizer::new(&self.config.speech) {
            Ok(synthesizer) => self.resources.synthesizer = Some(synthesizer),
            Err(e) => tracing::warn!(error = %e, "speech synthesizer unavailable"),
        }

        self.transition(ServiceState::Provisioning);

        let provisioner = AssetProvisioner::new(&self.config.model);
        provisioner.ensure_model()?;

        if !provisioner.is_provisioned() {
            tracing::warn!("model mirror incomplete, copying again");
            provisioner.ensure_model()?;
        }

        if !provisioner.is_provisioned() {
            let missing = provisioner.missing_files().join(", ");
            return Err(Error::Asset(format!(
                "model mirror incomplete: missing {missing}"
            )));
        }

        self.transition(ServiceState::Listening);

        let model = RecognitionModel::open(provisioner.mirror_dir())?;
        let session = ListeningSession::start(&model, self.config.audio, transcripts)?;

        self.resources.model = Some(model);
        self.resources.session = Some(session);

        Ok(())
    }

    /// Tear the daemon down, releasing engine handles in order
    ///
    /// Safe to call in any state, including repeatedly.
    pub fn stop(&mut self) {
        if self.state == ServiceState::Stopped && !self.resources.any_acquired() {
            return;
        }

        self.transition(ServiceState::ShuttingDown);
        self.resources.release();
        self.transition(ServiceState::Stopped);
    }

    /// Forward a speech request to the synthesizer, if acquired
    ///
    /// Failures are logged; a missing synthesizer drops the request.
    pub fn speak(&mut self, request: SpeakRequest) {
        if let Some(synthesizer) = &mut self.resources.synthesizer {
            if let Err(e) = synthesizer.speak(request) {
                tracing::warn!(error = %e, "speech request failed");
            }
        } else {
            tracing::debug!("speech request ignored, synthesizer not acquired");
        }
    }

    fn transition(&mut self, next: ServiceState) {
        tracing::info!(from = %self.state, to = %next, "lifecycle transition");
        self.state = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_release_on_empty_resources_is_idempotent() {
        let mut resources = EngineResources::default();
        assert!(!resources.any_acquired());

        resources.release();
        resources.release();
        assert!(!resources.any_acquired());
    }

    #[test]
    fn test_new_controller_is_stopped() {
        let controller = LifecycleController::new(Config::default());
        assert_eq!(controller.state(), ServiceState::Stopped);
    }

    #[test]
    fn test_stop_without_start_stays_stopped() {
        let mut controller = LifecycleController::new(Config::default());

        controller.stop();
        controller.stop();
        assert_eq!(controller.state(), ServiceState::Stopped);
    }

    #[test]
    fn test_speak_without_synthesizer_is_dropped() {
        let mut controller = LifecycleController::new(Config::default());

        controller.speak(SpeakRequest {
            text: "12:00".to_string(),
            flush: true,
        });
        assert_eq!(controller.state(), ServiceState::Stopped);
    }

    #[test]
    fn test_state_labels() {
        assert_eq!(ServiceState::Stopped.to_string(), "stopped");
        assert_eq!(ServiceState::Elevating.to_string(), "elevating");
        assert_eq!(ServiceState::Provisioning.to_string(), "provisioning");
        assert_eq!(ServiceState::ShuttingDown.to_string(), "shutting-down");
    }
}
