//! Daemon - the background keyword listener
//!
//! Wires the lifecycle controller, command router, and action launcher
//! together: transcripts flow in from the listening session, routed
//! requests flow back out to the synthesizer and launched commands.

use tokio::sync::mpsc;

use crate::Result;
use crate::actions::ActionLauncher;
use crate::config::Config;
use crate::lifecycle::LifecycleController;
use crate::router::CommandRouter;

/// Queue depth for transcripts and routed requests
const CHANNEL_CAPACITY: usize = 32;

/// The hark daemon
pub struct Daemon {
    config: Config,
}

impl Daemon {
    /// Create a new daemon instance
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Run until interrupted
    ///
    /// # Errors
    ///
    /// Returns error if startup fails. Runtime recognition and dispatch
    /// errors are logged and do not end the loop.
    #[allow(clippy::future_not_send)]
    pub async fn run(self) -> Result<()> {
        tracing::info!("daemon starting");

        let (transcript_tx, mut transcript_rx) = mpsc::channel(CHANNEL_CAPACITY);
        let (speech_tx, mut speech_rx) = mpsc::channel(CHANNEL_CAPACITY);
        let (action_tx, mut action_rx) = mpsc::channel(CHANNEL_CAPACITY);

        let mut lifecycle = LifecycleController::new(self.config.clone());
        lifecycle.start(transcript_tx)?;

        let router = CommandRouter::new(&self.config, speech_tx, action_tx);
        let launcher = ActionLauncher::new(self.config.actions.clone());

        // Set up shutdown signal
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
        let shutdown_tx_clone = shutdown_tx.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                let _ = shutdown_tx_clone.send(()).await;
            }
        });

        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    tracing::info!("shutdown requested");
                    break;
                }
                Some(transcript) = transcript_rx.recv() => {
                    router.on_transcript(&transcript);
                }
                Some(request) = speech_rx.recv() => {
                    lifecycle.speak(request);
                }
                Some(request) = action_rx.recv() => {
                    launcher.handle(request);
                }
            }
        }

        // Unblock the session worker if it is mid-send
        drop(transcript_rx);
        lifecycle.stop();

        tracing::info!("daemon stopped");
        Ok(())
    }
}
