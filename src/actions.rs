//! Device action launching
//!
//! Turns routed intents into platform commands: the camera action runs the
//! configured capture tool, the share action hands recognized text to the
//! configured share tool. Commands are spawned detached; failures are
//! logged and never stop the daemon.

use std::process::Stdio;

use tokio::process::Command;

use crate::config::ActionConfig;

/// Placeholder replaced by the shared text in configured commands
const TEXT_PLACEHOLDER: &str = "{text}";

/// Placeholder replaced by the share MIME type in configured commands
const MIME_PLACEHOLDER: &str = "{mime}";

/// A device action requested by the command router
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionRequest {
    /// Launch the platform image capture tool
    CaptureImage,
    /// Hand text off to the platform share tool
    ShareText {
        /// Text to share, as recognized
        text: String,
    },
}

/// Launches platform commands for routed actions
pub struct ActionLauncher {
    actions: ActionConfig,
}

impl ActionLauncher {
    /// Create a launcher over the configured platform commands
    #[must_use]
    pub fn new(actions: ActionConfig) -> Self {
        Self { actions }
    }

    /// Launch the command for one action request
    pub fn handle(&self, request: ActionRequest) {
        match request {
            ActionRequest::CaptureImage => {
                tracing::info!("launching image capture");
                self.launch(&self.actions.camera_command, "");
            }
            ActionRequest::ShareText { text } => {
                tracing::info!(text = %text, "launching share");
                self.launch(&self.actions.share_command, &text);
            }
        }
    }

    /// Spawn a configured command detached, with placeholders filled in
    fn launch(&self, command: &[String], text: &str) {
        let Some((program, args)) = render_command(command, text, &self.actions.share_mime) else {
            tracing::warn!("no command configured for this action on this platform");
            return;
        };

        let spawned = Command::new(&program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();

        match spawned {
            Ok(child) => {
                tracing::debug!(program = %program, pid = ?child.id(), "action spawned");
            }
            Err(e) => {
                tracing::warn!(program = %program, error = %e, "failed to launch action");
            }
        }
    }
}

/// Fill placeholders into a configured command, returning program and args
///
/// Returns `None` when no command is configured.
fn render_command(command: &[String], text: &str, mime: &str) -> Option<(String, Vec<String>)> {
    let (program, rest) = command.split_first()?;

    let args = rest
        .iter()
        .map(|arg| {
            arg.replace(TEXT_PLACEHOLDER, text)
                .replace(MIME_PLACEHOLDER, mime)
        })
        .collect();

    Some((program.clone(), args))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_command_fills_placeholders() {
        let command = vec![
            "share-tool".to_string(),
            "--mime".to_string(),
            "{mime}".to_string(),
            "--body".to_string(),
            "{text}".to_string(),
        ];

        let (program, args) = render_command(&command, "take a note", "text/plain").unwrap();
        assert_eq!(program, "share-tool");
        assert_eq!(args, vec!["--mime", "text/plain", "--body", "take a note"]);
    }

    #[test]
    fn test_render_command_empty_is_none() {
        assert!(render_command(&[], "anything", "text/plain").is_none());
    }

    #[test]
    fn test_render_command_inline_placeholder() {
        let command = vec![
            "osascript".to_string(),
            "-e".to_string(),
            "set the clipboard to \"{text}\"".to_string(),
        ];

        let (_, args) = render_command(&command, "hello", "text/plain").unwrap();
        assert_eq!(args[1], "set the clipboard to \"hello\"");
    }

    #[tokio::test]
    async fn test_launch_failures_are_swallowed() {
        let launcher = ActionLauncher::new(ActionConfig {
            camera_command: vec!["/nonexistent/hark-capture-tool".to_string()],
            share_command: vec![],
            share_mime: "text/plain".to_string(),
        });

        launcher.handle(ActionRequest::CaptureImage);
        launcher.handle(ActionRequest::ShareText {
            text: "note this".to_string(),
        });
    }
}
