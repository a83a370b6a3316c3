//! Keyword command routing
//!
//! Parses transcript payloads and maps recognized text onto command
//! intents by keyword containment. Matching is ordered: time, then
//! camera, then share; the first category with a hit wins. Dispatch is
//! channel-based and never blocks the daemon loop.

use std::fmt::Write as _;

use serde::Deserialize;
use tokio::sync::mpsc;

use crate::actions::ActionRequest;
use crate::config::{Config, KeywordConfig};
use crate::voice::{SpeakRequest, Transcript};

/// Intent recognized from a transcript
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandIntent {
    /// Speak the current time
    Time,
    /// Launch image capture
    Camera,
    /// Share the recognized text
    ShareText,
    /// No keyword matched
    None,
}

/// Wire shape of a transcript payload
#[derive(Debug, Deserialize)]
struct TranscriptPayload {
    #[serde(default)]
    text: String,
}

/// Routes transcripts to speech and device actions
pub struct CommandRouter {
    keywords: KeywordConfig,
    time_format: String,
    speech: mpsc::Sender<SpeakRequest>,
    actions: mpsc::Sender<ActionRequest>,
}

impl CommandRouter {
    /// Create a router dispatching into the given channels
    #[must_use]
    pub fn new(
        config: &Config,
        speech: mpsc::Sender<SpeakRequest>,
        actions: mpsc::Sender<ActionRequest>,
    ) -> Self {
        Self {
            keywords: config.keywords.clone(),
            time_format: config.speech.time_format.clone(),
            speech,
            actions,
        }
    }

    /// Route one transcript
    ///
    /// Partial and final hypotheses are treated alike, so a keyword
    /// repeated across a partial and its final dispatches twice. A payload
    /// that fails to parse routes as [`CommandIntent::None`] and the
    /// session keeps running.
    pub fn on_transcript(&self, transcript: &Transcript) {
        let text = match serde_json::from_str::<TranscriptPayload>(&transcript.payload) {
            Ok(payload) => payload.text.to_lowercase(),
            Err(e) => {
                tracing::warn!(error = %e, "unparseable transcript payload");
                String::new()
            }
        };

        let intent = self.intent_of(&text);
        tracing::debug!(?intent, %text, is_final = transcript.is_final, "transcript routed");

        match intent {
            CommandIntent::Time => {
                let mut spoken = String::new();
                if write!(spoken, "{}", chrono::Local::now().format(&self.time_format)).is_ok() {
                    self.send_speech(SpeakRequest {
                        text: spoken,
                        flush: true,
                    });
                } else {
                    tracing::warn!(format = %self.time_format, "time format is invalid, nothing spoken");
                }
            }
            CommandIntent::Camera => self.send_action(ActionRequest::CaptureImage),
            CommandIntent::ShareText => self.send_action(ActionRequest::ShareText { text }),
            CommandIntent::None => {}
        }
    }

    /// Classify recognized text by keyword containment
    #[must_use]
    pub fn intent_of(&self, text: &str) -> CommandIntent {
        if contains_any(text, &self.keywords.time) {
            CommandIntent::Time
        } else if contains_any(text, &self.keywords.camera) {
            CommandIntent::Camera
        } else if contains_any(text, &self.keywords.share) {
            CommandIntent::ShareText
        } else {
            CommandIntent::None
        }
    }

    fn send_speech(&self, request: SpeakRequest) {
        if let Err(e) = self.speech.try_send(request) {
            tracing::warn!(error = %e, "dropping speech request");
        }
    }

    fn send_action(&self, request: ActionRequest) {
        if let Err(e) = self.actions.try_send(request) {
            tracing::warn!(error = %e, "dropping action request");
        }
    }
}

/// True when any configured keyword occurs in the text
fn contains_any(text: &str, keywords: &[String]) -> bool {
    keywords
        .iter()
        .any(|k| !k.is_empty() && text.contains(k.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_router() -> (
        CommandRouter,
        mpsc::Receiver<SpeakRequest>,
        mpsc::Receiver<ActionRequest>,
    ) {
        let config = Config::default();
        let (speech_tx, speech_rx) = mpsc::channel(8);
        let (action_tx, action_rx) = mpsc::channel(8);

        (
            CommandRouter::new(&config, speech_tx, action_tx),
            speech_rx,
            action_rx,
        )
    }

    fn transcript(payload: &str, is_final: bool) -> Transcript {
        Transcript {
            payload: payload.to_string(),
            is_final,
        }
    }

    #[test]
    fn test_intent_order_prefers_time() {
        let (router, _speech, _actions) = test_router();

        assert_eq!(
            router.intent_of("what time is it, open the camera"),
            CommandIntent::Time
        );
    }

    #[test]
    fn test_intent_classification() {
        let (router, _speech, _actions) = test_router();

        assert_eq!(router.intent_of("what time is it"), CommandIntent::Time);
        assert_eq!(router.intent_of("open camera please"), CommandIntent::Camera);
        assert_eq!(router.intent_of("take a pic"), CommandIntent::Camera);
        assert_eq!(
            router.intent_of("write a note to bob"),
            CommandIntent::ShareText
        );
        assert_eq!(router.intent_of("hello there"), CommandIntent::None);
        assert_eq!(router.intent_of(""), CommandIntent::None);
    }

    #[test]
    fn test_time_request_speaks_clock() {
        let (router, mut speech, mut actions) = test_router();

        router.on_transcript(&transcript(r#"{"text": "what time is it"}"#, true));

        let request = speech.try_recv().unwrap();
        assert!(request.flush);
        assert!(chrono::NaiveTime::parse_from_str(&request.text, "%H:%M").is_ok());

        assert!(speech.try_recv().is_err());
        assert!(actions.try_recv().is_err());
    }

    #[test]
    fn test_camera_request_launches_without_speech() {
        let (router, mut speech, mut actions) = test_router();

        router.on_transcript(&transcript(r#"{"text": "open camera please"}"#, true));

        assert_eq!(actions.try_recv().unwrap(), ActionRequest::CaptureImage);
        assert!(actions.try_recv().is_err());
        assert!(speech.try_recv().is_err());
    }

    #[test]
    fn test_share_uses_lowercased_text() {
        let (router, _speech, mut actions) = test_router();

        router.on_transcript(&transcript(r#"{"text": "Write a Note to Bob"}"#, true));

        assert_eq!(
            actions.try_recv().unwrap(),
            ActionRequest::ShareText {
                text: "write a note to bob".to_string()
            }
        );
    }

    #[test]
    fn test_partial_and_final_both_dispatch() {
        let (router, _speech, mut actions) = test_router();

        router.on_transcript(&transcript(r#"{"text": "take a pic"}"#, false));
        router.on_transcript(&transcript(r#"{"text": "take a picture"}"#, true));

        assert_eq!(actions.try_recv().unwrap(), ActionRequest::CaptureImage);
        assert_eq!(actions.try_recv().unwrap(), ActionRequest::CaptureImage);
        assert!(actions.try_recv().is_err());
    }

    #[test]
    fn test_unparseable_payload_routes_nothing() {
        let (router, mut speech, mut actions) = test_router();

        router.on_transcript(&transcript("not json at all", true));

        assert!(speech.try_recv().is_err());
        assert!(actions.try_recv().is_err());

        // Router stays usable afterwards
        router.on_transcript(&transcript(r#"{"text": "take a pic"}"#, true));
        assert_eq!(actions.try_recv().unwrap(), ActionRequest::CaptureImage);
    }

    #[test]
    fn test_payload_without_text_field_routes_nothing() {
        let (router, mut speech, mut actions) = test_router();

        router.on_transcript(&transcript(r#"{"confidence": 0.9}"#, true));

        assert!(speech.try_recv().is_err());
        assert!(actions.try_recv().is_err());
    }
}
