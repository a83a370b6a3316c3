//! Command routing integration tests
//!
//! Drives the router with recognizer-shaped payloads and checks what comes
//! out of the speech and action channels. No audio hardware required.

use tokio::sync::mpsc;

use hark_daemon::actions::ActionRequest;
use hark_daemon::voice::{SpeakRequest, Transcript};
use hark_daemon::{CommandIntent, CommandRouter, Config};

mod common;

fn router_with_channels() -> (
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

fn transcript(text: &str, is_final: bool) -> Transcript {
    Transcript {
        payload: common::transcript_payload(text),
        is_final,
    }
}

#[test]
fn test_time_request_speaks_once() {
    let (router, mut speech, mut actions) = router_with_channels();

    router.on_transcript(&transcript("what time is it", true));

    let request = speech.try_recv().unwrap();
    assert!(request.flush);
    assert!(
        chrono::NaiveTime::parse_from_str(&request.text, "%H:%M").is_ok(),
        "spoken time {:?} is not HH:MM",
        request.text
    );

    // Exactly one utterance and no launched action
    assert!(speech.try_recv().is_err());
    assert!(actions.try_recv().is_err());
}

#[test]
fn test_camera_request_launches_once() {
    let (router, mut speech, mut actions) = router_with_channels();

    router.on_transcript(&transcript("open camera please", true));

    assert_eq!(actions.try_recv().unwrap(), ActionRequest::CaptureImage);
    assert!(actions.try_recv().is_err());
    assert!(speech.try_recv().is_err());
}

#[test]
fn test_partial_then_final_launches_twice() {
    let (router, _speech, mut actions) = router_with_channels();

    router.on_transcript(&transcript("take a pic", false));
    router.on_transcript(&transcript("take a picture", true));

    assert_eq!(actions.try_recv().unwrap(), ActionRequest::CaptureImage);
    assert_eq!(actions.try_recv().unwrap(), ActionRequest::CaptureImage);
    assert!(actions.try_recv().is_err());
}

#[test]
fn test_time_beats_camera() {
    let (router, mut speech, mut actions) = router_with_channels();

    router.on_transcript(&transcript("what time is it, and open the camera", true));

    assert!(speech.try_recv().is_ok());
    assert!(actions.try_recv().is_err());
}

#[test]
fn test_share_carries_recognized_text() {
    let (router, _speech, mut actions) = router_with_channels();

    router.on_transcript(&transcript("Write a Note to Bob", true));

    assert_eq!(
        actions.try_recv().unwrap(),
        ActionRequest::ShareText {
            text: "write a note to bob".to_string()
        }
    );
}

#[test]
fn test_bad_payload_does_not_kill_routing() {
    let (router, mut speech, mut actions) = router_with_channels();

    router.on_transcript(&Transcript {
        payload: "{{{ definitely not json".to_string(),
        is_final: true,
    });

    assert!(speech.try_recv().is_err());
    assert!(actions.try_recv().is_err());

    // The next transcript still routes
    router.on_transcript(&transcript("take a pic", true));
    assert_eq!(actions.try_recv().unwrap(), ActionRequest::CaptureImage);
}

#[test]
fn test_unmatched_text_routes_nothing() {
    let (router, mut speech, mut actions) = router_with_channels();

    assert_eq!(router.intent_of("nice weather today"), CommandIntent::None);

    router.on_transcript(&transcript("nice weather today", true));
    assert!(speech.try_recv().is_err());
    assert!(actions.try_recv().is_err());
}
