use voice_interviewer::nats::engines::{speech_event, transcript_event};
use voice_interviewer::nats::messages::{
    subjects, ListenControl, RecognitionErrorMessage, SpeakRequest, SpeechEventKind,
    SpeechEventMessage, TranscriptMessage,
};
use voice_interviewer::speech::{
    RecognitionErrorKind, RecognitionEvent, RecognitionResult, SynthesisErrorKind,
    SynthesisEvent,
};

fn transcript(text: &str, partial: bool) -> TranscriptMessage {
    TranscriptMessage {
        session_id: "interview-1".to_string(),
        text: text.to_string(),
        partial,
        timestamp: "2025-10-27T14:30:05Z".to_string(),
        confidence: None,
    }
}

#[test]
fn test_transcript_deserialization() {
    let json = r#"{
        "session_id": "interview-1",
        "text": "I would use a hash map",
        "partial": false,
        "timestamp": "2025-10-27T14:30:05Z",
        "confidence": 0.95
    }"#;

    let msg: TranscriptMessage = serde_json::from_str(json).unwrap();
    assert_eq!(msg.session_id, "interview-1");
    assert_eq!(msg.text, "I would use a hash map");
    assert!(!msg.partial);
    assert_eq!(msg.confidence, Some(0.95));
    assert_eq!(msg.timestamp, "2025-10-27T14:30:05Z");
}

#[test]
fn test_transcript_no_confidence() {
    let json = r#"{
        "session_id": "interview-1",
        "text": "No confidence score",
        "partial": true,
        "timestamp": "2025-10-27T14:30:05Z"
    }"#;

    let msg: TranscriptMessage = serde_json::from_str(json).unwrap();
    assert!(msg.partial);
    assert_eq!(msg.confidence, None);
}

#[test]
fn test_final_transcript_becomes_committed_fragment() {
    let event = transcript_event(&transcript("  a hash map ", false)).unwrap();
    assert_eq!(
        event,
        RecognitionEvent::Results {
            result_index: 0,
            results: vec![RecognitionResult::committed("a hash map ")],
        }
    );
}

#[test]
fn test_partial_transcript_becomes_interim() {
    let event = transcript_event(&transcript("a hash", true)).unwrap();
    assert_eq!(
        event,
        RecognitionEvent::Results {
            result_index: 0,
            results: vec![RecognitionResult::interim("a hash")],
        }
    );
}

#[test]
fn test_blank_transcript_is_dropped() {
    assert!(transcript_event(&transcript("   ", false)).is_none());
}

#[test]
fn test_listen_control_serialization() {
    let msg = ListenControl {
        session_id: "interview-1".to_string(),
        language: "en-US".to_string(),
        interim_results: true,
        timestamp: "2025-10-27T14:30:00Z".to_string(),
    };

    let json = serde_json::to_string(&msg).unwrap();
    assert!(json.contains("\"interim_results\":true"));
    assert!(json.contains("en-US"));
}

#[test]
fn test_recognition_error_codes() {
    let json = r#"{"session_id": "interview-1", "error": "not-allowed"}"#;
    let msg: RecognitionErrorMessage = serde_json::from_str(json).unwrap();
    assert_eq!(msg.message, None);
    assert_eq!(
        RecognitionErrorKind::from_code(&msg.error),
        RecognitionErrorKind::NotAllowed
    );
    assert_eq!(
        RecognitionErrorKind::from_code("audio-capture"),
        RecognitionErrorKind::Other("audio-capture".to_string())
    );
}

#[test]
fn test_speak_request_serialization() {
    let msg = SpeakRequest {
        session_id: "interview-1".to_string(),
        utterance_id: "u-1".to_string(),
        text: "Tell me about yourself.".to_string(),
        rate: 0.9,
        pitch: 1.0,
        volume: 1.0,
        language: "en-US".to_string(),
    };

    let json = serde_json::to_value(&msg).unwrap();
    assert_eq!(json["utterance_id"], "u-1");
    assert_eq!(json["text"], "Tell me about yourself.");
    assert_eq!(json["language"], "en-US");
}

#[test]
fn test_speech_events_filtered_by_utterance() {
    let json = r#"{"session_id": "interview-1", "utterance_id": "u-1", "event": "end"}"#;
    let msg: SpeechEventMessage = serde_json::from_str(json).unwrap();
    assert_eq!(msg.event, SpeechEventKind::End);

    assert_eq!(speech_event(&msg, "u-1"), Some(SynthesisEvent::End));
    assert_eq!(speech_event(&msg, "u-2"), None);
}

#[test]
fn test_speech_error_event_codes() {
    let json = r#"{"session_id": "interview-1", "utterance_id": "u-1", "event": "error", "error": "interrupted"}"#;
    let msg: SpeechEventMessage = serde_json::from_str(json).unwrap();
    assert_eq!(
        speech_event(&msg, "u-1"),
        Some(SynthesisEvent::Error(SynthesisErrorKind::Interrupted))
    );

    let json = r#"{"session_id": "interview-1", "utterance_id": "u-1", "event": "error"}"#;
    let msg: SpeechEventMessage = serde_json::from_str(json).unwrap();
    assert_eq!(
        speech_event(&msg, "u-1"),
        Some(SynthesisEvent::Error(SynthesisErrorKind::Other(
            "unknown".to_string()
        )))
    );
}

#[test]
fn test_subjects_are_per_session() {
    assert_eq!(subjects::speak("interview-1"), "tts.speak.interview-1");
    assert_eq!(
        subjects::listen_start("interview-1"),
        "voice.listen.start.interview-1"
    );
    assert!(subjects::TRANSCRIPTS.starts_with("stt.text."));
}
