use super::client::NatsClient;
use super::messages::{
    subjects, CancelSpeech, ListenControl, RecognitionErrorMessage, SpeakRequest,
    SpeechEventKind, SpeechEventMessage, TranscriptMessage,
};
use crate::error::SpeechError;
use crate::speech::{
    RecognitionEngine, RecognitionErrorKind, RecognitionEvent, RecognitionResult,
    SpokenUtterance, SynthesisEngine, SynthesisErrorKind, SynthesisEvent,
};
use chrono::Utc;
use futures::stream::StreamExt;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

const EVENT_BUFFER: usize = 64;

/// Map a transcript into one recognition event
///
/// Final fragments carry a trailing space so consecutive fragments
/// accumulate into separate words.
pub fn transcript_event(msg: &TranscriptMessage) -> Option<RecognitionEvent> {
    let text = msg.text.trim();
    if text.is_empty() {
        return None;
    }
    let result = if msg.partial {
        RecognitionResult::interim(text)
    } else {
        RecognitionResult::committed(format!("{} ", text))
    };
    Some(RecognitionEvent::Results {
        result_index: 0,
        results: vec![result],
    })
}

fn take_token(slot: &Mutex<Option<CancellationToken>>) -> Option<CancellationToken> {
    slot.lock().ok().and_then(|mut s| s.take())
}

fn replace_token(slot: &Mutex<Option<CancellationToken>>, token: CancellationToken) {
    if let Ok(mut s) = slot.lock() {
        if let Some(previous) = s.replace(token) {
            previous.cancel();
        }
    }
}

/// Streaming recognition performed by a remote voice client over NATS
pub struct NatsRecognitionEngine {
    client: Arc<NatsClient>,
    session_id: String,
    language: String,
    active: Mutex<Option<CancellationToken>>,
}

impl NatsRecognitionEngine {
    pub fn new(client: Arc<NatsClient>, session_id: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            client,
            session_id: session_id.into(),
            language: language.into(),
            active: Mutex::new(None),
        }
    }

    fn control(&self) -> ListenControl {
        ListenControl {
            session_id: self.session_id.clone(),
            language: self.language.clone(),
            interim_results: true,
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

#[async_trait::async_trait]
impl RecognitionEngine for NatsRecognitionEngine {
    async fn start(&self) -> Result<mpsc::Receiver<RecognitionEvent>, SpeechError> {
        let mut transcripts = self
            .client
            .subscribe(subjects::TRANSCRIPTS.to_string())
            .await
            .map_err(|e| SpeechError::StartFailed(format!("{:#}", e)))?;
        let mut errors = self
            .client
            .subscribe(subjects::listen_error(&self.session_id))
            .await
            .map_err(|e| SpeechError::StartFailed(format!("{:#}", e)))?;

        self.client
            .publish_json(subjects::listen_start(&self.session_id), &self.control())
            .await
            .map_err(|e| SpeechError::StartFailed(format!("{:#}", e)))?;

        let token = CancellationToken::new();
        replace_token(&self.active, token.clone());

        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        let session_id = self.session_id.clone();

        tokio::spawn(async move {
            debug!("Transcript forwarding started for {}", session_id);

            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => {
                        let _ = tx.send(RecognitionEvent::End).await;
                        break;
                    }
                    msg = errors.next() => {
                        let Some(msg) = msg else {
                            let _ = tx.send(RecognitionEvent::End).await;
                            break;
                        };
                        match serde_json::from_slice::<RecognitionErrorMessage>(&msg.payload) {
                            Ok(err) => {
                                warn!("Voice client reported recognition error: {}", err.error);
                                let kind = RecognitionErrorKind::from_code(&err.error);
                                let _ = tx.send(RecognitionEvent::Error(kind)).await;
                                break;
                            }
                            Err(e) => warn!("Failed to parse recognition error: {}", e),
                        }
                    }
                    msg = transcripts.next() => {
                        let Some(msg) = msg else {
                            let _ = tx.send(RecognitionEvent::End).await;
                            break;
                        };
                        match serde_json::from_slice::<TranscriptMessage>(&msg.payload) {
                            Ok(transcript) => {
                                // Filter by session_id
                                if transcript.session_id != session_id {
                                    continue;
                                }
                                if let Some(event) = transcript_event(&transcript) {
                                    if tx.send(event).await.is_err() {
                                        break;
                                    }
                                }
                            }
                            Err(e) => warn!("Failed to parse transcript message: {}", e),
                        }
                    }
                }
            }

            debug!("Transcript forwarding stopped for {}", session_id);
        });

        info!("Remote listening started for {}", self.session_id);
        Ok(rx)
    }

    fn stop(&self) {
        if let Some(token) = take_token(&self.active) {
            token.cancel();
            self.client
                .publish_json_detached(subjects::listen_stop(&self.session_id), &self.control());
        }
    }

    fn name(&self) -> &str {
        "nats"
    }
}

/// Speech synthesis played by a remote voice client over NATS
pub struct NatsSynthesisEngine {
    client: Arc<NatsClient>,
    session_id: String,
    active: Mutex<Option<CancellationToken>>,
}

impl NatsSynthesisEngine {
    pub fn new(client: Arc<NatsClient>, session_id: impl Into<String>) -> Self {
        Self {
            client,
            session_id: session_id.into(),
            active: Mutex::new(None),
        }
    }
}

/// Map a playback event for `utterance_id`; events for other utterances are ignored
pub fn speech_event(msg: &SpeechEventMessage, utterance_id: &str) -> Option<SynthesisEvent> {
    if msg.utterance_id != utterance_id {
        return None;
    }
    Some(match msg.event {
        SpeechEventKind::Start => SynthesisEvent::Start,
        SpeechEventKind::End => SynthesisEvent::End,
        SpeechEventKind::Error => SynthesisEvent::Error(SynthesisErrorKind::from_code(
            msg.error.as_deref().unwrap_or("unknown"),
        )),
    })
}

#[async_trait::async_trait]
impl SynthesisEngine for NatsSynthesisEngine {
    async fn speak(
        &self,
        utterance: SpokenUtterance,
    ) -> Result<mpsc::Receiver<SynthesisEvent>, SpeechError> {
        let mut events = self
            .client
            .subscribe(subjects::speech_events(&self.session_id))
            .await
            .map_err(|e| SpeechError::Synthesis(format!("{:#}", e)))?;

        let utterance_id = utterance.id.to_string();
        let request = SpeakRequest {
            session_id: self.session_id.clone(),
            utterance_id: utterance_id.clone(),
            text: utterance.text,
            rate: utterance.rate,
            pitch: utterance.pitch,
            volume: utterance.volume,
            language: utterance.language,
        };
        self.client
            .publish_json(subjects::speak(&self.session_id), &request)
            .await
            .map_err(|e| SpeechError::Synthesis(format!("{:#}", e)))?;

        let token = CancellationToken::new();
        replace_token(&self.active, token.clone());

        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => {
                        let _ = tx.send(SynthesisEvent::Error(SynthesisErrorKind::Canceled)).await;
                        break;
                    }
                    msg = events.next() => {
                        let Some(msg) = msg else { break };
                        let parsed = match serde_json::from_slice::<SpeechEventMessage>(&msg.payload) {
                            Ok(parsed) => parsed,
                            Err(e) => {
                                warn!("Failed to parse speech event: {}", e);
                                continue;
                            }
                        };
                        let Some(event) = speech_event(&parsed, &utterance_id) else {
                            continue;
                        };
                        let terminal = !matches!(event, SynthesisEvent::Start);
                        if tx.send(event).await.is_err() || terminal {
                            break;
                        }
                    }
                }
            }
        });

        Ok(rx)
    }

    fn cancel(&self) {
        if let Some(token) = take_token(&self.active) {
            token.cancel();
            let message = CancelSpeech {
                session_id: self.session_id.clone(),
                timestamp: Utc::now().to_rfc3339(),
            };
            self.client
                .publish_json_detached(subjects::cancel_speech(&self.session_id), &message);
        }
    }

    fn name(&self) -> &str {
        "nats"
    }
}
