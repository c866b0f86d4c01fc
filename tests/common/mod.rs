// Shared fakes for integration tests
//
// Scripted speech engines, a canned language model and store doubles so the
// interview flow can run end to end on a paused clock.

#![allow(dead_code)]

use anyhow::{anyhow, Result};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use voice_interviewer::conversation::KeywordHelpClassifier;
use voice_interviewer::interview::{Collaborators, SessionFactory, SharedServices};
use voice_interviewer::speech::{
    CaptureConfig, OutputConfig, PermissionState, RecognitionEngine, RecognitionErrorKind,
    RecognitionEvent, RecognitionResult, SpokenUtterance, StaticPermission, SynthesisEngine,
    SynthesisErrorKind, SynthesisEvent,
};
use voice_interviewer::store::{InterviewStore, InterviewUpdate, NewInterview, ResponseRecord};
use voice_interviewer::{
    CompletionScore, LanguageModel, MemoryStore, QuestionGenerator, ResponseGenerator,
    SpeechError,
};

// ============================================================================
// Recognition
// ============================================================================

/// One step of a scripted listening turn
#[derive(Debug, Clone)]
pub enum Step {
    Wait(Duration),
    Interim(&'static str),
    Final(&'static str),
    Error(RecognitionErrorKind),
    End,
}

/// Recognizer that plays one script per `start` call
///
/// After its script runs out it keeps the stream open until `stop`, the way
/// a continuous recognizer does.
pub struct FakeRecognizer {
    supported: bool,
    turns: Mutex<VecDeque<Vec<Step>>>,
    active: Mutex<Option<CancellationToken>>,
    pub starts: AtomicUsize,
    pub stops: AtomicUsize,
}

impl FakeRecognizer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::plain())
    }

    pub fn unsupported() -> Arc<Self> {
        Arc::new(Self {
            supported: false,
            ..Self::plain()
        })
    }

    fn plain() -> Self {
        Self {
            supported: true,
            turns: Mutex::new(VecDeque::new()),
            active: Mutex::new(None),
            starts: AtomicUsize::new(0),
            stops: AtomicUsize::new(0),
        }
    }

    pub fn push_turn(&self, steps: Vec<Step>) {
        self.turns.lock().unwrap().push_back(steps);
    }

    /// A candidate answer: a pause, then one committed fragment
    pub fn push_answer(&self, text: &'static str) {
        self.push_turn(vec![Step::Wait(Duration::from_millis(200)), Step::Final(text)]);
    }

    pub fn start_count(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub fn stop_count(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }

    fn results(result: RecognitionResult) -> RecognitionEvent {
        RecognitionEvent::Results {
            result_index: 0,
            results: vec![result],
        }
    }
}

#[async_trait::async_trait]
impl RecognitionEngine for FakeRecognizer {
    fn is_supported(&self) -> bool {
        self.supported
    }

    async fn start(&self) -> Result<mpsc::Receiver<RecognitionEvent>, SpeechError> {
        self.starts.fetch_add(1, Ordering::SeqCst);
        let steps = self.turns.lock().unwrap().pop_front().unwrap_or_default();

        let token = CancellationToken::new();
        if let Some(previous) = self.active.lock().unwrap().replace(token.clone()) {
            previous.cancel();
        }

        let (tx, rx) = mpsc::channel(32);
        tokio::spawn(async move {
            for step in steps {
                match step {
                    Step::Wait(duration) => {
                        tokio::select! {
                            _ = token.cancelled() => {
                                let _ = tx.send(RecognitionEvent::End).await;
                                return;
                            }
                            _ = tokio::time::sleep(duration) => {}
                        }
                    }
                    Step::Interim(text) => {
                        let _ = tx.send(Self::results(RecognitionResult::interim(text))).await;
                    }
                    Step::Final(text) => {
                        let event = Self::results(RecognitionResult::committed(format!("{} ", text)));
                        let _ = tx.send(event).await;
                    }
                    Step::Error(kind) => {
                        let _ = tx.send(RecognitionEvent::Error(kind)).await;
                        return;
                    }
                    Step::End => {
                        let _ = tx.send(RecognitionEvent::End).await;
                        return;
                    }
                }
            }
            token.cancelled().await;
            let _ = tx.send(RecognitionEvent::End).await;
        });

        Ok(rx)
    }

    fn stop(&self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
        if let Some(token) = self.active.lock().unwrap().take() {
            token.cancel();
        }
    }

    fn name(&self) -> &str {
        "fake"
    }
}

// ============================================================================
// Synthesis
// ============================================================================

/// How the fake synthesizer plays an utterance
#[derive(Debug, Clone, Copy)]
pub enum Playback {
    /// Start, then End after the given duration
    Normal(Duration),
    /// Start, then nothing until cancelled
    Hang,
    /// Start, then a synthesis error
    Fail,
}

pub struct FakeSynthesizer {
    supported: bool,
    playback: Mutex<Playback>,
    spoken: Mutex<Vec<SpokenUtterance>>,
    active: Mutex<Option<CancellationToken>>,
    pub cancels: AtomicUsize,
}

impl FakeSynthesizer {
    pub fn new() -> Arc<Self> {
        Self::with_playback(Playback::Normal(Duration::from_millis(500)))
    }

    pub fn with_playback(playback: Playback) -> Arc<Self> {
        Arc::new(Self {
            supported: true,
            playback: Mutex::new(playback),
            spoken: Mutex::new(Vec::new()),
            active: Mutex::new(None),
            cancels: AtomicUsize::new(0),
        })
    }

    pub fn unsupported() -> Arc<Self> {
        Arc::new(Self {
            supported: false,
            playback: Mutex::new(Playback::Normal(Duration::from_millis(10))),
            spoken: Mutex::new(Vec::new()),
            active: Mutex::new(None),
            cancels: AtomicUsize::new(0),
        })
    }

    pub fn set_playback(&self, playback: Playback) {
        *self.playback.lock().unwrap() = playback;
    }

    pub fn texts(&self) -> Vec<String> {
        self.spoken
            .lock()
            .unwrap()
            .iter()
            .map(|u| u.text.clone())
            .collect()
    }

    pub fn utterances(&self) -> Vec<SpokenUtterance> {
        self.spoken.lock().unwrap().clone()
    }

    pub fn cancel_count(&self) -> usize {
        self.cancels.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl SynthesisEngine for FakeSynthesizer {
    fn is_supported(&self) -> bool {
        self.supported
    }

    async fn speak(
        &self,
        utterance: SpokenUtterance,
    ) -> Result<mpsc::Receiver<SynthesisEvent>, SpeechError> {
        self.spoken.lock().unwrap().push(utterance);
        let playback = *self.playback.lock().unwrap();

        let token = CancellationToken::new();
        if let Some(previous) = self.active.lock().unwrap().replace(token.clone()) {
            previous.cancel();
        }

        let (tx, rx) = mpsc::channel(8);
        tokio::spawn(async move {
            let _ = tx.send(SynthesisEvent::Start).await;
            match playback {
                Playback::Normal(duration) => {
                    tokio::select! {
                        _ = token.cancelled() => {
                            let _ = tx.send(SynthesisEvent::Error(SynthesisErrorKind::Canceled)).await;
                        }
                        _ = tokio::time::sleep(duration) => {
                            let _ = tx.send(SynthesisEvent::End).await;
                        }
                    }
                }
                Playback::Hang => {
                    token.cancelled().await;
                    let _ = tx.send(SynthesisEvent::Error(SynthesisErrorKind::Canceled)).await;
                }
                Playback::Fail => {
                    let _ = tx
                        .send(SynthesisEvent::Error(SynthesisErrorKind::Other(
                            "audio-busy".to_string(),
                        )))
                        .await;
                }
            }
        });

        Ok(rx)
    }

    fn cancel(&self) {
        self.cancels.fetch_add(1, Ordering::SeqCst);
        if let Some(token) = self.active.lock().unwrap().take() {
            token.cancel();
        }
    }

    fn name(&self) -> &str {
        "fake"
    }
}

// ============================================================================
// Language model, questions, store
// ============================================================================

/// Language model that replays canned replies, then repeats a default
pub struct ScriptedModel {
    replies: Mutex<VecDeque<Result<String, String>>>,
    default_reply: String,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedModel {
    pub fn new(default_reply: &str) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(VecDeque::new()),
            default_reply: default_reply.to_string(),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn push_reply(&self, reply: &str) {
        self.replies.lock().unwrap().push_back(Ok(reply.to_string()));
    }

    pub fn push_failure(&self, reason: &str) {
        self.replies
            .lock()
            .unwrap()
            .push_back(Err(reason.to_string()));
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl LanguageModel for ScriptedModel {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        match self.replies.lock().unwrap().pop_front() {
            Some(Ok(reply)) => Ok(reply),
            Some(Err(reason)) => Err(anyhow!(reason)),
            None => Ok(self.default_reply.clone()),
        }
    }
}

/// Hands out a fixed list of questions, then fails
pub struct FixedQuestions {
    questions: Mutex<VecDeque<String>>,
    pub calls: AtomicUsize,
}

impl FixedQuestions {
    pub fn new(questions: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            questions: Mutex::new(questions.iter().map(|q| q.to_string()).collect()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn numbered(count: usize) -> Arc<Self> {
        let questions: Vec<String> = (1..=count)
            .map(|i| format!("Question number {}?", i))
            .collect();
        Arc::new(Self {
            questions: Mutex::new(questions.into_iter().collect()),
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait::async_trait]
impl QuestionGenerator for FixedQuestions {
    async fn generate_question(
        &self,
        _interview_type: &str,
        _difficulty: &str,
        _exclude: &[String],
    ) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.questions
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| anyhow!("question bank exhausted"))
    }
}

/// Store whose every write fails
pub struct FailingStore {
    pub attempts: AtomicUsize,
}

impl FailingStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            attempts: AtomicUsize::new(0),
        })
    }
}

#[async_trait::async_trait]
impl InterviewStore for FailingStore {
    async fn create_interview(&self, _interview: NewInterview) -> Result<String> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(anyhow!("database unavailable"))
    }

    async fn update_interview(&self, _id: &str, _update: InterviewUpdate) -> Result<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(anyhow!("database unavailable"))
    }

    async fn append_response(&self, _record: ResponseRecord) -> Result<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(anyhow!("database unavailable"))
    }
}

// ============================================================================
// Wiring
// ============================================================================

pub const REPLY: &str = "Good thinking. How would that scale?";

/// Everything one interview test needs a handle on
pub struct Harness {
    pub recognizer: Arc<FakeRecognizer>,
    pub synthesizer: Arc<FakeSynthesizer>,
    pub permission: Arc<StaticPermission>,
    pub model: Arc<ScriptedModel>,
    pub questions: Arc<FixedQuestions>,
    pub store: Arc<MemoryStore>,
    pub services: SharedServices,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_parts(FakeRecognizer::new(), FakeSynthesizer::new(), FixedQuestions::numbered(10))
    }

    pub fn with_parts(
        recognizer: Arc<FakeRecognizer>,
        synthesizer: Arc<FakeSynthesizer>,
        questions: Arc<FixedQuestions>,
    ) -> Self {
        let model = ScriptedModel::new(REPLY);
        let store = Arc::new(MemoryStore::new());
        let services = SharedServices {
            responder: Arc::new(ResponseGenerator::new(
                model.clone(),
                Arc::new(KeywordHelpClassifier::new()),
            )),
            questions: questions.clone(),
            store: store.clone(),
            scoring: Arc::new(CompletionScore::with_max_bonus(0.0)),
            output: OutputConfig::default(),
            capture: CaptureConfig::default(),
        };

        Self {
            recognizer,
            synthesizer,
            permission: Arc::new(StaticPermission::new(PermissionState::Granted)),
            model,
            questions,
            store,
            services,
        }
    }

    pub fn with_store(mut self, store: Arc<dyn InterviewStore>) -> Self {
        self.services.store = store;
        self
    }

    pub fn collaborators(&self) -> Collaborators {
        self.services.assemble(
            self.recognizer.clone(),
            self.synthesizer.clone(),
            self.permission.clone(),
        )
    }
}

/// Session factory that hands every interview the same fake engines
pub struct FakeFactory {
    pub recognizer: Arc<FakeRecognizer>,
    pub synthesizer: Arc<FakeSynthesizer>,
    pub permission: Arc<StaticPermission>,
    pub services: SharedServices,
    pub fail: AtomicBool,
}

impl FakeFactory {
    pub fn from_harness(harness: &Harness) -> Arc<Self> {
        Arc::new(Self {
            recognizer: harness.recognizer.clone(),
            synthesizer: harness.synthesizer.clone(),
            permission: harness.permission.clone(),
            services: harness.services.clone(),
            fail: AtomicBool::new(false),
        })
    }
}

#[async_trait::async_trait]
impl SessionFactory for FakeFactory {
    async fn collaborators(&self, _interview_id: &str) -> Result<Collaborators> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(anyhow!("voice client unreachable"));
        }
        Ok(self.services.assemble(
            self.recognizer.clone(),
            self.synthesizer.clone(),
            self.permission.clone(),
        ))
    }
}

/// Let spawned tasks run until they block, advancing paused time in small steps
pub async fn settle(total: Duration) {
    let step = Duration::from_millis(50);
    let mut elapsed = Duration::ZERO;
    while elapsed < total {
        tokio::time::sleep(step).await;
        elapsed += step;
    }
}

/// Poll `check` on a paused clock until it holds or `limit` passes
pub async fn wait_for<F: Fn() -> bool>(limit: Duration, check: F) -> bool {
    let step = Duration::from_millis(20);
    let mut waited = Duration::ZERO;
    while waited < limit {
        if check() {
            return true;
        }
        tokio::time::sleep(step).await;
        waited += step;
    }
    check()
}
