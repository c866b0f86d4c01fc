use super::config::{InterviewConfig, InterviewSettings};
use super::messages;
use super::scoring::ScoringPolicy;
use super::state::{InterviewSnapshot, InterviewState, InterviewStatus, Notice, TurnPhase};
use crate::conversation::{
    ConversationHistory, ConversationTurnRecord, InterviewContext, ResponseGenerator, Speaker,
};
use crate::error::SpeechError;
use crate::llm::{fallback_question, is_excluded, QuestionGenerator};
use crate::speech::{
    ListenMode, MicrophonePermission, PartialCallback, PermissionState, SpeakOutcome,
    SpeechCapture, SpeechOutput,
};
use crate::store::{InterviewStore, InterviewUpdate, NewInterview, ResponseRecord};
use chrono::Utc;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Everything an interview talks to
pub struct Collaborators {
    pub output: Arc<SpeechOutput>,
    pub capture: Arc<SpeechCapture>,
    pub permission: Arc<dyn MicrophonePermission>,
    pub responder: Arc<ResponseGenerator>,
    pub questions: Arc<dyn QuestionGenerator>,
    pub store: Arc<dyn InterviewStore>,
    pub scoring: Arc<dyn ScoringPolicy>,
}

enum ListenOutcome {
    Answer(String),
    Help,
    Failed(SpeechError),
}

/// Voice interview controller
///
/// Drives greeting, question, answer, and response turns on a background
/// task. Only one of speaking or listening is active at a time; the user
/// controls (`interrupt_speech`, `request_help`, `request_listen`,
/// `end_call`) are the only things that reach in from outside.
pub struct InterviewSession {
    id: String,
    settings: InterviewSettings,
    config: InterviewConfig,
    output: Arc<SpeechOutput>,
    capture: Arc<SpeechCapture>,
    permission: Arc<dyn MicrophonePermission>,
    responder: Arc<ResponseGenerator>,
    questions: Arc<dyn QuestionGenerator>,
    store: Arc<dyn InterviewStore>,
    scoring: Arc<dyn ScoringPolicy>,

    state: Mutex<InterviewState>,
    history: Mutex<ConversationHistory>,

    /// Cleared by the interrupt callback as soon as playback is cut off
    is_speaking: Arc<AtomicBool>,

    /// Latest live transcript from the capture adapter
    partial: Arc<Mutex<String>>,

    /// Set by `request_help`, cleared when a new question starts so a stale
    /// request never carries over
    help_pending: AtomicBool,
    help_requested: Notify,
    listen_requested: Notify,

    /// Silent teardown, no closing speech and no persistence
    teardown: CancellationToken,

    /// Candidate ended the call
    end_requested: CancellationToken,

    /// Cancelled once the controller task has fully wound down
    done: CancellationToken,

    task: Mutex<Option<JoinHandle<()>>>,

    /// Outstanding fire-and-forget store writes
    writes: Mutex<Vec<JoinHandle<()>>>,
}

impl InterviewSession {
    pub fn new(
        id: impl Into<String>,
        settings: InterviewSettings,
        config: InterviewConfig,
        collaborators: Collaborators,
    ) -> Arc<Self> {
        let is_speaking = Arc::new(AtomicBool::new(false));

        let flag = Arc::clone(&is_speaking);
        collaborators
            .output
            .set_interrupt_callback(Arc::new(move || flag.store(false, Ordering::SeqCst)));

        Arc::new(Self {
            id: id.into(),
            settings,
            config,
            output: collaborators.output,
            capture: collaborators.capture,
            permission: collaborators.permission,
            responder: collaborators.responder,
            questions: collaborators.questions,
            store: collaborators.store,
            scoring: collaborators.scoring,
            state: Mutex::new(InterviewState::default()),
            history: Mutex::new(ConversationHistory::new()),
            is_speaking,
            partial: Arc::new(Mutex::new(String::new())),
            help_pending: AtomicBool::new(false),
            help_requested: Notify::new(),
            listen_requested: Notify::new(),
            teardown: CancellationToken::new(),
            end_requested: CancellationToken::new(),
            done: CancellationToken::new(),
            task: Mutex::new(None),
            writes: Mutex::new(Vec::new()),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn settings(&self) -> &InterviewSettings {
        &self.settings
    }

    /// Check capabilities and permission, then run the interview in the background
    pub async fn start(self: &Arc<Self>) -> Result<(), SpeechError> {
        if self.state().status != InterviewStatus::NotStarted {
            warn!("Interview {} already started", self.id);
            return Ok(());
        }

        if !self.capture.is_supported() {
            return Err(self.refuse(SpeechError::CapabilityUnavailable(
                "streaming speech recognition".to_string(),
            )));
        }
        if !self.output.is_supported() {
            return Err(self.refuse(SpeechError::CapabilityUnavailable(
                "speech synthesis".to_string(),
            )));
        }

        match self.permission.query().await {
            PermissionState::Granted => {}
            PermissionState::Denied => {
                return Err(self.refuse(SpeechError::PermissionDenied));
            }
            PermissionState::Prompt | PermissionState::Unknown => {
                if !self.permission.request().await {
                    return Err(self.refuse(SpeechError::PermissionDenied));
                }
            }
        }

        {
            let mut state = self.state();
            if state.status != InterviewStatus::NotStarted {
                return Ok(());
            }
            state.status = InterviewStatus::InProgress;
            state.started_at = Some(Utc::now());
            state.notice = None;
        }

        info!(
            "Starting {} interview {} for {} at {}",
            self.settings.interview_type, self.id, self.settings.role, self.settings.company
        );

        let this = Arc::clone(self);
        let handle = tokio::spawn(async move { this.run().await });
        *self.lock_task() = Some(handle);
        Ok(())
    }

    /// Ask for microphone access again after a denial. Never retries on its own.
    pub async fn request_microphone_permission(&self) -> bool {
        let granted = self.permission.request().await;
        if granted {
            info!("Microphone permission granted for interview {}", self.id);
            self.state().notice = None;
        } else {
            self.post_notice(SpeechError::PermissionDenied.user_message());
        }
        granted
    }

    /// Cut off interruptible speech. Returns whether anything was interrupted.
    ///
    /// The controller then waits for `request_listen` before capturing again.
    pub fn interrupt_speech(&self) -> bool {
        let interrupted = self.output.interrupt();
        if interrupted {
            self.hold_for_listen();
        }
        interrupted
    }

    /// Ask the interviewer for a hint on the current question
    pub fn request_help(&self) -> bool {
        if self.state().status != InterviewStatus::InProgress {
            return false;
        }
        info!("Help requested in interview {}", self.id);
        self.help_pending.store(true, Ordering::SeqCst);
        self.help_requested.notify_one();
        true
    }

    /// Resume listening after an interruption or a blocking error
    pub fn request_listen(&self) -> bool {
        let awaiting = {
            let state = self.state();
            state.status == InterviewStatus::InProgress && state.awaiting_listen
        };
        if awaiting {
            self.listen_requested.notify_one();
        }
        awaiting
    }

    /// End the interview now: cancel any speech or listening, speak the
    /// early closing, persist the terminal status, and return the final view.
    pub async fn end_call(&self) -> InterviewSnapshot {
        let status = self.state().status;
        match status {
            InterviewStatus::NotStarted => {
                info!("Interview {} ended before it started", self.id);
                self.finish(true).await;
                self.done.cancel();
            }
            InterviewStatus::InProgress => {
                info!("Ending interview {} early", self.id);
                self.capture.stop_listening();
                self.output.stop();
                self.end_requested.cancel();
                self.wait_until_finished().await;
            }
            InterviewStatus::Completed | InterviewStatus::EndedEarly => {
                self.wait_until_finished().await;
            }
        }
        self.snapshot()
    }

    /// Tear the interview down without speaking or persisting anything
    pub async fn shutdown(&self) {
        debug!("Shutting down interview {}", self.id);
        self.teardown.cancel();
        self.capture.stop_listening();
        self.output.stop();
        self.is_speaking.store(false, Ordering::SeqCst);

        let handle = self.lock_task().take();
        match handle {
            Some(handle) => {
                if let Err(e) = handle.await {
                    error!("Interview {} task failed: {}", self.id, e);
                }
            }
            None => self.done.cancel(),
        }
        self.set_phase(TurnPhase::Ended);
    }

    /// Resolves once the controller has finished (naturally, early, or by teardown)
    pub async fn wait_until_finished(&self) {
        self.done.cancelled().await
    }

    pub fn is_finished(&self) -> bool {
        self.done.is_cancelled()
    }

    pub fn snapshot(&self) -> InterviewSnapshot {
        let partial = self.partial.lock().map(|p| p.clone()).unwrap_or_default();
        let state = self.state();
        let notice = state
            .notice
            .as_ref()
            .filter(|n| n.posted_at.elapsed() < self.config.notice_ttl)
            .map(|n| n.message.clone());

        InterviewSnapshot {
            id: self.id.clone(),
            status: state.status,
            phase: state.phase,
            question_index: state.question_index,
            max_questions: self.config.max_questions,
            current_question: state.current_question.clone(),
            is_speaking: self.is_speaking.load(Ordering::SeqCst),
            is_listening: self.capture.is_listening(),
            awaiting_listen: state.awaiting_listen,
            partial_transcript: partial,
            notice,
            score: state.score,
        }
    }

    pub fn history(&self) -> Vec<ConversationTurnRecord> {
        self.lock_history().records().to_vec()
    }

    async fn run(self: Arc<Self>) {
        let early = tokio::select! {
            biased;
            _ = self.teardown.cancelled() => None,
            _ = self.end_requested.cancelled() => Some(true),
            _ = self.conduct() => Some(false),
        };

        if let Some(early) = early {
            tokio::select! {
                biased;
                _ = self.teardown.cancelled() => {}
                _ = self.finish(early) => {}
            }
        }

        self.done.cancel();
        debug!("Interview {} controller stopped", self.id);
    }

    async fn conduct(&self) {
        self.greet().await;

        while self.state().question_index < self.config.max_questions {
            let question = self.ask_question().await;
            self.answer_question(&question).await;
        }
    }

    async fn greet(&self) {
        self.set_phase(TurnPhase::Greeting);
        self.create_record().await;

        let welcome = messages::welcome(&self.settings, self.config.max_questions);
        self.push_history(Speaker::Interviewer, &welcome);
        self.say(&welcome, true).await;
    }

    async fn ask_question(&self) -> String {
        self.set_phase(TurnPhase::AskingQuestion);
        self.help_pending.store(false, Ordering::SeqCst);

        let asked = self.state().asked_questions.clone();
        let kind = &self.settings.interview_type;
        let question = match self
            .questions
            .generate_question(kind, &self.settings.difficulty, &asked)
            .await
        {
            Ok(q) if !q.trim().is_empty() && !is_excluded(&q, &asked) => q,
            Ok(q) => {
                warn!("Question generator returned unusable question {:?}, using fallback", q);
                fallback_question(kind, &asked)
            }
            Err(e) => {
                warn!("Question generation failed, using fallback: {:#}", e);
                fallback_question(kind, &asked)
            }
        };

        {
            let mut state = self.state();
            state.asked_questions.push(question.clone());
            state.current_question = Some(question.clone());
        }
        self.push_history(Speaker::Interviewer, &question);

        self.set_phase(TurnPhase::SpeakingQuestion);
        self.say(&question, true).await;

        // A question counts once it has been delivered
        let index = {
            let mut state = self.state();
            state.question_index += 1;
            state.question_index
        };
        info!(
            "Interview {}: question {}/{}",
            self.id, index, self.config.max_questions
        );
        self.persist_progress(index, &question);
        question
    }

    /// Listen until the candidate gives an answer and the reply is spoken.
    /// The help control and silence never consume the question; an answer
    /// always does, even one that asks for a hint.
    async fn answer_question(&self, question: &str) {
        let mut silent_turns = 0;

        loop {
            match self.listen_for_answer().await {
                ListenOutcome::Help => {
                    self.give_help(messages::HELP_REQUEST).await;
                }
                ListenOutcome::Answer(text) if text.is_empty() => {
                    silent_turns += 1;
                    debug!("Empty turn {} on question {:?}", silent_turns, question);
                    if silent_turns >= self.config.silent_turn_limit {
                        silent_turns = 0;
                        self.set_phase(TurnPhase::SpeakingQuestion);
                        self.say(&messages::reprompt(question), true).await;
                    }
                }
                ListenOutcome::Answer(text) => {
                    silent_turns = 0;
                    self.push_history(Speaker::Candidate, &text);

                    self.set_phase(TurnPhase::GeneratingResponse);
                    let reply = self.responder.respond(&text, &self.context()).await;
                    self.push_history(Speaker::Interviewer, &reply);
                    self.persist_response(question, &text, &reply);

                    // An interrupted reply leaves the hold set; the next
                    // question waits for the candidate before listening
                    self.set_phase(TurnPhase::SpeakingResponse);
                    if self.say(&reply, true).await == SpeakOutcome::Interrupted {
                        debug!("Reply interrupted in interview {}", self.id);
                    }
                    return;
                }
                ListenOutcome::Failed(err) => {
                    warn!("Listening failed in interview {}: {}", self.id, err);
                    self.post_notice(err.user_message());
                    if err.is_blocking() {
                        self.hold_for_listen();
                    }
                }
            }
        }
    }

    async fn listen_for_answer(&self) -> ListenOutcome {
        self.set_phase(TurnPhase::ListeningForAnswer);

        let hold = self.state().awaiting_listen;
        if hold {
            info!("Interview {} waiting for the candidate to resume", self.id);
            tokio::select! {
                biased;
                _ = self.help_wanted() => {
                    self.state().awaiting_listen = false;
                    return ListenOutcome::Help;
                }
                _ = self.listen_requested.notified() => {}
            }
            self.state().awaiting_listen = false;
        } else {
            tokio::select! {
                biased;
                _ = self.help_wanted() => return ListenOutcome::Help,
                _ = tokio::time::sleep(self.config.post_speech_delay) => {}
            }
        }

        self.set_partial(String::new());
        let partial = Arc::clone(&self.partial);
        let on_partial: PartialCallback = Arc::new(move |text: &str| {
            if let Ok(mut current) = partial.lock() {
                *current = text.to_string();
            }
        });

        let listen = self
            .capture
            .listen(ListenMode::Conversational, Some(on_partial));
        tokio::pin!(listen);

        let result = tokio::select! {
            biased;
            result = &mut listen => result,
            _ = self.help_wanted() => {
                self.capture.stop_listening();
                if let Ok(text) = listen.await {
                    if !text.is_empty() {
                        debug!("Discarding {:?} captured before help request", text);
                    }
                }
                return ListenOutcome::Help;
            }
        };

        match result {
            Ok(text) => ListenOutcome::Answer(text),
            Err(e) if e.is_empty_turn() => ListenOutcome::Answer(String::new()),
            Err(e) => ListenOutcome::Failed(e),
        }
    }

    /// Resolves on a help request made since the current question started
    async fn help_wanted(&self) {
        loop {
            self.help_requested.notified().await;
            if self.help_pending.swap(false, Ordering::SeqCst) {
                return;
            }
        }
    }

    async fn give_help(&self, request: &str) {
        self.set_phase(TurnPhase::GeneratingResponse);
        let hint = self.responder.help(request, &self.context()).await;
        self.push_history(Speaker::Interviewer, &hint);

        self.set_phase(TurnPhase::SpeakingResponse);
        self.say(&hint, true).await;
    }

    /// Natural or early end. Runs at most once.
    async fn finish(&self, early: bool) {
        let status = if early {
            InterviewStatus::EndedEarly
        } else {
            InterviewStatus::Completed
        };
        {
            let mut state = self.state();
            if state.status.is_terminal() {
                return;
            }
            state.status = status;
            state.phase = TurnPhase::Ending;
            state.awaiting_listen = false;
        }

        self.capture.stop_listening();
        self.output.stop();

        let closing = if early {
            messages::early_closing(&self.settings)
        } else {
            messages::closing(&self.settings, self.config.max_questions)
        };
        self.push_history(Speaker::Interviewer, &closing);
        self.say(&closing, false).await;

        let asked = self.state().question_index;
        let score = self.scoring.score(asked, self.config.max_questions);
        self.state().score = Some(score);

        self.flush_writes().await;
        self.persist_final(status, score).await;

        self.set_phase(TurnPhase::Ended);
        info!(
            "Interview {} {} after {}/{} questions, score {}",
            self.id,
            status.as_str(),
            asked,
            self.config.max_questions,
            score
        );
    }

    async fn say(&self, text: &str, interruptible: bool) -> SpeakOutcome {
        self.is_speaking.store(true, Ordering::SeqCst);
        let outcome = match self.output.speak(text, interruptible).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("Speech output failed in interview {}: {}", self.id, e);
                self.post_notice(e.user_message());
                SpeakOutcome::Completed
            }
        };
        self.is_speaking.store(false, Ordering::SeqCst);
        outcome
    }

    fn context(&self) -> InterviewContext {
        let conversation_history = self.history();
        let state = self.state();
        InterviewContext {
            company: self.settings.company.clone(),
            role: self.settings.role.clone(),
            interview_type: self.settings.interview_type.clone(),
            difficulty: self.settings.difficulty.clone(),
            current_question: state.current_question.clone(),
            question_index: state.question_index,
            max_questions: self.config.max_questions,
            conversation_history,
            candidate_name: self.settings.candidate_name.clone(),
        }
    }

    async fn create_record(&self) {
        let row = NewInterview {
            user_id: self.settings.user_id.clone(),
            company: self.settings.company.clone(),
            role: self.settings.role.clone(),
            interview_type: self.settings.interview_type.clone(),
            score: 0,
            duration: 0,
            status: InterviewStatus::InProgress.as_str().to_string(),
            questions_count: self.config.max_questions,
            topics: vec![self.settings.interview_type.clone()],
            feedback: "Interview in progress".to_string(),
        };

        match self.store.create_interview(row).await {
            Ok(record_id) => {
                debug!("Interview {} persisted as {}", self.id, record_id);
                self.state().record_id = Some(record_id);
            }
            Err(e) => {
                error!(
                    "Failed to create interview record for {}, continuing in memory: {:#}",
                    self.id, e
                );
            }
        }
    }

    fn persist_progress(&self, index: usize, question: &str) {
        let Some(record_id) = self.record_id() else {
            return;
        };
        let store = Arc::clone(&self.store);
        let update = InterviewUpdate {
            questions_asked: Some(index),
            current_question: Some(question.to_string()),
            ..Default::default()
        };
        self.spawn_write("update interview progress", async move {
            store.update_interview(&record_id, update).await
        });
    }

    fn persist_response(&self, question: &str, response: &str, feedback: &str) {
        let Some(record_id) = self.record_id() else {
            return;
        };
        let store = Arc::clone(&self.store);
        let record = ResponseRecord {
            interview_id: record_id,
            question: question.to_string(),
            response: response.to_string(),
            ai_feedback: feedback.to_string(),
            question_number: self.state().question_index,
        };
        self.spawn_write("save interview response", async move {
            store.append_response(record).await
        });
    }

    async fn persist_final(&self, status: InterviewStatus, score: u8) {
        let (record_id, started_at) = {
            let state = self.state();
            (state.record_id.clone(), state.started_at)
        };
        let Some(record_id) = record_id else {
            return;
        };

        let now = Utc::now();
        let duration = started_at
            .map(|t| (now - t).num_seconds().max(0) as u64)
            .unwrap_or(0);
        let feedback = match status {
            InterviewStatus::EndedEarly => "Interview ended early",
            _ => "Interview completed successfully",
        };
        let update = InterviewUpdate {
            status: Some(status.as_str().to_string()),
            score: Some(score),
            completed_at: Some(now),
            duration: Some(duration),
            feedback: Some(feedback.to_string()),
            ..Default::default()
        };

        if let Err(e) = self.store.update_interview(&record_id, update).await {
            error!("Failed to save final result for {}: {:#}", self.id, e);
        }
    }

    fn spawn_write<F>(&self, what: &'static str, write: F)
    where
        F: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            if let Err(e) = write.await {
                error!("Failed to {}: {:#}", what, e);
            }
        });
        self.lock_writes().push(handle);
    }

    async fn flush_writes(&self) {
        let pending = std::mem::take(&mut *self.lock_writes());
        for handle in pending {
            if let Err(e) = handle.await {
                error!("Store write task failed: {}", e);
            }
        }
    }

    fn refuse(&self, err: SpeechError) -> SpeechError {
        warn!("Interview {} cannot start: {}", self.id, err);
        self.post_notice(err.user_message());
        err
    }

    fn hold_for_listen(&self) {
        self.state().awaiting_listen = true;
    }

    fn post_notice(&self, message: String) {
        self.state().notice = Some(Notice {
            message,
            posted_at: Instant::now(),
        });
    }

    fn set_phase(&self, phase: TurnPhase) {
        self.state().phase = phase;
    }

    fn set_partial(&self, text: String) {
        if let Ok(mut current) = self.partial.lock() {
            *current = text;
        }
    }

    fn record_id(&self) -> Option<String> {
        self.state().record_id.clone()
    }

    fn push_history(&self, speaker: Speaker, message: &str) {
        self.lock_history().push(speaker, message);
    }

    fn state(&self) -> MutexGuard<'_, InterviewState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_history(&self) -> MutexGuard<'_, ConversationHistory> {
        self.history.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_task(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.task.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_writes(&self) -> MutexGuard<'_, Vec<JoinHandle<()>>> {
        self.writes.lock().unwrap_or_else(|e| e.into_inner())
    }
}
