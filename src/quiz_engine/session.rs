use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::task::JoinHandle;

use crate::quiz_engine::models::{
    percentage, QuizFilter, QuizProgress, QuizResult, SessionQuestion, MIXED_CATEGORY,
};
use crate::quiz_engine::profile::ProfileStore;
use crate::quiz_engine::shuffle::prepare_questions;
use crate::quiz_engine::source::QuestionSource;
use crate::quiz_engine::storage::now_unix;

/// Default per-question budget in seconds.
pub const DEFAULT_TIME_PER_QUESTION: u32 = 15;

const DEFAULT_AMOUNT: usize = 10;

// ---------------------------------------------------------------------------
// Pure state machine
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// No batch loaded, or the last load failed.
    Idle,
    /// Questions loaded, answers being collected.
    Active,
    /// All questions answered or the session was finished explicitly.
    Finished,
}

/// What recording an answer did to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerOutcome {
    /// No current question, or the session was not active. Nothing changed.
    Ignored,
    /// Answer recorded, moved on to the next question.
    Advanced,
    /// Answer recorded on the last question; the session is now finished.
    Finished,
}

/// One second elapsed on the countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerTick {
    Counting,
    /// The budget was already spent; the current question times out.
    Expired,
}

/// The quiz state machine, free of timers and I/O.
///
/// All sequencing, scoring and bounds logic lives here so it can be tested
/// synchronously; [`QuizSession`] wraps it with the question source, the
/// profile store and the countdown task.
///
/// Phases move `Idle -> Active -> Finished`; the index is 0-based, never
/// decreases within a batch, and stays inside `[0, len)` while questions
/// remain. No operation panics or returns an error: invalid calls are
/// no-ops and failures become the `error` field.
#[derive(Debug)]
pub struct SessionState {
    phase: SessionPhase,
    questions: Vec<SessionQuestion>,
    current_index: usize,
    loading: bool,
    error: Option<String>,
    filter: QuizFilter,
    amount: usize,
    time_per_question: u32,
    remaining_time: u32,
    result_recorded: bool,
}

impl SessionState {
    pub fn new(time_per_question: u32) -> Self {
        Self {
            phase: SessionPhase::Idle,
            questions: Vec::new(),
            current_index: 0,
            loading: false,
            error: None,
            filter: QuizFilter::any(),
            amount: DEFAULT_AMOUNT,
            time_per_question,
            remaining_time: time_per_question,
            result_recorded: false,
        }
    }

    /// Enter the loading interval of a (re)start: clear any prior error and
    /// answer state, remember the requested amount and filter. The session
    /// is not active until [`begin`](Self::begin) confirms the batch.
    pub fn reset_for_load(&mut self, amount: usize, filter: QuizFilter) {
        self.phase = SessionPhase::Idle;
        self.questions.clear();
        self.current_index = 0;
        self.loading = true;
        self.error = None;
        self.filter = filter;
        self.amount = amount;
        self.remaining_time = self.time_per_question;
        self.result_recorded = false;
    }

    /// Accept a prepared batch and go active, with the countdown at its full
    /// budget for question 0.
    pub fn begin(&mut self, questions: Vec<SessionQuestion>) {
        log::debug!("quiz active: {} questions", questions.len());
        self.questions = questions;
        self.current_index = 0;
        self.loading = false;
        self.phase = SessionPhase::Active;
        self.remaining_time = self.time_per_question;
    }

    /// Record a load failure. The session stays non-active and the message
    /// is surfaced verbatim through [`error`](Self::error).
    pub fn fail(&mut self, message: String) {
        log::warn!("quiz start failed: {message}");
        self.loading = false;
        self.error = Some(message);
        self.phase = SessionPhase::Idle;
    }

    /// Record `answer` against the current question.
    ///
    /// Scoring is exact string equality with the canonical correct answer —
    /// no trimming, no case folding. The empty string (the timeout answer)
    /// therefore scores incorrect unless the correct answer is itself empty.
    pub fn answer_current(&mut self, answer: &str) -> AnswerOutcome {
        if self.phase != SessionPhase::Active || self.current_index >= self.questions.len() {
            return AnswerOutcome::Ignored;
        }

        let question = &mut self.questions[self.current_index];
        question.user_answer = Some(answer.to_string());
        question.is_correct = Some(answer == question.correct_answer);

        if self.current_index + 1 < self.questions.len() {
            self.current_index += 1;
            self.remaining_time = self.time_per_question;
            AnswerOutcome::Advanced
        } else {
            self.phase = SessionPhase::Finished;
            AnswerOutcome::Finished
        }
    }

    /// Advance the countdown by one second.
    pub fn tick(&mut self) -> TimerTick {
        if self.remaining_time > 0 {
            self.remaining_time -= 1;
            TimerTick::Counting
        } else {
            TimerTick::Expired
        }
    }

    /// Enter the finished phase and hand out the final result, exactly once.
    ///
    /// Subsequent calls return `None`, so a result can never be appended to
    /// a profile twice however the session reached its end.
    pub fn complete(&mut self) -> Option<QuizResult> {
        if self.result_recorded {
            return None;
        }
        self.phase = SessionPhase::Finished;
        self.loading = false;
        self.result_recorded = true;
        Some(self.result_preview())
    }

    // -- derived read-only views ------------------------------------------

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn is_active(&self) -> bool {
        self.phase == SessionPhase::Active
    }

    /// True once a batch has been accepted, and still true after finishing.
    pub fn started(&self) -> bool {
        matches!(self.phase, SessionPhase::Active | SessionPhase::Finished)
    }

    pub fn finished(&self) -> bool {
        self.phase == SessionPhase::Finished
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn questions(&self) -> &[SessionQuestion] {
        &self.questions
    }

    pub fn filter(&self) -> &QuizFilter {
        &self.filter
    }

    pub fn amount(&self) -> usize {
        self.amount
    }

    pub fn time_per_question(&self) -> u32 {
        self.time_per_question
    }

    pub fn remaining_time(&self) -> u32 {
        self.remaining_time
    }

    /// The question at the current index, if any.
    pub fn current_question(&self) -> Option<&SessionQuestion> {
        self.questions.get(self.current_index)
    }

    /// 1-based progress through the batch; all zeros for an empty batch.
    pub fn progress(&self) -> QuizProgress {
        let total = self.questions.len();
        if total == 0 {
            return QuizProgress { current: 0, total: 0, percentage: 0 };
        }
        let current = self.current_index + 1;
        QuizProgress {
            current,
            total,
            percentage: percentage(current, total),
        }
    }

    /// The result the session would record if it finished now.
    ///
    /// Side-effect free: reading the preview never touches the profile
    /// store or the session phase. An empty batch scores 0.
    pub fn result_preview(&self) -> QuizResult {
        let total = self.questions.len();
        let correct = self
            .questions
            .iter()
            .filter(|q| q.is_correct == Some(true))
            .count();
        QuizResult {
            score: percentage(correct, total),
            total_questions: total,
            correct_answers: correct,
            completed_at: now_unix(),
            category: self
                .questions
                .first()
                .map(|q| q.category.clone())
                .unwrap_or_else(|| MIXED_CATEGORY.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// Async session: source, profile store, countdown task
// ---------------------------------------------------------------------------

/// State shared between the session façade and its countdown task.
struct SessionCore {
    state: Mutex<SessionState>,
    profiles: Arc<Mutex<ProfileStore>>,
    /// Bumped whenever a timer is stopped or started; a tick whose
    /// generation no longer matches belongs to a superseded timer and must
    /// not touch the session.
    timer_generation: AtomicU64,
}

/// One run-through of a question batch: fetches and prepares questions,
/// drives the per-question countdown, records answers, and reports the
/// finished result to the profile store.
///
/// The countdown is a spawned task owned by this handle; starting a new
/// countdown always stops the previous one first, and dropping the session
/// aborts whatever is live, so no stale tick can reach a superseded run.
pub struct QuizSession {
    core: Arc<SessionCore>,
    source: Arc<dyn QuestionSource>,
    timer: Option<JoinHandle<()>>,
}

impl QuizSession {
    pub fn new(source: Arc<dyn QuestionSource>, profiles: Arc<Mutex<ProfileStore>>) -> Self {
        Self::with_time_per_question(source, profiles, DEFAULT_TIME_PER_QUESTION)
    }

    pub fn with_time_per_question(
        source: Arc<dyn QuestionSource>,
        profiles: Arc<Mutex<ProfileStore>>,
        seconds: u32,
    ) -> Self {
        Self {
            core: Arc::new(SessionCore {
                state: Mutex::new(SessionState::new(seconds)),
                profiles,
                timer_generation: AtomicU64::new(0),
            }),
            source,
            timer: None,
        }
    }

    /// Start a quiz of `amount` questions matching `filter`.
    ///
    /// While the fetch is in flight the session reports neither started nor
    /// finished — callers should treat that interval as loading. On success
    /// the batch is prepared, the session goes active and the countdown
    /// starts for question 0; on failure the source's message is recorded
    /// and the session stays non-active.
    pub async fn start(&mut self, amount: usize, filter: QuizFilter) {
        self.stop_timer();
        self.core
            .state
            .lock()
            .unwrap()
            .reset_for_load(amount, filter.clone());
        log::debug!("starting quiz: {amount} questions, filter {filter:?}");

        match self.source.fetch(amount, &filter).await {
            Ok(raw) => {
                let mut rng = StdRng::from_entropy();
                let prepared = prepare_questions(&mut rng, raw);
                self.core.state.lock().unwrap().begin(prepared);
                self.start_timer();
            }
            Err(e) => {
                self.core.state.lock().unwrap().fail(e.to_string());
            }
        }
    }

    /// Record an answer for the current question and advance.
    ///
    /// No-op when no question is current or the session is finished. On
    /// advance the countdown restarts at the full budget for the next
    /// question; on the last question the session finishes and the result
    /// goes to the profile store.
    pub fn answer(&mut self, answer: &str) {
        self.stop_timer();
        if record_answer(&self.core, answer) == AnswerOutcome::Advanced {
            self.start_timer();
        }
    }

    /// Finish the session now, scoring whatever has been answered so far.
    ///
    /// The result (score 0 for an empty session) is appended to the active
    /// profile; without a logged-in profile it is discarded silently.
    pub fn finish(&mut self) {
        self.stop_timer();
        let result = self.core.state.lock().unwrap().complete();
        if let Some(result) = result {
            log::debug!(
                "quiz finished: {}/{} correct, score {}",
                result.correct_answers,
                result.total_questions,
                result.score
            );
            self.core.profiles.lock().unwrap().append_result(result);
        }
    }

    /// Re-run `start` with the stored filter and question count, fetching a
    /// fresh (freshly shuffled) batch.
    pub async fn restart(&mut self) {
        let (amount, filter) = {
            let state = self.core.state.lock().unwrap();
            let amount = if state.questions().is_empty() {
                state.amount()
            } else {
                state.questions().len()
            };
            (amount, state.filter().clone())
        };
        self.start(amount, filter).await;
    }

    /// Teardown hook: stop the countdown without finishing the session.
    /// Also invoked on drop.
    pub fn shutdown(&mut self) {
        self.stop_timer();
    }

    // -- snapshot accessors ------------------------------------------------

    pub fn started(&self) -> bool {
        self.core.state.lock().unwrap().started()
    }

    pub fn finished(&self) -> bool {
        self.core.state.lock().unwrap().finished()
    }

    pub fn is_loading(&self) -> bool {
        self.core.state.lock().unwrap().is_loading()
    }

    pub fn error(&self) -> Option<String> {
        self.core.state.lock().unwrap().error().map(str::to_string)
    }

    pub fn remaining_time(&self) -> u32 {
        self.core.state.lock().unwrap().remaining_time()
    }

    pub fn current_question(&self) -> Option<SessionQuestion> {
        self.core.state.lock().unwrap().current_question().cloned()
    }

    pub fn questions(&self) -> Vec<SessionQuestion> {
        self.core.state.lock().unwrap().questions().to_vec()
    }

    pub fn progress(&self) -> QuizProgress {
        self.core.state.lock().unwrap().progress()
    }

    pub fn result_preview(&self) -> QuizResult {
        self.core.state.lock().unwrap().result_preview()
    }

    // -- timer ownership ---------------------------------------------------

    fn start_timer(&mut self) {
        self.stop_timer();
        let generation = self.core.timer_generation.load(Ordering::SeqCst);
        let core = Arc::clone(&self.core);
        self.timer = Some(tokio::spawn(run_countdown(core, generation)));
    }

    fn stop_timer(&mut self) {
        // Invalidate first so an already-scheduled tick sees a stale
        // generation even before the abort lands.
        self.core.timer_generation.fetch_add(1, Ordering::SeqCst);
        if let Some(handle) = self.timer.take() {
            handle.abort();
        }
    }
}

impl Drop for QuizSession {
    fn drop(&mut self) {
        self.stop_timer();
    }
}

/// Record an answer on the shared state and, when it ends the session,
/// forward the result to the profile store. Shared between the public
/// [`QuizSession::answer`] path and the countdown's timeout path.
fn record_answer(core: &SessionCore, answer: &str) -> AnswerOutcome {
    let (outcome, result) = {
        let mut state = core.state.lock().unwrap();
        let outcome = state.answer_current(answer);
        let result = if outcome == AnswerOutcome::Finished {
            state.complete()
        } else {
            None
        };
        (outcome, result)
    };
    if let Some(result) = result {
        log::debug!(
            "quiz finished: {}/{} correct, score {}",
            result.correct_answers,
            result.total_questions,
            result.score
        );
        core.profiles.lock().unwrap().append_result(result);
    }
    outcome
}

/// The countdown task: one tick per second while the session is active and
/// this generation is current. A spent budget submits the empty answer,
/// which is the sole auto-advance mechanism.
async fn run_countdown(core: Arc<SessionCore>, generation: u64) {
    let period = Duration::from_secs(1);
    let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);

    loop {
        interval.tick().await;
        if core.timer_generation.load(Ordering::SeqCst) != generation {
            return; // superseded by a newer timer
        }

        let expired = {
            let mut state = core.state.lock().unwrap();
            if !state.is_active() {
                return;
            }
            state.tick() == TimerTick::Expired
        };

        if expired {
            match record_answer(&core, "") {
                // Same task keeps counting for the next question, with the
                // tick cadence restarted from now.
                AnswerOutcome::Advanced => {
                    interval =
                        tokio::time::interval_at(tokio::time::Instant::now() + period, period);
                }
                AnswerOutcome::Finished | AnswerOutcome::Ignored => return,
            }
        }
    }
}
