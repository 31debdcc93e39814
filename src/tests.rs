//! Unit tests for the `trivia_engine` crate.
//!
//! Included from `lib.rs` under `#[cfg(test)]`. Leaf utilities (shuffle,
//! sources, storage, profiles) carry their own `#[cfg(test)]` modules; this
//! file covers the session state machine and the async session end to end.
//!
//! # Coverage
//!
//! | Group | What is tested |
//! |-------|----------------|
//! | State machine | Begin/answer/advance/finish transitions, index bounds, no-op guards |
//! | Scoring | Exact string equality, empty-answer edge cases, zero-question guards |
//! | Async session | Start success/failure, manual answers, result delivery to the profile |
//! | Countdown | Timeout auto-answer, timer reset on advance, teardown stops stale ticks |
//! | Restart | Same filter and count, fresh batch, answer state cleared |
//!
//! Countdown tests run on a paused tokio clock (`start_paused`) and drive
//! time explicitly with `tokio::time::advance`, so they are deterministic
//! and take no wall-clock time.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::quiz_engine::models::{
    Difficulty, QuestionKind, QuizFilter, RawQuestion, SessionQuestion,
};
use crate::quiz_engine::profile::ProfileStore;
use crate::quiz_engine::session::{AnswerOutcome, QuizSession, SessionPhase, SessionState};
use crate::quiz_engine::shuffle::prepare_questions;
use crate::quiz_engine::source::{FixtureSource, QuestionSource, SourceError};
use crate::quiz_engine::storage::MemoryStore;

// ── helpers ──────────────────────────────────────────────────────────────────

fn raw_question(category: &str, difficulty: Difficulty, correct: &str) -> RawQuestion {
    RawQuestion {
        category: category.to_string(),
        kind: QuestionKind::Multiple,
        difficulty,
        question: format!("Which one is {correct}?"),
        correct_answer: correct.to_string(),
        incorrect_answers: vec!["no".to_string(), "nope".to_string(), "never".to_string()],
    }
}

/// Ten-question bank: six easy Geography questions, four medium Science.
fn bank() -> Vec<RawQuestion> {
    let mut questions = Vec::new();
    for i in 0..6 {
        questions.push(raw_question("Geography", Difficulty::Easy, &format!("G{i}")));
    }
    for i in 0..4 {
        questions.push(raw_question("Science", Difficulty::Medium, &format!("S{i}")));
    }
    questions
}

/// Prepare `n` bank questions with a fixed seed for the pure state tests.
fn prepared(n: usize) -> Vec<SessionQuestion> {
    let mut rng = StdRng::seed_from_u64(42);
    prepare_questions(&mut rng, bank().into_iter().take(n).collect())
}

fn active_state(n: usize) -> SessionState {
    let mut state = SessionState::new(15);
    state.reset_for_load(n, QuizFilter::any());
    state.begin(prepared(n));
    state
}

fn profiles() -> Arc<Mutex<ProfileStore>> {
    Arc::new(Mutex::new(ProfileStore::new(Box::new(MemoryStore::new()))))
}

fn session_over(bank: Vec<RawQuestion>) -> (QuizSession, Arc<Mutex<ProfileStore>>) {
    let store = profiles();
    store.lock().unwrap().login("ada", "UK");
    let session = QuizSession::with_time_per_question(
        Arc::new(FixtureSource::new(bank)),
        Arc::clone(&store),
        15,
    );
    (session, store)
}

/// A source that always fails, for error-surface tests.
struct BrokenSource;

#[async_trait::async_trait]
impl QuestionSource for BrokenSource {
    async fn fetch(
        &self,
        _amount: usize,
        _filter: &QuizFilter,
    ) -> Result<Vec<RawQuestion>, SourceError> {
        Err(SourceError::Unavailable("trivia backend is down".to_string()))
    }

    async fn categories(&self) -> Result<Vec<crate::TriviaCategory>, SourceError> {
        Err(SourceError::Unavailable("trivia backend is down".to_string()))
    }
}

/// Let spawned countdown tasks catch up with the (paused) clock.
async fn settle() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}

// ── state machine: transitions ───────────────────────────────────────────────

#[test]
fn begin_activates_with_full_budget_at_question_zero() {
    let state = active_state(5);
    assert_eq!(state.phase(), SessionPhase::Active);
    assert!(state.started());
    assert!(!state.finished());
    assert_eq!(state.questions().len(), 5);
    assert_eq!(state.current_question().unwrap().id, 1);
    assert_eq!(state.remaining_time(), 15);
}

#[test]
fn correct_answer_marks_question_and_advances() {
    let mut state = active_state(3);
    let correct = state.current_question().unwrap().correct_answer.clone();

    assert_eq!(state.answer_current(&correct), AnswerOutcome::Advanced);

    let answered = &state.questions()[0];
    assert_eq!(answered.user_answer.as_deref(), Some(correct.as_str()));
    assert_eq!(answered.is_correct, Some(true));
    assert_eq!(state.current_question().unwrap().id, 2);
    assert_eq!(state.remaining_time(), 15, "countdown resets on advance");
}

#[test]
fn wrong_answer_still_advances() {
    let mut state = active_state(2);
    assert_eq!(state.answer_current("definitely wrong"), AnswerOutcome::Advanced);
    assert_eq!(state.questions()[0].is_correct, Some(false));
}

#[test]
fn last_answer_finishes_the_session() {
    let mut state = active_state(1);
    let correct = state.current_question().unwrap().correct_answer.clone();
    assert_eq!(state.answer_current(&correct), AnswerOutcome::Finished);
    assert!(state.finished());
    assert!(state.started(), "a finished session has still been started");
}

#[test]
fn answers_after_finish_are_ignored() {
    let mut state = active_state(1);
    state.answer_current("x");
    let snapshot = state.questions().to_vec();

    assert_eq!(state.answer_current("y"), AnswerOutcome::Ignored);
    assert_eq!(state.questions(), snapshot.as_slice(), "no mutation after finish");
}

#[test]
fn failed_load_surfaces_message_and_stays_idle() {
    let mut state = SessionState::new(15);
    state.reset_for_load(5, QuizFilter::any());
    state.fail("trivia backend is down".to_string());

    assert_eq!(state.error(), Some("trivia backend is down"));
    assert!(!state.started());
    assert!(!state.finished());
    assert!(!state.is_loading());
}

#[test]
fn reset_for_load_clears_a_previous_error() {
    let mut state = SessionState::new(15);
    state.reset_for_load(5, QuizFilter::any());
    state.fail("boom".to_string());
    state.reset_for_load(5, QuizFilter::any());
    assert_eq!(state.error(), None);
    assert!(state.is_loading());
}

#[test]
fn index_is_monotonic_and_in_bounds() {
    let mut state = active_state(4);
    let mut last = 0;
    while !state.finished() {
        let id = state.current_question().unwrap().id;
        assert!(id > last, "index must not move backwards");
        assert!(id <= 4);
        last = id;
        state.answer_current("whatever");
    }
    assert_eq!(last, 4);
}

// ── state machine: scoring ───────────────────────────────────────────────────

#[test]
fn scoring_is_exact_string_equality() {
    for (given, expected) in [
        ("G0", true),
        ("g0", false),  // case differs
        ("G0 ", false), // trailing space
        ("", false),
    ] {
        let mut state = active_state(1);
        state.answer_current(given);
        assert_eq!(
            state.questions()[0].is_correct,
            Some(expected),
            "answer {given:?}"
        );
    }
}

#[test]
fn empty_answer_matches_an_empty_correct_answer() {
    // The timeout submission is the empty string; when the canonical answer
    // is itself empty the two compare equal and score correct.
    let mut rng = StdRng::seed_from_u64(1);
    let mut odd = raw_question("Geography", Difficulty::Easy, "x");
    odd.correct_answer = String::new();
    let mut state = SessionState::new(15);
    state.reset_for_load(1, QuizFilter::any());
    state.begin(prepare_questions(&mut rng, vec![odd]));

    state.answer_current("");
    assert_eq!(state.questions()[0].is_correct, Some(true));
}

#[test]
fn result_counts_correct_answers_and_rounds_score() {
    let mut state = active_state(3);
    let correct: Vec<String> = state
        .questions()
        .iter()
        .map(|q| q.correct_answer.clone())
        .collect();
    state.answer_current(&correct[0]);
    state.answer_current("wrong");
    state.answer_current(&correct[2]);

    let result = state.complete().unwrap();
    assert_eq!(result.total_questions, 3);
    assert_eq!(result.correct_answers, 2);
    assert_eq!(result.score, 67); // round(200/3)
    assert_eq!(result.category, "Geography");
}

#[test]
fn zero_question_session_scores_zero_not_nan() {
    let mut state = SessionState::new(15);
    state.reset_for_load(0, QuizFilter::any());
    state.begin(Vec::new());

    let progress = state.progress();
    assert_eq!((progress.current, progress.total, progress.percentage), (0, 0, 0));

    assert_eq!(state.answer_current("x"), AnswerOutcome::Ignored);

    let result = state.complete().unwrap();
    assert_eq!(result.score, 0);
    assert_eq!(result.total_questions, 0);
    assert_eq!(result.category, "Mixed");
    assert!(state.finished());
}

#[test]
fn complete_hands_out_the_result_exactly_once() {
    let mut state = active_state(1);
    state.answer_current("x");
    assert!(state.complete().is_some());
    assert!(state.complete().is_none(), "no double result");
}

#[test]
fn result_preview_has_no_side_effects() {
    let state = active_state(2);
    let preview = state.result_preview();
    assert_eq!(preview.total_questions, 2);
    assert_eq!(preview.correct_answers, 0);
    assert!(state.is_active(), "preview must not finish the session");
}

#[test]
fn progress_is_one_based_with_rounded_percentage() {
    let mut state = active_state(3);
    assert_eq!(state.progress().current, 1);
    assert_eq!(state.progress().percentage, 33);
    state.answer_current("x");
    assert_eq!(state.progress().current, 2);
    assert_eq!(state.progress().percentage, 67);
}

#[test]
fn ticks_count_down_then_expire() {
    use crate::quiz_engine::session::TimerTick;
    let mut state = active_state(1);
    for expected in (0..15).rev() {
        assert_eq!(state.tick(), TimerTick::Counting);
        assert_eq!(state.remaining_time(), expected);
    }
    assert_eq!(state.tick(), TimerTick::Expired);
}

// ── async session: start and manual answers ──────────────────────────────────

#[tokio::test]
async fn start_loads_prepares_and_activates() {
    let (mut session, _store) = session_over(bank());
    session.start(5, QuizFilter::new(None, Some(Difficulty::Easy))).await;

    assert!(session.started());
    assert!(!session.finished());
    assert_eq!(session.error(), None);
    assert_eq!(session.remaining_time(), 15);

    let questions = session.questions();
    assert_eq!(questions.len(), 5);
    assert!(questions.iter().all(|q| q.difficulty == Difficulty::Easy));
    assert_eq!(session.current_question().unwrap().id, 1);

    // Every prepared question carries the full answer multiset.
    for q in &questions {
        assert_eq!(q.all_answers.len(), 1 + q.incorrect_answers.len());
        assert!(q.all_answers.contains(&q.correct_answer));
    }
}

#[tokio::test]
async fn source_failure_is_recorded_not_thrown() {
    let store = profiles();
    let mut session = QuizSession::new(Arc::new(BrokenSource), Arc::clone(&store));
    session.start(5, QuizFilter::any()).await;

    assert!(!session.started());
    assert!(!session.is_loading());
    let message = session.error().unwrap();
    assert!(message.contains("trivia backend is down"), "got: {message}");
}

#[tokio::test]
async fn answering_every_question_finishes_and_stores_the_result() {
    let (mut session, store) = session_over(bank());
    session.start(4, QuizFilter::any()).await;

    // Answer the first two correctly, the rest wrong.
    for i in 0..4 {
        let q = session.current_question().unwrap();
        let answer = if i < 2 { q.correct_answer } else { "wrong".to_string() };
        session.answer(&answer);
    }

    assert!(session.finished());
    assert!(session.current_question().is_none());

    let store = store.lock().unwrap();
    let history = store.quiz_history();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].correct_answers, 2);
    assert_eq!(history[0].total_questions, 4);
    assert_eq!(history[0].score, 50);
}

#[tokio::test]
async fn finish_without_profile_discards_the_result() {
    let store = profiles(); // nobody logged in
    let mut session =
        QuizSession::new(Arc::new(FixtureSource::new(bank())), Arc::clone(&store));
    session.start(2, QuizFilter::any()).await;
    session.answer("x");
    session.answer("y");

    assert!(session.finished());
    assert!(store.lock().unwrap().quiz_history().is_empty());
}

#[tokio::test]
async fn explicit_finish_scores_what_was_answered() {
    let (mut session, store) = session_over(bank());
    session.start(3, QuizFilter::any()).await;
    let correct = session.current_question().unwrap().correct_answer;
    session.answer(&correct);
    session.finish();

    assert!(session.finished());
    let store = store.lock().unwrap();
    assert_eq!(store.quiz_history().len(), 1);
    assert_eq!(store.quiz_history()[0].correct_answers, 1);
}

#[tokio::test]
async fn finish_after_natural_end_does_not_append_twice() {
    let (mut session, store) = session_over(bank());
    session.start(1, QuizFilter::any()).await;
    session.answer("x"); // finishes and appends
    session.finish(); // must be a no-op append-wise

    assert_eq!(store.lock().unwrap().quiz_history().len(), 1);
}

// ── async session: countdown ─────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn countdown_ticks_down_each_second() {
    let (mut session, _store) = session_over(bank());
    session.start(2, QuizFilter::any()).await;
    settle().await;

    tokio::time::advance(Duration::from_secs(3)).await;
    settle().await;

    assert_eq!(session.remaining_time(), 12);
    assert_eq!(session.current_question().unwrap().id, 1);
}

#[tokio::test(start_paused = true)]
async fn expiry_submits_the_empty_answer_and_advances() {
    let (mut session, _store) = session_over(bank());
    session.start(2, QuizFilter::any()).await;
    settle().await;

    // 15 ticks spend the budget, the 16th expires the question.
    tokio::time::advance(Duration::from_secs(16)).await;
    settle().await;

    let timed_out = &session.questions()[0];
    assert_eq!(timed_out.user_answer.as_deref(), Some(""));
    assert_eq!(timed_out.is_correct, Some(false));
    assert_eq!(session.current_question().unwrap().id, 2);
    assert_eq!(session.remaining_time(), 15, "budget resets for the next question");
    assert!(!session.finished());
}

#[tokio::test(start_paused = true)]
async fn letting_every_question_expire_finishes_with_score_zero() {
    let (mut session, store) = session_over(bank());
    session.start(3, QuizFilter::any()).await;
    settle().await;

    for _ in 0..3 {
        tokio::time::advance(Duration::from_secs(16)).await;
        settle().await;
    }

    assert!(session.finished());
    let store = store.lock().unwrap();
    assert_eq!(store.quiz_history().len(), 1);
    assert_eq!(store.quiz_history()[0].score, 0);
    assert_eq!(store.quiz_history()[0].correct_answers, 0);
}

#[tokio::test(start_paused = true)]
async fn answering_restarts_the_countdown() {
    let (mut session, _store) = session_over(bank());
    session.start(2, QuizFilter::any()).await;
    settle().await;

    tokio::time::advance(Duration::from_secs(10)).await;
    settle().await;
    assert_eq!(session.remaining_time(), 5);

    session.answer("whatever");
    assert_eq!(session.remaining_time(), 15);
    settle().await; // let the fresh timer anchor its first tick

    // Only the fresh timer ticks now; the old one is gone.
    tokio::time::advance(Duration::from_secs(2)).await;
    settle().await;
    assert_eq!(session.remaining_time(), 13);
    assert_eq!(session.current_question().unwrap().id, 2);
}

#[tokio::test(start_paused = true)]
async fn shutdown_stops_ticks_without_finishing() {
    let (mut session, store) = session_over(bank());
    session.start(2, QuizFilter::any()).await;
    settle().await;

    session.shutdown();
    tokio::time::advance(Duration::from_secs(60)).await;
    settle().await;

    assert!(session.started());
    assert!(!session.finished());
    assert_eq!(session.remaining_time(), 15, "no tick after teardown");
    assert!(session.questions()[0].user_answer.is_none());
    assert!(store.lock().unwrap().quiz_history().is_empty());
}

#[tokio::test(start_paused = true)]
async fn manual_answer_wins_over_a_pending_expiry() {
    let (mut session, _store) = session_over(bank());
    session.start(2, QuizFilter::any()).await;
    settle().await;

    tokio::time::advance(Duration::from_secs(15)).await;
    settle().await;
    assert_eq!(session.remaining_time(), 0);

    // One second from expiry; the user answer lands first and the stale
    // timer must not also record the empty answer.
    let correct = session.current_question().unwrap().correct_answer;
    session.answer(&correct);
    tokio::time::advance(Duration::from_secs(2)).await;
    settle().await;

    assert_eq!(session.questions()[0].user_answer.as_deref(), Some(correct.as_str()));
    assert_eq!(session.questions()[0].is_correct, Some(true));
}

// ── restart ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn restart_replays_filter_and_count_with_a_fresh_batch() {
    let (mut session, store) = session_over(bank());
    let filter = QuizFilter::new(None, Some(Difficulty::Medium));
    session.start(3, filter.clone()).await;

    for _ in 0..3 {
        session.answer("wrong");
    }
    assert!(session.finished());

    session.restart().await;

    assert!(session.started());
    assert!(!session.finished());
    assert_eq!(session.error(), None);
    assert_eq!(session.remaining_time(), 15);

    let questions = session.questions();
    assert_eq!(questions.len(), 3, "same question count as before");
    assert!(questions.iter().all(|q| q.difficulty == Difficulty::Medium));
    assert!(
        questions.iter().all(|q| q.user_answer.is_none() && q.is_correct.is_none()),
        "restart clears all per-question answer state"
    );

    // Only the first run's result is on record.
    assert_eq!(store.lock().unwrap().quiz_history().len(), 1);
}

#[tokio::test]
async fn restart_after_a_failed_start_retries_with_the_same_request() {
    let (mut session, _store) = session_over(bank());
    session.start(50, QuizFilter::any()).await; // more than the bank holds
    assert!(session.error().is_some());
    assert!(!session.started());

    session.restart().await;
    // Still the same impossible request, so still an error, never a panic.
    assert!(session.error().is_some());
    assert!(!session.started());
}
