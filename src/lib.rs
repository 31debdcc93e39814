//! # trivia_engine
//!
//! The core of a trivia quiz application: question preparation, a timed
//! quiz session state machine, and persisted user profiles with quiz
//! history.
//!
//! ## How it works
//!
//! 1. Plug in a [`QuestionSource`] — the built-in [`FixtureSource`] (an
//!    in-memory bank) or [`DatasetSource`] (a local JSON question set), or
//!    your own implementation over a remote API.
//! 2. Build a [`ProfileStore`] over any [`KeyValueStore`] backend and log a
//!    user in.
//! 3. Create a [`QuizSession`] and call [`start`](QuizSession::start) — the
//!    engine fetches a batch, shuffles every question's answers
//!    (Fisher-Yates), goes active, and starts a one-second countdown for
//!    the first question.
//! 4. Feed user choices to [`answer`](QuizSession::answer). A question
//!    whose countdown runs out is auto-answered with the empty string and
//!    scored incorrect. After the last question the session finishes and
//!    appends its [`QuizResult`] to the logged-in profile.
//!
//! ## Key properties
//!
//! - **No panics, no thrown errors**: invalid operations (answering after
//!   the end, finishing an empty session) are no-ops or score 0; source
//!   failures become a readable `error()` message on the session.
//! - **Exact-match scoring**: an answer is correct iff it equals the
//!   canonical correct-answer text, byte for byte.
//! - **Single live countdown**: starting, answering, restarting or dropping
//!   a session always cancels the previous countdown first, so a stale tick
//!   can never mutate a superseded run.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::sync::{Arc, Mutex};
//! use trivia_engine::{
//!     FixtureSource, MemoryStore, ProfileStore, QuizFilter, QuizSession,
//! };
//!
//! # async fn run(bank: Vec<trivia_engine::RawQuestion>) {
//! let source = Arc::new(FixtureSource::new(bank));
//! let profiles = Arc::new(Mutex::new(ProfileStore::new(Box::new(MemoryStore::new()))));
//! profiles.lock().unwrap().login("ada", "UK");
//!
//! let mut session = QuizSession::new(source, Arc::clone(&profiles));
//! session.start(5, QuizFilter::any()).await;
//!
//! while let Some(q) = session.current_question() {
//!     println!("{} ({} s left)", q.question, session.remaining_time());
//!     session.answer(&q.all_answers[0]);
//! }
//! println!("score: {}", session.result_preview().score);
//! # }
//! ```

pub mod quiz_engine;

// Convenience re-exports so callers can use `trivia_engine::QuizSession`
// directly without reaching into `quiz_engine::`.
pub use quiz_engine::{
    prepare_questions, shuffle, AnswerOutcome, DatasetSource, Difficulty, FixtureSource,
    JsonFileStore, KeyValueStore, MemoryStore, ProfileStore, QuestionKind, QuestionSource,
    QuizFilter, QuizProgress, QuizResult, QuizSession, RawQuestion, SessionPhase,
    SessionQuestion, SessionState, SourceError, StorageError, TimerTick, TriviaCategory,
    UserProfile, UserRole, DEFAULT_TIME_PER_QUESTION, MIXED_CATEGORY,
};

#[cfg(test)]
mod tests;
