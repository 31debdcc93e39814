//! Core quiz engine — session state machine, question preparation, profiles.
//!
//! ## Module overview
//!
//! | Module    | Purpose |
//! |-----------|---------|
//! | `models`  | All shared types: questions, filters, progress, results, profiles |
//! | `shuffle` | Fisher-Yates shuffle and raw-to-session question preparation |
//! | `source`  | `QuestionSource` trait plus the fixture and JSON dataset sources |
//! | `session` | The `Idle -> Active -> Finished` state machine and its countdown |
//! | `profile` | Logged-in identity, quiz history, replay rules |
//! | `storage` | Injected key/value abstraction with memory and file backends |

pub mod models;
pub mod profile;
pub mod session;
pub mod shuffle;
pub mod source;
pub mod storage;

// Re-export the public API surface so callers can use
// `quiz_engine::QuizSession` without reaching into sub-modules.
pub use models::{
    Difficulty, QuestionKind, QuizFilter, QuizProgress, QuizResult, RawQuestion,
    SessionQuestion, UserProfile, UserRole, MIXED_CATEGORY,
};
pub use profile::ProfileStore;
pub use session::{
    AnswerOutcome, QuizSession, SessionPhase, SessionState, TimerTick,
    DEFAULT_TIME_PER_QUESTION,
};
pub use shuffle::{prepare_questions, shuffle};
pub use source::{DatasetSource, FixtureSource, QuestionSource, SourceError, TriviaCategory};
pub use storage::{JsonFileStore, KeyValueStore, MemoryStore, StorageError};
