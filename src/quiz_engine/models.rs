use std::fmt;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Question primitives
// ---------------------------------------------------------------------------

/// Whether a question offers several answer choices or a true/false pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionKind {
    Multiple,
    Boolean,
}

impl fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuestionKind::Multiple => write!(f, "multiple"),
            QuestionKind::Boolean => write!(f, "boolean"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Difficulty::Easy => write!(f, "easy"),
            Difficulty::Medium => write!(f, "medium"),
            Difficulty::Hard => write!(f, "hard"),
        }
    }
}

/// A question exactly as a [`QuestionSource`](crate::quiz_engine::source::QuestionSource)
/// delivers it: no display order, no recorded answer.
///
/// Field names follow the Open Trivia wire format so datasets dumped from the
/// public API deserialize directly (`type` maps to `kind`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawQuestion {
    pub category: String,
    #[serde(rename = "type")]
    pub kind: QuestionKind,
    pub difficulty: Difficulty,
    pub question: String,
    pub correct_answer: String,
    pub incorrect_answers: Vec<String>,
}

/// A question inside a running session: the raw record plus the fields the
/// session derives and records.
///
/// `all_answers` is computed exactly once, when the question enters the
/// session (see [`prepare_questions`](crate::quiz_engine::shuffle::prepare_questions));
/// it is always a permutation of `{correct_answer} ∪ incorrect_answers`.
/// `user_answer` and `is_correct` are written exactly once, the moment an
/// answer is recorded, and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionQuestion {
    /// 1-based position within the session batch; unique per session.
    pub id: usize,
    pub category: String,
    pub kind: QuestionKind,
    pub difficulty: Difficulty,
    pub question: String,
    pub correct_answer: String,
    pub incorrect_answers: Vec<String>,
    /// Every answer choice in shuffled display order.
    pub all_answers: Vec<String>,
    pub user_answer: Option<String>,
    pub is_correct: Option<bool>,
}

// ---------------------------------------------------------------------------
// Filters, progress, results
// ---------------------------------------------------------------------------

/// The category/difficulty pair used to request a question batch.
///
/// `restart` replays the filter verbatim; `None` means "no filter".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizFilter {
    pub category: Option<u32>,
    pub difficulty: Option<Difficulty>,
}

impl QuizFilter {
    pub fn any() -> Self {
        Self::default()
    }

    pub fn new(category: Option<u32>, difficulty: Option<Difficulty>) -> Self {
        Self { category, difficulty }
    }
}

/// 1-based position within the session, recomputed on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizProgress {
    pub current: usize,
    pub total: usize,
    /// `round(100 * current / total)`; 0 when the session holds no questions.
    pub percentage: u32,
}

/// The immutable summary of one finished session.
///
/// Created once at finish time (or as a side-effect-free preview) and handed
/// to the profile store, which appends it to the user's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizResult {
    /// `round(100 * correct_answers / total_questions)`; 0 for an empty session.
    pub score: u32,
    pub total_questions: usize,
    pub correct_answers: usize,
    /// Unix seconds at completion.
    pub completed_at: u64,
    /// Category label of the first question, or "Mixed" when there is none.
    pub category: String,
}

/// Label used for the result category when the batch spans no single category.
pub const MIXED_CATEGORY: &str = "Mixed";

/// Integer percentage with round-half-up semantics, guarded against an empty
/// denominator (an empty session scores 0, never a division by zero).
pub(crate) fn percentage(part: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    ((part as f64 / total as f64) * 100.0).round() as u32
}

// ---------------------------------------------------------------------------
// User profiles
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    User,
    Admin,
}

/// A persisted user identity plus accumulated quiz history.
///
/// The quiz session never touches a profile directly; it hands finished
/// results to the [`ProfileStore`](crate::quiz_engine::profile::ProfileStore),
/// which owns all reads and writes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub name: String,
    pub country: String,
    pub is_premium: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<UserRole>,
    /// Append-only, in completion order.
    pub history: Vec<QuizResult>,
}

impl UserProfile {
    pub fn new(name: impl Into<String>, country: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            country: country.into(),
            is_premium: false,
            role: None,
            history: Vec::new(),
        }
    }
}
