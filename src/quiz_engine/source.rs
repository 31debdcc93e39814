use std::fs::File;
use std::io::Read;
use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::quiz_engine::models::{QuizFilter, RawQuestion};

/// Why a source could not deliver a batch. `Display` is the human-readable
/// message the quiz session records and surfaces verbatim.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("question source unavailable: {0}")]
    Unavailable(String),
    #[error("not enough questions for this filter: requested {requested}, found {available}")]
    NotEnough { requested: usize, available: usize },
    #[error("unknown category id {0}")]
    UnknownCategory(u32),
    #[error("failed to read question dataset: {0}")]
    DatasetIo(#[from] std::io::Error),
    #[error("malformed question dataset: {0}")]
    DatasetFormat(#[from] serde_json::Error),
}

/// A selectable question category, mirroring the Open Trivia category list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriviaCategory {
    pub id: u32,
    pub name: String,
}

/// Supplies raw question batches to the quiz session.
///
/// Implementations decide where questions come from (a remote API, a local
/// dataset, an in-memory fixture); the session only sees this contract.
#[async_trait]
pub trait QuestionSource: Send + Sync {
    /// Fetch `amount` questions matching `filter`.
    ///
    /// Must either return exactly `amount` questions or fail; a short batch
    /// is reported as [`SourceError::NotEnough`] rather than silently
    /// truncating the session.
    async fn fetch(&self, amount: usize, filter: &QuizFilter)
        -> Result<Vec<RawQuestion>, SourceError>;

    /// The categories this source can filter on.
    async fn categories(&self) -> Result<Vec<TriviaCategory>, SourceError>;
}

/// Shared filter logic for the in-process sources: resolve the category id
/// against the source's category table, then match questions by label and
/// difficulty.
fn select(
    questions: &[RawQuestion],
    categories: &[TriviaCategory],
    amount: usize,
    filter: &QuizFilter,
) -> Result<Vec<RawQuestion>, SourceError> {
    let category_name = match filter.category {
        Some(id) => Some(
            categories
                .iter()
                .find(|c| c.id == id)
                .map(|c| c.name.clone())
                .ok_or(SourceError::UnknownCategory(id))?,
        ),
        None => None,
    };

    let matching: Vec<RawQuestion> = questions
        .iter()
        .filter(|q| category_name.as_ref().map_or(true, |n| *n == q.category))
        .filter(|q| filter.difficulty.map_or(true, |d| q.difficulty == d))
        .cloned()
        .collect();

    if matching.len() < amount {
        return Err(SourceError::NotEnough {
            requested: amount,
            available: matching.len(),
        });
    }
    Ok(matching.into_iter().take(amount).collect())
}

/// In-memory question bank. Used by the tests and the demo, and handy as a
/// deterministic offline source.
#[derive(Debug, Clone, Default)]
pub struct FixtureSource {
    questions: Vec<RawQuestion>,
}

impl FixtureSource {
    pub fn new(questions: Vec<RawQuestion>) -> Self {
        Self { questions }
    }

    fn category_table(&self) -> Vec<TriviaCategory> {
        // Category ids are assigned by first appearance, starting at 1.
        let mut table: Vec<TriviaCategory> = Vec::new();
        for q in &self.questions {
            if !table.iter().any(|c| c.name == q.category) {
                table.push(TriviaCategory {
                    id: table.len() as u32 + 1,
                    name: q.category.clone(),
                });
            }
        }
        table
    }
}

#[async_trait]
impl QuestionSource for FixtureSource {
    async fn fetch(
        &self,
        amount: usize,
        filter: &QuizFilter,
    ) -> Result<Vec<RawQuestion>, SourceError> {
        select(&self.questions, &self.category_table(), amount, filter)
    }

    async fn categories(&self) -> Result<Vec<TriviaCategory>, SourceError> {
        Ok(self.category_table())
    }
}

/// On-disk dataset layout: a category table plus the question bank.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct DatasetFile {
    #[serde(default)]
    categories: Vec<TriviaCategory>,
    questions: Vec<RawQuestion>,
}

/// A question bank loaded from a local JSON dataset (for translated or
/// offline question sets that never touch the remote API).
#[derive(Debug, Clone)]
pub struct DatasetSource {
    categories: Vec<TriviaCategory>,
    questions: Vec<RawQuestion>,
}

impl DatasetSource {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, SourceError> {
        Self::from_reader(File::open(path)?)
    }

    pub fn from_reader(mut reader: impl Read) -> Result<Self, SourceError> {
        let mut raw = String::new();
        reader.read_to_string(&mut raw)?;
        let file: DatasetFile = serde_json::from_str(&raw)?;

        // Datasets may omit the category table; rebuild it from the
        // questions in first-appearance order.
        let categories = if file.categories.is_empty() {
            let mut table: Vec<TriviaCategory> = Vec::new();
            for q in &file.questions {
                if !table.iter().any(|c| c.name == q.category) {
                    table.push(TriviaCategory {
                        id: table.len() as u32 + 1,
                        name: q.category.clone(),
                    });
                }
            }
            table
        } else {
            file.categories
        };

        log::debug!(
            "loaded question dataset: {} questions, {} categories",
            file.questions.len(),
            categories.len()
        );

        Ok(Self {
            categories,
            questions: file.questions,
        })
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

#[async_trait]
impl QuestionSource for DatasetSource {
    async fn fetch(
        &self,
        amount: usize,
        filter: &QuizFilter,
    ) -> Result<Vec<RawQuestion>, SourceError> {
        select(&self.questions, &self.categories, amount, filter)
    }

    async fn categories(&self) -> Result<Vec<TriviaCategory>, SourceError> {
        Ok(self.categories.clone())
    }
}
