//! End-to-end demo of the trivia engine.
//!
//! Run with: `cargo run --example demo`
//!
//! This example shows how `trivia_engine` works end to end:
//!
//! 1. **Login** — a profile is created in an in-memory key/value store.
//! 2. **Quiz run** — a session is started against a small fixture question
//!    bank, every question is printed with its shuffled answer order, and
//!    the demo answers each one (getting some wrong on purpose).
//! 3. **Results** — the finished result lands in the profile's history;
//!    the history and top scores are printed at the end.
//!
//! ## Key concepts demonstrated
//!
//! - `FixtureSource` serves a fixed in-memory bank; swap in `DatasetSource`
//!   or your own `QuestionSource` for real data.
//! - `all_answers` is a fresh shuffle each run; the correct answer is never
//!   pinned to a position.
//! - `answer()` records, scores and advances; after the last question the
//!   session finishes on its own and stores the result.
//! - `result_preview()` shows the would-be score mid-run without side
//!   effects.

use std::sync::{Arc, Mutex};

use trivia_engine::{
    Difficulty, FixtureSource, MemoryStore, ProfileStore, QuestionKind, QuizFilter,
    QuizSession, RawQuestion,
};

fn question(
    category: &str,
    difficulty: Difficulty,
    prompt: &str,
    correct: &str,
    incorrect: &[&str],
) -> RawQuestion {
    RawQuestion {
        category: category.to_string(),
        kind: if incorrect.len() == 1 {
            QuestionKind::Boolean
        } else {
            QuestionKind::Multiple
        },
        difficulty,
        question: prompt.to_string(),
        correct_answer: correct.to_string(),
        incorrect_answers: incorrect.iter().map(|s| s.to_string()).collect(),
    }
}

fn bank() -> Vec<RawQuestion> {
    vec![
        question(
            "Geography",
            Difficulty::Easy,
            "What is the capital of France?",
            "Paris",
            &["Lyon", "Marseille", "Nice"],
        ),
        question(
            "Geography",
            Difficulty::Easy,
            "Which river runs through Cairo?",
            "The Nile",
            &["The Amazon", "The Danube", "The Volga"],
        ),
        question(
            "Science",
            Difficulty::Medium,
            "Helium is lighter than air.",
            "True",
            &["False"],
        ),
        question(
            "Science",
            Difficulty::Medium,
            "What is the chemical symbol for gold?",
            "Au",
            &["Ag", "Go", "Gd"],
        ),
        question(
            "History",
            Difficulty::Hard,
            "In which year did the Western Roman Empire fall?",
            "476",
            &["410", "1453", "330"],
        ),
    ]
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    pretty_env_logger::init();

    let source = Arc::new(FixtureSource::new(bank()));
    let profiles = Arc::new(Mutex::new(ProfileStore::new(Box::new(MemoryStore::new()))));
    profiles.lock().unwrap().login("ada", "UK");

    let mut session = QuizSession::new(source, Arc::clone(&profiles));
    session.start(5, QuizFilter::any()).await;

    if let Some(error) = session.error() {
        eprintln!("could not start quiz: {error}");
        return;
    }

    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!(
        "  Quiz started for {} — {} questions, {} s each",
        profiles.lock().unwrap().user_name(),
        session.questions().len(),
        session.remaining_time(),
    );
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    // Answer every question; get every Science question wrong on purpose.
    while let Some(q) = session.current_question() {
        let progress = session.progress();
        println!();
        println!(
            "  [{}/{} — {}%] ({} / {})",
            progress.current, progress.total, progress.percentage, q.category, q.difficulty
        );
        println!("  Q: {}", q.question);
        for (i, answer) in q.all_answers.iter().enumerate() {
            println!("     {}. {answer}", i + 1);
        }

        let chosen = if q.category == "Science" {
            q.all_answers
                .iter()
                .find(|a| **a != q.correct_answer)
                .cloned()
                .unwrap_or_default()
        } else {
            q.correct_answer.clone()
        };
        println!("  -> answering: {chosen}");
        session.answer(&chosen);

        if !session.finished() {
            let preview = session.result_preview();
            println!(
                "     running score: {}/{} correct",
                preview.correct_answers, progress.current
            );
        }
    }

    println!();
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    let store = profiles.lock().unwrap();
    for result in store.quiz_history() {
        println!(
            "  Finished: {} — {}/{} correct, score {}%",
            result.category, result.correct_answers, result.total_questions, result.score
        );
    }
    println!(
        "  Top scores: {:?}",
        store
            .top_scores()
            .iter()
            .map(|r| r.score)
            .collect::<Vec<_>>()
    );
    println!("  Can play again right away: {}", store.can_play_again());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
}
