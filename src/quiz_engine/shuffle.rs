use rand::Rng;

use crate::quiz_engine::models::{RawQuestion, SessionQuestion};

/// Return a new vector holding every element of `items` exactly once, in
/// uniformly random order. The input slice is left untouched.
///
/// Fisher-Yates: walk the index from the last position down to 1, swapping
/// with a uniformly chosen index in `[0, i]` inclusive, which makes each of
/// the n! orderings equally likely given a uniform `rng`.
pub fn shuffle<T: Clone, R: Rng>(rng: &mut R, items: &[T]) -> Vec<T> {
    let mut out = items.to_vec();
    for i in (1..out.len()).rev() {
        let j = rng.gen_range(0..=i);
        out.swap(i, j);
    }
    out
}

/// Convert a raw question batch into display-ready session questions.
///
/// Each question gets a 1-based `id` (its position in the batch) and an
/// `all_answers` order built by shuffling the correct answer together with
/// the incorrect ones. Duplicate answer texts from the source are preserved
/// verbatim, not deduplicated.
///
/// Call this exactly once per batch, before the batch enters a session.
/// Re-preparing the same batch draws a fresh shuffle, so the operation is
/// deliberately not idempotent.
pub fn prepare_questions<R: Rng>(rng: &mut R, raw: Vec<RawQuestion>) -> Vec<SessionQuestion> {
    raw.into_iter()
        .enumerate()
        .map(|(i, q)| {
            let mut answers = Vec::with_capacity(1 + q.incorrect_answers.len());
            answers.push(q.correct_answer.clone());
            answers.extend(q.incorrect_answers.iter().cloned());
            let all_answers = shuffle(rng, &answers);

            SessionQuestion {
                id: i + 1,
                category: q.category,
                kind: q.kind,
                difficulty: q.difficulty,
                question: q.question,
                correct_answer: q.correct_answer,
                incorrect_answers: q.incorrect_answers,
                all_answers,
                user_answer: None,
                is_correct: None,
            }
        })
        .collect()
}
