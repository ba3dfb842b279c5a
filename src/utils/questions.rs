use anyhow::{Context, Result};
use rand::seq::SliceRandom;
use serde::Deserialize;
use std::path::Path;

pub const ANSWER_LETTERS: [&str; 3] = ["a", "b", "c"];

#[derive(Debug, Clone, Deserialize)]
pub struct Question {
    pub question: String,
    pub options: Vec<String>,
    /// Answer letter: "a", "b" or "c".
    pub correct: String,
}

impl Question {
    pub fn correct_index(&self) -> usize {
        (self.correct.as_bytes()[0] - b'a') as usize
    }

    /// Option lines prefixed with their letter, ready for an embed body.
    pub fn options_text(&self) -> String {
        self.options
            .iter()
            .zip(ANSWER_LETTERS)
            .map(|(opt, letter)| format!("{}) {}", letter, opt))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Pool of quiz questions served in shuffled order without repeats until
/// every question has been shown once. On exhaustion the pool reshuffles and
/// starts over, so a question can reappear as the very next one across the
/// reshuffle boundary.
pub struct QuestionPool {
    questions: Vec<Question>,
    order: Vec<usize>,
    cursor: usize,
}

impl QuestionPool {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("reading question file {}", path.as_ref().display()))?;
        let questions: Vec<Question> =
            serde_json::from_str(&raw).context("parsing question file")?;
        Self::from_questions(questions)
    }

    pub fn from_questions(questions: Vec<Question>) -> Result<Self> {
        if questions.is_empty() {
            anyhow::bail!("question pool is empty");
        }
        for q in &questions {
            if q.options.len() != ANSWER_LETTERS.len() {
                anyhow::bail!("question '{}' must have exactly 3 options", q.question);
            }
            if !ANSWER_LETTERS.contains(&q.correct.as_str()) {
                anyhow::bail!("question '{}' has invalid answer '{}'", q.question, q.correct);
            }
        }

        let mut order: Vec<usize> = (0..questions.len()).collect();
        order.shuffle(&mut rand::rng());

        Ok(Self { questions, order, cursor: 0 })
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    /// Next question in the current pass, with its options re-shuffled and
    /// the correct letter remapped to match.
    pub fn next_question(&mut self) -> Question {
        if self.cursor >= self.order.len() {
            self.order.shuffle(&mut rand::rng());
            self.cursor = 0;
        }

        let mut question = self.questions[self.order[self.cursor]].clone();
        self.cursor += 1;
        shuffle_options(&mut question);
        question
    }
}

fn shuffle_options(question: &mut Question) {
    let correct_text = question.options[question.correct_index()].clone();
    question.options.shuffle(&mut rand::rng());
    let new_index = question
        .options
        .iter()
        .position(|opt| *opt == correct_text)
        .unwrap_or(0);
    question.correct = ANSWER_LETTERS[new_index].to_string();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn sample_questions(n: usize) -> Vec<Question> {
        (0..n)
            .map(|i| Question {
                question: format!("question {}", i),
                options: vec![format!("right {}", i), "wrong 1".into(), "wrong 2".into()],
                correct: "a".into(),
            })
            .collect()
    }

    #[test]
    fn empty_pool_is_an_error() {
        assert!(QuestionPool::from_questions(vec![]).is_err());
    }

    #[test]
    fn bad_answer_letter_is_an_error() {
        let mut qs = sample_questions(1);
        qs[0].correct = "d".into();
        assert!(QuestionPool::from_questions(qs).is_err());
    }

    #[test]
    fn full_pass_has_no_repeats() {
        let mut pool = QuestionPool::from_questions(sample_questions(10)).unwrap();
        let seen: HashSet<String> =
            (0..pool.len()).map(|_| pool.next_question().question).collect();
        assert_eq!(seen.len(), 10);
    }

    #[test]
    fn pool_reshuffles_after_exhaustion() {
        let mut pool = QuestionPool::from_questions(sample_questions(3)).unwrap();
        for _ in 0..9 {
            pool.next_question();
        }
    }

    #[test]
    fn option_shuffle_keeps_correct_letter_accurate() {
        let mut pool = QuestionPool::from_questions(sample_questions(5)).unwrap();
        for _ in 0..20 {
            let q = pool.next_question();
            assert!(q.options[q.correct_index()].starts_with("right"));
        }
    }
}
