//! Interview question set
//!
//! Questions are an immutable input to every assessment, one-to-one with the
//! question-response videos (video index `n` answers question `n`). The
//! default set is a plain constructor, never process-wide state.

use serde::{Deserialize, Serialize};

/// A single rubric criterion (e.g. `content_check`, `sentiment_check`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Criterion {
    pub name: String,
    pub description: String,
}

impl Criterion {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }
}

/// One interview question with its goal and scoring rubric.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// 1-based question number, matching the video index it is answered in
    pub number: u32,
    pub prompt_text: String,
    pub goal: String,
    #[serde(default)]
    pub rubric: Vec<Criterion>,
}

/// Ordered set of questions for one assessment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuestionSet {
    questions: Vec<Question>,
}

impl QuestionSet {
    pub fn new(questions: Vec<Question>) -> Self {
        Self { questions }
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Question> {
        self.questions.iter()
    }

    pub fn get(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    /// Question numbers must run 1..=N in order.
    pub fn is_sequential(&self) -> bool {
        self.questions
            .iter()
            .enumerate()
            .all(|(i, q)| q.number as usize == i + 1)
    }

    /// The five-question screening set used by the Ambassador Program.
    pub fn ambassador_program() -> Self {
        Self::new(vec![
            Question {
                number: 1,
                prompt_text: "Please introduce yourself and tell us about your academic background."
                    .to_string(),
                goal: "The candidate must clearly state their name, a specific university, \
                       and their field of study in a confident manner."
                    .to_string(),
                rubric: vec![
                    Criterion::new("content_check", "Specific university name and specific major"),
                    Criterion::new(
                        "clarity_check",
                        "Direct speech, free of excessive filler words",
                    ),
                    Criterion::new(
                        "sentiment_check",
                        "Professional and confident (neutral to positive)",
                    ),
                ],
            },
            Question {
                number: 2,
                prompt_text: "What motivated you to apply for our Ambassador Program?".to_string(),
                goal: "The candidate must express genuine, mission-aligned passion for helping \
                       students, not just personal gain."
                    .to_string(),
                rubric: vec![
                    Criterion::new(
                        "content_check",
                        "Keywords: help, guide, give back, share my experience",
                    ),
                    Criterion::new("sentiment_check", "Highly positive and enthusiastic"),
                ],
            },
            Question {
                number: 3,
                prompt_text: "Describe a time when you helped someone learn something new."
                    .to_string(),
                goal: "The candidate must demonstrate patience, empathy, and a structured \
                       approach to teaching."
                    .to_string(),
                rubric: vec![
                    Criterion::new(
                        "content_check",
                        "Clear process (Problem -> Action -> Result), empathy keywords: patience, listened, explained",
                    ),
                    Criterion::new("sentiment_check", "Helpful and positive"),
                ],
            },
            Question {
                number: 4,
                prompt_text: "How do you handle challenging situations or difficult students?"
                    .to_string(),
                goal: "The candidate must show a mature, calm, and solution-oriented approach, \
                       not a blaming one."
                    .to_string(),
                rubric: vec![
                    Criterion::new(
                        "content_check",
                        "Positive actions: listen, understand, empathize, find a solution",
                    ),
                    Criterion::new(
                        "red_flag_check",
                        "No negative words: lazy, stupid, their fault",
                    ),
                    Criterion::new(
                        "sentiment_check",
                        "Calm and professional (neutral-to-positive)",
                    ),
                ],
            },
            Question {
                number: 5,
                prompt_text: "What are your goals as a mentor and how do you plan to achieve them?"
                    .to_string(),
                goal: "The candidate must show forward-looking, aspirational goals with concrete \
                       action plans."
                    .to_string(),
                rubric: vec![
                    Criterion::new(
                        "content_check",
                        "Action-oriented words: plan, create, organize, develop, build",
                    ),
                    Criterion::new(
                        "specific_actions",
                        "Specific actions: weekly, daily, check-in, meeting, resource",
                    ),
                    Criterion::new(
                        "sentiment_check",
                        "Forward-looking, confident, aspirational with concrete plan",
                    ),
                ],
            },
        ])
    }
}

impl<'a> IntoIterator for &'a QuestionSet {
    type Item = &'a Question;
    type IntoIter = std::slice::Iter<'a, Question>;

    fn into_iter(self) -> Self::IntoIter {
        self.questions.iter()
    }
}
