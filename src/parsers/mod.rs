//! Tolerant parsers over free-form model output.
//!
//! Each parser returns `Err(MalformedResponse)` instead of panicking; the exam
//! orchestrator discards that attempt and decides whether to try again.

pub mod mcq;
pub mod theory;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MalformedResponse {
    #[error("expected at least {expected} non-blank lines, found {found}")]
    TooFewLines { expected: usize, found: usize },

    #[error("option line {line:?} has no \") \" separator")]
    MissingOptionSeparator { line: String },

    #[error("correct answer {0:?} is not one of the option labels")]
    UnknownCorrectAnswer(String),

    #[error("no line starting with \"Question:\"")]
    MissingQuestion,

    #[error("no line starting with \"Answer:\" or the answer is empty")]
    MissingAnswer,

    #[error("answer extraction returned no usable character")]
    EmptyAnswerToken,
}
