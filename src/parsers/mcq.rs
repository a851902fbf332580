use super::MalformedResponse;
use crate::models::question::OptionLabel;
use crate::utils::text::non_blank_lines;
use std::collections::BTreeMap;

const QUESTION_LABEL: &str = "Question:";
const ANSWER_LABEL: &str = "Correct Answer:";
const OPTION_SEPARATOR: &str = ") ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedMcq {
    pub question: String,
    pub options: BTreeMap<OptionLabel, String>,
    pub correct_answer: OptionLabel,
}

/// Parses the strict six-line layout:
///
/// ```text
/// Question: What is AI?
/// A) Artificial Intelligence
/// B) Automated Integration
/// C) Advanced Internet
/// D) Autonomous Input
/// Correct Answer: A
/// ```
///
/// Options are labeled by position; whatever letter the model wrote before
/// `") "` is discarded.
pub fn parse_mcq(raw: &str) -> Result<ParsedMcq, MalformedResponse> {
    let lines = non_blank_lines(raw);
    if lines.len() < 6 {
        return Err(MalformedResponse::TooFewLines {
            expected: 6,
            found: lines.len(),
        });
    }

    let question = strip_label(lines[0], QUESTION_LABEL).to_string();

    let mut options = BTreeMap::new();
    for (label, line) in OptionLabel::ALL.into_iter().zip(&lines[1..5]) {
        let (_, text) = line.split_once(OPTION_SEPARATOR).ok_or_else(|| {
            MalformedResponse::MissingOptionSeparator {
                line: line.to_string(),
            }
        })?;
        options.insert(label, text.trim().to_string());
    }

    let answer = strip_label(lines[5], ANSWER_LABEL).trim_end_matches([')', '.']);
    let correct_answer = answer
        .parse::<OptionLabel>()
        .map_err(|_| MalformedResponse::UnknownCorrectAnswer(answer.to_string()))?;

    Ok(ParsedMcq {
        question,
        options,
        correct_answer,
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LooseMcq {
    pub question: String,
    pub option_lines: Vec<String>,
}

/// Fallback layout: line 0 is the question, the next four lines are kept
/// verbatim as options. The correct answer is resolved separately.
pub fn parse_loose_mcq(raw: &str) -> Result<LooseMcq, MalformedResponse> {
    let lines = non_blank_lines(raw);
    if lines.len() < 5 {
        return Err(MalformedResponse::TooFewLines {
            expected: 5,
            found: lines.len(),
        });
    }

    Ok(LooseMcq {
        question: strip_label(lines[0], QUESTION_LABEL).to_string(),
        option_lines: lines[1..5].iter().map(|l| l.to_string()).collect(),
    })
}

/// First character of the model's "which line is correct" reply.
pub fn answer_token(verdict: &str) -> Result<String, MalformedResponse> {
    verdict
        .trim()
        .chars()
        .next()
        .map(String::from)
        .ok_or(MalformedResponse::EmptyAnswerToken)
}

fn strip_label<'a>(line: &'a str, label: &str) -> &'a str {
    line.strip_prefix(label).unwrap_or(line).trim()
}
