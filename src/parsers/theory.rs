use super::MalformedResponse;
use crate::utils::text::non_blank_lines;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTheory {
    pub question: String,
    pub answer: String,
}

/// Reads `Question:` / `Answer:` prefixed lines (case-insensitive). Every line
/// after the answer marker belongs to the answer, space-joined.
pub fn parse_theory(raw: &str) -> Result<ParsedTheory, MalformedResponse> {
    let mut question: Option<&str> = None;
    let mut answer_parts: Vec<&str> = Vec::new();
    let mut collecting_answer = false;

    for line in non_blank_lines(raw) {
        if collecting_answer {
            answer_parts.push(line);
        } else if let Some(rest) = strip_label_ci(line, "answer:") {
            collecting_answer = true;
            answer_parts.push(rest);
        } else if question.is_none() {
            question = strip_label_ci(line, "question:");
        }
    }

    let question = question
        .filter(|q| !q.is_empty())
        .ok_or(MalformedResponse::MissingQuestion)?;

    let answer = answer_parts
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    if answer.is_empty() {
        return Err(MalformedResponse::MissingAnswer);
    }

    Ok(ParsedTheory {
        question: question.to_string(),
        answer,
    })
}

fn strip_label_ci<'a>(line: &'a str, label: &str) -> Option<&'a str> {
    let head = line.get(..label.len())?;
    if head.eq_ignore_ascii_case(label) {
        Some(line[label.len()..].trim())
    } else {
        None
    }
}
