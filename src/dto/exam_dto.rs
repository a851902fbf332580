use crate::error::Result;
use crate::models::generation::{Difficulty, GenerationRequest, QuestionType};
use crate::services::quota_service::{QuotaLimits, QuotaState};
use crate::utils::multipart::UploadForm;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// Text fields of the `/analyze` multipart form.
#[derive(Debug, Clone, Validate)]
#[validate(schema(function = "validate_marks_per_question"))]
pub struct AnalyzeForm {
    #[validate(length(min = 1, message = "topic must not be empty"))]
    pub topic: String,
    pub difficulty: String,
    pub question_type: QuestionType,
    #[validate(range(min = 1, max = 200, message = "total_marks must be between 1 and 200"))]
    pub total_marks: u32,
    #[validate(range(min = 1, max = 200, message = "marks_per_question must be between 1 and 200"))]
    pub marks_per_question: Option<u32>,
}

fn validate_marks_per_question(form: &AnalyzeForm) -> std::result::Result<(), ValidationError> {
    if form.question_type == QuestionType::Mcq && form.marks_per_question.is_none() {
        let mut err = ValidationError::new("marks_per_question_required");
        err.message = Some("marks_per_question is required for MCQ".into());
        return Err(err);
    }
    Ok(())
}

impl AnalyzeForm {
    pub fn from_upload(form: &UploadForm) -> Result<Self> {
        let parsed = Self {
            topic: form.required_text("topic")?,
            difficulty: form.text("difficulty").unwrap_or("medium").to_string(),
            question_type: form.required_parsed("question_type")?,
            total_marks: form.required_parsed("total_marks")?,
            marks_per_question: form.parsed("marks_per_question")?,
        };
        parsed.validate()?;
        Ok(parsed)
    }

    pub fn into_request(self) -> GenerationRequest {
        GenerationRequest {
            difficulty: Difficulty::from(self.difficulty.as_str()),
            topic: self.topic,
            question_type: self.question_type,
            total_marks: self.total_marks,
            marks_per_question: self.marks_per_question,
        }
    }
}

/// Text fields of the `/askQuestion` multipart form.
#[derive(Debug, Clone, Validate)]
pub struct AskQuestionForm {
    #[validate(length(min = 1, message = "question must not be empty"))]
    pub question: String,
    #[validate(range(min = 1, message = "word_limit must be at least 1"))]
    pub word_limit: u32,
}

impl AskQuestionForm {
    pub fn from_upload(form: &UploadForm) -> Result<Self> {
        let parsed = Self {
            question: form.required_text("question")?,
            word_limit: form.required_parsed("word_limit")?,
        };
        parsed.validate()?;
        Ok(parsed)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryResponse {
    pub summary: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerResponse {
    pub answer: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct QuotaResponse {
    #[serde(flatten)]
    pub usage: QuotaState,
    pub limits: QuotaLimits,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::marks_service::MAX_TOTAL_MARKS;

    fn upload(fields: &[(&str, &str)]) -> UploadForm {
        UploadForm {
            file: None,
            fields: fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    #[test]
    fn analyze_form_builds_generation_request() {
        let form = AnalyzeForm::from_upload(&upload(&[
            ("topic", "Photosynthesis"),
            ("difficulty", "Hard"),
            ("question_type", "mcq"),
            ("total_marks", "10"),
            ("marks_per_question", "2"),
        ]))
        .unwrap();
        let request = form.into_request();
        assert_eq!(request.topic, "Photosynthesis");
        assert_eq!(request.difficulty, Difficulty::Hard);
        assert_eq!(request.question_type, QuestionType::Mcq);
        assert_eq!(request.marks_per_question, Some(2));
    }

    #[test]
    fn mcq_without_marks_per_question_fails_validation() {
        let result = AnalyzeForm::from_upload(&upload(&[
            ("topic", "Cells"),
            ("question_type", "MCQ"),
            ("total_marks", "10"),
        ]));
        assert!(matches!(result, Err(crate::error::Error::Validation(_))));
    }

    #[test]
    fn zero_total_marks_fails_validation() {
        let result = AnalyzeForm::from_upload(&upload(&[
            ("topic", "Cells"),
            ("question_type", "theory"),
            ("total_marks", "0"),
        ]));
        assert!(matches!(result, Err(crate::error::Error::Validation(_))));
    }

    #[test]
    fn oversized_total_marks_fails_validation() {
        let result = AnalyzeForm::from_upload(&upload(&[
            ("topic", "Cells"),
            ("question_type", "mcq"),
            ("total_marks", "4294967295"),
            ("marks_per_question", "1"),
        ]));
        assert!(matches!(result, Err(crate::error::Error::Validation(_))));
    }

    #[test]
    fn validation_cap_matches_planner_cap() {
        let form = AnalyzeForm::from_upload(&upload(&[
            ("topic", "Cells"),
            ("question_type", "theory"),
            ("total_marks", &MAX_TOTAL_MARKS.to_string()),
        ]));
        assert!(form.is_ok());
        let over = (MAX_TOTAL_MARKS + 1).to_string();
        let result = AnalyzeForm::from_upload(&upload(&[
            ("topic", "Cells"),
            ("question_type", "theory"),
            ("total_marks", &over),
        ]));
        assert!(matches!(result, Err(crate::error::Error::Validation(_))));
    }

    #[test]
    fn non_numeric_marks_is_bad_request() {
        let result = AnalyzeForm::from_upload(&upload(&[
            ("topic", "Cells"),
            ("question_type", "theory"),
            ("total_marks", "ten"),
        ]));
        assert!(matches!(result, Err(crate::error::Error::BadRequest(_))));
    }

    #[test]
    fn ask_question_requires_positive_word_limit() {
        let result =
            AskQuestionForm::from_upload(&upload(&[("question", "Why?"), ("word_limit", "0")]));
        assert!(matches!(result, Err(crate::error::Error::Validation(_))));
    }
}
