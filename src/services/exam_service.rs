use crate::error::{Error, Result};
use crate::models::generation::{GenerationRequest, QuestionType};
use crate::models::question::{McqOptions, McqQuestion, Question, TheoryQuestion};
use crate::parsers::mcq::{answer_token, parse_loose_mcq, parse_mcq};
use crate::parsers::theory::parse_theory;
use crate::services::gateway_service::ModelGateway;
use crate::services::marks_service::{
    self, MarksBucket, MarksPlan, MAX_TOTAL_MARKS, THEORY_DISTRIBUTION,
};
use crate::services::prompts;
use crate::utils::text::snippet;
use serde::Serialize;

const SNIPPET_CHARS: usize = 200;

#[derive(Debug, Clone, Copy)]
pub struct GenerationSettings {
    /// Primary MCQ attempts allowed per planned question.
    pub mcq_primary_attempts_per_question: usize,
    /// Fallback MCQ attempts allowed per planned question.
    pub mcq_fallback_attempts_per_question: usize,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            mcq_primary_attempts_per_question: 1,
            mcq_fallback_attempts_per_question: 2,
        }
    }
}

/// Generated questions plus how many marks they cover. Fewer questions than
/// planned is a normal outcome.
#[derive(Debug, Clone, Serialize)]
pub struct ExamOutput {
    pub questions: Vec<Question>,
    pub marks_requested: u32,
    pub marks_planned: u32,
    pub marks_delivered: u32,
}

#[derive(Clone)]
pub struct ExamService {
    gateway: ModelGateway,
    settings: GenerationSettings,
}

impl ExamService {
    pub fn new(gateway: ModelGateway, settings: GenerationSettings) -> Self {
        Self { gateway, settings }
    }

    pub async fn summarize(&self, document_text: &str) -> Result<String> {
        self.gateway
            .gated_call(&prompts::summary(document_text))
            .await?
            .ok_or_else(|| Error::GenerationFailed("Failed to summarize the PDF".to_string()))
    }

    pub async fn answer_question(
        &self,
        document_text: &str,
        question: &str,
        word_limit: u32,
    ) -> Result<String> {
        self.gateway
            .gated_call(&prompts::answer(question, document_text, word_limit))
            .await?
            .ok_or_else(|| Error::GenerationFailed("Failed to generate an answer".to_string()))
    }

    pub async fn generate_exam(
        &self,
        document_text: &str,
        request: &GenerationRequest,
    ) -> Result<ExamOutput> {
        let plan = plan_for(request)?;
        let topic_text = self.extract_topic(document_text, &request.topic).await?;

        tracing::info!(
            topic = %request.topic,
            question_type = ?request.question_type,
            total_marks = request.total_marks,
            planned_questions = plan.question_count(),
            dropped_marks = plan.shortfall(),
            "Generating exam questions"
        );

        let mut questions = Vec::new();
        for bucket in plan.buckets.iter().filter(|b| b.count > 0) {
            let generated = match request.question_type {
                QuestionType::Mcq => self.generate_mcq(&topic_text, request, bucket).await?,
                QuestionType::Theory => self.generate_theory(&topic_text, request, bucket).await?,
            };
            if generated.len() < bucket.count as usize {
                tracing::warn!(
                    marks = bucket.marks,
                    planned = bucket.count,
                    generated = generated.len(),
                    "Bucket finished short of its target"
                );
            }
            questions.extend(generated);
        }

        let marks_delivered = questions.iter().map(Question::marks).sum();
        Ok(ExamOutput {
            questions,
            marks_requested: plan.requested_marks,
            marks_planned: plan.planned_marks(),
            marks_delivered,
        })
    }

    async fn extract_topic(&self, document_text: &str, topic: &str) -> Result<String> {
        match self
            .gateway
            .gated_call(&prompts::topic_extraction(topic, document_text))
            .await?
        {
            Some(text) => Ok(text),
            None => {
                tracing::error!(stage = "topic_extraction", topic, "No usable topic text");
                Err(Error::TopicExtractionFailed)
            }
        }
    }

    async fn generate_mcq(
        &self,
        topic_text: &str,
        request: &GenerationRequest,
        bucket: &MarksBucket,
    ) -> Result<Vec<Question>> {
        let target = bucket.count as usize;
        let mut questions = Vec::new();

        let primary_budget = target * self.settings.mcq_primary_attempts_per_question;
        let prompt = prompts::mcq(bucket.marks, &request.topic, &request.difficulty, topic_text);
        let mut attempts = 0;
        while questions.len() < target && attempts < primary_budget {
            attempts += 1;
            let Some(raw) = self.gateway.gated_call(&prompt).await? else {
                tracing::warn!(stage = "mcq", attempt = attempts, "No response from model");
                continue;
            };
            match parse_mcq(&raw) {
                Ok(parsed) => questions.push(Question::MultipleChoice(McqQuestion {
                    question: parsed.question,
                    options: McqOptions::Labeled(parsed.options),
                    correct_answer: parsed.correct_answer.to_string(),
                    marks: bucket.marks,
                })),
                Err(e) => tracing::warn!(
                    stage = "mcq",
                    attempt = attempts,
                    error = %e,
                    snippet = %snippet(&raw, SNIPPET_CHARS),
                    "Discarding malformed question"
                ),
            }
        }

        if questions.len() < target {
            self.generate_mcq_fallback(request, bucket, target, &mut questions)
                .await?;
        }
        Ok(questions)
    }

    /// Stops at the target, on an unusable model reply, or when the attempt budget runs out.
    async fn generate_mcq_fallback(
        &self,
        request: &GenerationRequest,
        bucket: &MarksBucket,
        target: usize,
        questions: &mut Vec<Question>,
    ) -> Result<()> {
        let budget = target * self.settings.mcq_fallback_attempts_per_question;
        let prompt = prompts::mcq_fallback(bucket.marks, &request.topic, &request.difficulty);
        let mut attempts = 0;
        let mut unusable_reply = false;

        tracing::info!(
            missing = target - questions.len(),
            budget,
            "Switching to fallback question generation"
        );

        while questions.len() < target && attempts < budget && !unusable_reply {
            attempts += 1;

            let Some(raw) = self.gateway.gated_call(&prompt).await? else {
                tracing::warn!(stage = "mcq_fallback", attempt = attempts, "Fallback generation returned nothing");
                unusable_reply = true;
                continue;
            };

            let loose = match parse_loose_mcq(&raw) {
                Ok(loose) => loose,
                Err(e) => {
                    tracing::warn!(
                        stage = "mcq_fallback",
                        attempt = attempts,
                        error = %e,
                        snippet = %snippet(&raw, SNIPPET_CHARS),
                        "Discarding malformed fallback question"
                    );
                    continue;
                }
            };

            let verdict = self
                .gateway
                .gated_call(&prompts::correct_option(&loose.option_lines))
                .await?;
            let Some(verdict) = verdict else {
                tracing::warn!(
                    stage = "mcq_fallback_answer",
                    attempt = attempts,
                    snippet = %snippet(&raw, SNIPPET_CHARS),
                    "Answer extraction returned nothing"
                );
                unusable_reply = true;
                continue;
            };
            let token = match answer_token(&verdict) {
                Ok(token) => token,
                Err(e) => {
                    tracing::warn!(
                        stage = "mcq_fallback_answer",
                        attempt = attempts,
                        error = %e,
                        snippet = %snippet(&verdict, SNIPPET_CHARS),
                        "No answer token"
                    );
                    unusable_reply = true;
                    continue;
                }
            };

            questions.push(Question::MultipleChoice(McqQuestion {
                question: loose.question,
                options: McqOptions::Raw(loose.option_lines),
                correct_answer: token,
                marks: bucket.marks,
            }));
        }

        Ok(())
    }

    async fn generate_theory(
        &self,
        topic_text: &str,
        request: &GenerationRequest,
        bucket: &MarksBucket,
    ) -> Result<Vec<Question>> {
        let word_limit = bucket.word_limit.unwrap_or_default();
        let prompt = prompts::theory(
            bucket.marks,
            &request.topic,
            &request.difficulty,
            word_limit,
            topic_text,
        );

        let mut questions = Vec::new();
        for attempt in 1..=bucket.count {
            let Some(raw) = self.gateway.gated_call(&prompt).await? else {
                tracing::warn!(stage = "theory", attempt, "No response from model");
                continue;
            };
            match parse_theory(&raw) {
                Ok(parsed) => questions.push(Question::Theory(TheoryQuestion {
                    question: parsed.question,
                    answer: parsed.answer,
                    marks: bucket.marks,
                    word_limit,
                })),
                Err(e) => tracing::warn!(
                    stage = "theory",
                    attempt,
                    error = %e,
                    snippet = %snippet(&raw, SNIPPET_CHARS),
                    "Discarding malformed theory question"
                ),
            }
        }
        Ok(questions)
    }
}

fn plan_for(request: &GenerationRequest) -> Result<MarksPlan> {
    if request.total_marks > MAX_TOTAL_MARKS {
        return Err(Error::BadRequest(format!(
            "total_marks must not exceed {}",
            MAX_TOTAL_MARKS
        )));
    }
    match request.question_type {
        QuestionType::Mcq => {
            let marks = request
                .marks_per_question
                .filter(|m| *m > 0)
                .ok_or_else(|| {
                    Error::BadRequest("marks_per_question is required for MCQ papers".to_string())
                })?;
            Ok(marks_service::allocate_mcq(request.total_marks, marks))
        }
        QuestionType::Theory => Ok(marks_service::allocate(
            request.total_marks,
            &THEORY_DISTRIBUTION,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::generation::Difficulty;
    use crate::models::question::OptionLabel;
    use crate::services::ai_service::MockTextGenerator;
    use crate::services::quota_service::{QuotaLimits, QuotaTracker};
    use mockall::Sequence;
    use std::sync::Arc;

    const MCQ_OK: &str = "Question: What is the capital of France?\nA) Paris\nB) London\nC) Rome\nD) Berlin\nCorrect Answer: A";

    /// Each call pops the next scripted reply; `None` simulates an upstream failure.
    fn scripted(replies: Vec<Option<&'static str>>) -> MockTextGenerator {
        let mut generator = MockTextGenerator::new();
        let mut seq = Sequence::new();
        for reply in replies {
            generator
                .expect_generate()
                .times(1)
                .in_sequence(&mut seq)
                .returning(move |_| match reply {
                    Some(text) => Ok(text.to_string()),
                    None => Err(Error::Internal("upstream failure".into())),
                });
        }
        generator
    }

    fn service(generator: MockTextGenerator) -> ExamService {
        let gateway = ModelGateway::new(
            Arc::new(QuotaTracker::new(QuotaLimits::default())),
            Arc::new(generator),
        );
        ExamService::new(gateway, GenerationSettings::default())
    }

    fn request(question_type: QuestionType, total_marks: u32, per_question: Option<u32>) -> GenerationRequest {
        GenerationRequest {
            topic: "Geography".into(),
            difficulty: Difficulty::Easy,
            question_type,
            total_marks,
            marks_per_question: per_question,
        }
    }

    #[tokio::test]
    async fn mcq_paper_uses_primary_parser() {
        let svc = service(scripted(vec![Some("Topic text"), Some(MCQ_OK), Some(MCQ_OK)]));
        let out = svc
            .generate_exam("doc", &request(QuestionType::Mcq, 4, Some(2)))
            .await
            .unwrap();

        assert_eq!(out.questions.len(), 2);
        assert_eq!(out.marks_delivered, 4);
        match &out.questions[0] {
            Question::MultipleChoice(q) => {
                assert_eq!(q.correct_answer, "A");
                assert_eq!(q.marks, 2);
                match &q.options {
                    McqOptions::Labeled(opts) => assert_eq!(opts[&OptionLabel::B], "London"),
                    other => panic!("expected labeled options, got {:?}", other),
                }
            }
            other => panic!("expected mcq, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn malformed_primary_reply_falls_back() {
        let svc = service(scripted(vec![
            Some("Topic text"),
            Some(MCQ_OK),
            Some("Question: broken\nA) only one option"),
            Some("Which planet is largest?\nA. Mars\nB. Jupiter (correct)\nC. Venus\nD. Earth"),
            Some("B. Jupiter (correct)"),
        ]));
        let out = svc
            .generate_exam("doc", &request(QuestionType::Mcq, 2, Some(1)))
            .await
            .unwrap();

        assert_eq!(out.questions.len(), 2);
        match &out.questions[1] {
            Question::MultipleChoice(q) => {
                assert_eq!(q.question, "Which planet is largest?");
                assert_eq!(q.correct_answer, "B");
                assert!(matches!(&q.options, McqOptions::Raw(lines) if lines.len() == 4));
            }
            other => panic!("expected mcq, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn unusable_fallback_reply_returns_partial_result() {
        let svc = service(scripted(vec![
            Some("Topic text"),
            None,
            None,
            None,
        ]));
        let out = svc
            .generate_exam("doc", &request(QuestionType::Mcq, 2, Some(1)))
            .await
            .unwrap();

        assert!(out.questions.is_empty());
        assert_eq!(out.marks_planned, 2);
        assert_eq!(out.marks_delivered, 0);
    }

    #[tokio::test]
    async fn fallback_attempt_budget_bounds_malformed_replies() {
        // 1 primary attempt, then 2 fallback attempts that never parse.
        let svc = service(scripted(vec![
            Some("Topic text"),
            Some("garbage"),
            Some("still\ngarbage"),
            Some("more\ngarbage"),
        ]));
        let out = svc
            .generate_exam("doc", &request(QuestionType::Mcq, 1, Some(1)))
            .await
            .unwrap();
        assert!(out.questions.is_empty());
    }

    #[tokio::test]
    async fn theory_paper_follows_marks_table() {
        let theory = "Question: Define X\nAnswer: It is\nY.";
        let svc = service(scripted(vec![
            Some("Topic text"),
            Some(theory),
            Some(theory),
            Some("no markers here"),
        ]));
        let out = svc
            .generate_exam("doc", &request(QuestionType::Theory, 10, None))
            .await
            .unwrap();

        assert_eq!(out.questions.len(), 2);
        assert_eq!(out.marks_planned, 10);
        assert_eq!(out.marks_delivered, 8);
        match &out.questions[0] {
            Question::Theory(q) => {
                assert_eq!(q.answer, "It is Y.");
                assert_eq!(q.word_limit, 150);
                assert_eq!(q.marks, 4);
            }
            other => panic!("expected theory, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn missing_topic_text_fails_whole_pipeline() {
        let svc = service(scripted(vec![Some("   ")]));
        let result = svc
            .generate_exam("doc", &request(QuestionType::Theory, 10, None))
            .await;
        assert!(matches!(result, Err(Error::TopicExtractionFailed)));
    }

    #[tokio::test]
    async fn mcq_without_marks_per_question_is_rejected_before_any_call() {
        let svc = service(scripted(vec![]));
        let result = svc
            .generate_exam("doc", &request(QuestionType::Mcq, 10, None))
            .await;
        assert!(matches!(result, Err(Error::BadRequest(_))));
    }

    #[tokio::test]
    async fn failed_answer_extraction_stops_fallback() {
        let svc = service(scripted(vec![
            Some("Topic text"),
            Some("garbage"),
            Some("Which planet is largest?\nA. Mars\nB. Jupiter (correct)\nC. Venus\nD. Earth"),
            None,
        ]));
        let out = svc
            .generate_exam("doc", &request(QuestionType::Mcq, 1, Some(1)))
            .await
            .unwrap();
        assert!(out.questions.is_empty());
        assert_eq!(out.marks_planned, 1);
    }

    #[tokio::test]
    async fn oversized_paper_is_rejected_before_any_call() {
        let svc = service(scripted(vec![]));
        let result = svc
            .generate_exam("doc", &request(QuestionType::Mcq, u32::MAX, Some(1)))
            .await;
        assert!(matches!(result, Err(Error::BadRequest(_))));
    }

    #[test]
    fn largest_allowed_paper_is_planned() {
        let plan = plan_for(&request(QuestionType::Theory, MAX_TOTAL_MARKS, None)).unwrap();
        assert_eq!(plan.planned_marks(), MAX_TOTAL_MARKS);
    }

    #[tokio::test]
    async fn daily_quota_aborts_generation() {
        let mut generator = MockTextGenerator::new();
        generator
            .expect_generate()
            .times(2)
            .returning(|_| Ok("Topic text".to_string()));
        let gateway = ModelGateway::new(
            Arc::new(QuotaTracker::new(QuotaLimits {
                max_rpd: 2,
                ..QuotaLimits::default()
            })),
            Arc::new(generator),
        );
        let svc = ExamService::new(gateway, GenerationSettings::default());

        let result = svc
            .generate_exam("doc", &request(QuestionType::Theory, 10, None))
            .await;
        assert!(matches!(result, Err(Error::DailyQuotaExceeded)));
    }

    #[tokio::test]
    async fn summary_failure_is_generation_failed() {
        let svc = service(scripted(vec![None]));
        assert!(matches!(
            svc.summarize("doc").await,
            Err(Error::GenerationFailed(_))
        ));
    }

    #[tokio::test]
    async fn answer_passes_through_model_text() {
        let mut generator = MockTextGenerator::new();
        generator
            .expect_generate()
            .withf(|prompt: &str| prompt.contains("Limit the answer to 50 words"))
            .returning(|_| Ok("Mitochondria produce ATP.".to_string()));
        let svc = service(generator);

        let answer = svc
            .answer_question("doc", "What do mitochondria do?", 50)
            .await
            .unwrap();
        assert_eq!(answer, "Mitochondria produce ATP.");
    }
}
