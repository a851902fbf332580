use crate::models::generation::Difficulty;

pub fn summary(document_text: &str) -> String {
    format!(
        "Summarize the following content in a concise and clear manner: {}",
        document_text
    )
}

pub fn answer(question: &str, document_text: &str, word_limit: u32) -> String {
    format!(
        "Give the answer of question {} by analyzing the {}.\n\
         Limit the answer to {} words.",
        question, document_text, word_limit
    )
}

pub fn topic_extraction(topic: &str, document_text: &str) -> String {
    format!(
        "Extract the text related to '{}' from the following content: {}",
        topic, document_text
    )
}

pub fn mcq(marks: u32, topic: &str, difficulty: &Difficulty, topic_text: &str) -> String {
    format!(
        r#"Generate a {marks}-mark multiple-choice question on the topic '{topic}' at '{difficulty}' difficulty level.
Provide 4 answer options (A, B, C, D), one of which is correct. Clearly indicate the correct answer.
Ensure that one option is correct among the four and that the generated question is different from previous ones.
Base it on the following content:

{topic_text}

Return output in this format:
Question: What is AI?
A) Artificial Intelligence
B) Automated Integration
C) Advanced Internet
D) Autonomous Input
Correct Answer: A"#
    )
}

pub fn mcq_fallback(marks: u32, topic: &str, difficulty: &Difficulty) -> String {
    format!(
        r#"Search the web for content on the topic '{topic}' at '{difficulty}' difficulty level.
Generate a {marks}-mark multiple-choice question.
Provide 4 answer options, one of which is correct. Clearly indicate the correct answer.
Make sure the options of the question contain exactly one correct option out of 4.
The question must be different from previous ones.
Put the question on the first line and each option on its own line after it."#
    )
}

pub fn correct_option(option_lines: &[String]) -> String {
    format!(
        "Extract the line which contains the word correct from {:?}. Reply with that line only.",
        option_lines
    )
}

pub fn theory(
    marks: u32,
    topic: &str,
    difficulty: &Difficulty,
    word_limit: u32,
    topic_text: &str,
) -> String {
    format!(
        r#"Generate a concise theory question worth {marks} marks on the topic "{topic}"
with difficulty level "{difficulty}". Avoid unnecessary details.
Base it on the following content:

{topic_text}

Then, generate a well-structured answer within {word_limit} words.
The answer should be clear, relevant, and informative but should not exceed the word limit.

Format:
Question: <concise question here>
Answer: <answer within {word_limit} words>"#
    )
}
