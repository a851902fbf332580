use crate::dto::exam_dto::{AnswerResponse, AskQuestionForm, SummaryResponse};
use crate::error::Result;
use crate::utils::multipart::UploadForm;
use crate::AppState;
use axum::{
    extract::{Multipart, State},
    Json,
};

pub async fn summarize_pdf(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<SummaryResponse>> {
    let mut form = UploadForm::collect(multipart).await?;
    let file = form.take_file("pdfFile")?;

    let text = state.text_extractor.extract_text(&file.data).await?;
    tracing::info!(file = ?file.file_name, chars = text.len(), "Summarizing PDF");
    let summary = state.exam_service.summarize(&text).await?;

    Ok(Json(SummaryResponse { summary }))
}

pub async fn ask_question(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<AnswerResponse>> {
    let mut form = UploadForm::collect(multipart).await?;
    let fields = AskQuestionForm::from_upload(&form)?;
    let file = form.take_file("pdf_file")?;

    let text = state.text_extractor.extract_text(&file.data).await?;
    let answer = state
        .exam_service
        .answer_question(&text, &fields.question, fields.word_limit)
        .await?;

    Ok(Json(AnswerResponse { answer }))
}
