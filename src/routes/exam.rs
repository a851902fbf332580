use crate::dto::exam_dto::AnalyzeForm;
use crate::error::{Error, Result};
use crate::services::exam_service::ExamOutput;
use crate::utils::multipart::UploadForm;
use crate::AppState;
use axum::{
    extract::{Multipart, State},
    Json,
};

pub async fn analyze(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<ExamOutput>> {
    let mut form = UploadForm::collect(multipart).await?;
    let request = AnalyzeForm::from_upload(&form)?.into_request();
    let file = form.take_file("pdf_file")?;

    let text = state.text_extractor.extract_text(&file.data).await?;
    let output = state.exam_service.generate_exam(&text, &request).await?;

    if output.questions.is_empty() {
        return Err(Error::GenerationFailed(
            "No questions could be generated from the document".to_string(),
        ));
    }
    tracing::info!(
        questions = output.questions.len(),
        marks_planned = output.marks_planned,
        marks_delivered = output.marks_delivered,
        "Exam generated"
    );
    Ok(Json(output))
}
