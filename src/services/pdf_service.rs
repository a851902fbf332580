use crate::error::{Error, Result};
use crate::utils::text::normalize_whitespace;
use async_trait::async_trait;
use tokio::fs;
use tokio::process::Command;

#[async_trait]
pub trait TextExtractor: Send + Sync {
    /// Plain, whitespace-normalised text of the document.
    async fn extract_text(&self, document: &[u8]) -> Result<String>;
}

/// Shells out to poppler's `pdftotext`.
#[derive(Clone, Debug)]
pub struct PdftotextExtractor {
    binary: String,
    scratch_dir: String,
}

impl Default for PdftotextExtractor {
    fn default() -> Self {
        Self {
            binary: "pdftotext".to_string(),
            scratch_dir: std::env::temp_dir().to_string_lossy().into_owned(),
        }
    }
}

impl PdftotextExtractor {
    pub fn new(binary: impl Into<String>, scratch_dir: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            scratch_dir: scratch_dir.into(),
        }
    }
}

pub fn ensure_pdf(document: &[u8]) -> Result<()> {
    if document.starts_with(b"%PDF") {
        Ok(())
    } else {
        Err(Error::BadRequest("Invalid PDF file content".into()))
    }
}

#[async_trait]
impl TextExtractor for PdftotextExtractor {
    async fn extract_text(&self, document: &[u8]) -> Result<String> {
        ensure_pdf(document)?;

        fs::create_dir_all(&self.scratch_dir).await?;
        let file_path = format!("{}/studify_{}.pdf", self.scratch_dir, uuid::Uuid::new_v4());
        fs::write(&file_path, document).await?;

        let output = Command::new(&self.binary)
            .arg("-enc")
            .arg("UTF-8")
            .arg(&file_path)
            .arg("-")
            .output()
            .await;

        let _ = fs::remove_file(&file_path).await;

        let out = output.map_err(|e| {
            tracing::error!("Failed to run {}: {}", self.binary, e);
            Error::PdfExtraction(format!("{} not available", self.binary))
        })?;
        if !out.status.success() {
            tracing::error!("pdftotext failed: {}", String::from_utf8_lossy(&out.stderr));
            return Err(Error::PdfExtraction("Failed to read the PDF".to_string()));
        }

        let text = normalize_whitespace(&String::from_utf8_lossy(&out.stdout));
        if text.is_empty() {
            return Err(Error::PdfExtraction(
                "Failed to extract text from the PDF.".to_string(),
            ));
        }
        tracing::debug!(chars = text.len(), "Extracted PDF text");
        Ok(text)
    }
}
