use crate::error::{Error, Result};
use axum::extract::Multipart;
use bytes::Bytes;
use std::collections::HashMap;

/// One uploaded file plus the plain text fields that came with it.
#[derive(Debug, Default)]
pub struct UploadForm {
    pub file: Option<UploadedFile>,
    pub fields: HashMap<String, String>,
}

#[derive(Debug)]
pub struct UploadedFile {
    pub field_name: String,
    pub file_name: Option<String>,
    pub data: Bytes,
}

impl UploadForm {
    pub async fn collect(mut multipart: Multipart) -> Result<Self> {
        let mut form = UploadForm::default();

        while let Some(field) = multipart.next_field().await.map_err(|e| {
            tracing::error!("Failed to get next field: {}", e);
            Error::BadRequest(e.to_string())
        })? {
            let field_name = field.name().unwrap_or_default().to_string();
            if field.file_name().is_some() {
                let file_name = field.file_name().map(str::to_string);
                let data = field.bytes().await?;
                form.file = Some(UploadedFile {
                    field_name,
                    file_name,
                    data,
                });
            } else {
                let value = field.text().await?;
                form.fields.insert(field_name, value);
            }
        }

        Ok(form)
    }

    /// The uploaded file, which must have been sent under `field_name`.
    pub fn take_file(&mut self, field_name: &str) -> Result<UploadedFile> {
        match self.file.take() {
            Some(file) if file.field_name == field_name => Ok(file),
            Some(file) => Err(Error::BadRequest(format!(
                "Expected file field '{}', got '{}'",
                field_name, file.field_name
            ))),
            None => Err(Error::BadRequest("No file uploaded.".to_string())),
        }
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    pub fn required_text(&self, name: &str) -> Result<String> {
        self.text(name)
            .map(str::to_string)
            .ok_or_else(|| Error::BadRequest(format!("Missing form field: {}", name)))
    }

    pub fn parsed<T>(&self, name: &str) -> Result<Option<T>>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        self.text(name)
            .map(|raw| {
                raw.parse()
                    .map_err(|e| Error::BadRequest(format!("Invalid value for {}: {}", name, e)))
            })
            .transpose()
    }

    pub fn required_parsed<T>(&self, name: &str) -> Result<T>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        self.parsed(name)?
            .ok_or_else(|| Error::BadRequest(format!("Missing form field: {}", name)))
    }
}
