//! Structured view of the request body shared by the course and lecture handlers.
//!
//! Multipart bodies carry the text fields plus the `file` and `pdf` parts. A JSON
//! body may carry the text fields only. Any other body yields an empty form, so
//! handlers see missing fields rather than an extractor rejection.

use std::sync::Arc;

use axum::Json;
use axum::extract::multipart::Field;
use axum::extract::{FromRef, FromRequest, Multipart, Request};
use axum::http::{HeaderMap, header::CONTENT_TYPE};
use serde::Deserialize;

use crate::config::AppConfig;
use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Default)]
pub struct UploadForm {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub created_by: Option<String>,
    /// Poster for courses, video for lectures.
    pub file: Option<UploadedFile>,
    /// Lecture assignment.
    pub pdf: Option<UploadedFile>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TextFields {
    title: Option<String>,
    description: Option<String>,
    category: Option<String>,
    created_by: Option<String>,
}

impl From<TextFields> for UploadForm {
    fn from(fields: TextFields) -> Self {
        Self {
            title: fields.title.and_then(non_blank),
            description: fields.description.and_then(non_blank),
            category: fields.category.and_then(non_blank),
            created_by: fields.created_by.and_then(non_blank),
            ..Self::default()
        }
    }
}

impl<S> FromRequest<S> for UploadForm
where
    S: Send + Sync,
    Arc<AppConfig>: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let config = Arc::<AppConfig>::from_ref(state);

        match body_kind(req.headers()) {
            BodyKind::Multipart => {
                let multipart = Multipart::from_request(req, state)
                    .await
                    .map_err(|e| AppError::Validation(e.body_text()))?;
                Self::read_multipart(multipart, config.max_upload_bytes).await
            }
            BodyKind::Json => {
                let Json(fields) = Json::<TextFields>::from_request(req, state)
                    .await
                    .map_err(|e| AppError::Validation(e.body_text()))?;
                Ok(fields.into())
            }
            BodyKind::Other => Ok(Self::default()),
        }
    }
}

impl UploadForm {
    /// Reads every part, keeping the first non-empty value per field name.
    pub async fn read_multipart(
        mut multipart: Multipart,
        max_file_bytes: usize,
    ) -> Result<Self, AppError> {
        let mut form = Self::default();

        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "file" | "pdf" => {
                    let file = read_file(field, &name, max_file_bytes).await?;
                    let slot = if name == "file" { &mut form.file } else { &mut form.pdf };
                    // browsers send an empty part when no file was picked
                    if slot.is_none() && !file.bytes.is_empty() {
                        *slot = Some(file);
                    }
                }
                _ => {
                    if let Some(slot) = form.text_slot(&name) {
                        let value = field.text().await?;
                        if slot.is_none() {
                            *slot = non_blank(value);
                        }
                    }
                }
            }
        }

        Ok(form)
    }

    fn text_slot(&mut self, name: &str) -> Option<&mut Option<String>> {
        match name {
            "title" => Some(&mut self.title),
            "description" => Some(&mut self.description),
            "category" => Some(&mut self.category),
            "createdBy" => Some(&mut self.created_by),
            _ => None,
        }
    }
}

async fn read_file(
    mut field: Field<'_>,
    name: &str,
    limit: usize,
) -> Result<UploadedFile, AppError> {
    let file_name = field.file_name().map(str::to_string);
    let content_type = field.content_type().map(str::to_string);

    let mut bytes = Vec::new();
    while let Some(chunk) = field.chunk().await? {
        if bytes.len() + chunk.len() > limit {
            return Err(AppError::PayloadTooLarge {
                field: name.to_string(),
                limit,
            });
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok(UploadedFile {
        file_name,
        content_type,
        bytes,
    })
}

fn non_blank(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

enum BodyKind {
    Multipart,
    Json,
    Other,
}

fn body_kind(headers: &HeaderMap) -> BodyKind {
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    if content_type.starts_with("multipart/form-data") {
        BodyKind::Multipart
    } else if content_type.starts_with("application/json") {
        BodyKind::Json
    } else {
        BodyKind::Other
    }
}
