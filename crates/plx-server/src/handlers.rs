//! HTTP request handlers for API endpoints

use std::time::{Duration, Instant};

use axum::{
    extract::{multipart::Field, multipart::MultipartError, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;
use tracing::{debug, error, info, warn};

use plx_core::error::ExtractionError;
use plx_core::{PlxError, Template, TemplateExtractor};

use crate::types::{ErrorResponse, ExtractResponse, HealthResponse};
use crate::ApiState;

/// Error returned by a handler, rendered as `{"error": ...}`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl From<PlxError> for ApiError {
    fn from(err: PlxError) -> Self {
        let status = if err.is_user_error() {
            StatusCode::BAD_REQUEST
        } else if err.is_limit_exceeded() {
            StatusCode::UNPROCESSABLE_ENTITY
        } else {
            error!("Extraction failed: {}", err);
            StatusCode::INTERNAL_SERVER_ERROR
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        // Carries 413 when the upload exceeds the body limit
        Self {
            status: err.status(),
            message: err.body_text(),
        }
    }
}

impl From<std::io::Error> for ApiError {
    fn from(err: std::io::Error) -> Self {
        error!("Upload spooling failed: {}", err);
        Self::internal(format!("failed to store upload: {err}"))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorResponse { error: self.message })).into_response()
    }
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Apply the uploaded template to the uploaded PDF.
pub async fn extract(
    State(state): State<ApiState>,
    mut multipart: Multipart,
) -> Result<Json<ExtractResponse>, ApiError> {
    let start = Instant::now();
    let mut upload: Option<NamedTempFile> = None;
    let mut template_json: Option<String> = None;

    while let Some(mut field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "pdf" => upload = Some(spool(&mut field).await?),
            "template" => template_json = Some(field.text().await?),
            other => debug!("Ignoring multipart part {:?}", other),
        }
    }

    let upload = upload.ok_or_else(|| ApiError::bad_request("missing 'pdf' file part"))?;
    let template_json =
        template_json.ok_or_else(|| ApiError::bad_request("missing 'template' part"))?;

    let template = Template::from_json(&template_json).map_err(PlxError::from)?;

    let extractor = TemplateExtractor::new(state.config.as_ref().clone());
    let timeout_secs = state.config.limits.timeout_secs;

    // The temp file moves into the task and is removed when it finishes
    let task = tokio::task::spawn_blocking(move || {
        let data = std::fs::read(upload.path())?;
        extractor.extract_pdf(&data, &template)
    });

    let extraction = match tokio::time::timeout(Duration::from_secs(timeout_secs), task).await {
        Ok(Ok(result)) => result?,
        Ok(Err(join_err)) => {
            return Err(PlxError::from(ExtractionError::Task(join_err.to_string())).into());
        }
        Err(_) => {
            // The blocking job cannot be interrupted; it runs to completion
            // and the temp file is removed when it returns.
            warn!("Extraction exceeded {}s", timeout_secs);
            return Err(PlxError::from(ExtractionError::Timeout(timeout_secs)).into());
        }
    };

    info!("Handled /extract in {}ms", start.elapsed().as_millis());
    Ok(Json(ExtractResponse::from(extraction)))
}

/// Stream a multipart part into a fresh temporary file.
async fn spool(field: &mut Field<'_>) -> Result<NamedTempFile, ApiError> {
    let upload = NamedTempFile::new()?;
    let mut file = tokio::fs::File::from_std(upload.as_file().try_clone()?);

    let mut size = 0usize;
    while let Some(chunk) = field.chunk().await? {
        size += chunk.len();
        file.write_all(&chunk).await?;
    }
    file.flush().await?;

    debug!("Spooled {} bytes to {}", size, upload.path().display());
    Ok(upload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use plx_core::error::{PdfError, TemplateError};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_status_mapping() {
        let user = ApiError::from(PlxError::from(TemplateError::NoFields));
        assert_eq!(user.status, StatusCode::BAD_REQUEST);

        let limit = ApiError::from(PlxError::from(PdfError::TooManyPages { pages: 9, limit: 2 }));
        assert_eq!(limit.status, StatusCode::UNPROCESSABLE_ENTITY);

        let other = ApiError::from(PlxError::from(PdfError::Parse("bad xref".to_string())));
        assert_eq!(other.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(other.message, "PDF error: failed to parse PDF: bad xref");
    }

    #[test]
    fn test_timeout_is_internal_error() {
        let err = ApiError::from(PlxError::from(ExtractionError::Timeout(30)));
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message, "extraction error: extraction timed out after 30s");
    }
}
