//! API response types

use serde::Serialize;

use plx_core::Extraction;

/// Successful `/extract` response.
#[derive(Debug, Serialize)]
pub struct ExtractResponse {
    pub success: bool,
    /// `data`, plus `products` in repeated record mode.
    #[serde(flatten)]
    pub extraction: Extraction,
}

impl From<Extraction> for ExtractResponse {
    fn from(extraction: Extraction) -> Self {
        Self {
            success: true,
            extraction,
        }
    }
}

/// Error body for every failed request.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}
