use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use point_ops::PointOpError;
use serde_json::json;
use thiserror::Error;

use crate::models::OperatorError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Unsupported operator: {0}")]
    UnsupportedOperator(String),

    #[error("Missing image source: {0}")]
    MissingSource(&'static str),

    #[error("Image could not be loaded: {0}")]
    Decode(#[from] DecodeError),

    #[error("Not found")]
    NotFound,

    #[error("Request body too large: {0}")]
    PayloadTooLarge(String),

    #[error("Rendering error: {0}")]
    Render(#[from] RenderError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<OperatorError> for ApiError {
    fn from(e: OperatorError) -> Self {
        match e {
            OperatorError::Unsupported { .. } => ApiError::UnsupportedOperator(e.to_string()),
            OperatorError::Invalid(inner) => ApiError::InvalidParameter(inner.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge(rejection.body_text())
        } else {
            ApiError::InvalidParameter(rejection.body_text())
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::InvalidParameter(rejection.body_text())
    }
}

impl From<PipelineError> for ApiError {
    fn from(e: PipelineError) -> Self {
        match e {
            PipelineError::Decode(e) => ApiError::Decode(e),
            PipelineError::InvalidParameter(e) => ApiError::InvalidParameter(e.to_string()),
            PipelineError::Task(msg) => ApiError::Internal(msg),
        }
    }
}

/// An image could not be read, fetched or decoded.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("fetch failed: {0}")]
    Fetch(String),

    #[error("fetch returned HTTP {status} for {url}")]
    HttpStatus { status: u16, url: String },

    #[error("unsupported URL scheme: {0}")]
    UnsupportedScheme(String),

    #[error("invalid data URL: {0}")]
    DataUrl(String),

    #[error("image payload is empty")]
    Empty,

    #[error("image too large: {size} bytes (max {max})")]
    TooLarge { size: usize, max: usize },

    #[error("decode failed: {0}")]
    Image(#[from] image::ImageError),

    #[error("resample failed: {0}")]
    Resample(#[from] PointOpError),
}

/// Failure of one pipeline invocation.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("invalid parameter: {0}")]
    InvalidParameter(PointOpError),

    #[error("processing task failed: {0}")]
    Task(String),
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("PNG encode error: {0}")]
    PngEncode(String),

    #[error("Render task failed: {0}")]
    Task(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::InvalidParameter(_) => StatusCode::BAD_REQUEST,
            ApiError::UnsupportedOperator(_) => StatusCode::BAD_REQUEST,
            ApiError::MissingSource(_) => StatusCode::BAD_REQUEST,
            ApiError::Decode(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Render(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "status": status.as_u16(),
            "error": self.to_string(),
        }));

        (status, body).into_response()
    }
}
