use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum ConvertError {
    /// No `file` part in the multipart body
    #[error("No file provided")]
    MissingFile,

    /// The `file` part carried a blank filename
    #[error("No file selected")]
    EmptyFilename,

    /// Extension outside the allowed set
    #[error("File type not allowed")]
    UnsupportedType,

    /// The multipart body could not be parsed
    #[error("{0}")]
    MalformedUpload(String),

    #[error("File exceeds the maximum upload size of {limit} bytes")]
    PayloadTooLarge { limit: u64 },

    /// Every strategy failed or none left a PDF behind
    #[error("Conversion failed")]
    ConversionFailed,

    /// Anything else. Only the outermost context message reaches the client,
    /// so contexts attached on the request path must not mention paths.
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

impl ConvertError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ConvertError::MissingFile
            | ConvertError::EmptyFilename
            | ConvertError::UnsupportedType
            | ConvertError::MalformedUpload(_) => StatusCode::BAD_REQUEST,
            ConvertError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ConvertError::ConversionFailed | ConvertError::Unexpected(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            ConvertError::Unexpected(err) => err.to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ConvertError {
    fn into_response(self) -> Response {
        match &self {
            ConvertError::Unexpected(_) => {
                tracing::error!("Unexpected conversion error: {:#}", self);
            }
            ConvertError::ConversionFailed => {
                tracing::error!("Conversion failed: all strategies exhausted");
            }
            _ => {
                tracing::debug!("Client error: {}", self);
            }
        }

        let body = json!({ "error": self.user_message() });
        (self.status_code(), Json(body)).into_response()
    }
}
