use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Serialize, Deserialize};

/// Errors raised by the enhancement library itself (decode, pipeline, encode).
#[derive(Debug, thiserror::Error)]
pub enum EnhanceError {
    #[error("unable to decode image: {0}")]
    Decode(#[source] image::ImageError),

    #[error("image has no pixels")]
    EmptyImage,

    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("{format} encode error: {detail}")]
    Encode { format: &'static str, detail: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ProblemDetail {
    #[serde(rename = "type")]
    pub problem_type: String,
    pub title: String,
    pub status: u16,
    pub detail: String,
    pub code: String,
    pub request_id: String,
}

/// Errors surfaced by the HTTP service, rendered as `application/problem+json`.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Image decode failed: {0}")]
    ImageDecode(String),

    #[error("Missing file field")]
    MissingFile,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("File too large: {0}")]
    FileTooLarge(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<EnhanceError> for AppError {
    fn from(err: EnhanceError) -> Self {
        match err {
            EnhanceError::Decode(_) => AppError::ImageDecode(err.to_string()),
            EnhanceError::EmptyImage | EnhanceError::InvalidParameter { .. } => {
                AppError::ValidationError(err.to_string())
            }
            EnhanceError::Encode { .. } | EnhanceError::Io(_) => AppError::Internal(err.to_string()),
        }
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ImageDecode(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::MissingFile | AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::FileTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn to_problem_detail(&self, request_id: &str) -> ProblemDetail {
        let (code, title, detail) = match self {
            AppError::ImageDecode(detail) => (
                "IMAGE_DECODE_FAILED",
                "Image Decode Failed",
                detail.clone(),
            ),
            AppError::MissingFile => (
                "MISSING_FILE",
                "Missing File",
                "Multipart field 'file' is required".to_string(),
            ),
            AppError::ValidationError(field) => (
                "VALIDATION_ERROR",
                "Validation Error",
                field.clone(),
            ),
            AppError::FileTooLarge(detail) => (
                "FILE_TOO_LARGE",
                "File Too Large",
                detail.clone(),
            ),
            AppError::Internal(detail) => (
                "INTERNAL_ERROR",
                "Internal Error",
                detail.clone(),
            ),
        };

        ProblemDetail {
            problem_type: format!("about:blank#{}", code.to_lowercase()),
            title: title.to_string(),
            status: self.status().as_u16(),
            detail,
            code: code.to_string(),
            request_id: request_id.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // The request-id middleware keeps this header so it matches the body.
        let request_id = uuid::Uuid::new_v4().to_string();
        let problem = self.to_problem_detail(&request_id);
        tracing::warn!(status = problem.status, code = %problem.code, "{}", self);

        let mut response = (self.status(), Json(problem)).into_response();
        if let Ok(value) = request_id.parse() {
            response.headers_mut().insert("X-Request-Id", value);
        }
        response.headers_mut().insert(
            axum::http::header::CONTENT_TYPE,
            axum::http::HeaderValue::from_static("application/problem+json"),
        );
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enhance_error_mapping() {
        let err = EnhanceError::InvalidParameter {
            name: "scale".to_string(),
            reason: "must be positive".to_string(),
        };
        let app: AppError = err.into();
        assert_eq!(app.status(), StatusCode::BAD_REQUEST);

        let decode = image::load_from_memory(b"not an image").unwrap_err();
        let app: AppError = EnhanceError::Decode(decode).into();
        assert_eq!(app.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_problem_detail_shape() {
        let pd = AppError::MissingFile.to_problem_detail("abc");
        assert_eq!(pd.status, 400);
        assert_eq!(pd.code, "MISSING_FILE");
        assert_eq!(pd.request_id, "abc");

        let json = serde_json::to_value(&pd).unwrap();
        assert_eq!(json["type"], "about:blank#missing_file");
        assert_eq!(json["requestId"], "abc");
    }
}
