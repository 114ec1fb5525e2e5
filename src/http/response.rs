//! Error responses for views.
//!
//! # Responsibilities
//! - Map view failures to HTTP status codes
//! - Attach `Allow` on 405 responses
//! - Keep internal error details out of response bodies
//!
//! # Design Decisions
//! - Client errors carry a JSON `{"error": "..."}` body
//! - Server errors are logged here and answered with a generic message

use axum::{
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::location::LocationError;
use crate::media::MediaError;
use crate::processing::ProcessingError;

/// Failure of a view handler.
#[derive(Debug, Error)]
pub enum ViewError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("method not allowed")]
    MethodNotAllowed(&'static [Method]),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("payload exceeds {0} bytes")]
    PayloadTooLarge(usize),
    #[error("unsupported media type: {0}")]
    UnsupportedMediaType(String),
    #[error("invalid location: {0}")]
    InvalidLocation(#[from] LocationError),
    #[error("processing failed: {0}")]
    Processing(#[from] ProcessingError),
    #[error("storage failed: {0}")]
    Media(MediaError),
    #[error("unavailable: {0}")]
    Unavailable(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<MediaError> for ViewError {
    fn from(err: MediaError) -> Self {
        match err {
            MediaError::TooLarge { limit } => ViewError::PayloadTooLarge(limit),
            MediaError::Empty => ViewError::BadRequest("upload is empty".into()),
            MediaError::Stream(msg) => ViewError::BadRequest(msg),
            other => ViewError::Media(other),
        }
    }
}

impl ViewError {
    pub fn status(&self) -> StatusCode {
        match self {
            ViewError::NotFound(_) => StatusCode::NOT_FOUND,
            ViewError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            ViewError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ViewError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ViewError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ViewError::InvalidLocation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ViewError::Processing(ProcessingError::Unsupported(_)) => {
                StatusCode::UNSUPPORTED_MEDIA_TYPE
            }
            ViewError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ViewError::Processing(_) | ViewError::Media(_) | ViewError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ViewError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "View failed");
            "internal server error".to_string()
        } else {
            self.to_string()
        };

        let mut response = (status, Json(serde_json::json!({ "error": message }))).into_response();
        if let ViewError::MethodNotAllowed(methods) = self {
            let allow = methods
                .iter()
                .map(Method::as_str)
                .collect::<Vec<_>>()
                .join(", ");
            if let Ok(value) = HeaderValue::from_str(&allow) {
                response.headers_mut().insert(header::ALLOW, value);
            }
        }
        response
    }
}

pub const GET_HEAD: &[Method] = &[Method::GET, Method::HEAD];
pub const GET_HEAD_POST: &[Method] = &[Method::GET, Method::HEAD, Method::POST];
pub const POST_ONLY: &[Method] = &[Method::POST];

/// Reject `method` unless it is one of `allowed`.
pub fn require_method(method: &Method, allowed: &'static [Method]) -> Result<(), ViewError> {
    if allowed.contains(method) {
        Ok(())
    } else {
        Err(ViewError::MethodNotAllowed(allowed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_not_allowed_sets_allow() {
        let response = ViewError::MethodNotAllowed(GET_HEAD_POST).into_response();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers()[header::ALLOW], "GET, HEAD, POST");
    }

    #[test]
    fn test_media_error_mapping() {
        assert_eq!(
            ViewError::from(MediaError::TooLarge { limit: 10 }).status(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(ViewError::from(MediaError::Empty).status(), StatusCode::BAD_REQUEST);
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
        assert_eq!(
            ViewError::from(MediaError::Io(io)).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_require_method() {
        assert!(require_method(&Method::HEAD, GET_HEAD).is_ok());
        assert!(matches!(
            require_method(&Method::DELETE, POST_ONLY),
            Err(ViewError::MethodNotAllowed(_))
        ));
    }
}
