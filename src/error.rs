//! Error taxonomy
//!
//! `AppError` is every way a single request can end early. Each variant maps to
//! exactly one HTTP status and is rendered straight back to the caller.
//! `RouteError` covers mistakes made while the route table is being built,
//! `SetupError` anything that stops the dispatcher from being assembled.

use crate::config::ResponseFormat;
use crate::http;
use crate::routing::{LoginResponse, ParamKind};
use crate::store::{StoreError, UploadError};
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Response, StatusCode};
use thiserror::Error;

/// Terminal request failures
#[derive(Debug, Error)]
pub enum AppError {
    /// No route is registered for this method at all
    #[error("Method {method} Not Allowed")]
    MethodNotAllowed { method: String, allow: Vec<&'static str> },

    /// Unmatched path, or the addressed record does not exist
    #[error("404 Not Found")]
    NotFound,

    /// A captured path segment could not be coerced to the declared type
    #[error("Bad parameter '{segment}': '{value}' is not a valid {expected}")]
    BadParameter {
        segment: String,
        value: String,
        expected: &'static str,
    },

    /// Missing or malformed request body field
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),

    #[error("Upload error: {0}")]
    Upload(String),

    /// Gate rejected the request; rendered as the login prompt or redirect
    #[error("Authentication required")]
    Unauthenticated(LoginResponse),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub const fn status(&self) -> StatusCode {
        match self {
            Self::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::BadParameter { .. } | Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Storage(_) | Self::Upload(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unauthenticated(LoginResponse::Prompt { .. }) => StatusCode::OK,
            Self::Unauthenticated(LoginResponse::Redirect(_)) => StatusCode::FOUND,
        }
    }

    /// Render this error as the response the caller sees
    pub fn into_response(self, format: ResponseFormat) -> Response<Full<Bytes>> {
        match self {
            Self::MethodNotAllowed { ref method, ref allow } => {
                http::build_405_response(method, allow)
            }
            Self::NotFound if format == ResponseFormat::Html => http::build_404_response(),
            Self::Unauthenticated(login) => login.respond(),
            other => {
                let status = other.status();
                let message = other.to_string();
                match format {
                    ResponseFormat::Json => http::build_json_response(
                        status,
                        &serde_json::json!({ "error": message, "status": status.as_u16() }),
                    ),
                    ResponseFormat::Html => http::build_text_response(status, &message),
                }
            }
        }
    }
}

impl From<UploadError> for AppError {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::UnsupportedType(_) | UploadError::InvalidName(_) => {
                Self::Validation(err.to_string())
            }
            UploadError::NotFound(_) => Self::NotFound,
            UploadError::Io { .. } => Self::Upload(err.to_string()),
        }
    }
}

/// Route table construction failures
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RouteError {
    #[error("invalid route pattern '{template}': {reason}")]
    InvalidPattern { template: String, reason: String },

    #[error("route '{template}' captures {found:?} but its handler expects {expected:?}")]
    SignatureMismatch {
        template: String,
        expected: Vec<ParamKind>,
        found: Vec<ParamKind>,
    },
}

/// Startup failures while assembling stores and routes
#[derive(Debug, Error)]
pub enum SetupError {
    #[error(transparent)]
    Route(#[from] RouteError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(AppError::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::validation("title is required").status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Upload("disk full".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::Storage(StoreError::Unavailable("down".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_method_not_allowed_names_method() {
        let err = AppError::MethodNotAllowed {
            method: "PUT".to_string(),
            allow: vec!["GET"],
        };
        assert_eq!(err.to_string(), "Method PUT Not Allowed");
        let resp = err.into_response(ResponseFormat::Json);
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(resp.headers().get("Allow").unwrap(), "GET");
    }

    #[test]
    fn test_json_error_body() {
        let resp = AppError::validation("url is required").into_response(ResponseFormat::Json);
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            resp.headers().get("Content-Type").unwrap(),
            "application/json"
        );
    }

    #[test]
    fn test_unauthenticated_follows_login_response() {
        let prompt = AppError::Unauthenticated(LoginResponse::Prompt {
            action: "/login".into(),
        });
        assert_eq!(prompt.status(), StatusCode::OK);
        let resp = prompt.into_response(ResponseFormat::Json);
        assert_eq!(resp.status(), StatusCode::OK);

        let redirect = AppError::Unauthenticated(LoginResponse::Redirect("/signin".into()));
        assert_eq!(redirect.status(), StatusCode::FOUND);
        let resp = redirect.into_response(ResponseFormat::Html);
        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(resp.headers().get("Location").unwrap(), "/signin");
    }

    #[test]
    fn test_upload_error_classification() {
        let err: AppError = UploadError::UnsupportedType("exe".into()).into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let err: AppError = UploadError::Io {
            path: "uploads/x.png".into(),
            source: std::io::Error::other("disk full"),
        }
        .into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
