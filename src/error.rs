use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::supabase::GatewayError;

/// Application-level failure taxonomy. Every handler converts gateway and
/// validation failures into one of these at the boundary.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    /// Generic on purpose: must not reveal whether the email exists.
    #[error("{0}")]
    Authentication(String),

    #[error("You are not authorized to perform this action.")]
    Authorization,

    /// Covers both "does not exist" and "not yours" so the two are
    /// indistinguishable to the caller.
    #[error("{0}")]
    NotFound(String),

    #[error("This email is already registered. Please log in.")]
    DuplicateEmail,

    #[error("{0}")]
    ServiceUnavailable(&'static str),

    /// Third-party call failed; the message is sanitized before display.
    #[error("{0}")]
    Upstream(String),
}

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Authentication(_) => StatusCode::UNAUTHORIZED,
            AppError::Authorization => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::DuplicateEmail => StatusCode::CONFLICT,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

impl From<GatewayError> for AppError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::Status { status, .. } => {
                AppError::Upstream(format!("Upstream service returned {}.", status))
            }
            GatewayError::Transport(_) => {
                AppError::Upstream("Upstream service is unreachable.".into())
            }
            GatewayError::Decode(_) => {
                AppError::Upstream("Upstream service returned an unexpected response.".into())
            }
        }
    }
}

#[cfg(test)]
mod error_tests {
    use super::*;

    #[test]
    fn statuses_match_taxonomy() {
        assert_eq!(
            AppError::validation("bad").status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Authentication("nope".into()).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(AppError::Authorization.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            AppError::not_found("gone").status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(AppError::DuplicateEmail.status(), StatusCode::CONFLICT);
        assert_eq!(
            AppError::ServiceUnavailable("off").status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            AppError::Upstream("boom".into()).status(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn upstream_messages_hide_the_body() {
        let err = AppError::from(GatewayError::Status {
            status: 500,
            body: "secret internals".into(),
        });
        assert!(!err.to_string().contains("secret"));
        assert!(err.to_string().contains("500"));
    }
}
