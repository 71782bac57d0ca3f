use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use derive_more::Display;
use serde_json::json;

/// Request-level failure taxonomy.
///
/// `Validation` rejects the request before any mutation, `NotFound` reports
/// empty lookups, and `Store` hides the database cause behind a generic
/// message (the cause is logged where the failure occurred, never sent to
/// the client).
#[derive(Debug, Display)]
pub enum ApiError {
    #[display(fmt = "{}", _0)]
    Validation(String),

    #[display(fmt = "{}", _0)]
    NotFound(String),

    #[display(fmt = "{}", _0)]
    Store(String),
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    /// Map-err helper: logs the underlying cause server-side and returns a
    /// `Store` error carrying only the public message.
    pub fn store<E: std::fmt::Display>(public: &'static str) -> impl FnOnce(E) -> ApiError {
        move |e| {
            tracing::error!(error = %e, "{}", public);
            ApiError::Store(public.to_string())
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({
            "success": false,
            "message": self.to_string(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_taxonomy() {
        assert_eq!(
            ApiError::validation("bad").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::not_found("none").status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::Store("oops".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn display_is_the_public_message() {
        assert_eq!(ApiError::validation("Invalid format.").to_string(), "Invalid format.");
    }
}
