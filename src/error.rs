use axum::{
    extract::multipart::MultipartError,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Error taxonomy surfaced by every handler.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Could not validate credentials")]
    InvalidCredentials,

    /// Carries the space separated scopes the endpoint demands.
    #[error("Not enough permissions")]
    InsufficientPermission(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    UnsupportedMediaType(String),

    #[error("Requested range not satisfiable")]
    RangeNotSatisfiable { size: u64 },

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("Upload exceeds the size limit")]
    PayloadTooLarge,

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AppError::InsufficientPermission(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::UnsupportedMediaType(_) => StatusCode::BAD_REQUEST,
            AppError::RangeNotSatisfiable { .. } => StatusCode::RANGE_NOT_SATISFIABLE,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            AppError::Internal(e) => {
                error!(error = ?e, "request failed");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        let mut response = (status, Json(json!({ "error": message }))).into_response();
        let headers = response.headers_mut();
        match &self {
            AppError::InvalidCredentials => {
                headers.insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
            }
            AppError::InsufficientPermission(scopes) => {
                if let Ok(value) = HeaderValue::from_str(&format!("Bearer scope=\"{}\"", scopes)) {
                    headers.insert(header::WWW_AUTHENTICATE, value);
                }
            }
            AppError::RangeNotSatisfiable { size } => {
                if let Ok(value) = HeaderValue::from_str(&format!("bytes */{}", size)) {
                    headers.insert(header::CONTENT_RANGE, value);
                }
            }
            _ => {}
        }
        response
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::RowNotFound => AppError::NotFound("Resource not found".into()),
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AppError::Conflict("Resource already exists".into())
            }
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
                AppError::NotFound("Referenced resource not found".into())
            }
            _ => AppError::Internal(e.into()),
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        match e.kind() {
            std::io::ErrorKind::NotFound => AppError::NotFound("File not found".into()),
            _ => AppError::Internal(e.into()),
        }
    }
}

impl From<MultipartError> for AppError {
    fn from(e: MultipartError) -> Self {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::PayloadTooLarge
        } else {
            AppError::BadRequest(e.body_text())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_the_taxonomy() {
        assert_eq!(AppError::InvalidCredentials.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AppError::InsufficientPermission("items:read".into()).status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::UnsupportedMediaType("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::RangeNotSatisfiable { size: 10 }.status(),
            StatusCode::RANGE_NOT_SATISFIABLE
        );
        assert_eq!(AppError::Conflict("x".into()).status(), StatusCode::CONFLICT);
    }

    #[test]
    fn unauthorized_responses_carry_a_bearer_challenge() {
        let res = AppError::InvalidCredentials.into_response();
        assert_eq!(res.headers()[header::WWW_AUTHENTICATE], "Bearer");

        let res = AppError::InsufficientPermission("items:create".into()).into_response();
        assert_eq!(
            res.headers()[header::WWW_AUTHENTICATE],
            "Bearer scope=\"items:create\""
        );
    }

    #[test]
    fn range_errors_report_the_resource_size() {
        let res = AppError::RangeNotSatisfiable { size: 1000 }.into_response();
        assert_eq!(res.status(), StatusCode::RANGE_NOT_SATISFIABLE);
        assert_eq!(res.headers()[header::CONTENT_RANGE], "bytes */1000");
    }

    #[test]
    fn missing_rows_become_not_found() {
        let err: AppError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
