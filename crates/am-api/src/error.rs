use std::{borrow::Cow, future::Future};

use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

use am_common::{
    db::{DbPoolError, MigrationError},
    service::MatchServiceError,
    store::SourceError,
};

tokio::task_local! {
    static REQUEST_ID: String;
}

const MAX_PUBLIC_MESSAGE_CHARS: usize = 240;

/// Strips control characters, URLs and paths from client-visible messages.
fn sanitize_message(message: &str) -> String {
    let cleaned = message
        .split_whitespace()
        .map(|token| {
            let token: String = token.chars().filter(|c| !c.is_control()).collect();
            if token.contains("://") {
                "[redacted-url]".to_string()
            } else if token.starts_with('/') || token.contains('\\') {
                "[redacted-path]".to_string()
            } else {
                token
            }
        })
        .collect::<Vec<_>>()
        .join(" ");

    if cleaned.trim().is_empty() {
        return "unexpected error".to_string();
    }

    if cleaned.chars().count() > MAX_PUBLIC_MESSAGE_CHARS {
        let mut truncated: String = cleaned.chars().take(MAX_PUBLIC_MESSAGE_CHARS).collect();
        truncated.push_str("...");
        truncated
    } else {
        cleaned
    }
}

pub async fn with_request_id<Fut, T>(request_id: Option<String>, fut: Fut) -> T
where
    Fut: Future<Output = T>,
{
    match request_id {
        Some(request_id) => REQUEST_ID.scope(request_id, fut).await,
        None => fut.await,
    }
}

pub fn current_request_id() -> Option<String> {
    REQUEST_ID.try_with(|value| value.clone()).ok()
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("database error: {0}")]
    Database(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("too many requests: {0}")]
    TooManyRequests(String),
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
    #[error("internal server error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorResponse {
    code: &'static str,
    message: String,
    request_id: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        let code = self.code();
        let request_id = current_request_id();

        if status.is_server_error() {
            error!(code, status = %status, request_id = request_id.as_deref().unwrap_or(""), error = %self, "api error");
        } else {
            warn!(code, status = %status, request_id = request_id.as_deref().unwrap_or(""), error = %self, "request rejected");
        }

        let body = Json(ErrorResponse {
            code,
            message: self.public_message().into_owned(),
            request_id,
        });

        (status, body).into_response()
    }
}

impl ApiError {
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "bad_request",
            ApiError::Unauthorized(_) => "unauthorized",
            ApiError::NotFound(_) => "not_found",
            ApiError::TooManyRequests(_) => "too_many_requests",
            ApiError::ServiceUnavailable(_) => "service_unavailable",
            ApiError::Database(_) => "database_error",
            ApiError::Internal(_) => "internal_error",
        }
    }

    fn public_message(&self) -> Cow<'static, str> {
        match self {
            ApiError::BadRequest(msg) | ApiError::NotFound(msg) => Cow::Owned(sanitize_message(msg)),
            ApiError::Unauthorized(_) => Cow::Borrowed("unauthorized"),
            ApiError::TooManyRequests(_) => Cow::Borrowed("too many requests"),
            ApiError::ServiceUnavailable(_) => Cow::Borrowed("service unavailable"),
            ApiError::Database(_) | ApiError::Internal(_) => Cow::Borrowed("internal server error"),
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::TooManyRequests(_) => StatusCode::TOO_MANY_REQUESTS,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Database(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<SourceError> for ApiError {
    fn from(value: SourceError) -> Self {
        ApiError::Database(value.to_string())
    }
}

impl From<MatchServiceError> for ApiError {
    fn from(value: MatchServiceError) -> Self {
        match value {
            MatchServiceError::Upstream(err) => err.into(),
            MatchServiceError::Task(err) => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<DbPoolError> for ApiError {
    fn from(value: DbPoolError) -> Self {
        ApiError::Database(format!("failed to create pool: {value}"))
    }
}

impl From<MigrationError> for ApiError {
    fn from(value: MigrationError) -> Self {
        ApiError::Database(format!("failed to run migrations: {value}"))
    }
}

#[cfg(test)]
mod tests {
    use http_body_util::BodyExt;
    use serde_json::Value;

    use super::*;

    async fn body_json(err: ApiError, request_id: Option<&str>) -> (StatusCode, Value) {
        let response = with_request_id(request_id.map(String::from), async { err.into_response() }).await;
        let (parts, body) = response.into_parts();
        let bytes = body.collect().await.unwrap().to_bytes();
        (parts.status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn includes_request_id_and_hides_internal_details() {
        let (status, json) = body_json(
            ApiError::Database("postgres://am:secret@db/am refused".into()),
            Some("req-123"),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["request_id"], "req-123");
        assert_eq!(json["code"], "database_error");
        assert_eq!(json["message"], "internal server error");
    }

    #[tokio::test]
    async fn not_found_message_is_sanitized() {
        let (status, json) =
            body_json(ApiError::NotFound("user 7 not found in /var/lib/am".into()), None).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["message"], "user 7 not found in [redacted-path]");
        assert!(json["request_id"].is_null());
    }

    #[test]
    fn long_messages_are_truncated() {
        let long = "x".repeat(500);
        let cleaned = sanitize_message(&long);
        assert_eq!(cleaned.chars().count(), MAX_PUBLIC_MESSAGE_CHARS + 3);
    }
}
