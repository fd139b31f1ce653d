use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::alert::error::AlertError;
use domain::auth::error::AuthError;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g. `ALERT_NOT_FOUND`).
    #[schema(value_type = String)]
    code: &'static str,
    /// Human-readable description of the error.
    message: String,
}

/// Standard API error type.
///
/// All variants produce a JSON response matching:
/// `{"error":{"code":"SCREAMING_SNAKE","message":"human-readable"}}`.
#[derive(Debug)]
pub enum ApiError {
    NotFound { code: &'static str, message: String },
    BadRequest { code: &'static str, message: String },
    Unauthorized { message: String },
    Conflict { message: String },
    Timeout { message: String },
    Internal { message: String },
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::BadRequest {
            code: "VALIDATION_ERROR",
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            Self::NotFound { code, message } => (StatusCode::NOT_FOUND, code, message),
            Self::BadRequest { code, message } => (StatusCode::BAD_REQUEST, code, message),
            Self::Unauthorized { message } => {
                (StatusCode::UNAUTHORIZED, "AUTHENTICATION_REQUIRED", message)
            }
            Self::Conflict { message } => (StatusCode::CONFLICT, "VERSION_CONFLICT", message),
            Self::Timeout { message } => (StatusCode::GATEWAY_TIMEOUT, "QUERY_TIMEOUT", message),
            Self::Internal { message } => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", message)
            }
        };

        (
            status,
            Json(ErrorBody {
                error: ErrorDetail { code, message },
            }),
        )
            .into_response()
    }
}

impl From<AlertError> for ApiError {
    fn from(err: AlertError) -> Self {
        match &err {
            AlertError::NotFound => Self::NotFound {
                code: "ALERT_NOT_FOUND",
                message: err.to_string(),
            },
            AlertError::Conflict { .. } => Self::Conflict {
                message: err.to_string(),
            },
            AlertError::Timeout { .. } => Self::Timeout {
                message: err.to_string(),
            },
            AlertError::StoreFailed(_) | AlertError::QueryFailed(_) => {
                // Full context stays server-side; the caller gets an
                // opaque internal error.
                tracing::error!(error = %err, "alert storage failure");
                Self::Internal {
                    message: "internal storage error".to_string(),
                }
            }
            validation if validation.is_validation() => Self::validation(err.to_string()),
            _ => Self::Internal {
                message: err.to_string(),
            },
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        Self::Unauthorized {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn response_body(resp: Response) -> serde_json::Value {
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn not_found_maps_to_404() {
        let resp = ApiError::from(AlertError::NotFound).into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body = response_body(resp).await;
        assert_eq!(body["error"]["code"], "ALERT_NOT_FOUND");
        assert_eq!(body["error"]["message"], "alert not found");
    }

    #[tokio::test]
    async fn validation_errors_map_to_400() {
        for err in [
            AlertError::InvalidStatus("snoozed".into()),
            AlertError::EmptyBatch,
            AlertError::TooManyIds { count: 101, max: 100 },
            AlertError::NoValidIds,
            AlertError::InvalidSeverity("42".into()),
        ] {
            let resp = ApiError::from(err).into_response();
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
            let body = response_body(resp).await;
            assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        }
    }

    #[tokio::test]
    async fn conflict_maps_to_409() {
        let resp = ApiError::from(AlertError::Conflict {
            expected: 3,
            actual: 4,
        })
        .into_response();
        assert_eq!(resp.status(), StatusCode::CONFLICT);
        let body = response_body(resp).await;
        assert_eq!(body["error"]["code"], "VERSION_CONFLICT");
    }

    #[tokio::test]
    async fn timeout_maps_to_504_with_guidance() {
        let resp = ApiError::from(AlertError::Timeout { secs: 30 }).into_response();
        assert_eq!(resp.status(), StatusCode::GATEWAY_TIMEOUT);
        let body = response_body(resp).await;
        assert_eq!(body["error"]["code"], "QUERY_TIMEOUT");
        assert!(
            body["error"]["message"]
                .as_str()
                .unwrap()
                .contains("narrow the window")
        );
    }

    #[tokio::test]
    async fn storage_failures_are_opaque_500s() {
        let resp =
            ApiError::from(AlertError::StoreFailed("redb: /var/lib secret path".into()))
                .into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = response_body(resp).await;
        assert_eq!(body["error"]["code"], "INTERNAL_ERROR");
        assert_eq!(body["error"]["message"], "internal storage error");
    }

    #[tokio::test]
    async fn auth_error_maps_to_401() {
        let resp = ApiError::from(AuthError::TokenExpired).into_response();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let body = response_body(resp).await;
        assert_eq!(body["error"]["code"], "AUTHENTICATION_REQUIRED");
    }
}
