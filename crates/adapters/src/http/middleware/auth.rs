use std::sync::Arc;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;

use domain::common::entity::OwnerId;

use super::super::error::ApiError;
use super::super::state::AppState;

/// Axum middleware that resolves the caller's owner identity and
/// attaches it as a request extension.
///
/// With an auth provider configured: `Authorization: Bearer <jwt>` is
/// validated and the owner comes from the `sub` claim. Without one
/// (development mode): the owner is read from the `X-Owner-Id` header.
/// Requests with no resolvable owner are rejected — every alert
/// operation is owner-scoped.
pub async fn owner_auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let owner = match state.auth_provider {
        Some(ref provider) => {
            let token = extract_bearer(&request)?;
            let claims = provider.validate_token(token)?;
            claims.owner_id()?
        }
        None => extract_owner_header(&request)?,
    };

    request.extensions_mut().insert(owner);
    Ok(next.run(request).await)
}

/// Extract the bearer token from the `Authorization` header.
fn extract_bearer(request: &Request) -> Result<&str, ApiError> {
    if let Some(auth_header) = request
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        && let Some(token) = auth_header.strip_prefix("Bearer ")
    {
        return Ok(token);
    }

    Err(ApiError::Unauthorized {
        message: "authentication required: no token provided".to_string(),
    })
}

/// Development-mode owner resolution from `X-Owner-Id`.
fn extract_owner_header(request: &Request) -> Result<OwnerId, ApiError> {
    let raw = request
        .headers()
        .get("X-Owner-Id")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized {
            message: "authentication required: no owner identity".to_string(),
        })?;

    OwnerId::parse(raw).ok_or_else(|| ApiError::Unauthorized {
        message: format!("invalid owner id '{raw}'"),
    })
}
