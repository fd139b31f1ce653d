use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("no token provided")]
    TokenMissing,

    #[error("token expired")]
    TokenExpired,

    #[error("invalid token: {0}")]
    TokenInvalid(String),

    #[error("failed to load signing key: {0}")]
    KeyLoadFailed(String),
}
