use domain::auth::entity::JwtClaims;
use domain::auth::error::AuthError;

/// Pluggable token validation for the API layer.
pub trait AuthProvider: Send + Sync {
    /// Validate a bearer token and return its claims.
    fn validate_token(&self, token: &str) -> Result<JwtClaims, AuthError>;
}
