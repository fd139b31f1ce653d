use domain::auth::entity::JwtClaims;
use domain::auth::error::AuthError;
use jsonwebtoken::{Algorithm, DecodingKey, TokenData, Validation};
use ports::secondary::auth_provider::AuthProvider;

/// JWT authentication provider validating HS256 tokens against a
/// shared secret.
///
/// The secret is passed in explicitly at construction (from config),
/// never read from process-wide mutable state.
pub struct JwtAuthProvider {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for JwtAuthProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtAuthProvider")
            .field("algorithm", &"HS256")
            .finish_non_exhaustive()
    }
}

impl JwtAuthProvider {
    pub fn new(secret: &[u8]) -> Result<Self, AuthError> {
        if secret.is_empty() {
            return Err(AuthError::KeyLoadFailed("empty JWT secret".to_string()));
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["sub", "exp"]);

        Ok(Self {
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        })
    }
}

impl AuthProvider for JwtAuthProvider {
    fn validate_token(&self, token: &str) -> Result<JwtClaims, AuthError> {
        if token.is_empty() {
            return Err(AuthError::TokenMissing);
        }

        let token_data: TokenData<JwtClaims> =
            jsonwebtoken::decode(token, &self.decoding_key, &self.validation).map_err(|e| {
                match e.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                    _ => AuthError::TokenInvalid(e.to_string()),
                }
            })?;

        Ok(token_data.claims)
    }
}
