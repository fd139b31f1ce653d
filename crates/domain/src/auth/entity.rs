use serde::{Deserialize, Serialize};

use crate::common::entity::OwnerId;

use super::error::AuthError;

/// Validated JWT claims attached to an authenticated request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Subject — the caller's user ID.
    pub sub: String,
    /// Expiry (seconds since epoch).
    pub exp: u64,
    /// Issued-at (seconds since epoch).
    #[serde(default)]
    pub iat: u64,
}

impl JwtClaims {
    /// Resolve the claims subject into the owner identity used for
    /// all alert scoping.
    pub fn owner_id(&self) -> Result<OwnerId, AuthError> {
        OwnerId::parse(&self.sub)
            .ok_or_else(|| AuthError::TokenInvalid(format!("subject '{}' is not a user id", self.sub)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owner_id_from_valid_subject() {
        let id = uuid::Uuid::new_v4();
        let claims = JwtClaims {
            sub: id.to_string(),
            exp: 9_999_999_999,
            iat: 0,
        };
        assert_eq!(claims.owner_id().unwrap(), OwnerId(id));
    }

    #[test]
    fn owner_id_rejects_non_uuid_subject() {
        let claims = JwtClaims {
            sub: "service-account".to_string(),
            exp: 9_999_999_999,
            iat: 0,
        };
        assert!(claims.owner_id().is_err());
    }
}
