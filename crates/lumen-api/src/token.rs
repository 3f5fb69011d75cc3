use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use lumen_types::models::User;

const ISSUER: &str = "lumen-journal";

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("token has expired")]
    Expired,
    #[error("invalid token")]
    Invalid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    /// User's surrogate id.
    pub sub: i64,
    pub open_id: String,
    pub email: String,
    pub name: String,
    pub login_method: String,
    pub iss: String,
    pub iat: usize,
    pub exp: usize,
}

/// Issues and validates the signed session credential (HS256 JWT).
pub struct TokenManager {
    secret: String,
    expiry: Duration,
}

impl TokenManager {
    pub fn new(secret: impl Into<String>, expiry_hours: i64) -> Self {
        Self {
            secret: secret.into(),
            expiry: Duration::hours(expiry_hours),
        }
    }

    pub fn issue(&self, user: &User) -> anyhow::Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id,
            open_id: user.open_id.clone(),
            email: user.email.clone().unwrap_or_default(),
            name: user.name.clone(),
            login_method: user.login_method.clone(),
            iss: ISSUER.to_string(),
            iat: now.timestamp() as usize,
            exp: (now + self.expiry).timestamp() as usize,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )?;
        Ok(token)
    }

    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Invalid,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_user() -> User {
        let now = Utc::now();
        User {
            id: 7,
            open_id: "email_abc123".into(),
            email: Some("quinn@example.com".into()),
            name: "Quinn".into(),
            login_method: "email".into(),
            last_signed_in: now,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn issued_tokens_verify_and_carry_identity() {
        let tokens = TokenManager::new("test-secret", 168);
        let token = tokens.issue(&test_user()).unwrap();

        let claims = tokens.verify(&token).unwrap();
        assert_eq!(claims.sub, 7);
        assert_eq!(claims.open_id, "email_abc123");
        assert_eq!(claims.email, "quinn@example.com");
        assert_eq!(claims.login_method, "email");
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = TokenManager::new("secret-a", 168).issue(&test_user()).unwrap();
        let err = TokenManager::new("secret-b", 168).verify(&token).unwrap_err();
        assert!(matches!(err, TokenError::Invalid));
    }

    #[test]
    fn expired_tokens_are_rejected_as_expired() {
        // Negative expiry puts `exp` in the past.
        let tokens = TokenManager::new("test-secret", -2);
        let token = tokens.issue(&test_user()).unwrap();
        let err = tokens.verify(&token).unwrap_err();
        assert!(matches!(err, TokenError::Expired));
    }

    #[test]
    fn garbage_is_invalid() {
        let tokens = TokenManager::new("test-secret", 168);
        assert!(matches!(
            tokens.verify("not-a-jwt").unwrap_err(),
            TokenError::Invalid
        ));
    }
}
