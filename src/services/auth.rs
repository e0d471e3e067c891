//! Password hashing and bearer-token issuance.

use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

pub const TOKEN_LIFETIME_MINUTES: i64 = 60;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id the token was issued for.
    pub sub: i32,
    pub username: String,
    /// Expiry as a unix timestamp, validated on decode.
    pub exp: i64,
}

pub fn hash_password(password: &str) -> Result<String, bcrypt::BcryptError> {
    bcrypt::hash(password, bcrypt::DEFAULT_COST)
}

pub fn verify_password(plain: &str, hashed: &str) -> bool {
    bcrypt::verify(plain, hashed).unwrap_or(false)
}

pub fn create_access_token(
    user_id: i32,
    username: &str,
    secret: &str,
) -> Result<String, jsonwebtoken::errors::Error> {
    let claims = Claims {
        sub: user_id,
        username: username.to_string(),
        exp: (Utc::now() + Duration::minutes(TOKEN_LIFETIME_MINUTES)).timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

pub fn decode_access_token(
    token: &str,
    secret: &str,
) -> Result<Claims, jsonwebtoken::errors::Error> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_hash_verifies_roundtrip() {
        let hashed = hash_password("hunter2").unwrap();
        assert_ne!(hashed, "hunter2");
        assert!(verify_password("hunter2", &hashed));
        assert!(!verify_password("hunter3", &hashed));
    }

    #[test]
    fn verify_rejects_malformed_hash() {
        assert!(!verify_password("hunter2", "not-a-bcrypt-hash"));
    }

    #[test]
    fn access_token_roundtrip() {
        let token = create_access_token(42, "satoshi", "test-secret").unwrap();
        let claims = decode_access_token(&token, "test-secret").unwrap();

        assert_eq!(claims.sub, 42);
        assert_eq!(claims.username, "satoshi");
        assert!(claims.exp > Utc::now().timestamp());
    }

    #[test]
    fn token_with_wrong_secret_is_rejected() {
        let token = create_access_token(42, "satoshi", "test-secret").unwrap();
        assert!(decode_access_token(&token, "other-secret").is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let claims = Claims {
            sub: 42,
            username: "satoshi".to_string(),
            // Well past the default decode leeway
            exp: (Utc::now() - Duration::minutes(10)).timestamp(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret("test-secret".as_bytes()),
        )
        .unwrap();

        assert!(decode_access_token(&token, "test-secret").is_err());
    }
}
