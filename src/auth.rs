use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::Result;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AuthPayload {
    pub sub: String, // username
    pub role: String,
    pub exp: usize,
}

/// Password hashing and token signing parameters.
#[derive(Clone)]
pub struct AuthSettings {
    pub jwt_secret: String,
    pub token_ttl_secs: u64,
    pub bcrypt_cost: u32,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            jwt_secret: "change-me".to_string(),
            token_ttl_secs: 3600,
            bcrypt_cost: DEFAULT_COST,
        }
    }
}

impl std::fmt::Debug for AuthSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSettings")
            .field("jwt_secret", &"[REDACTED]")
            .field("token_ttl_secs", &self.token_ttl_secs)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .finish()
    }
}

pub fn hash_password(password: &str, cost: u32) -> Result<String> {
    Ok(hash(password, cost)?)
}

/// A malformed stored digest counts as a mismatch.
pub fn verify_password(password: &str, digest: &str) -> bool {
    verify(password, digest).unwrap_or(false)
}

pub fn create_jwt(username: &str, role: &str, settings: &AuthSettings) -> Result<String> {
    let ttl = usize::try_from(settings.token_ttl_secs).unwrap_or(usize::MAX);
    let expiration = (Utc::now().timestamp().max(0) as usize).saturating_add(ttl);

    let claims = AuthPayload {
        sub: username.to_owned(),
        role: role.to_owned(),
        exp: expiration,
    };

    Ok(encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(settings.jwt_secret.as_bytes()),
    )?)
}

pub fn validate_jwt(token: &str, settings: &AuthSettings) -> Result<AuthPayload> {
    let token_data = decode::<AuthPayload>(
        token,
        &DecodingKey::from_secret(settings.jwt_secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )?;
    Ok(token_data.claims)
}
