use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Longest token lifetime accepted from config
pub const MAX_EXPIRY_HOURS: u64 = 24 * 366;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub username: String,
    /// First name shown as the title of the user's reviews
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub is_staff: bool,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(user_id: Uuid, username: String, name: String, is_staff: bool, expiry_hours: u64) -> Self {
        let now = Utc::now();
        let hours = expiry_hours.min(MAX_EXPIRY_HOURS) as i64;
        let exp = (now + Duration::hours(hours)).timestamp();

        Self {
            sub: user_id,
            username,
            name,
            is_staff,
            exp,
            iat: now.timestamp(),
        }
    }
}

#[derive(Debug, Error)]
pub enum JwtError {
    #[error("JWT generation error: {0}")]
    TokenGeneration(String),

    #[error("Invalid JWT token: {0}")]
    InvalidToken(String),

    #[error("JWT secret not configured")]
    InvalidSecret,
}

pub fn generate_jwt(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    if secret.is_empty() {
        return Err(JwtError::InvalidSecret);
    }

    let encoding_key = EncodingKey::from_secret(secret.as_bytes());
    let header = Header::default();

    encode(&header, claims, &encoding_key).map_err(|e| JwtError::TokenGeneration(e.to_string()))
}

/// Validate signature and expiry, returning the embedded claims
pub fn decode_jwt(token: &str, secret: &str) -> Result<Claims, JwtError> {
    if secret.is_empty() {
        return Err(JwtError::InvalidSecret);
    }

    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    let validation = Validation::default();

    let token_data = decode::<Claims>(token, &decoding_key, &validation)
        .map_err(|e| JwtError::InvalidToken(e.to_string()))?;

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "unit-test-secret";

    #[test]
    fn token_round_trips_claims() {
        let id = Uuid::new_v4();
        let claims = Claims::new(id, "alice".into(), "Alice".into(), true, 1);
        let token = generate_jwt(&claims, SECRET).unwrap();

        let decoded = decode_jwt(&token, SECRET).unwrap();
        assert_eq!(decoded.sub, id);
        assert_eq!(decoded.name, "Alice");
        assert!(decoded.is_staff);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let claims = Claims::new(Uuid::new_v4(), "bob".into(), String::new(), false, 1);
        let token = generate_jwt(&claims, SECRET).unwrap();

        assert!(matches!(
            decode_jwt(&token, "another-secret"),
            Err(JwtError::InvalidToken(_))
        ));
    }

    #[test]
    fn expired_token_is_rejected() {
        let mut claims = Claims::new(Uuid::new_v4(), "carol".into(), String::new(), false, 1);
        claims.iat -= 7200;
        claims.exp = claims.iat + 60;
        let token = generate_jwt(&claims, SECRET).unwrap();

        assert!(decode_jwt(&token, SECRET).is_err());
    }

    #[test]
    fn empty_secret_refuses_to_sign() {
        let claims = Claims::new(Uuid::new_v4(), "dave".into(), String::new(), false, 1);
        assert!(matches!(generate_jwt(&claims, ""), Err(JwtError::InvalidSecret)));
    }

    #[test]
    fn oversized_expiry_is_clamped() {
        let claims = Claims::new(Uuid::new_v4(), "max".into(), String::new(), false, u64::MAX);
        let limit = MAX_EXPIRY_HOURS as i64 * 3600;
        assert!(claims.exp > claims.iat);
        assert!(claims.exp - claims.iat <= limit);
    }
}
