use crate::error::AppError;
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use log::info;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use uuid::Uuid;

// Issuer name for JWT tokens
pub const JWT_ISSUER: &str = "schedai";

const DEFAULT_JWT_DURATION_DAYS: i64 = 30;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
    pub iat: usize,
    pub iss: String,
    pub email: String,
}

// Global static holders for JWT keys
static JWT_ENCODING_KEY: OnceLock<EncodingKey> = OnceLock::new();
static JWT_DECODING_KEY: OnceLock<DecodingKey> = OnceLock::new();

/// Initialize the JWT keys from the configured secret.
/// This should be called once at application startup.
pub fn init_jwt_keys(jwt_secret: &str) -> Result<(), AppError> {
    info!("Initializing JWT keys from configuration");

    let secret = jwt_secret.as_bytes();

    JWT_ENCODING_KEY
        .set(EncodingKey::from_secret(secret))
        .map_err(|_| AppError::Internal("JWT encoding key was already initialized".to_string()))?;
    JWT_DECODING_KEY
        .set(DecodingKey::from_secret(secret))
        .map_err(|_| AppError::Internal("JWT decoding key was already initialized".to_string()))?;

    Ok(())
}

fn get_encoding_key() -> Result<&'static EncodingKey, AppError> {
    JWT_ENCODING_KEY
        .get()
        .ok_or_else(|| AppError::Configuration("JWT encoding key not initialized".to_string()))
}

fn get_decoding_key() -> Result<&'static DecodingKey, AppError> {
    JWT_DECODING_KEY
        .get()
        .ok_or_else(|| AppError::Configuration("JWT decoding key not initialized".to_string()))
}

/// Generate a signed token for a user.
pub fn generate_token(
    user_id: Uuid,
    email: &str,
    token_duration_days: i64,
) -> Result<String, AppError> {
    let iat = Utc::now();
    let exp = iat
        .checked_add_signed(
            Duration::try_days(token_duration_days)
                .unwrap_or_else(|| Duration::days(DEFAULT_JWT_DURATION_DAYS)),
        )
        .ok_or_else(|| AppError::Internal("Failed to calculate JWT expiration time".to_string()))?;

    let claims = Claims {
        sub: user_id.to_string(),
        exp: exp.timestamp() as usize,
        iat: iat.timestamp() as usize,
        iss: JWT_ISSUER.to_string(),
        email: email.to_string(),
    };

    encode(&Header::default(), &claims, get_encoding_key()?)
        .map_err(|e| AppError::Internal(format!("Failed to sign JWT: {}", e)))
}

/// Validate a bearer token and return its claims.
pub fn validate_token(token: &str) -> Result<Claims, AppError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[JWT_ISSUER]);

    decode::<Claims>(token, get_decoding_key()?, &validation)
        .map(|data| data.claims)
        .map_err(|e| AppError::Unauthorized(format!("Invalid token: {}", e)))
}

/// Resolve the caller's user id from validated claims.
pub fn user_id_from_claims(claims: &Claims) -> Result<Uuid, AppError> {
    Uuid::parse_str(&claims.sub)
        .map_err(|_| AppError::Unauthorized("Token subject is not a valid user id".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ensure_keys() {
        // The keys are process-global; a second init in another test is fine.
        let _ = init_jwt_keys("test-secret-for-unit-tests");
    }

    #[test]
    fn token_round_trip_preserves_identity() {
        ensure_keys();
        let user_id = Uuid::new_v4();
        let token = generate_token(user_id, "user@example.com", 1).unwrap();
        let claims = validate_token(&token).unwrap();
        assert_eq!(claims.email, "user@example.com");
        assert_eq!(user_id_from_claims(&claims).unwrap(), user_id);
        assert_eq!(claims.iss, JWT_ISSUER);
    }

    #[test]
    fn garbage_token_is_unauthorized() {
        ensure_keys();
        let err = validate_token("not-a-jwt").unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }
}
