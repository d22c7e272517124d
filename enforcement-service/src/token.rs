//! Claims token encoding and validation.
//!
//! The enforcement side trusts only what it can decode from the signed
//! token; role and school in request payloads are never consulted for
//! authorization.

use authz_core::{Claims, Role};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use crate::config::TokenConfig;

#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl_minutes: i64,
}

impl TokenService {
    pub fn new(config: &TokenConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            ttl_minutes: config.ttl_minutes,
        }
    }

    /// Mint a token carrying claims for a user, permissions derived from
    /// the role table. Used by the token issuer and by tests.
    pub fn issue(
        &self,
        user_id: &str,
        email: &str,
        role: Role,
        school_id: &str,
        is_active: bool,
    ) -> Result<String, anyhow::Error> {
        let claims = Claims::for_user(
            user_id,
            email,
            role,
            school_id,
            is_active,
            Utc::now(),
            Duration::minutes(self.ttl_minutes),
        );
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| anyhow::anyhow!("Failed to encode claims token: {e}"))
    }

    /// Mint an already-expired token, for tests.
    pub fn issue_expired(
        &self,
        user_id: &str,
        email: &str,
        role: Role,
        school_id: &str,
    ) -> Result<String, anyhow::Error> {
        let claims = Claims::for_user(
            user_id,
            email,
            role,
            school_id,
            true,
            Utc::now() - Duration::hours(2),
            Duration::minutes(1),
        );
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| anyhow::anyhow!("Failed to encode claims token: {e}"))
    }

    /// Validate a token and return its claims. Rejects bad signatures and
    /// expired tokens.
    pub fn verify(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        let validation = Validation::new(Algorithm::HS256);
        decode::<Claims>(token, &self.decoding_key, &validation).map(|data| data.claims)
    }
}
