//! Bearer token issuance and verification

use chrono::{DateTime, TimeDelta, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::AuthError;

/// Default token lifetime in seconds (1 hour)
pub const DEFAULT_TOKEN_TTL_SECS: i64 = 3600;

/// Longest accepted token lifetime in seconds (30 days)
pub const MAX_TOKEN_TTL_SECS: i64 = 30 * 24 * 3600;

/// JWT claims
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
}

impl Claims {
    /// The user id carried by the token
    pub fn user_id(&self) -> Result<i64, AuthError> {
        self.sub.parse().map_err(|_| AuthError::InvalidToken)
    }
}

/// Issues and verifies signed, time-bounded bearer tokens.
///
/// The signing secret and TTL are fixed at construction.
#[derive(Clone)]
pub struct TokenManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: TimeDelta,
}

impl std::fmt::Debug for TokenManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenManager")
            .field("ttl_secs", &self.ttl.num_seconds())
            .finish_non_exhaustive()
    }
}

impl TokenManager {
    /// Create a token manager.
    ///
    /// An empty secret is a configuration error, and so is a TTL above
    /// [`MAX_TOKEN_TTL_SECS`]. A non-positive TTL falls back to
    /// [`DEFAULT_TOKEN_TTL_SECS`].
    pub fn new(secret: &str, ttl_secs: i64) -> Result<Self, AuthError> {
        if secret.trim().is_empty() {
            return Err(AuthError::MissingSecret);
        }
        let ttl_secs = if ttl_secs > 0 { ttl_secs } else { DEFAULT_TOKEN_TTL_SECS };
        if ttl_secs > MAX_TOKEN_TTL_SECS {
            return Err(AuthError::InvalidTtl(ttl_secs));
        }
        let ttl = TimeDelta::try_seconds(ttl_secs).ok_or(AuthError::InvalidTtl(ttl_secs))?;

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        })
    }

    /// Token lifetime in seconds
    pub fn ttl_secs(&self) -> i64 {
        self.ttl.num_seconds()
    }

    /// Issue a token for a user, valid from now for the configured TTL
    pub fn issue(&self, user_id: i64) -> Result<String, AuthError> {
        self.issue_at(user_id, Utc::now())
    }

    /// Issue a token as if the current time were `now`
    pub fn issue_at(&self, user_id: i64, now: DateTime<Utc>) -> Result<String, AuthError> {
        let expires = now
            .checked_add_signed(self.ttl)
            .ok_or(AuthError::InvalidTtl(self.ttl.num_seconds()))?;
        let claims = Claims {
            sub: user_id.to_string(),
            exp: expires.timestamp(),
            iat: now.timestamp(),
        };

        debug!("Issuing token for user id {}", user_id);

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key).map_err(AuthError::Jwt)
    }

    /// Verify a token and return the user id it carries
    pub fn verify(&self, token: &str) -> Result<i64, AuthError> {
        self.verify_at(token, Utc::now())
    }

    /// Verify a token against the given clock.
    ///
    /// Signature problems and elapsed expiry are both `InvalidToken` /
    /// `TokenExpired`; neither is retried.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<i64, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is compared below against `now`, without leeway
        validation.validate_exp = false;
        validation.leeway = 0;

        let token_data =
            decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
                debug!("Token rejected: {}", e);
                AuthError::InvalidToken
            })?;

        if now.timestamp() >= token_data.claims.exp {
            return Err(AuthError::TokenExpired);
        }

        token_data.claims.user_id()
    }
}
