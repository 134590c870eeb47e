//! Session claims validation and verification.
//!
//! The identity layer authenticates callers and hands this core a signed
//! session token carrying the caller id and email. Claim-window validation
//! is deterministic (explicit `now`) and separate from signature
//! verification so it can be tested without key material.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use atrium_core::UserId;

/// Session claims model (transport-agnostic).
///
/// The minimal set of claims the membership core expects once a token has
/// been decoded and its signature verified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject / caller identifier.
    pub sub: UserId,

    /// Email identity the session was established for.
    pub email: String,

    /// Issued-at timestamp.
    pub issued_at: DateTime<Utc>,

    /// Expiration timestamp.
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenValidationError {
    #[error("token has expired")]
    Expired,

    #[error("token not yet valid (issued_at is in the future)")]
    NotYetValid,

    #[error("invalid token time window (expires_at <= issued_at)")]
    InvalidTimeWindow,
}

/// Deterministically validate session claims.
///
/// Note: this validates the *claims* only. Signature verification is the
/// verifier's job.
pub fn validate_claims(
    claims: &SessionClaims,
    now: DateTime<Utc>,
) -> Result<(), TokenValidationError> {
    if claims.expires_at <= claims.issued_at {
        return Err(TokenValidationError::InvalidTimeWindow);
    }
    if now < claims.issued_at {
        return Err(TokenValidationError::NotYetValid);
    }
    if now >= claims.expires_at {
        return Err(TokenValidationError::Expired);
    }
    Ok(())
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("malformed session token")]
    Malformed,

    #[error(transparent)]
    Invalid(#[from] TokenValidationError),
}

/// Verifies a bearer token and yields the caller's session claims.
pub trait SessionVerifier: Send + Sync {
    fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<SessionClaims, SessionError>;
}

impl<V> SessionVerifier for Arc<V>
where
    V: SessionVerifier + ?Sized,
{
    fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<SessionClaims, SessionError> {
        (**self).verify(token, now)
    }
}

/// JWT claims as they appear on the wire.
#[derive(Debug, Serialize, Deserialize)]
struct WireClaims {
    sub: Uuid,
    email: String,
    iat: i64,
    exp: i64,
}

/// HMAC-SHA256 session verifier.
#[derive(Clone)]
pub struct Hs256SessionVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl Hs256SessionVerifier {
    pub fn new(secret: &[u8]) -> Self {
        // jsonwebtoken's own exp handling is disabled; the claim window is
        // checked by `validate_claims` against an explicit clock.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.required_spec_claims = Default::default();

        Self {
            key: DecodingKey::from_secret(secret),
            validation,
        }
    }
}

impl SessionVerifier for Hs256SessionVerifier {
    fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<SessionClaims, SessionError> {
        let data = jsonwebtoken::decode::<WireClaims>(token, &self.key, &self.validation)
            .map_err(|_| SessionError::Malformed)?;

        let issued_at = Utc
            .timestamp_opt(data.claims.iat, 0)
            .single()
            .ok_or(SessionError::Malformed)?;
        let expires_at = Utc
            .timestamp_opt(data.claims.exp, 0)
            .single()
            .ok_or(SessionError::Malformed)?;

        let claims = SessionClaims {
            sub: UserId::from_uuid(data.claims.sub),
            email: data.claims.email,
            issued_at,
            expires_at,
        };
        validate_claims(&claims, now)?;
        Ok(claims)
    }
}

/// Sign session claims with an HMAC-SHA256 secret (dev/test tooling).
pub fn encode_session_token(secret: &[u8], claims: &SessionClaims) -> Result<String, SessionError> {
    let wire = WireClaims {
        sub: *claims.sub.as_uuid(),
        email: claims.email.clone(),
        iat: claims.issued_at.timestamp(),
        exp: claims.expires_at.timestamp(),
    };
    jsonwebtoken::encode(
        &jsonwebtoken::Header::new(Algorithm::HS256),
        &wire,
        &EncodingKey::from_secret(secret),
    )
    .map_err(|_| SessionError::Malformed)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
