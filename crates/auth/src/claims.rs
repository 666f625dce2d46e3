//! Signed identity tokens (HS256 JWT).
//!
//! The codec owns signing and verification; the claims it returns are already
//! validated against the supplied `now`, so callers never re-check expiry.

use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use innkeep_core::UserId;

use crate::AuthError;

/// Purpose of a token. Only `Access` tokens authenticate API requests.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// Raw JWT payload as it travels on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject: user id as a UUID string.
    pub sub: String,

    #[serde(rename = "type")]
    pub kind: TokenKind,

    /// Issued-at, seconds since the UNIX epoch.
    pub iat: i64,

    /// Expiry, seconds since the UNIX epoch.
    pub exp: i64,
}

/// Claims of a verified access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessClaims {
    pub sub: UserId,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Internal reason a token was refused. Never shown to clients.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenValidationError {
    #[error("token could not be decoded or its signature is invalid: {0}")]
    Malformed(String),

    #[error("token has expired")]
    Expired,

    #[error("token not yet valid (issued_at is in the future)")]
    NotYetValid,

    #[error("invalid token time window (expires_at <= issued_at)")]
    InvalidTimeWindow,

    #[error("token kind is {0:?}, expected access")]
    WrongKind(TokenKind),

    #[error("token subject is not a user id")]
    InvalidSubject,
}

impl From<TokenValidationError> for AuthError {
    fn from(_: TokenValidationError) -> Self {
        AuthError::InvalidToken
    }
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("failed to sign token: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),
}

/// Deterministically validate the time window of decoded claims.
pub fn validate_claims(claims: &TokenClaims, now: DateTime<Utc>) -> Result<(), TokenValidationError> {
    let now = now.timestamp();
    if claims.exp <= claims.iat {
        return Err(TokenValidationError::InvalidTimeWindow);
    }
    if now < claims.iat {
        return Err(TokenValidationError::NotYetValid);
    }
    if now >= claims.exp {
        return Err(TokenValidationError::Expired);
    }
    Ok(())
}

/// Issues and verifies HS256 tokens with a shared secret.
#[derive(Clone)]
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl core::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish_non_exhaustive()
    }
}

impl TokenCodec {
    pub const DEFAULT_ACCESS_TTL_SECS: i64 = 15 * 60;
    pub const DEFAULT_REFRESH_TTL_SECS: i64 = 7 * 24 * 60 * 60;

    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked in `validate_claims` against the injected clock.
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            access_ttl: Duration::seconds(Self::DEFAULT_ACCESS_TTL_SECS),
            refresh_ttl: Duration::seconds(Self::DEFAULT_REFRESH_TTL_SECS),
        }
    }

    pub fn with_ttls(mut self, access_ttl: Duration, refresh_ttl: Duration) -> Self {
        self.access_ttl = access_ttl;
        self.refresh_ttl = refresh_ttl;
        self
    }

    pub fn access_ttl(&self) -> Duration {
        self.access_ttl
    }

    /// Sign a token of the given kind for `user_id`, valid from `now`.
    pub fn issue(&self, user_id: UserId, kind: TokenKind, now: DateTime<Utc>) -> Result<String, TokenError> {
        let ttl = match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        };
        let claims = TokenClaims {
            sub: user_id.to_string(),
            kind,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };
        self.sign(&claims)
    }

    /// Sign arbitrary claims. Used by `issue` and by tests that need odd tokens.
    pub fn sign(&self, claims: &TokenClaims) -> Result<String, TokenError> {
        Ok(jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            claims,
            &self.encoding,
        )?)
    }

    /// Verify an access token.
    ///
    /// Every failure is reported as [`AuthError::InvalidToken`]; the precise
    /// reason is only logged.
    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<AccessClaims, AuthError> {
        self.decode_access(token, now).map_err(|reason| {
            tracing::debug!(%reason, "access token rejected");
            AuthError::from(reason)
        })
    }

    /// Verify an access token, keeping the precise rejection reason.
    pub fn decode_access(&self, token: &str, now: DateTime<Utc>) -> Result<AccessClaims, TokenValidationError> {
        let data = jsonwebtoken::decode::<TokenClaims>(token, &self.decoding, &self.validation)
            .map_err(|e| TokenValidationError::Malformed(e.to_string()))?;
        let claims = data.claims;

        validate_claims(&claims, now)?;

        if claims.kind != TokenKind::Access {
            return Err(TokenValidationError::WrongKind(claims.kind));
        }

        let sub: UserId = claims
            .sub
            .parse()
            .map_err(|_| TokenValidationError::InvalidSubject)?;

        Ok(AccessClaims {
            sub,
            issued_at: timestamp(claims.iat)?,
            expires_at: timestamp(claims.exp)?,
        })
    }
}

fn timestamp(secs: i64) -> Result<DateTime<Utc>, TokenValidationError> {
    Utc.timestamp_opt(secs, 0)
        .single()
        .ok_or(TokenValidationError::InvalidTimeWindow)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn codec() -> TokenCodec {
        TokenCodec::new(b"unit-test-secret")
    }

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 14, 12, 0, 0).unwrap()
    }

    #[test]
    fn access_token_round_trips_within_ttl() {
        let codec = codec();
        let user = UserId::new();
        let token = codec.issue(user, TokenKind::Access, fixed_now()).unwrap();

        let claims = codec.verify(&token, fixed_now() + Duration::minutes(5)).unwrap();
        assert_eq!(claims.sub, user);
        assert_eq!(claims.expires_at - claims.issued_at, codec.access_ttl());
    }

    #[test]
    fn refresh_token_is_rejected_like_a_bad_signature() {
        let codec = codec();
        let token = codec.issue(UserId::new(), TokenKind::Refresh, fixed_now()).unwrap();

        assert_eq!(
            codec.decode_access(&token, fixed_now()).unwrap_err(),
            TokenValidationError::WrongKind(TokenKind::Refresh)
        );
        assert_eq!(codec.verify(&token, fixed_now()).unwrap_err(), AuthError::InvalidToken);

        let forged = TokenCodec::new(b"another-secret")
            .issue(UserId::new(), TokenKind::Access, fixed_now())
            .unwrap();
        assert_eq!(codec.verify(&forged, fixed_now()).unwrap_err(), AuthError::InvalidToken);
    }

    #[test]
    fn expired_token_is_invalid() {
        let codec = codec();
        let token = codec.issue(UserId::new(), TokenKind::Access, fixed_now()).unwrap();
        let later = fixed_now() + codec.access_ttl() + Duration::seconds(1);

        assert_eq!(
            codec.decode_access(&token, later).unwrap_err(),
            TokenValidationError::Expired
        );
        assert_eq!(codec.verify(&token, later).unwrap_err(), AuthError::InvalidToken);
    }

    #[test]
    fn token_from_the_future_is_invalid() {
        let codec = codec();
        let token = codec.issue(UserId::new(), TokenKind::Access, fixed_now()).unwrap();
        let earlier = fixed_now() - Duration::minutes(1);

        assert_eq!(
            codec.decode_access(&token, earlier).unwrap_err(),
            TokenValidationError::NotYetValid
        );
    }

    #[test]
    fn non_uuid_subject_is_invalid() {
        let codec = codec();
        let now = fixed_now();
        let token = codec
            .sign(&TokenClaims {
                sub: "alice".to_string(),
                kind: TokenKind::Access,
                iat: now.timestamp(),
                exp: now.timestamp() + 60,
            })
            .unwrap();

        assert_eq!(
            codec.decode_access(&token, now).unwrap_err(),
            TokenValidationError::InvalidSubject
        );
    }

    #[test]
    fn unknown_kind_fails_to_decode() {
        let codec = codec();
        let now = fixed_now();
        let payload = serde_json::json!({
            "sub": UserId::new().to_string(),
            "type": "password_reset",
            "iat": now.timestamp(),
            "exp": now.timestamp() + 60,
        });
        let token = jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &payload,
            &EncodingKey::from_secret(b"unit-test-secret"),
        )
        .unwrap();

        assert_eq!(codec.verify(&token, now).unwrap_err(), AuthError::InvalidToken);
    }

    proptest! {
        #[test]
        fn arbitrary_strings_never_verify(token in ".{0,200}") {
            prop_assert_eq!(codec().verify(&token, fixed_now()).unwrap_err(), AuthError::InvalidToken);
        }

        #[test]
        fn every_instant_past_expiry_is_rejected(extra in 0i64..10_000_000) {
            let codec = codec();
            let token = codec.issue(UserId::new(), TokenKind::Access, fixed_now()).unwrap();
            let at = fixed_now() + codec.access_ttl() + Duration::seconds(extra);
            prop_assert_eq!(codec.verify(&token, at).unwrap_err(), AuthError::InvalidToken);
        }
    }
}
