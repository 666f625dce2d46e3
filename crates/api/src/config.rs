//! Server settings loaded from environment variables.

use std::net::SocketAddr;

use chrono::Duration;
use thiserror::Error;

use innkeep_auth::TokenCodec;

/// Used only when `JWT_SECRET` is unset; never suitable outside development.
const DEV_JWT_SECRET: &str = "innkeep-dev-secret";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key} is required: {reason}")]
    Missing { key: &'static str, reason: &'static str },

    #[error("{key}={value:?} is invalid: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Clone)]
pub struct Settings {
    pub jwt_secret: String,
    pub access_token_ttl: Duration,
    pub refresh_token_ttl: Duration,
    pub bind_addr: SocketAddr,
    pub use_persistent_stores: bool,
    pub database_url: Option<String>,
}

impl core::fmt::Debug for Settings {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Settings")
            .field("jwt_secret", &"<redacted>")
            .field("access_token_ttl", &self.access_token_ttl)
            .field("refresh_token_ttl", &self.refresh_token_ttl)
            .field("bind_addr", &self.bind_addr)
            .field("use_persistent_stores", &self.use_persistent_stores)
            .field("database_url", &self.database_url.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup (tests pass a map).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let jwt_secret = match lookup("JWT_SECRET").filter(|s| !s.trim().is_empty()) {
            Some(secret) => secret,
            None => {
                tracing::warn!("JWT_SECRET not set; using insecure dev default");
                DEV_JWT_SECRET.to_string()
            }
        };

        let access_ttl = parse_or(
            &lookup,
            "ACCESS_TOKEN_TTL_SECS",
            TokenCodec::DEFAULT_ACCESS_TTL_SECS,
        )?;
        let refresh_ttl = parse_or(
            &lookup,
            "REFRESH_TOKEN_TTL_SECS",
            TokenCodec::DEFAULT_REFRESH_TTL_SECS,
        )?;
        for (key, secs) in [("ACCESS_TOKEN_TTL_SECS", access_ttl), ("REFRESH_TOKEN_TTL_SECS", refresh_ttl)] {
            if secs <= 0 {
                return Err(ConfigError::Invalid {
                    key,
                    value: secs.to_string(),
                    reason: "must be a positive number of seconds".to_string(),
                });
            }
        }

        let bind_addr = parse_or(&lookup, "BIND_ADDR", SocketAddr::from(([0, 0, 0, 0], 8080)))?;
        let use_persistent_stores = parse_or(&lookup, "USE_PERSISTENT_STORES", false)?;

        let database_url = lookup("DATABASE_URL").filter(|s| !s.trim().is_empty());
        if use_persistent_stores && database_url.is_none() {
            return Err(ConfigError::Missing {
                key: "DATABASE_URL",
                reason: "USE_PERSISTENT_STORES=true needs a Postgres connection string",
            });
        }

        Ok(Self {
            jwt_secret,
            access_token_ttl: Duration::seconds(access_ttl),
            refresh_token_ttl: Duration::seconds(refresh_ttl),
            bind_addr,
            use_persistent_stores,
            database_url,
        })
    }

    pub fn token_codec(&self) -> TokenCodec {
        TokenCodec::new(self.jwt_secret.as_bytes()).with_ttls(self.access_token_ttl, self.refresh_token_ttl)
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: core::str::FromStr,
    T::Err: core::fmt::Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) if raw.trim().is_empty() => Ok(default),
        Some(raw) => raw.trim().parse::<T>().map_err(|e| ConfigError::Invalid {
            key,
            value: raw.clone(),
            reason: e.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(pairs: &[(&str, &str)]) -> Result<Settings, ConfigError> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Settings::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let s = settings(&[]).unwrap();
        assert_eq!(s.jwt_secret, DEV_JWT_SECRET);
        assert_eq!(s.access_token_ttl, Duration::minutes(15));
        assert_eq!(s.refresh_token_ttl, Duration::days(7));
        assert_eq!(s.bind_addr.to_string(), "0.0.0.0:8080");
        assert!(!s.use_persistent_stores);
    }

    #[test]
    fn explicit_values_win() {
        let s = settings(&[
            ("JWT_SECRET", "s3cret"),
            ("ACCESS_TOKEN_TTL_SECS", "60"),
            ("BIND_ADDR", "127.0.0.1:9000"),
        ])
        .unwrap();
        assert_eq!(s.jwt_secret, "s3cret");
        assert_eq!(s.access_token_ttl, Duration::seconds(60));
        assert_eq!(s.bind_addr.port(), 9000);
    }

    #[test]
    fn bad_values_are_reported_with_their_key() {
        let err = settings(&[("ACCESS_TOKEN_TTL_SECS", "soon")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "ACCESS_TOKEN_TTL_SECS", .. }));

        let err = settings(&[("REFRESH_TOKEN_TTL_SECS", "0")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "REFRESH_TOKEN_TTL_SECS", .. }));
    }

    #[test]
    fn persistence_requires_database_url() {
        let err = settings(&[("USE_PERSISTENT_STORES", "true")]).unwrap_err();
        assert!(matches!(err, ConfigError::Missing { key: "DATABASE_URL", .. }));

        let s = settings(&[("USE_PERSISTENT_STORES", "true"), ("DATABASE_URL", "postgres://localhost/innkeep")]).unwrap();
        assert!(s.use_persistent_stores);
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let s = settings(&[("JWT_SECRET", "top-secret")]).unwrap();
        assert!(!format!("{s:?}").contains("top-secret"));
    }
}
