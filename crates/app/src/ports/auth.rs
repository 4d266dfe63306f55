//! Authentication ports: how a platform session is obtained.
//!
//! A [`CredentialStrategy`] produces a [`Session`] in one attempt; strategies
//! are composed by [`FallbackAuthenticator`](crate::services::FallbackAuthenticator)
//! and kept fresh by [`SessionManager`](crate::services::SessionManager).

use std::fmt;
use std::future::Future;

use afolu_domain::error::{AnalysisError, BoxError};
use chrono::{DateTime, TimeDelta, Utc};

/// Bearer token for the imagery platform. `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token, for an `Authorization: Bearer` header.
    #[must_use]
    pub fn secret(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(***)")
    }
}

/// An authenticated platform session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: AccessToken,
    /// `None` when the issuer did not say; such sessions are never refreshed.
    pub expires_at: Option<DateTime<Utc>>,
    /// Name of the strategy that produced the session.
    pub strategy: &'static str,
}

impl Session {
    /// Whether the session expires before `now + margin`.
    #[must_use]
    pub fn expires_within(&self, now: DateTime<Utc>, margin: TimeDelta) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at <= now + margin)
    }
}

/// Failure to obtain a session.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// One strategy failed.
    #[error("{strategy} authentication failed: {source}")]
    Failed {
        strategy: &'static str,
        #[source]
        source: BoxError,
    },

    /// Both the primary and the fallback strategy failed.
    #[error("all authentication strategies failed (primary: {primary}; fallback: {fallback})")]
    Exhausted {
        primary: Box<AuthError>,
        fallback: Box<AuthError>,
    },
}

impl AuthError {
    pub fn failed(strategy: &'static str, err: impl Into<BoxError>) -> Self {
        Self::Failed {
            strategy,
            source: err.into(),
        }
    }
}

impl From<AuthError> for AnalysisError {
    fn from(err: AuthError) -> Self {
        Self::platform(err)
    }
}

/// One way of authenticating against the imagery platform.
///
/// Implementations live in adapter crates (`adapter_earth_engine`).
pub trait CredentialStrategy: Send + Sync {
    /// Short name used in logs and errors, e.g. `ambient`.
    fn name(&self) -> &'static str;

    /// Attempt to obtain a fresh session.
    fn authenticate(&self) -> impl Future<Output = Result<Session, AuthError>> + Send;
}

/// A secret store holding versioned secrets.
pub trait SecretStore: Send + Sync {
    /// Raw payload of the latest version of secret `name`.
    fn fetch_latest_secret(&self, name: &str) -> impl Future<Output = Result<Vec<u8>, AuthError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(expires_at: Option<DateTime<Utc>>) -> Session {
        Session {
            token: AccessToken::new("ya29.secret"),
            expires_at,
            strategy: "ambient",
        }
    }

    #[test]
    fn should_redact_token_in_debug_output() {
        let printed = format!("{:?}", session(None));
        assert!(!printed.contains("ya29.secret"));
        assert!(printed.contains("AccessToken(***)"));
    }

    #[test]
    fn should_detect_expiry_within_margin() {
        let now = Utc::now();
        let soon = session(Some(now + TimeDelta::seconds(30)));
        let later = session(Some(now + TimeDelta::seconds(600)));

        assert!(soon.expires_within(now, TimeDelta::seconds(60)));
        assert!(!later.expires_within(now, TimeDelta::seconds(60)));
    }

    #[test]
    fn should_never_expire_without_deadline() {
        assert!(!session(None).expires_within(Utc::now(), TimeDelta::days(365)));
    }

    #[test]
    fn should_name_both_failures_when_exhausted() {
        let err = AuthError::Exhausted {
            primary: Box::new(AuthError::failed("ambient", "no metadata server")),
            fallback: Box::new(AuthError::failed("service_account", "secret not found")),
        };
        let message = err.to_string();
        assert!(message.contains("no metadata server"));
        assert!(message.contains("secret not found"));
    }

    #[test]
    fn should_convert_into_platform_error() {
        let err: AnalysisError = AuthError::failed("ambient", "denied").into();
        assert!(matches!(err, AnalysisError::Platform(_)));
    }
}
