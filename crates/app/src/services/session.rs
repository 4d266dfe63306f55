//! Platform session lifecycle: strategy fallback and token refresh.

use afolu_domain::error::AnalysisError;
use chrono::{TimeDelta, Utc};
use tokio::sync::RwLock;

use crate::ports::auth::{AccessToken, AuthError, CredentialStrategy, Session};

/// Refresh a session this long before it expires.
pub const DEFAULT_REFRESH_MARGIN_SECS: i64 = 60;

/// Tries `primary`, then `fallback` when the primary fails.
pub struct FallbackAuthenticator<A, B> {
    primary: A,
    fallback: B,
}

impl<A, B> FallbackAuthenticator<A, B> {
    pub fn new(primary: A, fallback: B) -> Self {
        Self { primary, fallback }
    }
}

impl<A: CredentialStrategy, B: CredentialStrategy> CredentialStrategy for FallbackAuthenticator<A, B> {
    fn name(&self) -> &'static str {
        "fallback"
    }

    async fn authenticate(&self) -> Result<Session, AuthError> {
        let primary = match self.primary.authenticate().await {
            Ok(session) => return Ok(session),
            Err(err) => err,
        };
        tracing::warn!(
            strategy = self.primary.name(),
            error = %primary,
            fallback = self.fallback.name(),
            "authentication failed, trying fallback"
        );
        self.fallback
            .authenticate()
            .await
            .map_err(|fallback| AuthError::Exhausted {
                primary: Box::new(primary),
                fallback: Box::new(fallback),
            })
    }
}

/// Holds the current session and renews it shortly before expiry.
pub struct SessionManager<S> {
    strategy: S,
    current: RwLock<Option<Session>>,
    refresh_margin: TimeDelta,
}

impl<S: CredentialStrategy> SessionManager<S> {
    pub fn new(strategy: S) -> Self {
        Self {
            strategy,
            current: RwLock::new(None),
            refresh_margin: TimeDelta::seconds(DEFAULT_REFRESH_MARGIN_SECS),
        }
    }

    #[must_use]
    pub fn with_refresh_margin(mut self, margin: TimeDelta) -> Self {
        self.refresh_margin = margin;
        self
    }

    /// Authenticate once, replacing any current session.
    ///
    /// Returns the name of the strategy that succeeded.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError`] when no strategy produced a session.
    #[tracing::instrument(skip(self), fields(strategy = self.strategy.name()))]
    pub async fn establish(&self) -> Result<&'static str, AuthError> {
        let session = self.strategy.authenticate().await?;
        let name = session.strategy;
        tracing::info!(via = name, expires_at = ?session.expires_at, "platform session established");
        *self.current.write().await = Some(session);
        Ok(name)
    }

    /// Token of the current session, renewed first when it is missing or
    /// about to expire.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::Platform`] when renewal fails.
    pub async fn access_token(&self) -> Result<AccessToken, AnalysisError> {
        if let Some(token) = self.fresh_token(self.current.read().await.as_ref()) {
            return Ok(token);
        }

        let mut current = self.current.write().await;
        // Another caller may have renewed while we waited for the lock.
        if let Some(token) = self.fresh_token(current.as_ref()) {
            return Ok(token);
        }
        tracing::debug!("renewing platform session");
        let session = self.strategy.authenticate().await?;
        let token = session.token.clone();
        *current = Some(session);
        Ok(token)
    }

    fn fresh_token(&self, session: Option<&Session>) -> Option<AccessToken> {
        session
            .filter(|session| !session.expires_within(Utc::now(), self.refresh_margin))
            .map(|session| session.token.clone())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chrono::{DateTime, Utc};

    use super::*;

    struct StubStrategy {
        name: &'static str,
        fail_with: Option<&'static str>,
        expires_in: Option<TimeDelta>,
        attempts: Arc<AtomicUsize>,
    }

    impl StubStrategy {
        fn ok(name: &'static str) -> Self {
            Self {
                name,
                fail_with: None,
                expires_in: Some(TimeDelta::hours(1)),
                attempts: Arc::new(AtomicUsize::new(0)),
            }
        }

        fn failing(name: &'static str, message: &'static str) -> Self {
            Self {
                fail_with: Some(message),
                ..Self::ok(name)
            }
        }
    }

    impl CredentialStrategy for StubStrategy {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn authenticate(&self) -> Result<Session, AuthError> {
            let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
            if let Some(message) = self.fail_with {
                return Err(AuthError::failed(self.name, message));
            }
            let expires_at: Option<DateTime<Utc>> = self.expires_in.map(|delta| Utc::now() + delta);
            Ok(Session {
                token: AccessToken::new(format!("{}-{attempt}", self.name)),
                expires_at,
                strategy: self.name,
            })
        }
    }

    #[tokio::test]
    async fn should_use_primary_when_it_succeeds() {
        let fallback = StubStrategy::ok("service_account");
        let fallback_attempts = Arc::clone(&fallback.attempts);
        let auth = FallbackAuthenticator::new(StubStrategy::ok("ambient"), fallback);

        let session = auth.authenticate().await.unwrap();

        assert_eq!(session.strategy, "ambient");
        assert_eq!(fallback_attempts.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn should_fall_back_when_primary_fails() {
        let auth = FallbackAuthenticator::new(
            StubStrategy::failing("ambient", "metadata server unreachable"),
            StubStrategy::ok("service_account"),
        );

        let session = auth.authenticate().await.unwrap();

        assert_eq!(session.strategy, "service_account");
    }

    #[tokio::test]
    async fn should_report_both_errors_when_exhausted() {
        let auth = FallbackAuthenticator::new(
            StubStrategy::failing("ambient", "metadata server unreachable"),
            StubStrategy::failing("service_account", "secret not found"),
        );

        let err = auth.authenticate().await.unwrap_err();

        assert!(matches!(err, AuthError::Exhausted { .. }));
        let message = err.to_string();
        assert!(message.contains("metadata server unreachable"));
        assert!(message.contains("secret not found"));
    }

    #[tokio::test]
    async fn should_reuse_fresh_session() {
        let strategy = StubStrategy::ok("ambient");
        let attempts = Arc::clone(&strategy.attempts);
        let sessions = SessionManager::new(strategy);

        assert_eq!(sessions.establish().await.unwrap(), "ambient");
        let first = sessions.access_token().await.unwrap();
        let second = sessions.access_token().await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first.secret(), "ambient-1");
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn should_renew_session_close_to_expiry() {
        let strategy = StubStrategy {
            expires_in: Some(TimeDelta::seconds(30)),
            ..StubStrategy::ok("ambient")
        };
        let attempts = Arc::clone(&strategy.attempts);
        let sessions = SessionManager::new(strategy);

        sessions.establish().await.unwrap();
        let token = sessions.access_token().await.unwrap();

        assert_eq!(token.secret(), "ambient-2");
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn should_authenticate_lazily_without_establish() {
        let sessions = SessionManager::new(StubStrategy::ok("ambient"))
            .with_refresh_margin(TimeDelta::zero());
        let token = sessions.access_token().await.unwrap();
        assert_eq!(token.secret(), "ambient-1");
    }

    #[tokio::test]
    async fn should_surface_renewal_failure_as_platform_error() {
        let sessions = SessionManager::new(StubStrategy::failing("ambient", "denied"));
        let err = sessions.access_token().await.unwrap_err();
        assert!(matches!(err, AnalysisError::Platform(_)));
    }
}
