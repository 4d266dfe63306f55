//! Credential strategies for Google APIs.
//!
//! - [`AmbientCredentials`]: the runtime's attached service account, through
//!   the metadata server, confirmed with an Earth Engine probe.
//! - [`ServiceAccountCredentials`]: a JSON key held in a [`SecretStore`],
//!   exchanged for a token with a signed JWT assertion.

use std::fmt;

use afolu_app::ports::auth::{AccessToken, AuthError, CredentialStrategy, SecretStore, Session};
use chrono::{DateTime, TimeDelta, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};

use crate::compute::ComputeClient;
use crate::error::EarthEngineError;
use crate::expr::{Expression, constant};
use crate::http::{json_body, transport};

pub const EARTH_ENGINE_SCOPE: &str = "https://www.googleapis.com/auth/earthengine";
pub const CLOUD_PLATFORM_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";

/// Scopes requested for Earth Engine sessions.
pub const SESSION_SCOPES: [&str; 2] = [EARTH_ENGINE_SCOPE, CLOUD_PLATFORM_SCOPE];

pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Lifetime of a signed assertion; Google rejects anything above one hour.
const ASSERTION_LIFETIME_SECS: i64 = 3600;

/// OAuth 2.0 token response, as answered by both token sources.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<i64>,
}

impl TokenResponse {
    fn into_session(self, strategy: &'static str, issued_at: DateTime<Utc>) -> Session {
        Session {
            token: AccessToken::new(self.access_token),
            expires_at: self
                .expires_in
                .map(|secs| issued_at + TimeDelta::seconds(secs)),
            strategy,
        }
    }
}

/// The GCE / Cloud Run metadata server.
#[derive(Debug, Clone)]
pub struct MetadataServer {
    http: reqwest::Client,
    base: String,
}

impl MetadataServer {
    pub fn new(http: reqwest::Client, base: &str) -> Self {
        Self {
            http,
            base: base.trim_end_matches('/').to_string(),
        }
    }

    /// Token of the default service account for `scopes`.
    ///
    /// # Errors
    ///
    /// Returns [`EarthEngineError`] when the server is unreachable (not on
    /// Google Cloud) or refuses the request.
    pub async fn token(&self, scopes: &[&str]) -> Result<TokenResponse, EarthEngineError> {
        let url = format!("{}/instance/service-accounts/default/token", self.base);
        tracing::debug!(%url, "requesting metadata server token");
        let response = self
            .http
            .get(&url)
            .header("Metadata-Flavor", "Google")
            .query(&[("scopes", scopes.join(","))])
            .send()
            .await
            .map_err(transport(&url))?;
        json_body(response, "metadata server").await
    }
}

/// Credentials attached to the runtime.
#[derive(Debug, Clone)]
pub struct AmbientCredentials {
    metadata: MetadataServer,
    probe: ComputeClient,
}

impl AmbientCredentials {
    const NAME: &'static str = "ambient";

    pub fn new(metadata: MetadataServer, probe: ComputeClient) -> Self {
        Self { metadata, probe }
    }
}

impl CredentialStrategy for AmbientCredentials {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    async fn authenticate(&self) -> Result<Session, AuthError> {
        let issued_at = Utc::now();
        let session = self
            .metadata
            .token(&SESSION_SCOPES)
            .await
            .map_err(|err| AuthError::failed(Self::NAME, err))?
            .into_session(Self::NAME, issued_at);

        // The metadata server hands out tokens even when the account is not
        // registered with Earth Engine.
        let probe = Expression::new().into_request(constant(1));
        self.probe
            .compute(&session.token, &probe)
            .await
            .map_err(|err| AuthError::failed(Self::NAME, err))?;
        Ok(session)
    }
}

/// A service account JSON key, as downloaded from the IAM console.
#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default)]
    pub private_key_id: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("client_email", &self.client_email)
            .field("private_key_id", &self.private_key_id)
            .field("token_uri", &self.token_uri)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    iss: String,
    scope: String,
    aud: String,
    iat: i64,
    exp: i64,
}

impl ServiceAccountKey {
    /// # Errors
    ///
    /// Returns [`EarthEngineError::Decode`] when `payload` is not a key.
    pub fn from_json(payload: &[u8]) -> Result<Self, EarthEngineError> {
        serde_json::from_slice(payload)
            .map_err(|err| EarthEngineError::decode("service account key", err))
    }

    /// RS256 assertion for the `jwt-bearer` grant.
    ///
    /// # Errors
    ///
    /// Returns [`EarthEngineError::Signing`] when the private key is not a
    /// PEM RSA key.
    pub fn assertion(
        &self,
        scopes: &[&str],
        issued_at: DateTime<Utc>,
    ) -> Result<String, EarthEngineError> {
        let iat = issued_at.timestamp();
        let claims = Claims {
            iss: self.client_email.clone(),
            scope: scopes.join(" "),
            aud: self.token_uri.clone(),
            iat,
            exp: iat + ASSERTION_LIFETIME_SECS,
        };
        let mut header = Header::new(Algorithm::RS256);
        header.kid.clone_from(&self.private_key_id);
        let key =
            EncodingKey::from_rsa_pem(self.private_key.as_bytes()).map_err(EarthEngineError::Signing)?;
        jsonwebtoken::encode(&header, &claims, &key).map_err(EarthEngineError::Signing)
    }
}

/// A service account whose key is read from `secrets` on every login.
pub struct ServiceAccountCredentials<S> {
    http: reqwest::Client,
    secrets: S,
    secret_name: String,
}

impl<S> ServiceAccountCredentials<S> {
    const NAME: &'static str = "service_account";

    pub fn new(http: reqwest::Client, secrets: S, secret_name: impl Into<String>) -> Self {
        Self {
            http,
            secrets,
            secret_name: secret_name.into(),
        }
    }

    async fn exchange(&self, key: &ServiceAccountKey) -> Result<Session, EarthEngineError> {
        let issued_at = Utc::now();
        let assertion = key.assertion(&SESSION_SCOPES, issued_at)?;
        tracing::debug!(token_uri = %key.token_uri, account = %key.client_email, "exchanging assertion");
        let response = self
            .http
            .post(&key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await
            .map_err(transport(&key.token_uri))?;
        let token: TokenResponse = json_body(response, "token endpoint").await?;
        Ok(token.into_session(Self::NAME, issued_at))
    }
}

impl<S: SecretStore> CredentialStrategy for ServiceAccountCredentials<S> {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    async fn authenticate(&self) -> Result<Session, AuthError> {
        let payload = self.secrets.fetch_latest_secret(&self.secret_name).await?;
        let key = ServiceAccountKey::from_json(&payload)
            .map_err(|err| AuthError::failed(Self::NAME, err))?;
        self.exchange(&key)
            .await
            .map_err(|err| AuthError::failed(Self::NAME, err))
    }
}
