//! Earth Engine adapter configuration and wiring.

use std::sync::Arc;
use std::time::Duration;

use afolu_app::services::{FallbackAuthenticator, SessionManager};
use serde::Deserialize;

use crate::client::EarthEngine;
use crate::compute::ComputeClient;
use crate::credentials::{AmbientCredentials, MetadataServer, ServiceAccountCredentials};
use crate::error::EarthEngineError;
use crate::secret_manager::SecretManager;

/// Ambient credentials first, then the service account from Secret Manager.
pub type DefaultCredentials =
    FallbackAuthenticator<AmbientCredentials, ServiceAccountCredentials<SecretManager>>;

/// Configuration for the Earth Engine adapter.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EarthEngineConfig {
    /// Google Cloud project registered with Earth Engine.
    pub project: String,
    /// Earth Engine REST API root.
    pub api_base: String,
    /// Metadata server root.
    pub metadata_base: String,
    /// Secret Manager REST API root.
    pub secret_manager_base: String,
    /// Secret holding the service account JSON key.
    pub secret_name: String,
    /// Per-call HTTP timeout, in seconds.
    pub request_timeout_secs: u64,
}

impl Default for EarthEngineConfig {
    fn default() -> Self {
        Self {
            project: String::new(),
            api_base: "https://earthengine.googleapis.com/v1".to_string(),
            metadata_base: "http://metadata.google.internal/computeMetadata/v1".to_string(),
            secret_manager_base: "https://secretmanager.googleapis.com/v1".to_string(),
            secret_name: "gee-service-account".to_string(),
            request_timeout_secs: 120,
        }
    }
}

impl EarthEngineConfig {
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Build the client with the default credential chain. Nothing is
    /// contacted until the session is established.
    ///
    /// # Errors
    ///
    /// Returns [`EarthEngineError::Client`] if the HTTP client cannot be
    /// built.
    pub fn build(&self) -> Result<EarthEngine<DefaultCredentials>, EarthEngineError> {
        let http = reqwest::Client::builder()
            .timeout(self.request_timeout())
            .user_agent(concat!("afolu/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(EarthEngineError::Client)?;

        let compute = ComputeClient::new(http.clone(), &self.api_base, &self.project);
        let metadata = MetadataServer::new(http.clone(), &self.metadata_base);
        let ambient = AmbientCredentials::new(metadata.clone(), compute.clone());
        let secrets = SecretManager::new(
            http.clone(),
            &self.secret_manager_base,
            &self.project,
            metadata,
        );
        let service_account = ServiceAccountCredentials::new(http, secrets, &*self.secret_name);

        let sessions = SessionManager::new(FallbackAuthenticator::new(ambient, service_account));
        Ok(EarthEngine::new(compute, Arc::new(sessions)))
    }
}
