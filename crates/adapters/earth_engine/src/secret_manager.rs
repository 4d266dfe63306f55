//! Secret Manager client implementing [`SecretStore`].

use afolu_app::ports::auth::{AccessToken, AuthError, SecretStore};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Deserialize;

use crate::credentials::{CLOUD_PLATFORM_SCOPE, MetadataServer};
use crate::error::EarthEngineError;
use crate::http::{json_body, transport};

#[derive(Deserialize)]
struct AccessResponse {
    payload: Payload,
}

#[derive(Deserialize)]
struct Payload {
    data: String,
}

/// Reads secrets of one Cloud project, authenticated as the runtime's
/// service account.
#[derive(Debug, Clone)]
pub struct SecretManager {
    http: reqwest::Client,
    base: String,
    project: String,
    metadata: MetadataServer,
}

impl SecretManager {
    const NAME: &'static str = "secret_manager";

    pub fn new(
        http: reqwest::Client,
        base: &str,
        project: &str,
        metadata: MetadataServer,
    ) -> Self {
        Self {
            http,
            base: base.trim_end_matches('/').to_string(),
            project: project.to_string(),
            metadata,
        }
    }

    fn version_url(&self, name: &str) -> String {
        format!(
            "{}/projects/{}/secrets/{name}/versions/latest:access",
            self.base, self.project
        )
    }

    async fn access(&self, name: &str) -> Result<Vec<u8>, EarthEngineError> {
        let token = self.metadata.token(&[CLOUD_PLATFORM_SCOPE]).await?;
        let token = AccessToken::new(token.access_token);
        let url = self.version_url(name);
        tracing::debug!(%url, "reading secret");
        let response = self
            .http
            .get(&url)
            .bearer_auth(token.secret())
            .send()
            .await
            .map_err(transport(&url))?;
        let body: AccessResponse = json_body(response, "secret manager").await?;
        STANDARD
            .decode(body.payload.data)
            .map_err(|err| EarthEngineError::decode("secret manager", err))
    }
}

impl SecretStore for SecretManager {
    async fn fetch_latest_secret(&self, name: &str) -> Result<Vec<u8>, AuthError> {
        self.access(name)
            .await
            .map_err(|err| AuthError::failed(Self::NAME, err))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::Json;
    use axum::Router;
    use axum::extract::Path;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::get;
    use serde_json::{Value, json};

    use super::*;
    use crate::testing::serve;

    const KEY_JSON: &str = r#"{"type": "service_account", "client_email": "afolu@forest-project.iam.gserviceaccount.com"}"#;

    fn reply(name: &str) -> (StatusCode, Json<Value>) {
        if name == "gee-service-account" {
            let data = STANDARD.encode(KEY_JSON);
            return (
                StatusCode::OK,
                Json(json!({
                    "name": "projects/forest-project/secrets/gee-service-account/versions/3",
                    "payload": {"data": data}
                })),
            );
        }
        (
            StatusCode::NOT_FOUND,
            Json(json!({"error": {
                "code": 404,
                "message": format!("Secret [{name}] not found or has no versions."),
                "status": "NOT_FOUND"
            }})),
        )
    }

    /// Metadata server plus Secret Manager on one stub host.
    async fn secret_manager() -> (SecretManager, Arc<Mutex<Vec<HeaderMap>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let router = Router::new()
            .route(
                "/metadata/instance/service-accounts/default/token",
                get(|| async { Json(json!({"access_token": "ya29.runtime", "expires_in": 1800})) }),
            )
            .route(
                "/v1/projects/forest-project/secrets/{name}/versions/latest:access",
                get(move |Path(name): Path<String>, headers: HeaderMap| {
                    let sink = Arc::clone(&sink);
                    async move {
                        sink.lock().unwrap().push(headers);
                        reply(&name)
                    }
                }),
            );
        let base = serve(router).await;
        let http = reqwest::Client::new();
        let metadata = MetadataServer::new(http.clone(), &format!("{base}/metadata"));
        let manager = SecretManager::new(http, &format!("{base}/v1"), "forest-project", metadata);
        (manager, seen)
    }

    #[test]
    fn should_address_latest_version() {
        let metadata = MetadataServer::new(reqwest::Client::new(), "http://metadata");
        let manager = SecretManager::new(
            reqwest::Client::new(),
            "https://secretmanager.googleapis.com/v1/",
            "forest-project",
            metadata,
        );
        assert_eq!(
            manager.version_url("gee-service-account"),
            "https://secretmanager.googleapis.com/v1/projects/forest-project/secrets/gee-service-account/versions/latest:access"
        );
    }

    #[tokio::test]
    async fn should_decode_base64_payload() {
        let (manager, seen) = secret_manager().await;

        let payload = manager.fetch_latest_secret("gee-service-account").await.unwrap();

        assert_eq!(payload, KEY_JSON.as_bytes());
        let seen = seen.lock().unwrap();
        assert_eq!(seen[0]["authorization"], "Bearer ya29.runtime");
    }

    #[tokio::test]
    async fn should_fail_when_secret_is_missing() {
        let (manager, _) = secret_manager().await;

        let err = manager.fetch_latest_secret("other-secret").await.unwrap_err();

        assert!(matches!(err, AuthError::Failed { strategy: "secret_manager", .. }));
        assert!(err.to_string().contains("Secret [other-secret] not found"));
    }
}
