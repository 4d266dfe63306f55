//! `value:compute` endpoint client.

use afolu_app::ports::auth::AccessToken;
use serde::Deserialize;
use serde_json::Value;

use crate::error::EarthEngineError;
use crate::http::{json_body, transport};

#[derive(Deserialize)]
struct ComputeResponse {
    result: Option<Value>,
}

/// Evaluates expressions for one Cloud project.
#[derive(Debug, Clone)]
pub struct ComputeClient {
    http: reqwest::Client,
    url: String,
}

impl ComputeClient {
    #[must_use]
    pub fn new(http: reqwest::Client, api_base: &str, project: &str) -> Self {
        Self {
            http,
            url: format!(
                "{}/projects/{project}/value:compute",
                api_base.trim_end_matches('/')
            ),
        }
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Evaluate a `{"expression": ..}` request body and return its `result`.
    ///
    /// A `null` result is returned as [`Value::Null`].
    ///
    /// # Errors
    ///
    /// Returns [`EarthEngineError`] when the call fails or is rejected.
    pub async fn compute(
        &self,
        token: &AccessToken,
        request: &Value,
    ) -> Result<Value, EarthEngineError> {
        let response = self
            .http
            .post(&self.url)
            .bearer_auth(token.secret())
            .json(request)
            .send()
            .await
            .map_err(transport(&self.url))?;
        let body: ComputeResponse = json_body(response, "value:compute").await?;
        Ok(body.result.unwrap_or(Value::Null))
    }
}
