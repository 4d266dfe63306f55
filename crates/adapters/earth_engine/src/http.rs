//! Shared handling of Google API responses.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::EarthEngineError;

/// Map a send failure for `url`.
pub(crate) fn transport(url: &str) -> impl FnOnce(reqwest::Error) -> EarthEngineError + '_ {
    move |source| EarthEngineError::Transport {
        url: url.to_string(),
        source,
    }
}

/// Human-readable message of an error body.
///
/// Google APIs answer `{"error": {"message"}}`; the OAuth token endpoint
/// answers `{"error": "<code>", "error_description"}`.
fn error_message(body: &Value) -> Option<String> {
    let error = body.get("error")?;
    error
        .get("message")
        .and_then(Value::as_str)
        .or_else(|| body.get("error_description").and_then(Value::as_str))
        .or_else(|| error.as_str())
        .map(str::to_string)
}

/// Read a JSON body, turning non-success statuses into
/// [`EarthEngineError::Api`].
pub(crate) async fn json_body<T: DeserializeOwned>(
    response: reqwest::Response,
    context: &'static str,
) -> Result<T, EarthEngineError> {
    let status = response.status();
    let url = response.url().to_string();
    let bytes = response.bytes().await.map_err(transport(&url))?;

    if !status.is_success() {
        let message = serde_json::from_slice::<Value>(&bytes)
            .ok()
            .and_then(|body| error_message(&body))
            .unwrap_or_else(|| format!("{context} returned HTTP {}", status.as_u16()));
        return Err(EarthEngineError::Api {
            status: status.as_u16(),
            message,
        });
    }
    serde_json::from_slice(&bytes).map_err(|err| EarthEngineError::decode(context, err))
}
