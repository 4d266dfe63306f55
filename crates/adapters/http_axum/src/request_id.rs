//! `x-request-id` propagation.
//!
//! A well-formed incoming id is reused, anything else is replaced by a fresh
//! UUID. The id is echoed on the response and recorded on a per-request
//! tracing span, so every log line of the request carries it.

use axum::extract::Request;
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::Response;
use tracing::Instrument;
use uuid::Uuid;

pub const HEADER: &str = "x-request-id";

/// The id assigned to the current request, available as an extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(pub String);

impl RequestId {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn is_valid(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= 128
        && id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.'))
}

fn resolve(req: &Request) -> String {
    req.headers()
        .get(HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|id| is_valid(id))
        .map_or_else(|| Uuid::new_v4().to_string(), str::to_string)
}

/// Middleware assigning a request id; install with
/// [`axum::middleware::from_fn`].
pub async fn propagate(mut req: Request, next: Next) -> Response {
    let id = resolve(&req);
    let span = tracing::info_span!(
        "request",
        request_id = %id,
        method = %req.method(),
        path = %req.uri().path(),
    );
    req.extensions_mut().insert(RequestId(id.clone()));

    let mut response = next.run(req).instrument(span).await;
    if let Ok(value) = HeaderValue::from_str(&id) {
        response.headers_mut().insert(HEADER, value);
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_accept_safe_characters() {
        assert!(is_valid("req-123_abc.def"));
        assert!(is_valid("0b5e4c9e-2f0d-4a47-9a55-3f8a1fd1e0e2"));
    }

    #[test]
    fn should_reject_empty_unsafe_or_oversized_ids() {
        assert!(!is_valid(""));
        assert!(!is_valid("bad id"));
        assert!(!is_valid("bad/xx"));
        assert!(!is_valid(&"a".repeat(129)));
    }
}
