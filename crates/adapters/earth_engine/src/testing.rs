//! Local HTTP stubs for the adapter tests.

use std::sync::{Arc, Mutex};

use afolu_app::ports::auth::{AccessToken, AuthError, CredentialStrategy, Session};
use axum::Router;
use axum::http::HeaderMap;
use serde_json::Value;

/// Serve `router` on an ephemeral local port and return its base URL.
pub(crate) async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

/// What a stub endpoint received.
#[derive(Debug, Clone)]
pub(crate) struct Captured {
    pub headers: HeaderMap,
    pub body: Value,
}

pub(crate) type Captures = Arc<Mutex<Vec<Captured>>>;

/// Always hands out the same token.
pub(crate) struct StaticToken(pub &'static str);

impl CredentialStrategy for StaticToken {
    fn name(&self) -> &'static str {
        "static"
    }

    async fn authenticate(&self) -> Result<Session, AuthError> {
        Ok(Session {
            token: AccessToken::new(self.0),
            expires_at: None,
            strategy: "static",
        })
    }
}
