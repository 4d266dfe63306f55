//! Axum router assembly.

use axum::Router;
use axum::middleware;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

use afolu_app::ports::ImageryPlatform;
use afolu_app::services::Analysis;

use crate::api;
use crate::request_id;
use crate::state::AppState;

/// Build the top-level axum [`Router`] for the service in `state`.
///
/// Mounts `/health`, the service's analysis endpoint and, when the service
/// exposes one, the `GET /` metadata route. Includes a [`TraceLayer`] that
/// logs each HTTP request/response at the `DEBUG` level, inside the span
/// opened by the request-id middleware.
pub fn build<A, P>(state: AppState<A, P>) -> Router
where
    A: Analysis + 'static,
    P: ImageryPlatform + 'static,
{
    let kind = state.analysis.kind();
    let mut router = Router::new()
        .route("/health", get(api::health::<A, P>))
        .route(kind.endpoint(), post(api::analyze::<A, P>));
    if kind.exposes_metadata() {
        router = router.route("/", get(api::metadata::<A, P>));
    }

    router
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(request_id::propagate))
        .with_state(state)
}
