//! Shared application state for axum handlers.

use std::sync::Arc;

use afolu_app::ports::ImageryPlatform;
use afolu_app::services::{Analysis, AnalysisService};

/// Application state shared across all axum handlers.
///
/// Generic over the analysis and the platform to avoid dynamic dispatch.
/// `Clone` is implemented manually so neither type needs to be `Clone`;
/// only the `Arc` wrapper is cloned.
pub struct AppState<A, P> {
    /// The analysis this process serves.
    pub analysis: Arc<AnalysisService<A, P>>,
}

impl<A, P> Clone for AppState<A, P> {
    fn clone(&self) -> Self {
        Self {
            analysis: Arc::clone(&self.analysis),
        }
    }
}

impl<A, P> AppState<A, P>
where
    A: Analysis + 'static,
    P: ImageryPlatform + 'static,
{
    /// Create a new application state from a service instance.
    pub fn new(analysis: AnalysisService<A, P>) -> Self {
        Self {
            analysis: Arc::new(analysis),
        }
    }
}
