//! Analysis pipeline: validate → run on the platform → format.
//!
//! Every service follows the same template. An [`Analysis`] supplies the
//! request parsing and the platform program; [`AnalysisService`] runs it under
//! a deadline.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use afolu_domain::error::{AnalysisError, ValidationError};
use afolu_domain::service::ServiceKind;
use serde::Serialize;
use serde_json::Value;

use crate::ports::ImageryPlatform;

/// One analysis: how to read its request and how to compute its report.
pub trait Analysis: Send + Sync {
    type Request: fmt::Debug + Send + Sync;
    type Report: Serialize + Send;

    /// Which service this analysis backs.
    fn kind(&self) -> ServiceKind;

    /// Validate a raw request body.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] for a missing body, a missing required
    /// field, or a mistyped field.
    fn parse(&self, body: Option<&Value>) -> Result<Self::Request, ValidationError>;

    /// Compute the report against the platform.
    fn run<P: ImageryPlatform>(
        &self,
        platform: &P,
        request: &Self::Request,
    ) -> impl Future<Output = Result<Self::Report, AnalysisError>> + Send;
}

/// Runs one [`Analysis`] against an [`ImageryPlatform`].
pub struct AnalysisService<A, P> {
    analysis: A,
    platform: Arc<P>,
    deadline: Duration,
}

impl<A: Analysis, P: ImageryPlatform> AnalysisService<A, P> {
    /// Create a new service. Runs longer than `deadline` fail with
    /// [`AnalysisError::Timeout`].
    pub fn new(analysis: A, platform: Arc<P>, deadline: Duration) -> Self {
        Self {
            analysis,
            platform,
            deadline,
        }
    }

    pub fn kind(&self) -> ServiceKind {
        self.analysis.kind()
    }

    /// Validate `body`, then run the analysis.
    ///
    /// Validation happens before any platform call.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::Validation`] for bad input, the platform's
    /// error when a step fails, or [`AnalysisError::Timeout`] when the
    /// deadline elapses first.
    #[tracing::instrument(skip(self, body), fields(service = %self.analysis.kind()))]
    pub async fn handle(&self, body: Option<&Value>) -> Result<A::Report, AnalysisError> {
        let request = self.analysis.parse(body)?;
        tracing::debug!(?request, "request validated");

        let run = self.analysis.run(self.platform.as_ref(), &request);
        match tokio::time::timeout(self.deadline, run).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(deadline = ?self.deadline, "analysis deadline elapsed");
                Err(AnalysisError::Timeout(self.deadline))
            }
        }
    }
}
