//! # afolud: AFOLU analysis daemon
//!
//! Composition root that wires the adapters together and serves one analysis.
//!
//! ## Responsibilities
//! - Load configuration (config file, env vars)
//! - Initialize tracing
//! - Construct the imagery platform and establish its session before binding
//! - Construct the analysis service selected by configuration
//! - Build the axum router, bind to a TCP port and serve
//! - Handle graceful shutdown (SIGTERM/SIGINT)
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer, no domain logic belongs here.

mod config;

use std::sync::Arc;

use afolu_adapter_http_axum::router;
use afolu_adapter_http_axum::state::AppState;
use afolu_adapter_virtual::VirtualPlatform;
use afolu_app::ports::ImageryPlatform;
use afolu_app::services::{
    Analysis, AnalysisService, BiomassAnalysis, LandCoverAnalysis, NdviAnalysis,
};
use afolu_domain::service::ServiceKind;
use tracing_subscriber::EnvFilter;

use crate::config::{Backend, Config};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let config = Config::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.logging.filter))
        .init();

    tracing::info!(
        service = %config.service.kind,
        backend = ?config.platform.backend,
        "starting afolud"
    );

    match config.platform.backend {
        Backend::EarthEngine => {
            let platform = config.platform.earth_engine.build()?;
            let strategy = platform.establish_session().await.inspect_err(|err| {
                tracing::error!(error = %err, "could not authenticate with Earth Engine");
            })?;
            tracing::info!(
                strategy,
                project = %config.platform.earth_engine.project,
                "Earth Engine session established"
            );
            serve(&config, platform).await
        }
        Backend::Virtual => {
            tracing::warn!("serving simulated imagery from the virtual platform");
            serve(&config, VirtualPlatform::default()).await
        }
    }
}

async fn serve<P: ImageryPlatform + 'static>(config: &Config, platform: P) -> Result<(), BoxError> {
    let platform = Arc::new(platform);
    let deadline = config.platform.deadline();
    match config.service.kind {
        ServiceKind::Biomass => {
            listen(config, AnalysisService::new(BiomassAnalysis, platform, deadline)).await
        }
        ServiceKind::Landcover => {
            listen(config, AnalysisService::new(LandCoverAnalysis, platform, deadline)).await
        }
        ServiceKind::Ndvi => {
            listen(config, AnalysisService::new(NdviAnalysis, platform, deadline)).await
        }
    }
}

async fn listen<A, P>(config: &Config, service: AnalysisService<A, P>) -> Result<(), BoxError>
where
    A: Analysis + 'static,
    P: ImageryPlatform + 'static,
{
    let kind = service.kind();
    let app = router::build(AppState::new(service));

    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(%bind_addr, service = kind.health_name(), endpoint = kind.endpoint(), "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    tracing::info!("shutdown signal received, draining connections");
}
