use axum::Router;
use web3_signature_verifier::api::{create_router, AppState};
use web3_signature_verifier::config::Config;
use web3_signature_verifier::telemetry;

// Build the application for a given configuration
fn build_app(config: &Config) -> Router {
    if config.auth.is_none() {
        tracing::warn!("JWKS_URL not set, signature routes are unauthenticated");
    }
    create_router(AppState::from_config(config), &config.allowed_origins())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for Ctrl+C: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => tracing::error!("failed to install SIGTERM handler: {}", e),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutting down");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env()?;
    telemetry::init_tracing(&config.log_level);

    let app = build_app(&config);

    let addr = config.bind_address();
    tracing::info!("Verifier service listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}
