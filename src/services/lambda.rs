use lambda_http::{run, Error};
use web3_signature_verifier::api::{create_router, AppState};
use web3_signature_verifier::config::Config;
use web3_signature_verifier::telemetry;

/// Main function for the Lambda handler.
///
/// Runs the same router as the standalone server; API Gateway, Function URL
/// and ALB events are translated by `lambda_http`.
#[tokio::main]
async fn main() -> Result<(), Error> {
    let config = Config::from_env()?;
    telemetry::init_lambda_tracing(&config.log_level);

    let app = create_router(AppState::from_config(&config), &config.allowed_origins());
    run(app).await
}
