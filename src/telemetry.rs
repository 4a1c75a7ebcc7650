use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "web3_signature_verifier={lvl},verifier={lvl},verifier_lambda={lvl},tower_http={lvl}",
            lvl = default_level
        ))
    })
}

/// Install the global subscriber for long-running binaries
pub fn init_tracing(default_level: &str) {
    tracing_subscriber::registry()
        .with(env_filter(default_level))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Compact, timestamp-less output; CloudWatch adds its own timestamps
pub fn init_lambda_tracing(default_level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(default_level))
        .with_target(false)
        .without_time()
        .with_line_number(false)
        .init();
}
