//! `serve` command — start the chat gateway.

use graphtutor_config::AppConfig;

pub async fn run(port: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = AppConfig::load()?;

    if let Some(port) = port {
        config.gateway.port = port;
    }

    tracing::info!(
        model = %config.model,
        retrieval = config.retrieval_enabled,
        "Starting GraphTutor gateway"
    );

    graphtutor_gateway::start(config).await
}
