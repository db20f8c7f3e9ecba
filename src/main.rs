use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{info, warn};

use stock_assistant_relay::prelude::*;

#[tokio::main]
async fn main() -> Result<(), RelayError> {
    let config = RelayConfig::from_env()?;
    init_logging(config.log_format)?;

    let missing_keys = config.missing_keys();
    for key in &missing_keys {
        warn!("Missing {key} environment variable!");
    }

    let api = OpenAiAssistantsClient::from_config(config.openai.clone())?;
    let relay = AssistantRelay::new(Arc::new(api), config.assistant_id.clone());
    let protocol = if config.mask_errors {
        ProtocolOptions::production()
    } else {
        ProtocolOptions::development()
    };
    let state = AppState::new(relay, missing_keys).with_protocol_options(protocol);

    let listener = TcpListener::bind(config.bind_addr).await.map_err(|e| {
        RelayError::ConfigurationError(format!("Failed to bind {}: {e}", config.bind_addr))
    })?;

    serve(listener, state, shutdown_signal()).await?;
    info!("Shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
