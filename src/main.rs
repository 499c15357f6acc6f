//! tendero - conversational-commerce gateway
//!
//! Receives chat/webhook events from the messaging automation platform and
//! resolves messages, voice notes, and product photos into model replies,
//! transcriptions, attribute extractions, and catalog search results.

use std::sync::Arc;

use tendero_catalog::StorefrontClient;
use tendero_core::AppConfig;
use tendero_gateway::{AppState, GatewayServer};
use tendero_model::{KeywordIntentDetector, OpenAiClient};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tendero_gateway::init_tracing();

    tracing::info!("Starting tendero v{}", env!("CARGO_PKG_VERSION"));

    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load configuration, using defaults");
            AppConfig::default()
        }
    };

    if config.models.api_key.is_none() {
        tracing::warn!("No model API key configured; model-backed endpoints will return errors");
    }
    if config.catalog.shop_domain.is_none() || config.catalog.storefront_token.is_none() {
        tracing::info!("Storefront not configured; catalog search will return empty results");
    }

    let http = reqwest::Client::new();

    let model_client = Arc::new(OpenAiClient::new(config.models.clone(), http.clone()));
    let catalog_client = Arc::new(StorefrontClient::new(config.catalog.clone(), http));

    let host = config.server.host.clone();
    let port = config.server.port;

    let state = AppState::new(
        config,
        model_client.clone(),
        model_client.clone(),
        model_client,
        catalog_client,
        Arc::new(KeywordIntentDetector::new()),
    );

    let server = GatewayServer::new(state);

    println!();
    println!("tendero v{}", env!("CARGO_PKG_VERSION"));
    println!("  GET  /                  - diagnostics");
    println!("  GET  /webhook           - webhook verification");
    println!("  POST /webhook           - inbound events");
    println!("  POST /chat/complete     - chat completion");
    println!("  POST /voice/transcribe  - voice note transcription");
    println!("  POST /vision/analyze    - product attribute extraction");
    println!("  POST /catalog/search    - catalog search");
    println!("  POST /by-image/search   - image -> attributes -> catalog");
    println!();
    println!("  Listening on http://{}:{}", host, port);
    println!();

    server.run().await?;

    Ok(())
}
