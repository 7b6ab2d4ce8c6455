// Web-based image analyzer: captions and visual question answering
// through the Hugging Face inference API.

use std::sync::Arc;

use ai_image_analyzer::{
    server::{self, AppState},
    Config, InferenceClient,
};
use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_tracing() {
    let env_layer = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());

    tracing_subscriber::registry()
        .with(env_layer)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let dotenv = dotenvy::dotenv();
    init_tracing();
    if let Err(e) = dotenv {
        tracing::debug!("no .env file loaded: {e}");
    }

    let config = Config::from_env().context("loading configuration")?;
    tracing::info!(inference = ?config.inference, "configuration loaded");

    let state = Arc::new(AppState {
        client: InferenceClient::new(config.inference),
    });
    let app = server::router(state, config.server.max_body_bytes);

    let listener = tokio::net::TcpListener::bind(config.server.bind_addr)
        .await
        .with_context(|| format!("binding {}", config.server.bind_addr))?;

    tracing::info!("server running on http://{}", config.server.bind_addr);

    axum::serve(listener, app).await.context("serving http")?;
    Ok(())
}
