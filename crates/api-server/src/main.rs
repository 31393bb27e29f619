//! API Server for Promptline
//!
//! Serves the chat polling API and the prompt version lifecycle over REST.

mod config;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use agent_runner::{ChatAgent, EchoAgent, OpenAiClient};
use anyhow::Context;
use axum::http::HeaderValue;
use axum::Router;
use tower_http::cors::{Any, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::ServerConfig;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "api_server=debug,agent_runner=debug,pl_core=info,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env();
    tracing::info!("Using data directory: {:?}", config.data_dir);

    let agent: Arc<dyn ChatAgent> = match config.upstream_key() {
        Some(key) => {
            tracing::info!("Using upstream agent {} at {}", config.agent.model, config.base_url);
            let client = OpenAiClient::new(&config.base_url, key, config.agent.clone())
                .context("Failed to build upstream HTTP client")?;
            Arc::new(client)
        }
        None => {
            tracing::warn!("No upstream agent configured, replies are echoed");
            Arc::new(EchoAgent)
        }
    };

    let cors = cors_layer(config.allowed_origin.as_deref())?;
    let port = config.port;
    let app_state = AppState::new(config, agent);

    Arc::clone(app_state.results())
        .spawn_sweeper(app_state.config().result_retention, app_state.config().sweep_interval);

    let app = Router::new()
        .merge(routes::health::router())
        .merge(routes::messages::router())
        .merge(routes::prompts::router())
        .merge(routes::evals::router())
        .with_state(app_state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("REST API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

fn cors_layer(allowed_origin: Option<&str>) -> anyhow::Result<CorsLayer> {
    let origin = match allowed_origin {
        Some(origin) => AllowOrigin::exact(
            HeaderValue::from_str(origin).with_context(|| format!("Invalid origin {:?}", origin))?,
        ),
        None => AllowOrigin::any(),
    };

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(Any)
        .allow_headers(Any))
}
