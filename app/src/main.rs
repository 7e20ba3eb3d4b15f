use axum::{response::Redirect, routing::get, Router};
use axum_embed::ServeEmbed;
use clap::Parser;
use common::{AppState, Config};
use rust_embed::RustEmbed;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(RustEmbed, Clone)]
#[folder = "public/"]
struct Assets;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Initialize Logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 2. Load Config from .env, environment and CLI args
    dotenvy::dotenv().ok();
    let config = Config::parse();

    // 3. Sheet API client
    let state = Arc::new(AppState::new(config.clone())?);
    match &config.proxy_url {
        Some(proxy) => tracing::info!("Sheet API {} via proxy {}", config.api_url, proxy),
        None => tracing::info!("Sheet API {}", config.api_url),
    }

    // 4. Routing
    let serve_assets = ServeEmbed::<Assets>::new();
    for file in Assets::iter() {
        tracing::debug!("Embedded file: {}", file);
    }

    let app = Router::<Arc<AppState>>::new()
        .route("/", get(root_redirect))
        .nest("/dashboard", transactions::handler::dashboard_router(state.clone()))
        .nest("/transactions", transactions::handler::transactions_router(state.clone()))
        .nest("/budgets", transactions::handler::budgets_router(state.clone()))
        .nest("/reports", reports::handler::reports_router(state.clone()))
        .nest("/settings", categories::handler::settings_router(state.clone()))
        .nest_service("/public", serve_assets)
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    // 5. Start Server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

async fn root_redirect() -> Redirect {
    Redirect::to("/dashboard")
}
