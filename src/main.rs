use std::sync::Arc;

use anyhow::Context;
use axum::http::HeaderValue;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use agencybot::config::AppConfig;
use agencybot::handlers;
use agencybot::state::{load_knowledge_base, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let kb = load_knowledge_base(&config)?;

    let state = Arc::new(AppState::build(config.clone(), kb).context("invalid startup configuration")?);

    // Drive pending bot replies and nudges in real time
    let ticker_state = Arc::clone(&state);
    let tick_every = config.tick_interval();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(tick_every);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            interval.tick().await;
            ticker_state.sessions.tick();
        }
    });

    let cors = match &config.cors_allow_origin {
        Some(origin) => CorsLayer::new()
            .allow_origin(
                origin
                    .parse::<HeaderValue>()
                    .with_context(|| format!("invalid CORS_ALLOW_ORIGIN: {origin}"))?,
            )
            .allow_methods(Any)
            .allow_headers(Any),
        None => CorsLayer::permissive(),
    };

    let app = handlers::router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!(
        typing_min_ms = config.typing_delay_min_ms,
        typing_max_ms = config.typing_delay_max_ms,
        nudge_ms = config.nudge_delay_ms,
        "starting chat server on {addr}"
    );

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
