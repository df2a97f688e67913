mod config;
mod page;
mod routes;
mod session;
mod state;

use std::sync::Arc;

use anyhow::Result;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use dotenv::dotenv;
use sentiscope_core::{Analyzer, AnalyzerConfig, SessionStore};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::{config::WebConfig, state::AppState};

fn app(state: Arc<AppState>, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/", get(routes::index))
        .route("/analyze", post(routes::analyze))
        .route("/charts/:name", get(routes::chart))
        .route("/video", get(routes::video))
        .route("/healthz", get(routes::healthz))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Drop idle sessions and processed files past their lifetime.
fn spawn_purge_task(state: Arc<AppState>, every: std::time::Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        loop {
            ticker.tick().await;
            let sessions = state.sessions.purge_expired();
            let files = state.analyzer.processor().evict_expired().await;
            if sessions > 0 || files > 0 {
                tracing::info!(sessions, files, "purged expired state");
            }
        }
    });
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug")),
        )
        .init();

    let web = WebConfig::from_env();
    let analyzer_config = AnalyzerConfig::from_env();
    let analyzer = Analyzer::from_config(&analyzer_config)?;
    tracing::info!(
        model = %analyzer_config.provider.model,
        max_upload_bytes = web.max_upload_bytes,
        "analyzer ready"
    );

    let state = Arc::new(AppState {
        analyzer,
        sessions: SessionStore::new(web.session_ttl),
    });
    spawn_purge_task(Arc::clone(&state), web.purge_interval);

    let listener = tokio::net::TcpListener::bind(web.bind).await?;
    tracing::info!("Listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app(state, web.max_upload_bytes)).await?;

    Ok(())
}
