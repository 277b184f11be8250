//! Toxic Comment Analyzer — Binary Entrypoint
//! Boots the Axum HTTP server, wiring routes, shared state, and middleware.
//!
//! See `README.md` for quickstart and the expected artifact layout.

use std::path::PathBuf;

use anyhow::Context;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use toxic_comment_analyzer::api::{self, AppState};
use toxic_comment_analyzer::engine::ToxicityEngine;
use toxic_comment_analyzer::metrics::Metrics;
use toxic_comment_analyzer::store::CommentStore;

const ENV_MODEL_DIR: &str = "TOXIC_MODEL_DIR";
const ENV_DB_PATH: &str = "TOXIC_DB_PATH";
const ENV_BIND_ADDR: &str = "TOXIC_BIND_ADDR";

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    init_tracing();

    // Inference artifacts load exactly once, before the listener binds. A
    // missing or corrupt artifact keeps the process from serving at all.
    let model_dir = PathBuf::from(env_or(ENV_MODEL_DIR, "artifacts"));
    let engine = ToxicityEngine::load(&model_dir)
        .with_context(|| format!("load inference artifacts from {}", model_dir.display()))?;
    tracing::info!(model_dir = %model_dir.display(), "inference artifacts loaded");

    let db_path = PathBuf::from(env_or(ENV_DB_PATH, "data/comments.db"));
    let store = CommentStore::open(&db_path)
        .with_context(|| format!("open comment store at {}", db_path.display()))?;

    let metrics = Metrics::init();
    let state = AppState::new(engine, store);
    let router = api::router(state).merge(metrics.router());

    let addr = env_or(ENV_BIND_ADDR, "0.0.0.0:8000");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("bind {addr}"))?;
    tracing::info!(%addr, "toxic comment analyzer listening");
    axum::serve(listener, router).await.context("serve http")?;

    Ok(())
}
