use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::CorsLayer;

use crate::engine::{ScoredRow, ToxicityEngine};
use crate::metrics;
use crate::model::Prediction;
use crate::store::CommentStore;

#[derive(Clone)]
pub struct AppState {
    engine: Arc<ToxicityEngine>,
    store: Arc<CommentStore>,
}

impl AppState {
    pub fn new(engine: ToxicityEngine, store: CommentStore) -> Self {
        Self {
            engine: Arc::new(engine),
            store: Arc::new(store),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/predict", post(predict))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(serde::Deserialize)]
struct PredictReq {
    text: String,
}

#[derive(serde::Serialize)]
struct PredictResp {
    text: String,
    predictions: Prediction,
    is_toxic: bool,
    rows: BTreeMap<i64, ScoredRow>,
}

/// Classify the submitted text, append it to the comment log, and return
/// the verdict together with the freshly rescored history.
async fn predict(
    State(state): State<AppState>,
    Json(body): Json<PredictReq>,
) -> Result<Json<PredictResp>, ApiError> {
    let outcome = state.engine.score_and_rescore(&state.store, &body.text)?;
    let is_toxic = outcome.prediction.is_toxic();
    metrics::record_predict(is_toxic);

    Ok(Json(PredictResp {
        text: body.text,
        predictions: outcome.prediction,
        is_toxic,
        rows: outcome.rows,
    }))
}

/// Request-level failure (persistence, in practice). The response is a bare
/// 500; no partial result leaves the handler.
pub struct ApiError(anyhow::Error);

impl<E: Into<anyhow::Error>> From<E> for ApiError {
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Never echo user text into logs; the error chain is enough.
        tracing::error!(error = %self.0, "predict request failed");
        (StatusCode::INTERNAL_SERVER_ERROR, "internal error").into_response()
    }
}
