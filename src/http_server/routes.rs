//! Dataset and query HTTP routes
//!
//! Success bodies are `{"result": ...}`, failures `{"error": ..., "code": ...}`.

use std::str::FromStr;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use serde_json::{json, Value};

use crate::api::{EngineError, QueryEngine};
use crate::catalog::DatasetKind;
use crate::storage::DatasetStore;

/// State shared across handlers
pub struct AppState {
    pub engine: QueryEngine<DatasetStore>,
}

impl AppState {
    pub fn new(engine: QueryEngine<DatasetStore>) -> Self {
        Self { engine }
    }
}

/// Create the API routes
pub fn api_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/dataset/:id/:kind", put(add_dataset_handler))
        .route("/dataset/:id", delete(remove_dataset_handler))
        .route("/datasets", get(list_datasets_handler))
        .route("/query", post(query_handler))
        .route("/metrics", get(metrics_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl ApiError {
    fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            code,
            message: message.into(),
        }
    }
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        let status = if err.is_not_found() {
            StatusCode::NOT_FOUND
        } else if err.is_rejection() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        Self {
            status,
            code: err.code(),
            message: err.message(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(json!({"error": self.message, "code": self.code})),
        )
            .into_response()
    }
}

fn parse_body(body: &Bytes) -> Result<Value, ApiError> {
    serde_json::from_slice(body)
        .map_err(|e| ApiError::bad_request("INSIGHT_MALFORMED_BODY", format!("body is not valid JSON: {}", e)))
}

async fn add_dataset_handler(
    State(state): State<Arc<AppState>>,
    Path((id, kind)): Path<(String, String)>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let kind = DatasetKind::from_str(&kind)
        .map_err(|reason| ApiError::bad_request("INSIGHT_INVALID_DATASET_KIND", reason))?;
    let rows = match parse_body(&body)? {
        Value::Array(rows) => rows,
        other => {
            return Err(ApiError::bad_request(
                "INSIGHT_MALFORMED_BODY",
                format!("dataset body must be a JSON array, got {}", other),
            ));
        }
    };

    let ids = state.engine.add_dataset(&id, kind, &rows)?;
    Ok(Json(json!({"result": ids})))
}

async fn remove_dataset_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let removed = state.engine.remove_dataset(&id)?;
    Ok(Json(json!({"result": removed})))
}

async fn list_datasets_handler(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({"result": state.engine.list_datasets()}))
}

async fn query_handler(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let query = parse_body(&body)?;
    // Every query failure is the caller's, including an unknown dataset
    let rows = state.engine.perform_query(&query).await.map_err(|err| ApiError {
        status: StatusCode::BAD_REQUEST,
        code: err.code(),
        message: err.message(),
    })?;
    Ok(Json(json!({"result": rows})))
}

async fn metrics_handler(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({"result": state.engine.metrics().snapshot()}))
}

async fn health_handler() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({"status": "ok", "version": env!("CARGO_PKG_VERSION")})),
    )
}
