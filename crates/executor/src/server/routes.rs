use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use tracing::error;

use super::{payload::AlertPayload, Server};

pub async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "healthy" }))
}

pub async fn metrics() -> String {
    crate::metrics::gather_metrics()
}

pub async fn handle_alert(
    State(server): State<Arc<Server>>,
    payload: Result<Json<AlertPayload>, JsonRejection>,
) -> Response {
    // Validation failures never reach the dispatcher; they get the
    // structured error envelope instead of axum's plain-text reply.
    let Json(payload) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            error!("Request validation failed: {}", rejection.body_text());
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "status": "error",
                    "detail": rejection.body_text(),
                })),
            )
                .into_response();
        }
    };

    match server.dispatcher.dispatch(&payload).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => {
            error!("Error while processing alert batch: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Internal Server Error" })),
            )
                .into_response()
        }
    }
}
