//! HTTP request handlers

use super::types::{ErrorResponse, HealthResponse, WebhookForm};
use super::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Inbound messages from the messaging provider
        .route("/webhook", post(receive_message))
        .route("/health", get(health))
        .with_state(state)
}

// ============================================================
// Webhook
// ============================================================

async fn receive_message(
    State(state): State<AppState>,
    Form(form): Form<WebhookForm>,
) -> Result<StatusCode, AppError> {
    tracing::info!(phone = %form.from, body = %form.body, "Inbound message");

    state
        .runtime
        .dispatch(&form.from, form.body)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(StatusCode::NO_CONTENT)
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

// ============================================================
// Error Handling
// ============================================================

#[derive(Debug)]
enum AppError {
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Internal(detail) => {
                // Details stay in the logs; the caller gets a generic body
                tracing::error!(error = %detail, "Webhook processing failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
            }
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}
