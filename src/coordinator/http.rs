//! HTTP API for the coordinator
//!
//! - `POST /`: record a submission (form field `text`)
//! - `GET /`: listing page
//! - `GET /health`: store reachability and message count

use axum::{
    extract::{rejection::FormRejection, ConnectInfo, State},
    http::{header, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Form, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::net::SocketAddr;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::limit::RequestBodyLimitLayer;

use crate::common::tracing_middleware::request_tracing_middleware;
use crate::coordinator::handlers::{self, Reply, SubmitRequest};
use crate::coordinator::store::MessageStore;

/// Largest accepted request body
pub const BODY_LIMIT_BYTES: usize = 16 * 1024;

/// Shared state for all routes
#[derive(Clone)]
pub struct CoordState {
    pub store: MessageStore,
}

impl IntoResponse for Reply {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (
            status,
            [(header::CONTENT_TYPE, self.content_type.mime())],
            self.body,
        )
            .into_response()
    }
}

#[derive(Debug, Deserialize)]
struct SubmitForm {
    text: Option<String>,
}

/// Creates the HTTP router with all public endpoints.
pub fn create_router(state: CoordState) -> Router {
    Router::new()
        .route("/", get(display_text).post(receive_text))
        .route("/health", get(health))
        .layer(middleware::from_fn(request_tracing_middleware))
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT_BYTES))
        .layer(CatchPanicLayer::new())
        .with_state(state)
}

async fn receive_text(
    State(state): State<CoordState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    form: Result<Form<SubmitForm>, FormRejection>,
) -> Reply {
    // An unparseable body is treated like a missing field
    let text = match form {
        Ok(Form(form)) => form.text,
        Err(rejection) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => {
            return Reply::text(413, "Request body too large");
        }
        Err(_) => None,
    };
    let request = SubmitRequest {
        text,
        source_address: addr.ip().to_string(),
    };
    handlers::receive_text(&state.store, request).await
}

async fn display_text(State(state): State<CoordState>) -> Reply {
    handlers::display_text(&state.store).await
}

/// Health check: reports whether the store answers and how many messages it holds.
async fn health(State(state): State<CoordState>) -> impl IntoResponse {
    match state.store.count().await {
        Ok(messages) => (
            StatusCode::OK,
            axum::Json(json!({
                "status": "healthy",
                "messages": messages,
                "version": env!("CARGO_PKG_VERSION"),
            })),
        ),
        Err(e) => {
            tracing::error!(error = %e, "Health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                axum::Json(json!({
                    "status": "unavailable",
                    "version": env!("CARGO_PKG_VERSION"),
                })),
            )
        }
    }
}
