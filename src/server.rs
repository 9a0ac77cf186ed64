//! HTTP surface of the authority service.

use std::sync::Arc;

use axum::extract::{Form, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use axum::Router;
use serde::Deserialize;
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::protocol::{self, QueryReply, Report};
use crate::registry::Registry;
use crate::Error;

#[derive(Debug, Clone)]
pub struct AppState {
    registry: Arc<Registry>,
    key: Arc<str>,
}

impl AppState {
    pub fn new(registry: Arc<Registry>, key: &str) -> Self {
        Self {
            registry,
            key: key.into(),
        }
    }

    fn key_matches(&self, supplied: Option<&str>) -> bool {
        supplied == Some(&*self.key)
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(query).post(report))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct QueryParams {
    key: Option<String>,
}

fn rejection(body: impl Into<String>) -> Response {
    (StatusCode::SERVICE_UNAVAILABLE, body.into()).into_response()
}

async fn query(State(state): State<AppState>, Query(params): Query<QueryParams>) -> Response {
    if !state.key_matches(params.key.as_deref()) {
        warn!("Query with invalid key");
        return rejection(protocol::INVALID_KEY);
    }
    let holder = state.registry.query().await;
    Json(QueryReply::from_holder(holder)).into_response()
}

async fn report(State(state): State<AppState>, Form(report): Form<Report>) -> Response {
    if !state.key_matches(report.key.as_deref()) {
        warn!("Report with invalid key");
        return rejection(protocol::INVALID_KEY);
    }
    match report.message.as_deref() {
        Some(protocol::MESSAGE_STOPPED) => {
            state.registry.release().await;
            StatusCode::OK.into_response()
        }
        Some(protocol::MESSAGE_STARTED) => {
            let Some(identity) = report.ip.filter(|ip| !ip.is_empty()) else {
                return rejection(protocol::NO_IP);
            };
            match state.registry.acquire(&identity).await {
                Ok(()) => StatusCode::OK.into_response(),
                Err(Error::AlreadyRunning { holder }) => {
                    rejection(protocol::already_running(&holder))
                }
                Err(e) => {
                    warn!("Acquire failed: {}", e);
                    rejection(e.to_string())
                }
            }
        }
        _ => rejection(protocol::NO_MESSAGE),
    }
}
