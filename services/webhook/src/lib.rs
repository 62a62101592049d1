pub mod error;
pub mod jira;
pub mod reconcile;
pub mod webhook;

use std::sync::Arc;

use axum::{routing::get, Json, Router};
use storybot_common::types::ServiceInfo;

use crate::jira::tracker::Tracker;
use crate::reconcile::ReconcileSettings;

pub const SERVICE_NAME: &str = "storybot-webhook";

/// Shared by all requests; holds no per-request state.
#[derive(Clone)]
pub struct AppState {
    pub tracker: Arc<dyn Tracker>,
    pub settings: Arc<ReconcileSettings>,
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn info() -> Json<ServiceInfo> {
    Json(ServiceInfo::new(SERVICE_NAME, env!("CARGO_PKG_VERSION")))
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/info", get(info))
        .merge(webhook::router())
        .with_state(state)
}
