use std::sync::Arc;

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};

use crate::orchestrator::Orchestrator;

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub provider: String,
    pub cached_artifacts: usize,
}

pub async fn health(State(orchestrator): State<Arc<Orchestrator>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        provider: orchestrator.provider().status_label().to_string(),
        cached_artifacts: orchestrator.cache().count(),
    })
}
