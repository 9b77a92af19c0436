use std::sync::Arc;

use axum::{Json, extract::State, extract::rejection::JsonRejection};
use serde::{Deserialize, Serialize};

use crate::{error::AppError, handlers::ImageResponse, orchestrator::Orchestrator};

#[derive(Debug, Serialize, Deserialize)]
pub struct GenerateCollageRequest {
    #[serde(alias = "itemImages")]
    pub images: Vec<String>,
}

pub async fn generate_collage(
    State(orchestrator): State<Arc<Orchestrator>>,
    payload: Result<Json<GenerateCollageRequest>, JsonRejection>,
) -> Result<Json<ImageResponse>, AppError> {
    let Json(request) = payload?;
    let generated = orchestrator.generate_collage(&request.images).await?;
    Ok(Json(generated.into()))
}
