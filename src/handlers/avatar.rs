use std::sync::Arc;

use axum::{Json, extract::State, extract::rejection::JsonRejection};
use serde::{Deserialize, Serialize};

use crate::{
    error::AppError,
    handlers::ImageResponse,
    orchestrator::Orchestrator,
    provider::AvatarMetrics,
};

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateAvatarRequest {
    #[serde(alias = "faceImageBase64")]
    pub face_image: String,
    #[serde(default, alias = "mimeType")]
    pub media_subtype: Option<String>,
    #[serde(flatten)]
    pub metrics: AvatarMetrics,
}

pub async fn generate_avatar(
    State(orchestrator): State<Arc<Orchestrator>>,
    payload: Result<Json<GenerateAvatarRequest>, JsonRejection>,
) -> Result<Json<ImageResponse>, AppError> {
    let Json(request) = payload?;
    let generated = orchestrator
        .generate_avatar(
            &request.face_image,
            request.media_subtype.as_deref(),
            &request.metrics,
        )
        .await?;
    Ok(Json(generated.into()))
}
