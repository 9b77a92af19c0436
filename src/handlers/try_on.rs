use std::sync::Arc;

use axum::{Json, extract::State, extract::rejection::JsonRejection};
use serde::{Deserialize, Serialize};

use crate::{error::AppError, handlers::ImageResponse, orchestrator::Orchestrator};

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualTryOnRequest {
    #[serde(alias = "avatarImageBase64")]
    pub avatar_image: String,
    #[serde(alias = "itemImages")]
    pub images: Vec<String>,
}

pub async fn virtual_try_on(
    State(orchestrator): State<Arc<Orchestrator>>,
    payload: Result<Json<VirtualTryOnRequest>, JsonRejection>,
) -> Result<Json<ImageResponse>, AppError> {
    let Json(request) = payload?;
    let generated = orchestrator
        .virtual_try_on(&request.avatar_image, &request.images)
        .await?;
    Ok(Json(generated.into()))
}
