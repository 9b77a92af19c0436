use std::sync::Arc;

use axum::{Json, extract::State, extract::rejection::JsonRejection};
use serde::{Deserialize, Serialize};

use crate::{
    error::AppError,
    orchestrator::{Orchestrator, StagedImage},
};

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateCutoutRequest {
    #[serde(alias = "imageBase64")]
    pub image: String,
    #[serde(default, alias = "mimeType")]
    pub media_subtype: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefineCutoutRequest {
    pub cache_id: String,
    #[serde(alias = "currentImageBase64")]
    pub current_image: String,
    #[serde(alias = "userFeedback")]
    pub feedback: String,
    #[serde(default, alias = "mimeType")]
    pub media_subtype: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClearCacheRequest {
    pub cache_id: String,
}

/// `cache_id` must be sent back on the next refine call. It is `null` when no
/// session was opened (placeholder output).
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CutoutResponse {
    pub image: String,
    pub cache_id: Option<String>,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ClearCacheResponse {
    pub success: bool,
    pub message: String,
}

impl From<StagedImage> for CutoutResponse {
    fn from(staged: StagedImage) -> Self {
        Self {
            image: staged.image.to_base64(),
            cache_id: staged.cache_id,
            message: staged.message,
        }
    }
}

pub async fn generate_cutout(
    State(orchestrator): State<Arc<Orchestrator>>,
    payload: Result<Json<GenerateCutoutRequest>, JsonRejection>,
) -> Result<Json<CutoutResponse>, AppError> {
    let Json(request) = payload?;
    let staged = orchestrator
        .generate_cutout(&request.image, request.media_subtype.as_deref())
        .await?;
    Ok(Json(staged.into()))
}

pub async fn refine_cutout(
    State(orchestrator): State<Arc<Orchestrator>>,
    payload: Result<Json<RefineCutoutRequest>, JsonRejection>,
) -> Result<Json<CutoutResponse>, AppError> {
    let Json(request) = payload?;
    if request.cache_id.trim().is_empty() {
        return Err(AppError::bad_request("cacheId must not be empty"));
    }
    if request.feedback.trim().is_empty() {
        return Err(AppError::bad_request("feedback must not be empty"));
    }
    let staged = orchestrator
        .refine_cutout(
            request.cache_id.trim(),
            &request.current_image,
            &request.feedback,
            request.media_subtype.as_deref(),
        )
        .await?;
    Ok(Json(staged.into()))
}

pub async fn clear_cache(
    State(orchestrator): State<Arc<Orchestrator>>,
    payload: Result<Json<ClearCacheRequest>, JsonRejection>,
) -> Result<Json<ClearCacheResponse>, AppError> {
    let Json(request) = payload?;
    let success = orchestrator.clear_session(request.cache_id.trim());
    let message = if success {
        "Image session cleared"
    } else {
        "Image session already cleared or expired"
    };
    Ok(Json(ClearCacheResponse {
        success,
        message: message.to_string(),
    }))
}
