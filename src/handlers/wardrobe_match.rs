use std::sync::Arc;

use axum::{Json, extract::State, extract::rejection::JsonRejection};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{error::AppError, orchestrator::Orchestrator, provider::WardrobeMatch};

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchRequest {
    #[serde(alias = "imageBase64")]
    pub image: String,
    #[serde(default, alias = "mimeType")]
    pub media_subtype: Option<String>,
    /// Existing wardrobe items, forwarded to the provider as-is.
    #[serde(default, alias = "existingItems")]
    pub items: Vec<Value>,
}

pub async fn match_in_wardrobe(
    State(orchestrator): State<Arc<Orchestrator>>,
    payload: Result<Json<MatchRequest>, JsonRejection>,
) -> Result<Json<WardrobeMatch>, AppError> {
    let Json(request) = payload?;
    let found = orchestrator
        .match_in_wardrobe(&request.image, request.media_subtype.as_deref(), &request.items)
        .await?;
    Ok(Json(found))
}
