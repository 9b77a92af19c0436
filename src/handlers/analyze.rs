use std::sync::Arc;

use axum::{Json, extract::State, extract::rejection::JsonRejection};
use serde::{Deserialize, Serialize};

use crate::{error::AppError, orchestrator::Orchestrator, provider::ClothingAnalysis};

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    #[serde(alias = "imageBase64")]
    pub image: String,
    #[serde(default, alias = "mimeType")]
    pub media_subtype: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefineAnalysisRequest {
    #[serde(alias = "imageBase64")]
    pub image: String,
    #[serde(default, alias = "mimeType")]
    pub media_subtype: Option<String>,
    #[serde(alias = "userFeedback")]
    pub feedback: String,
    /// Result the feedback refers to, if the client still has it.
    #[serde(default)]
    pub previous_analysis: Option<ClothingAnalysis>,
}

pub async fn analyze(
    State(orchestrator): State<Arc<Orchestrator>>,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<Json<ClothingAnalysis>, AppError> {
    let Json(request) = payload?;
    let analysis = orchestrator
        .analyze(&request.image, request.media_subtype.as_deref())
        .await?;
    Ok(Json(analysis))
}

pub async fn refine_analysis(
    State(orchestrator): State<Arc<Orchestrator>>,
    payload: Result<Json<RefineAnalysisRequest>, JsonRejection>,
) -> Result<Json<ClothingAnalysis>, AppError> {
    let Json(request) = payload?;
    if request.feedback.trim().is_empty() {
        return Err(AppError::bad_request("feedback must not be empty"));
    }
    let analysis = orchestrator
        .refine_analysis(
            &request.image,
            request.media_subtype.as_deref(),
            &request.feedback,
            request.previous_analysis.as_ref(),
        )
        .await?;
    Ok(Json(analysis))
}
