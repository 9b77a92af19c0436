pub mod analyze;
pub mod avatar;
pub mod collage;
pub mod cutout;
pub mod health;
pub mod try_on;
pub mod wardrobe_match;

use serde::Serialize;

use crate::orchestrator::GeneratedImage;

/// Response body for endpoints that return a single generated image.
#[derive(Debug, Serialize)]
pub struct ImageResponse {
    /// Base64 encoded image bytes.
    pub image: String,
    pub message: String,
}

impl From<GeneratedImage> for ImageResponse {
    fn from(generated: GeneratedImage) -> Self {
        Self {
            image: generated.image.to_base64(),
            message: generated.message,
        }
    }
}

pub use analyze::{AnalyzeRequest, RefineAnalysisRequest, analyze, refine_analysis};
pub use avatar::{GenerateAvatarRequest, generate_avatar};
pub use collage::{GenerateCollageRequest, generate_collage};
pub use cutout::{
    ClearCacheRequest, ClearCacheResponse, CutoutResponse, GenerateCutoutRequest,
    RefineCutoutRequest, clear_cache, generate_cutout, refine_cutout,
};
pub use health::{HealthResponse, health};
pub use try_on::{VirtualTryOnRequest, virtual_try_on};
pub use wardrobe_match::{MatchRequest, match_in_wardrobe};
