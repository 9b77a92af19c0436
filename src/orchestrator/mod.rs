//! Composes the provider client with the artifact cache.
//!
//! Refine protocol for cutouts:
//!
//! 1. `generate_cutout` stages the original in the cache, then asks the
//!    provider for a cutout. If the provider fails, or the request is dropped
//!    mid-flight, the staged entry is removed again.
//! 2. `refine_cutout` looks the original up by cache id and sends it together
//!    with the current cutout and the feedback. The id stays the same across
//!    rounds. An unknown or expired id is [`AppError::SessionExpired`].
//! 3. `clear_session` drops the staged original.
//!
//! Without a configured provider every operation returns placeholder output
//! and no network call is made.

pub mod placeholder;

use std::sync::Arc;

use serde_json::Value;

use crate::cache::{ArtifactCache, log_prefix};
use crate::error::AppError;
use crate::image_processing::InlineImage;
use crate::provider::{
    AvatarMetrics, ClothingAnalysis, Operation, Provider, WardrobeMatch,
};

/// A generated image that belongs to a refine session.
#[derive(Debug)]
pub struct StagedImage {
    pub image: InlineImage,
    pub cache_id: Option<String>,
    pub message: String,
}

#[derive(Debug)]
pub struct GeneratedImage {
    pub image: InlineImage,
    pub message: String,
}

#[derive(Clone)]
pub struct Orchestrator {
    cache: Arc<ArtifactCache>,
    provider: Provider,
}

fn decode_each(raw_images: &[String]) -> Vec<InlineImage> {
    raw_images
        .iter()
        .enumerate()
        .filter_map(|(index, raw)| match InlineImage::from_base64(raw, None) {
            Ok(image) => Some(image),
            Err(err) => {
                tracing::warn!(index, error = %err, "Skipping undecodable image");
                None
            }
        })
        .collect()
}

/// Staged original that is removed from the cache on drop unless committed.
struct StagedOriginal<'a> {
    cache: &'a ArtifactCache,
    cache_id: String,
    committed: bool,
}

impl<'a> StagedOriginal<'a> {
    fn stage(cache: &'a ArtifactCache, original: InlineImage) -> Self {
        let cache_id = cache.store(original);
        Self {
            cache,
            cache_id,
            committed: false,
        }
    }

    fn commit(mut self) -> String {
        self.committed = true;
        std::mem::take(&mut self.cache_id)
    }
}

impl Drop for StagedOriginal<'_> {
    fn drop(&mut self) {
        if !self.committed && self.cache.delete(&self.cache_id) {
            tracing::debug!(cache_id = %log_prefix(&self.cache_id), "Rolled back staged original");
        }
    }
}

impl Orchestrator {
    pub fn new(cache: Arc<ArtifactCache>, provider: Provider) -> Self {
        Self { cache, provider }
    }

    pub fn cache(&self) -> &Arc<ArtifactCache> {
        &self.cache
    }

    pub fn provider(&self) -> &Provider {
        &self.provider
    }

    pub async fn analyze(
        &self,
        image: &str,
        media_subtype: Option<&str>,
    ) -> Result<ClothingAnalysis, AppError> {
        let Provider::Available(client) = &self.provider else {
            return Ok(placeholder::analysis());
        };
        let image = InlineImage::from_base64(image, media_subtype)?;
        client
            .analyze(&image)
            .await
            .map_err(AppError::provider(Operation::Analyze))
    }

    pub async fn refine_analysis(
        &self,
        image: &str,
        media_subtype: Option<&str>,
        feedback: &str,
        previous: Option<&ClothingAnalysis>,
    ) -> Result<ClothingAnalysis, AppError> {
        let Provider::Available(client) = &self.provider else {
            return Ok(placeholder::refined_analysis());
        };
        let image = InlineImage::from_base64(image, media_subtype)?;
        client
            .refine_analysis(&image, feedback, previous)
            .await
            .map_err(AppError::provider(Operation::RefineAnalysis))
    }

    pub async fn generate_cutout(
        &self,
        image: &str,
        media_subtype: Option<&str>,
    ) -> Result<StagedImage, AppError> {
        let Provider::Available(client) = &self.provider else {
            return Ok(StagedImage {
                image: placeholder::image()?,
                cache_id: None,
                message: placeholder::message("Cutout generation"),
            });
        };

        let original = InlineImage::from_base64(image, media_subtype)?;
        let staged = StagedOriginal::stage(&self.cache, original.clone());

        let cutout = client
            .generate_cutout(&original)
            .await
            .map_err(AppError::provider(Operation::Cutout))?;
        let cache_id = staged.commit();
        tracing::info!(cache_id = %log_prefix(&cache_id), "Cutout generated, refine session open");
        Ok(StagedImage {
            image: cutout,
            cache_id: Some(cache_id),
            message: "Cutout generated successfully".to_string(),
        })
    }

    pub async fn refine_cutout(
        &self,
        cache_id: &str,
        current_image: &str,
        feedback: &str,
        media_subtype: Option<&str>,
    ) -> Result<StagedImage, AppError> {
        let Provider::Available(client) = &self.provider else {
            return Ok(StagedImage {
                image: placeholder::image()?,
                cache_id: Some(cache_id.to_string()),
                message: placeholder::message("Cutout refinement"),
            });
        };

        let Some(entry) = self.cache.get(cache_id) else {
            tracing::debug!(cache_id = %log_prefix(cache_id), "Refine requested for unknown or expired session");
            return Err(AppError::SessionExpired);
        };
        let current = InlineImage::from_base64(current_image, media_subtype)?;

        let refined = client
            .refine_cutout(&entry.payload, &current, feedback)
            .await
            .map_err(AppError::provider(Operation::RefineCutout))?;
        tracing::info!(
            cache_id = %log_prefix(cache_id),
            staged_at = %entry.created_at,
            age_secs = entry.age().as_secs(),
            "Cutout refined"
        );
        Ok(StagedImage {
            image: refined,
            cache_id: Some(entry.id.clone()),
            message: "Cutout refined successfully".to_string(),
        })
    }

    /// Ends a refine session. Returns whether a staged original was removed.
    pub fn clear_session(&self, cache_id: &str) -> bool {
        self.cache.delete(cache_id)
    }

    pub async fn generate_avatar(
        &self,
        face_image: &str,
        media_subtype: Option<&str>,
        metrics: &AvatarMetrics,
    ) -> Result<GeneratedImage, AppError> {
        let Provider::Available(client) = &self.provider else {
            return Ok(GeneratedImage {
                image: placeholder::image()?,
                message: placeholder::message("Avatar generation"),
            });
        };
        let face = InlineImage::from_base64(face_image, media_subtype)?;
        let avatar = client
            .generate_avatar(&face, metrics)
            .await
            .map_err(AppError::provider(Operation::Avatar))?;
        Ok(GeneratedImage {
            image: avatar,
            message: "Avatar generated successfully".to_string(),
        })
    }

    /// Undecodable entries are skipped; at least one must remain.
    pub async fn generate_collage(&self, images: &[String]) -> Result<GeneratedImage, AppError> {
        let Provider::Available(client) = &self.provider else {
            return Ok(GeneratedImage {
                image: placeholder::image()?,
                message: placeholder::message("Collage generation"),
            });
        };
        let items = decode_each(images);
        let collage = client
            .generate_collage(&items)
            .await
            .map_err(AppError::provider(Operation::Collage))?;
        Ok(GeneratedImage {
            image: collage,
            message: "Collage generated successfully".to_string(),
        })
    }

    pub async fn virtual_try_on(
        &self,
        avatar_image: &str,
        images: &[String],
    ) -> Result<GeneratedImage, AppError> {
        let Provider::Available(client) = &self.provider else {
            return Ok(GeneratedImage {
                image: placeholder::image()?,
                message: placeholder::message("Virtual try-on"),
            });
        };
        let avatar = InlineImage::from_base64(avatar_image, None)?;
        let garments = decode_each(images);
        let try_on = client
            .virtual_try_on(&avatar, &garments)
            .await
            .map_err(AppError::provider(Operation::TryOn))?;
        Ok(GeneratedImage {
            image: try_on,
            message: "Virtual try-on generated successfully".to_string(),
        })
    }

    pub async fn match_in_wardrobe(
        &self,
        image: &str,
        media_subtype: Option<&str>,
        items: &[Value],
    ) -> Result<WardrobeMatch, AppError> {
        let Provider::Available(client) = &self.provider else {
            return Ok(WardrobeMatch::default());
        };
        let image = InlineImage::from_base64(image, media_subtype)?;
        Ok(client.match_in_wardrobe(&image, items).await)
    }
}
