//! Access to the external multimodal generation provider.
//!
//! The provider is optional: without a credential the process still serves
//! every endpoint, and callers see [`Provider::Unavailable`] and substitute
//! placeholder output.

pub mod gemini;
pub mod prompts;
pub mod types;

use std::fmt;
use std::str::FromStr;

use thiserror::Error;
use tokio::time::Duration;

use crate::config::ProviderConfig;
use crate::image_processing::DecodeError;

pub use gemini::GeminiClient;
pub use types::{AvatarMetrics, ClothingAnalysis, WardrobeMatch};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    Analyze,
    RefineAnalysis,
    Cutout,
    RefineCutout,
    Avatar,
    Collage,
    TryOn,
    WardrobeMatch,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Analyze => "analyze",
            Operation::RefineAnalysis => "refine_analysis",
            Operation::Cutout => "cutout",
            Operation::RefineCutout => "refine_cutout",
            Operation::Avatar => "avatar",
            Operation::Collage => "collage",
            Operation::TryOn => "try_on",
            Operation::WardrobeMatch => "wardrobe_match",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Deadline for a single provider call, per operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimeoutBudgets {
    pub analyze: Duration,
    pub refine_analysis: Duration,
    pub cutout: Duration,
    pub refine_cutout: Duration,
    pub avatar: Duration,
    pub collage: Duration,
    pub try_on: Duration,
    pub wardrobe_match: Duration,
}

impl TimeoutBudgets {
    pub fn uniform(budget: Duration) -> Self {
        Self {
            analyze: budget,
            refine_analysis: budget,
            cutout: budget,
            refine_cutout: budget,
            avatar: budget,
            collage: budget,
            try_on: budget,
            wardrobe_match: budget,
        }
    }

    pub fn for_operation(&self, operation: Operation) -> Duration {
        match operation {
            Operation::Analyze => self.analyze,
            Operation::RefineAnalysis => self.refine_analysis,
            Operation::Cutout => self.cutout,
            Operation::RefineCutout => self.refine_cutout,
            Operation::Avatar => self.avatar,
            Operation::Collage => self.collage,
            Operation::TryOn => self.try_on,
            Operation::WardrobeMatch => self.wardrobe_match,
        }
    }
}

impl Default for TimeoutBudgets {
    fn default() -> Self {
        Self {
            analyze: Duration::from_secs(30),
            refine_analysis: Duration::from_secs(30),
            cutout: Duration::from_secs(60),
            refine_cutout: Duration::from_secs(60),
            avatar: Duration::from_secs(90),
            collage: Duration::from_secs(60),
            try_on: Duration::from_secs(90),
            wardrobe_match: Duration::from_secs(30),
        }
    }
}

/// What refine-analysis does when the provider call fails.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RefineAnalysisMode {
    /// Re-run plain analysis and return that instead.
    #[default]
    Lenient,
    /// Surface the provider error.
    Strict,
}

impl FromStr for RefineAnalysisMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "lenient" => Ok(RefineAnalysisMode::Lenient),
            "strict" => Ok(RefineAnalysisMode::Strict),
            other => Err(format!("unknown refine analysis fallback mode: {other}")),
        }
    }
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("{operation} timed out after {}s", .budget.as_secs())]
    Timeout { operation: Operation, budget: Duration },

    #[error("request to provider failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("provider returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("provider reported an error: {0}")]
    Api(String),

    #[error("provider returned no candidates")]
    NoCandidates,

    #[error("provider returned no text content")]
    NoText,

    #[error("provider returned no image")]
    NoImage,

    #[error("provider returned malformed structured output: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("provider returned {field} {value:?} outside the allowed vocabulary")]
    OffVocabulary { field: &'static str, value: String },

    #[error("provider returned undecodable image data: {0}")]
    Decode(#[from] DecodeError),

    /// Raised before any request is made.
    #[error("no valid images provided")]
    NoValidImages,
}

impl ProviderError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, ProviderError::Timeout { .. })
    }
}

/// Provider capability, either configured or absent.
#[derive(Clone)]
pub enum Provider {
    Unavailable,
    Available(GeminiClient),
}

impl Provider {
    pub fn from_config(config: &ProviderConfig) -> Self {
        let Some(api_key) = config.api_key.as_deref() else {
            tracing::warn!("GEMINI_API_KEY not set, AI endpoints will return placeholder output");
            return Provider::Unavailable;
        };
        match GeminiClient::new(api_key, config) {
            Ok(client) => {
                tracing::info!(
                    analysis_model = %config.analysis_model,
                    image_model = %config.image_model,
                    "AI provider initialized"
                );
                Provider::Available(client)
            }
            Err(err) => {
                tracing::warn!(error = %err, "Failed to initialize AI provider, AI endpoints will return placeholder output");
                Provider::Unavailable
            }
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Provider::Available(_))
    }

    pub fn status_label(&self) -> &'static str {
        match self {
            Provider::Unavailable => "unconfigured",
            Provider::Available(_) => "configured",
        }
    }
}
