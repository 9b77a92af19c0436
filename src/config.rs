use std::env;

use anyhow::{Result, anyhow};
use url::Url;

use crate::cache::CacheSettings;
use crate::provider::{RefineAnalysisMode, TimeoutBudgets};

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_BIND_HOST: &str = "0.0.0.0";
const DEFAULT_MAX_BODY_MB: usize = 50;
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_ANALYSIS_MODEL: &str = "gemini-3-flash-preview";
pub const DEFAULT_IMAGE_MODEL: &str = "gemini-3-pro-image-preview";

#[derive(Clone, Debug)]
pub struct ProviderConfig {
    /// `None` when no credential is configured; the provider is then unavailable.
    pub api_key: Option<String>,
    pub base_url: String,
    pub analysis_model: String,
    pub image_model: String,
    pub refine_fallback: RefineAnalysisMode,
    pub budgets: TimeoutBudgets,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            analysis_model: DEFAULT_ANALYSIS_MODEL.to_string(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
            refine_fallback: RefineAnalysisMode::default(),
            budgets: TimeoutBudgets::default(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub bind_address: String,
    pub max_body_bytes: usize,
    pub provider: ProviderConfig,
    pub cache: CacheSettings,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key lookup. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let port = get("PORT")
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(DEFAULT_PORT);
        let host = get("BIND_ADDRESS").unwrap_or_else(|| DEFAULT_BIND_HOST.to_string());
        let max_body_mb = get("MAX_BODY_MB")
            .and_then(|value| value.parse::<usize>().ok())
            .unwrap_or(DEFAULT_MAX_BODY_MB);

        let base_url = match get("GEMINI_BASE_URL") {
            Some(raw) => validate_http_url(&raw)?
                .as_str()
                .trim_end_matches('/')
                .to_string(),
            None => DEFAULT_BASE_URL.to_string(),
        };
        let refine_fallback = match get("REFINE_ANALYSIS_FALLBACK") {
            Some(raw) => raw.parse::<RefineAnalysisMode>().map_err(|err| anyhow!(err))?,
            None => RefineAnalysisMode::default(),
        };

        Ok(Self {
            bind_address: format!("{host}:{port}"),
            max_body_bytes: max_body_mb * 1024 * 1024,
            provider: ProviderConfig {
                api_key: get("GEMINI_API_KEY"),
                base_url,
                analysis_model: get("GEMINI_ANALYSIS_MODEL")
                    .unwrap_or_else(|| DEFAULT_ANALYSIS_MODEL.to_string()),
                image_model: get("GEMINI_IMAGE_MODEL")
                    .unwrap_or_else(|| DEFAULT_IMAGE_MODEL.to_string()),
                refine_fallback,
                budgets: TimeoutBudgets::default(),
            },
            cache: CacheSettings::default(),
        })
    }
}

pub fn validate_http_url(raw: &str) -> Result<Url> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(anyhow!("url must not be empty"));
    }
    let parsed = Url::parse(trimmed).map_err(|err| anyhow!("invalid url {trimmed}: {err}"))?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        scheme => Err(anyhow!("only http or https urls are allowed, got {scheme}")),
    }
}
