use std::sync::Arc;

use axum_test::TestServer;
use serde_json::json;
use tokio::time::Duration;
use wiremock::ResponseTemplate;

use crate::cache::{ArtifactCache, CacheSettings};
use crate::config::ProviderConfig;
use crate::image_processing::InlineImage;
use crate::orchestrator::Orchestrator;
use crate::provider::{Provider, TimeoutBudgets};
use crate::server::router;

/// 1x1 transparent PNG.
pub const SAMPLE_IMAGE_BASE64: &str =
    "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNk+M9QDwADhgGAWjR9awAAAABJRU5ErkJggg==";

pub const ANALYSIS_PATH: &str = "/v1beta/models/test-analysis:generateContent";
pub const IMAGE_PATH: &str = "/v1beta/models/test-image:generateContent";

pub fn sample_image() -> InlineImage {
    InlineImage::from_base64(SAMPLE_IMAGE_BASE64, Some("png")).unwrap()
}

pub fn provider_config(base_url: &str) -> ProviderConfig {
    ProviderConfig {
        api_key: Some("test-key".to_string()),
        base_url: base_url.to_string(),
        analysis_model: "test-analysis".to_string(),
        image_model: "test-image".to_string(),
        budgets: TimeoutBudgets::uniform(Duration::from_secs(5)),
        ..Default::default()
    }
}

pub fn available_provider(base_url: &str) -> Provider {
    let provider = Provider::from_config(&provider_config(base_url));
    assert!(provider.is_available());
    provider
}

pub fn unavailable_orchestrator() -> Orchestrator {
    Orchestrator::new(ArtifactCache::new(CacheSettings::default()), Provider::Unavailable)
}

pub fn test_server(orchestrator: Orchestrator) -> TestServer {
    TestServer::new(router(Arc::new(orchestrator), 50 * 1024 * 1024)).unwrap()
}

pub fn image_reply(data_base64: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "candidates": [{ "content": { "parts": [
            { "inlineData": { "mimeType": "image/png", "data": data_base64 } }
        ] } }]
    }))
}

pub fn text_reply(text: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "candidates": [{ "content": { "parts": [{ "text": text }] } }]
    }))
}
