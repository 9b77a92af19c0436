use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tokio::time::{Duration, Instant};

use crate::config::ProviderConfig;
use crate::image_processing::{InlineImage, resolve_mime_type};
use crate::provider::prompts;
use crate::provider::types::{AvatarMetrics, ClothingAnalysis, WardrobeMatch};
use crate::provider::{Operation, ProviderError, RefineAnalysisMode, TimeoutBudgets};

const API_KEY_HEADER: &str = "x-goog-api-key";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const ANALYSIS_TEMPERATURE: f64 = 0.3;

async fn assert_ok_response(response: reqwest::Response) -> Result<reqwest::Response, ProviderError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    Err(ProviderError::Status { status, body })
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    parts: Option<Vec<Part>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    text: Option<String>,
    #[serde(alias = "inline_data")]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    #[serde(alias = "mime_type")]
    mime_type: Option<String>,
    data: String,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: Option<String>,
}

impl GenerateContentResponse {
    fn into_parts(self) -> Result<Vec<Part>, ProviderError> {
        if let Some(message) = self.error.and_then(|error| error.message) {
            return Err(ProviderError::Api(message));
        }
        let candidate = self
            .candidates
            .and_then(|candidates| candidates.into_iter().next())
            .ok_or(ProviderError::NoCandidates)?;
        Ok(candidate
            .content
            .and_then(|content| content.parts)
            .unwrap_or_default())
    }

    fn first_text(self) -> Result<String, ProviderError> {
        self.into_parts()?
            .into_iter()
            .find_map(|part| part.text.filter(|text| !text.trim().is_empty()))
            .ok_or(ProviderError::NoText)
    }

    fn first_image(self) -> Result<InlineImage, ProviderError> {
        let data = self
            .into_parts()?
            .into_iter()
            .find_map(|part| part.inline_data)
            .ok_or(ProviderError::NoImage)?;
        let bytes = crate::image_processing::decode_base64_image(&data.data)?;
        let mime_type = resolve_mime_type(data.mime_type.as_deref(), &bytes);
        Ok(InlineImage { bytes, mime_type })
    }
}

/// Removes a surrounding markdown code fence (```json ... ```), if any.
pub fn strip_code_fences(text: &str) -> &str {
    let mut text = text.trim();
    if let Some(rest) = text.strip_prefix("```json") {
        text = rest;
    } else if let Some(rest) = text.strip_prefix("```") {
        text = rest;
    }
    if let Some(rest) = text.strip_suffix("```") {
        text = rest;
    }
    text.trim()
}

fn inline_part(image: &InlineImage) -> Value {
    json!({
        "inlineData": {
            "mimeType": image.mime_type,
            "data": image.to_base64(),
        }
    })
}

fn text_part(text: &str) -> Value {
    json!({ "text": text })
}

/// Client for a Gemini-style `generateContent` API.
///
/// Each public method maps to one [`Operation`] and runs under that
/// operation's deadline. Nothing is retried here.
#[derive(Clone)]
pub struct GeminiClient {
    http: Client,
    api_key: String,
    base_url: String,
    analysis_model: String,
    image_model: String,
    budgets: TimeoutBudgets,
    refine_fallback: RefineAnalysisMode,
}

impl GeminiClient {
    pub fn new(api_key: &str, config: &ProviderConfig) -> Result<Self, ProviderError> {
        let http = Client::builder().connect_timeout(CONNECT_TIMEOUT).build()?;
        Ok(Self {
            http,
            api_key: api_key.to_string(),
            base_url: config.base_url.clone(),
            analysis_model: config.analysis_model.clone(),
            image_model: config.image_model.clone(),
            budgets: config.budgets,
            refine_fallback: config.refine_fallback,
        })
    }

    fn endpoint(&self, model: &str) -> String {
        format!(
            "{}/v1beta/models/{model}:generateContent",
            self.base_url.trim_end_matches('/')
        )
    }

    async fn send(&self, model: &str, body: &Value) -> Result<GenerateContentResponse, ProviderError> {
        let response = self
            .http
            .post(self.endpoint(model))
            .header(API_KEY_HEADER, &self.api_key)
            .json(body)
            .send()
            .await?;
        let response = assert_ok_response(response).await?;
        Ok(response.json().await?)
    }

    async fn call(
        &self,
        operation: Operation,
        model: &str,
        body: Value,
    ) -> Result<GenerateContentResponse, ProviderError> {
        let budget = self.budgets.for_operation(operation);
        let started = Instant::now();
        let outcome = tokio::time::timeout(budget, self.send(model, &body)).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;
        match outcome {
            Ok(Ok(response)) => {
                tracing::info!(%operation, model, elapsed_ms, "Provider call completed");
                Ok(response)
            }
            Ok(Err(err)) => {
                tracing::warn!(%operation, model, elapsed_ms, error = %err, "Provider call failed");
                Err(err)
            }
            Err(_) => {
                tracing::warn!(%operation, model, budget_secs = budget.as_secs(), "Provider call timed out");
                Err(ProviderError::Timeout { operation, budget })
            }
        }
    }

    async fn structured<T: DeserializeOwned>(
        &self,
        operation: Operation,
        parts: Vec<Value>,
    ) -> Result<T, ProviderError> {
        let body = json!({
            "contents": [{ "role": "user", "parts": parts }],
            "generationConfig": {
                "temperature": ANALYSIS_TEMPERATURE,
                "responseMimeType": "application/json",
            }
        });
        let text = self
            .call(operation, &self.analysis_model, body)
            .await?
            .first_text()?;
        Ok(serde_json::from_str(strip_code_fences(&text))?)
    }

    async fn image(&self, operation: Operation, parts: Vec<Value>) -> Result<InlineImage, ProviderError> {
        let body = json!({
            "contents": [{ "role": "user", "parts": parts }],
            "generationConfig": {
                "responseModalities": ["TEXT", "IMAGE"],
            }
        });
        self.call(operation, &self.image_model, body)
            .await?
            .first_image()
    }

    pub async fn analyze(&self, image: &InlineImage) -> Result<ClothingAnalysis, ProviderError> {
        tracing::debug!(mime_type = %image.mime_type, size = image.bytes.len(), "Analyzing clothing image");
        let prompt = prompts::build_analysis_prompt();
        self.structured::<ClothingAnalysis>(Operation::Analyze, vec![inline_part(image), text_part(&prompt)])
            .await?
            .into_checked()
    }

    /// Re-analyzes with user feedback. In lenient mode any failure, including
    /// unparseable or off-vocabulary output, falls back to a plain
    /// [`analyze`](Self::analyze) under its own budget.
    pub async fn refine_analysis(
        &self,
        image: &InlineImage,
        feedback: &str,
        previous: Option<&ClothingAnalysis>,
    ) -> Result<ClothingAnalysis, ProviderError> {
        let prompt = prompts::build_refine_analysis_prompt(feedback, previous);
        let refined = self
            .structured::<ClothingAnalysis>(
                Operation::RefineAnalysis,
                vec![inline_part(image), text_part(&prompt)],
            )
            .await
            .and_then(ClothingAnalysis::into_checked);
        match (refined, self.refine_fallback) {
            (Ok(analysis), _) => Ok(analysis),
            (Err(err), RefineAnalysisMode::Lenient) => {
                tracing::warn!(error = %err, "Refine analysis failed, falling back to plain analysis");
                self.analyze(image).await
            }
            (Err(err), RefineAnalysisMode::Strict) => Err(err),
        }
    }

    pub async fn generate_cutout(&self, image: &InlineImage) -> Result<InlineImage, ProviderError> {
        tracing::debug!(mime_type = %image.mime_type, size = image.bytes.len(), "Generating cutout");
        self.image(
            Operation::Cutout,
            vec![inline_part(image), text_part(prompts::CUTOUT_PROMPT)],
        )
        .await
    }

    pub async fn refine_cutout(
        &self,
        original: &InlineImage,
        current: &InlineImage,
        feedback: &str,
    ) -> Result<InlineImage, ProviderError> {
        let prompt = prompts::build_refine_cutout_prompt(feedback);
        self.image(
            Operation::RefineCutout,
            vec![inline_part(original), inline_part(current), text_part(&prompt)],
        )
        .await
    }

    pub async fn generate_avatar(
        &self,
        face: &InlineImage,
        metrics: &AvatarMetrics,
    ) -> Result<InlineImage, ProviderError> {
        let prompt = prompts::build_avatar_prompt(metrics);
        self.image(Operation::Avatar, vec![inline_part(face), text_part(&prompt)])
            .await
    }

    pub async fn generate_collage(&self, items: &[InlineImage]) -> Result<InlineImage, ProviderError> {
        if items.is_empty() {
            return Err(ProviderError::NoValidImages);
        }
        let mut parts: Vec<Value> = items.iter().map(inline_part).collect();
        parts.push(text_part(prompts::COLLAGE_PROMPT));
        self.image(Operation::Collage, parts).await
    }

    pub async fn virtual_try_on(
        &self,
        avatar: &InlineImage,
        garments: &[InlineImage],
    ) -> Result<InlineImage, ProviderError> {
        if garments.is_empty() {
            return Err(ProviderError::NoValidImages);
        }
        let mut parts = Vec::with_capacity(garments.len() + 2);
        parts.push(inline_part(avatar));
        parts.extend(garments.iter().map(inline_part));
        parts.push(text_part(prompts::TRY_ON_PROMPT));
        self.image(Operation::TryOn, parts).await
    }

    /// Best effort: any failure yields an empty match.
    pub async fn match_in_wardrobe(&self, image: &InlineImage, items: &[Value]) -> WardrobeMatch {
        let items_json = serde_json::to_string(items).unwrap_or_else(|_| "[]".to_string());
        let prompt = prompts::build_wardrobe_match_prompt(&items_json);
        match self
            .structured(Operation::WardrobeMatch, vec![inline_part(image), text_part(&prompt)])
            .await
        {
            Ok(found) => found,
            Err(err) => {
                tracing::warn!(error = %err, "Wardrobe match failed, returning no match");
                WardrobeMatch::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::test::utils::{
        ANALYSIS_PATH, IMAGE_PATH, provider_config, sample_image, text_reply as text_response,
    };

    fn client_for(server: &MockServer) -> GeminiClient {
        GeminiClient::new("test-key", &provider_config(&server.uri())).unwrap()
    }

    #[test]
    fn strips_markdown_fences() {
        assert_eq!(strip_code_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("```\n{}\n```"), "{}");
        assert_eq!(strip_code_fences("  {\"a\":1} "), "{\"a\":1}");
    }

    #[tokio::test]
    async fn analyze_parses_fenced_json_and_sends_credentials() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(ANALYSIS_PATH))
            .and(header(API_KEY_HEADER, "test-key"))
            .respond_with(text_response(
                "```json\n{\"category\":\"Bottoms\",\"color\":\"Blue\",\"material\":\"Denim\",\
\"description\":\"Straight-leg jeans.\",\"tags\":[\"jeans\"],\"style\":[\"Casual\"],\"season\":[\"Fall\"]}\n```",
            ))
            .expect(1)
            .mount(&server)
            .await;

        let analysis = client_for(&server).analyze(&sample_image()).await.unwrap();
        assert_eq!(analysis.category, "Bottoms");
        assert_eq!(analysis.material, "Denim");
        assert_eq!(analysis.season, vec!["Fall".to_string()]);
    }

    #[tokio::test]
    async fn analyze_rejects_non_json_output() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(ANALYSIS_PATH))
            .respond_with(text_response("I think this is a shirt."))
            .mount(&server)
            .await;

        let err = client_for(&server).analyze(&sample_image()).await.unwrap_err();
        assert!(matches!(err, ProviderError::Parse(_)), "{err:?}");
    }

    #[tokio::test]
    async fn analyze_rejects_labels_outside_the_vocabulary() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(ANALYSIS_PATH))
            .respond_with(text_response(
                "{\"category\":\"T-Shirt\",\"color\":\"Blue\",\"material\":\"Cotton\"}",
            ))
            .mount(&server)
            .await;

        let err = client_for(&server).analyze(&sample_image()).await.unwrap_err();
        assert!(
            matches!(err, ProviderError::OffVocabulary { field: "category", ref value } if value == "T-Shirt"),
            "{err:?}"
        );
    }

    #[tokio::test]
    async fn analyze_rejects_objects_missing_closed_fields() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(ANALYSIS_PATH))
            .respond_with(text_response("{\"category\":\"T-Shirt\",\"colour\":\"blu\"}"))
            .mount(&server)
            .await;

        let err = client_for(&server).analyze(&sample_image()).await.unwrap_err();
        assert!(matches!(err, ProviderError::Parse(_)), "{err:?}");
    }

    #[tokio::test]
    async fn non_success_status_is_classified() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("quota exceeded"))
            .mount(&server)
            .await;

        let err = client_for(&server).analyze(&sample_image()).await.unwrap_err();
        match err {
            ProviderError::Status { status, body } => {
                assert_eq!(status.as_u16(), 429);
                assert_eq!(body, "quota exceeded");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn slow_provider_hits_the_deadline() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(text_response("{}").set_delay(Duration::from_secs(5)))
            .mount(&server)
            .await;

        let mut config = provider_config(&server.uri());
        config.budgets = TimeoutBudgets::uniform(Duration::from_millis(100));
        let client = GeminiClient::new("test-key", &config).unwrap();

        let err = client.analyze(&sample_image()).await.unwrap_err();
        assert!(err.is_timeout());
        assert!(matches!(err, ProviderError::Timeout { operation: Operation::Analyze, .. }));
    }

    #[tokio::test]
    async fn image_result_uses_first_inline_part() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(IMAGE_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{ "content": { "parts": [
                    { "text": "Here is your cutout" },
                    { "inlineData": { "mimeType": "image/png", "data": "Zmlyc3Q=" } },
                    { "inlineData": { "mimeType": "image/png", "data": "c2Vjb25k" } }
                ] } }]
            })))
            .mount(&server)
            .await;

        let output = client_for(&server).generate_cutout(&sample_image()).await.unwrap();
        assert_eq!(output.bytes, b"first");
        assert_eq!(output.mime_type, "image/png");
    }

    #[tokio::test]
    async fn image_result_without_binary_part_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(IMAGE_PATH))
            .respond_with(text_response("I can't draw that"))
            .mount(&server)
            .await;

        let err = client_for(&server).generate_cutout(&sample_image()).await.unwrap_err();
        assert!(matches!(err, ProviderError::NoImage), "{err:?}");
    }

    #[tokio::test]
    async fn empty_candidate_list_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "candidates": [] })))
            .mount(&server)
            .await;

        let err = client_for(&server).generate_avatar(&sample_image(), &AvatarMetrics::default()).await.unwrap_err();
        assert!(matches!(err, ProviderError::NoCandidates), "{err:?}");
    }

    #[tokio::test]
    async fn collage_without_images_fails_before_calling() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;

        let err = client_for(&server).generate_collage(&[]).await.unwrap_err();
        assert!(matches!(err, ProviderError::NoValidImages));
    }

    #[tokio::test]
    async fn lenient_refine_falls_back_to_plain_analysis() {
        let server = MockServer::start().await;
        // Refine and plain analysis hit the same endpoint; the first call fails.
        Mock::given(method("POST"))
            .and(path(ANALYSIS_PATH))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(ANALYSIS_PATH))
            .respond_with(text_response("{\"category\":\"Tops\",\"color\":\"Red\",\"material\":\"Silk\"}"))
            .mount(&server)
            .await;

        let analysis = client_for(&server)
            .refine_analysis(&sample_image(), "it is red", None)
            .await
            .unwrap();
        assert_eq!(analysis.color, "Red");
        assert!(analysis.tags.is_empty());
    }

    #[tokio::test]
    async fn lenient_refine_falls_back_on_off_vocabulary_output() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(ANALYSIS_PATH))
            .respond_with(text_response(
                "{\"category\":\"Jumper\",\"color\":\"Teal\",\"material\":\"Wool\"}",
            ))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(ANALYSIS_PATH))
            .respond_with(text_response("{\"category\":\"Tops\",\"color\":\"green\",\"material\":\"Wool\"}"))
            .mount(&server)
            .await;

        let analysis = client_for(&server)
            .refine_analysis(&sample_image(), "it is a green sweater", None)
            .await
            .unwrap();
        assert_eq!(analysis.category, "Tops");
        assert_eq!(analysis.color, "Green");
    }

    #[tokio::test]
    async fn strict_refine_surfaces_the_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&server)
            .await;

        let mut config = provider_config(&server.uri());
        config.refine_fallback = RefineAnalysisMode::Strict;
        let client = GeminiClient::new("test-key", &config).unwrap();

        let err = client.refine_analysis(&sample_image(), "wool", None).await.unwrap_err();
        assert!(matches!(err, ProviderError::Status { .. }));
    }

    #[tokio::test]
    async fn wardrobe_match_degrades_to_empty() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(text_response("not json"))
            .mount(&server)
            .await;

        let found = client_for(&server)
            .match_in_wardrobe(&sample_image(), &[json!({"id": "a"})])
            .await;
        assert_eq!(found, WardrobeMatch::default());
    }
}
