use crate::{
    config::GeminiConfig,
    error::{GridError, Result},
    gemini::{response, ImageGenerator},
    logger::Timer,
    models::{
        AspectRatio, GenerateContentRequest, GenerationConfig, GenerationRequest,
        GenerationResult, ImageConfig, RequestContent, RequestPart,
    },
    prompt::{build_prompt, PromptParams},
};
use async_trait::async_trait;
use reqwest::Client;

const RESPONSE_MODALITIES: [&str; 2] = ["IMAGE", "TEXT"];

/// HTTP client for the `generateContent` image endpoint.
#[derive(Clone)]
pub struct GenerationClient {
    client: Client,
    config: GeminiConfig,
    api_key: String,
    base_url: String,
}

impl GenerationClient {
    pub fn new(config: GeminiConfig) -> Result<Self> {
        let api_key = config.api_key()?.to_string();
        let base_url = config.base_url();

        let client = Client::builder()
            .build()
            .map_err(|e| GridError::ConfigError(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            config,
            api_key,
            base_url,
        })
    }

    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }

    pub fn model(&self) -> &str {
        self.config.model()
    }

    pub fn build_request_body(
        parts: Vec<RequestPart>,
        image_size: &str,
        aspect_ratio: Option<&AspectRatio>,
    ) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![RequestContent { parts }],
            generation_config: GenerationConfig {
                response_modalities: RESPONSE_MODALITIES.iter().map(|m| m.to_string()).collect(),
                image_config: ImageConfig {
                    image_size: image_size.to_string(),
                    aspect_ratio: aspect_ratio
                        .filter(|ratio| !ratio.is_square())
                        .map(|ratio| ratio.to_string()),
                },
            },
        }
    }

    /// Sends one `generateContent` call and returns the base64 image data.
    ///
    /// The send and the body read share a single deadline. When it expires
    /// the in-flight request is dropped, which closes its connection.
    pub async fn generate_content(
        &self,
        parts: Vec<RequestPart>,
        image_size: &str,
        aspect_ratio: Option<&AspectRatio>,
    ) -> Result<String> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model());
        let body = Self::build_request_body(parts, image_size, aspect_ratio);
        let timeout = self.config.timeout();

        log::debug!("POST {} (imageSize {})", url, image_size);

        let exchange = async {
            let response = self
                .client
                .post(&url)
                .header("x-goog-api-key", self.api_key.as_str())
                .header(reqwest::header::CONTENT_TYPE, "application/json")
                .json(&body)
                .send()
                .await
                .map_err(|e| GridError::RequestError(format!("request failed: {}", e)))?;

            let status = response.status();
            let text = response
                .text()
                .await
                .map_err(|e| GridError::RequestError(format!("failed to read response: {}", e)))?;
            Ok::<_, GridError>((status, text))
        };

        let (status, text) = tokio::time::timeout(timeout, exchange)
            .await
            .map_err(|_| {
                log::warn!("Generation request timed out after {}s", timeout.as_secs());
                GridError::TimeoutError {
                    seconds: timeout.as_secs(),
                }
            })??;

        if !status.is_success() {
            let error = response::classify_http_error(status.as_u16(), &text);
            log::error!("Generation request failed with status {}: {}", status, error);
            return Err(error);
        }

        response::parse_success_body(&text)
    }

    /// Probes `GET {base}/models`. Never errors: any failure is `false`.
    pub async fn test_connection(&self) -> bool {
        let url = format!("{}/models", self.base_url);
        let probe = self
            .client
            .get(&url)
            .header("x-goog-api-key", self.api_key.as_str())
            .send();

        match tokio::time::timeout(self.config.timeout(), probe).await {
            Ok(Ok(response)) if response.status().is_success() => {
                log::info!("✅ Connected to {}", self.base_url);
                true
            }
            Ok(Ok(response)) => {
                log::warn!("Connection probe returned status {}", response.status());
                false
            }
            Ok(Err(e)) => {
                log::warn!("Connection probe failed: {}", e);
                false
            }
            Err(_) => {
                log::warn!("Connection probe timed out");
                false
            }
        }
    }
}

#[async_trait]
impl ImageGenerator for GenerationClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResult> {
        let prompt = build_prompt(&PromptParams::from_request(request))?;

        let mut parts = Vec::with_capacity(2);
        if let Some(reference) = &request.reference_image {
            parts.push(RequestPart::image(
                reference.mime_type.clone(),
                reference.data.clone(),
            ));
        }
        parts.push(RequestPart::text(prompt.clone()));

        log::info!(
            "🎨 Generating {} {}x{} at {} with {}",
            request.generation_type.key(),
            request.grid_size.value(),
            request.grid_size.value(),
            request.resolution.size_token(),
            self.model()
        );
        let _timer = Timer::new("generate_content");

        let image_base64 = self
            .generate_content(
                parts,
                request.resolution.size_token(),
                Some(&request.aspect_ratio),
            )
            .await?;

        Ok(GenerationResult {
            image_base64,
            model: self.model().to_string(),
            prompt,
            resolution: request.resolution,
            grid_size: request.grid_size,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn construction_requires_an_api_key() {
        assert!(matches!(
            GenerationClient::new(GeminiConfig::new()),
            Err(GridError::ConfigError(_))
        ));
        let client = GenerationClient::new(GeminiConfig::new().with_api_key("k")).unwrap();
        assert_eq!(client.model(), crate::config::DEFAULT_IMAGE_MODEL);
    }

    #[test]
    fn request_body_matches_the_wire_shape() {
        let ratio = AspectRatio::new(16, 9).unwrap();
        let body = GenerationClient::build_request_body(
            vec![RequestPart::image("image/png", "QUJD"), RequestPart::text("gems")],
            "2K",
            Some(&ratio),
        );
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({
                "contents": [{ "parts": [
                    { "inlineData": { "mimeType": "image/png", "data": "QUJD" } },
                    { "text": "gems" }
                ]}],
                "generationConfig": {
                    "responseModalities": ["IMAGE", "TEXT"],
                    "imageConfig": { "imageSize": "2K", "aspectRatio": "16:9" }
                }
            })
        );
    }

    #[test]
    fn square_aspect_ratio_is_omitted() {
        let body = GenerationClient::build_request_body(
            vec![RequestPart::text("gems")],
            "1K",
            Some(&AspectRatio::SQUARE),
        );
        let value = serde_json::to_value(&body).unwrap();
        assert!(value["generationConfig"]["imageConfig"]
            .get("aspectRatio")
            .is_none());
    }
}
