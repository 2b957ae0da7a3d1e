//! Veo over the Gemini Developer API.

use crate::config::{resolve_api_key, resolve_base_url};
use crate::error::{parse_retry_after, sanitize_error_message, Result, VeoGenError};
use crate::video::provider::{OperationClient, VideoFetcher};
use crate::video::types::{GeneratedVideo, GenerationRequest, Image, Operation, OperationResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::io::AsyncWriteExt;

/// Page size used when listing models.
const MODELS_PAGE_SIZE: u32 = 1000;

/// Builder for [`VeoClient`].
#[derive(Debug, Clone, Default)]
pub struct VeoClientBuilder {
    api_key: Option<String>,
    base_url: Option<String>,
}

impl VeoClientBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the API key. Falls back to `GEMINI_API_KEY`, then `GOOGLE_API_KEY`.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Overrides the API base URL (e.g. for a local mock).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Builds the client, resolving the API key.
    pub fn build(self) -> Result<VeoClient> {
        let api_key = resolve_api_key(self.api_key.as_deref())?;
        Ok(VeoClient {
            client: reqwest::Client::new(),
            api_key,
            base_url: resolve_base_url(self.base_url.as_deref()),
        })
    }
}

/// Gemini API client for Veo long-running video generation.
pub struct VeoClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

/// A model listed by the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteModel {
    /// Resource name, e.g. `models/veo-3.1-generate-preview`.
    pub name: String,
    /// Human-readable name.
    #[serde(default)]
    pub display_name: Option<String>,
    /// Generation methods the model supports.
    #[serde(default)]
    pub supported_generation_methods: Vec<String>,
}

impl RemoteModel {
    /// Model id without the `models/` prefix.
    pub fn id(&self) -> &str {
        self.name.strip_prefix("models/").unwrap_or(&self.name)
    }

    /// Whether the model generates video through long-running operations.
    pub fn is_video_model(&self) -> bool {
        self.supported_generation_methods
            .iter()
            .any(|m| m == "predictLongRunning")
    }
}

impl VeoClient {
    /// Creates a new `VeoClientBuilder`.
    pub fn builder() -> VeoClientBuilder {
        VeoClientBuilder::new()
    }

    /// Base URL requests are sent to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Lists the video models available to this API key.
    pub async fn list_models(&self) -> Result<Vec<RemoteModel>> {
        let url = format!("{}/models", self.base_url);
        let mut models = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut query = vec![("pageSize", MODELS_PAGE_SIZE.to_string())];
            if let Some(token) = &page_token {
                query.push(("pageToken", token.clone()));
            }
            let response = self
                .client
                .get(&url)
                .header("x-goog-api-key", &self.api_key)
                .query(&query)
                .send()
                .await?;

            let status = response.status();
            if !status.is_success() {
                let headers = response.headers().clone();
                let text = response.text().await.unwrap_or_default();
                return Err(parse_error(status.as_u16(), &text, &headers));
            }

            let page: ListModelsResponse = serde_json::from_str(&response.text().await?)?;
            models.extend(page.models.into_iter().filter(RemoteModel::is_video_model));
            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        Ok(models)
    }
}

#[async_trait]
impl OperationClient for VeoClient {
    async fn submit(&self, request: &GenerationRequest) -> Result<Operation> {
        let model = request
            .model
            .strip_prefix("models/")
            .unwrap_or(&request.model);
        let url = format!("{}/models/{}:predictLongRunning", self.base_url, model);
        let body = VeoRequest::from_request(request);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(match status.as_u16() {
                401 | 403 => VeoGenError::Credential(sanitize_error_message(&text)),
                status => VeoGenError::Submission {
                    status,
                    message: text,
                },
            });
        }

        let operation: VeoOperationResponse = serde_json::from_str(&response.text().await?)?;
        operation.into_operation()
    }

    async fn fetch(&self, operation: &Operation) -> Result<Operation> {
        let url = format!("{}/{}", self.base_url, operation.name);

        let response = self
            .client
            .get(&url)
            .header("x-goog-api-key", &self.api_key)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let headers = response.headers().clone();
            let text = response.text().await.unwrap_or_default();
            return Err(parse_error(status.as_u16(), &text, &headers));
        }

        let fetched: VeoOperationResponse = serde_json::from_str(&response.text().await?)?;
        fetched.into_operation()
    }
}

#[async_trait]
impl VideoFetcher for VeoClient {
    async fn fetch_to_file(&self, uri: &str, path: &Path) -> Result<u64> {
        if uri.starts_with("gs://") {
            return Err(VeoGenError::Generation(format!(
                "Veo returned a Google Cloud Storage URI ({uri}) which cannot be downloaded \
                 with an API key. Use `gsutil cp` to download the video."
            )));
        }

        let url = with_api_key(uri, &self.api_key);
        tracing::debug!(uri, "downloading video");
        // The URL carries the key, so it must not end up in error messages.
        let mut response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| VeoGenError::Network(e.without_url()))?;

        let status = response.status();
        if !status.is_success() {
            let headers = response.headers().clone();
            let text = response.text().await.unwrap_or_default();
            return Err(parse_error(status.as_u16(), &text, &headers));
        }

        // A failure mid-stream leaves a truncated file behind.
        let mut file = tokio::fs::File::create(path).await?;
        let mut written = 0u64;
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| VeoGenError::Network(e.without_url()))?
        {
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;
        Ok(written)
    }
}

/// Appends `key=<api_key>` to the query string of `uri`.
fn with_api_key(uri: &str, api_key: &str) -> String {
    let separator = if uri.contains('?') { '&' } else { '?' };
    format!("{uri}{separator}key={api_key}")
}

fn parse_error(status: u16, text: &str, headers: &reqwest::header::HeaderMap) -> VeoGenError {
    let text = sanitize_error_message(text);
    if status == 429 {
        let retry_after = parse_retry_after(headers).map(std::time::Duration::from_secs);
        return VeoGenError::RateLimited { retry_after };
    }
    if status == 401 || status == 403 {
        return VeoGenError::Credential(text);
    }
    let lower = text.to_lowercase();
    if lower.contains("safety")
        || lower.contains("blocked")
        || lower.contains("content_policy")
        || lower.contains("prohibited")
    {
        return VeoGenError::ContentBlocked(text);
    }
    VeoGenError::Api {
        status,
        message: text,
    }
}

// ── Request wire format ─────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VeoRequest {
    instances: Vec<VeoInstance>,
    parameters: VeoParameters,
}

/// Image payload (`{"bytesBase64Encoded": "...", "mimeType": "..."}`).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct VeoImage {
    bytes_base64_encoded: String,
    mime_type: String,
}

impl From<&Image> for VeoImage {
    fn from(image: &Image) -> Self {
        Self {
            bytes_base64_encoded: image.to_base64(),
            mime_type: image.mime_type().to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct VeoReferenceImage {
    image: VeoImage,
    reference_type: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VeoInstance {
    prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    image: Option<VeoImage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_frame: Option<VeoImage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    reference_images: Vec<VeoReferenceImage>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VeoParameters {
    aspect_ratio: &'static str,
    duration_seconds: u32,
    sample_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    resolution: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    negative_prompt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    person_generation: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    enhance_prompt: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generate_audio: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    fps: Option<u32>,
}

impl VeoRequest {
    fn from_request(req: &GenerationRequest) -> Self {
        let reference_images = req
            .reference_images
            .iter()
            .map(|r| VeoReferenceImage {
                image: VeoImage::from(&r.image),
                reference_type: r.kind.as_str(),
            })
            .collect();

        Self {
            instances: vec![VeoInstance {
                prompt: req.prompt.clone(),
                image: req.source_image.as_ref().map(VeoImage::from),
                last_frame: req.last_frame.as_ref().map(VeoImage::from),
                reference_images,
            }],
            parameters: VeoParameters {
                aspect_ratio: req.aspect_ratio.as_str(),
                duration_seconds: req.duration_secs,
                sample_count: req.video_count,
                resolution: req.resolution.map(|r| r.as_str()),
                negative_prompt: req.negative_prompt.clone(),
                seed: req.seed,
                person_generation: req.person_generation.map(|p| p.as_str()),
                enhance_prompt: req.enhance_prompt,
                generate_audio: req.generate_audio,
                fps: req.fps,
            },
        }
    }
}

// ── Response wire format ────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListModelsResponse {
    #[serde(default)]
    models: Vec<RemoteModel>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VeoOperationResponse {
    name: String,
    #[serde(default)]
    done: Option<bool>,
    #[serde(default)]
    response: Option<VeoVideoResponse>,
    #[serde(default)]
    error: Option<VeoError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VeoVideoResponse {
    #[serde(default)]
    generate_video_response: Option<VeoGenerateVideoResponse>,
    /// Flat `videos[]` shape.
    #[serde(default)]
    videos: Option<Vec<VeoVideo>>,
    #[serde(default)]
    rai_media_filtered_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VeoGenerateVideoResponse {
    #[serde(default)]
    generated_samples: Option<Vec<VeoGeneratedSample>>,
    #[serde(default)]
    rai_media_filtered_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct VeoGeneratedSample {
    #[serde(default)]
    video: Option<VeoVideo>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VeoVideo {
    #[serde(default)]
    uri: Option<String>,
    #[serde(default)]
    gcs_uri: Option<String>,
    #[serde(default)]
    encoded_video: Option<String>,
    #[serde(default)]
    bytes_base64_encoded: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VeoError {
    #[serde(default)]
    code: Option<i32>,
    #[serde(default)]
    message: Option<String>,
}

impl VeoVideo {
    fn into_generated(self) -> Result<GeneratedVideo> {
        use base64::Engine;

        let bytes = self
            .encoded_video
            .or(self.bytes_base64_encoded)
            .map(|b64| {
                base64::engine::general_purpose::STANDARD
                    .decode(b64.trim())
                    .map_err(|e| VeoGenError::Decode(format!("inline video data: {e}")))
            })
            .transpose()?;
        Ok(GeneratedVideo::from_parts(bytes, self.uri.or(self.gcs_uri)))
    }
}

impl VeoOperationResponse {
    fn into_operation(self) -> Result<Operation> {
        let error = self.error.map(|e| match (e.code, e.message) {
            (Some(code), Some(message)) => format!("{message} (code {code})"),
            (None, Some(message)) => message,
            (Some(code), None) => format!("error code {code}"),
            (None, None) => "unknown error".to_string(),
        });

        let result = self.response.map(|resp| -> Result<OperationResult> {
            let mut filtered_count = resp.rai_media_filtered_count.unwrap_or(0);
            let mut raw = Vec::new();
            if let Some(gen_resp) = resp.generate_video_response {
                filtered_count += gen_resp.rai_media_filtered_count.unwrap_or(0);
                raw.extend(
                    gen_resp
                        .generated_samples
                        .unwrap_or_default()
                        .into_iter()
                        .map(|s| s.video.unwrap_or_default()),
                );
            }
            raw.extend(resp.videos.unwrap_or_default());

            let videos = raw
                .into_iter()
                .map(VeoVideo::into_generated)
                .collect::<Result<Vec<_>>>()?;
            Ok(OperationResult {
                videos,
                filtered_count,
            })
        });

        Ok(Operation {
            name: self.name,
            done: self.done.unwrap_or(false),
            result: result.transpose()?,
            error,
        })
    }
}
