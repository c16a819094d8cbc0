//! Client for the upload and caption-generation pipeline.
//!
//! Four strictly sequential steps, each bearer-authenticated with the user's
//! session token: request an upload slot, PUT the bytes, register the image,
//! generate captions. The first failing step aborts the rest; nothing already
//! done is rolled back.

use std::fmt;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

use crate::services::feed_session::FeedItem;

pub const SUPPORTED_CONTENT_TYPES: &[&str] = &[
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/webp",
    "image/gif",
    "image/heic",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStep {
    Validate,
    PresignUrl,
    UploadBytes,
    RegisterImage,
    GenerateCaptions,
}

impl fmt::Display for PipelineStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineStep::Validate => "validate upload",
            PipelineStep::PresignUrl => "request upload slot",
            PipelineStep::UploadBytes => "upload image bytes",
            PipelineStep::RegisterImage => "register image",
            PipelineStep::GenerateCaptions => "generate captions",
        };
        f.write_str(name)
    }
}

#[derive(Debug, thiserror::Error)]
#[error("{step} failed{}: {detail}", .status.map(|s| format!(" ({})", s)).unwrap_or_default())]
pub struct PipelineError {
    pub step: PipelineStep,
    pub status: Option<StatusCode>,
    pub detail: String,
}

impl PipelineError {
    fn new(step: PipelineStep, status: Option<StatusCode>, detail: impl ToString) -> Self {
        Self {
            step,
            status,
            detail: detail.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PresignRequest<'a> {
    content_type: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PresignResponse {
    presigned_url: String,
    cdn_url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegisterResponse {
    image_id: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct GeneratedCaption {
    pub id: String,
    pub content: String,
}

#[derive(Debug, Clone)]
pub struct GeneratedContent {
    pub image_id: String,
    pub image_url: String,
    pub captions: Vec<GeneratedCaption>,
}

impl GeneratedContent {
    /// The one feed item surfaced for an upload: the first generated caption.
    pub fn into_feed_item(self) -> Option<FeedItem> {
        let caption = self.captions.into_iter().next()?;
        Some(FeedItem::fresh(
            self.image_id,
            self.image_url,
            caption.id,
            caption.content,
        ))
    }
}

#[derive(Clone)]
pub struct CaptionPipeline {
    client: Client,
    base_url: String,
}

impl CaptionPipeline {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub async fn upload_and_caption(
        &self,
        token: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<GeneratedContent, PipelineError> {
        let content_type = normalize_content_type(content_type)?;
        if bytes.is_empty() {
            return Err(PipelineError::new(PipelineStep::Validate, None, "empty file"));
        }

        let slot: PresignResponse = self
            .post_json(
                PipelineStep::PresignUrl,
                "generate-presigned-url",
                token,
                &PresignRequest { content_type },
            )
            .await?;

        let size = bytes.len();
        let resp = self
            .client
            .put(&slot.presigned_url)
            .header(CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await
            .map_err(|e| PipelineError::new(PipelineStep::UploadBytes, None, e))?;
        ensure_success(PipelineStep::UploadBytes, resp).await?;
        info!(bytes = size, cdn_url = %slot.cdn_url, "Image bytes uploaded");

        let registered: RegisterResponse = self
            .post_json(
                PipelineStep::RegisterImage,
                "upload-image-from-url",
                token,
                &json!({ "imageUrl": slot.cdn_url, "isCommonUse": false }),
            )
            .await?;

        let captions: Vec<GeneratedCaption> = self
            .post_json(
                PipelineStep::GenerateCaptions,
                "generate-captions",
                token,
                &json!({ "imageId": registered.image_id }),
            )
            .await?;
        info!(image_id = %registered.image_id, captions = captions.len(), "Captions generated");

        Ok(GeneratedContent {
            image_id: registered.image_id,
            image_url: slot.cdn_url,
            captions,
        })
    }

    async fn post_json<B, T>(
        &self,
        step: PipelineStep,
        path: &str,
        token: &str,
        body: &B,
    ) -> Result<T, PipelineError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.endpoint(path);
        let resp = self
            .client
            .post(&url)
            .header(AUTHORIZATION, format!("Bearer {}", token))
            .json(body)
            .send()
            .await
            .map_err(|e| {
                warn!(step = %step, url = %url, error = %e, "Pipeline request failed");
                PipelineError::new(step, None, e)
            })?;
        let resp = ensure_success(step, resp).await?;
        resp.json::<T>()
            .await
            .map_err(|e| PipelineError::new(step, None, format!("unreadable response: {}", e)))
    }
}

async fn ensure_success(
    step: PipelineStep,
    resp: reqwest::Response,
) -> Result<reqwest::Response, PipelineError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    warn!(step = %step, status = %status, body = %body, "Pipeline step rejected");
    Err(PipelineError::new(step, Some(status), body.trim()))
}

fn normalize_content_type(raw: &str) -> Result<&'static str, PipelineError> {
    let essence = raw.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
    SUPPORTED_CONTENT_TYPES
        .iter()
        .copied()
        .find(|ct| *ct == essence)
        .ok_or_else(|| {
            PipelineError::new(
                PipelineStep::Validate,
                None,
                format!("unsupported file type {:?}", raw),
            )
        })
}
