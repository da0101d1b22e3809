use std::time::Duration;
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Serialize, Deserialize};
use reqwest::Client;
use log::error;

use crate::emotion::FaceAnnotation;
use crate::errors::ProviderError;
use crate::providers::Classifier;

/// Google Vision client for the `images:annotate` face detection API
#[derive(Debug)]
pub struct GoogleVision {
    /// HTTP client for API requests
    client: Client,
    /// API key for authentication
    api_key: String,
    /// API endpoint URL (optional, defaults to public API)
    endpoint: String,
    /// Maximum number of faces requested per image
    max_faces: u32,
}

/// Top-level batch annotate request
#[derive(Debug, Serialize)]
pub struct AnnotateRequest {
    /// One entry per image to annotate
    requests: Vec<AnnotateImageRequest>,
}

/// A single image annotation request
#[derive(Debug, Serialize)]
pub struct AnnotateImageRequest {
    /// The image payload
    image: ImageContent,

    /// Requested detection features
    features: Vec<Feature>,
}

/// Inline image content
#[derive(Debug, Serialize)]
pub struct ImageContent {
    /// Base64-encoded image bytes
    content: String,
}

/// A requested detection feature
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Feature {
    /// Feature type identifier
    #[serde(rename = "type")]
    feature_type: String,

    /// Maximum number of results to return
    max_results: u32,
}

/// Top-level batch annotate response
#[derive(Debug, Deserialize)]
pub struct AnnotateResponse {
    /// One entry per requested image
    #[serde(default)]
    pub responses: Vec<AnnotateImageResponse>,
}

/// Annotation results for a single image
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AnnotateImageResponse {
    /// Detected faces with per-emotion likelihoods
    #[serde(default)]
    pub face_annotations: Vec<FaceAnnotation>,

    /// Per-image error, set when this image could not be processed
    #[serde(default)]
    pub error: Option<ApiStatus>,
}

/// Error status attached to a failed per-image response
#[derive(Debug, Deserialize)]
pub struct ApiStatus {
    /// Numeric status code
    #[serde(default)]
    pub code: i32,

    /// Human-readable error message
    #[serde(default)]
    pub message: String,
}

impl AnnotateRequest {
    /// Create a face detection request for a single image
    pub fn face_detection(image: &[u8], max_results: u32) -> Self {
        Self {
            requests: vec![AnnotateImageRequest {
                image: ImageContent {
                    content: BASE64.encode(image),
                },
                features: vec![Feature {
                    feature_type: "FACE_DETECTION".to_string(),
                    max_results,
                }],
            }],
        }
    }
}

impl GoogleVision {
    /// Create a new Google Vision client
    pub fn new(api_key: impl Into<String>, endpoint: impl Into<String>, max_faces: u32) -> Self {
        Self::with_timeout(api_key, endpoint, max_faces, Duration::from_secs(30))
    }

    /// Create a new Google Vision client with an explicit request timeout
    pub fn with_timeout(
        api_key: impl Into<String>,
        endpoint: impl Into<String>,
        max_faces: u32,
        timeout: Duration,
    ) -> Self {
        Self {
            client: Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
            api_key: api_key.into(),
            endpoint: endpoint.into(),
            max_faces,
        }
    }

    fn annotate_url(&self) -> String {
        let base = if self.endpoint.is_empty() {
            "https://vision.googleapis.com".to_string()
        } else {
            self.endpoint.trim_end_matches('/').to_string()
        };
        format!("{}/v1/images:annotate?key={}", base, self.api_key)
    }

    /// Send a batch annotate request
    pub async fn annotate(&self, request: AnnotateRequest) -> Result<AnnotateResponse, ProviderError> {
        let response = self.client.post(self.annotate_url())
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::ConnectionError(
                format!("Failed to send request to Vision API: {}", e)
            ))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            error!("Vision API error ({}): {}", status, error_text);
            return Err(match status.as_u16() {
                401 | 403 => ProviderError::AuthenticationError(error_text),
                429 => ProviderError::RateLimitExceeded(error_text),
                code => ProviderError::ApiError { status_code: code, message: error_text },
            });
        }

        response.json::<AnnotateResponse>().await
            .map_err(|e| ProviderError::ParseError(
                format!("Failed to parse Vision API response: {}", e)
            ))
    }
}

#[async_trait]
impl Classifier for GoogleVision {
    async fn detect_faces(&self, image: &[u8]) -> Result<Vec<FaceAnnotation>, ProviderError> {
        let request = AnnotateRequest::face_detection(image, self.max_faces);
        let mut response = self.annotate(request).await?;

        // One image in, one response out
        let first = if response.responses.is_empty() {
            AnnotateImageResponse::default()
        } else {
            response.responses.swap_remove(0)
        };

        if let Some(status) = first.error {
            return Err(ProviderError::RequestFailed(
                format!("Vision API rejected the image ({}): {}", status.code, status.message)
            ));
        }

        Ok(first.face_annotations)
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        // A deliberately empty payload; we only care that the endpoint answers
        // and accepts our key, not that the image decodes.
        let request = AnnotateRequest::face_detection(&[], 1);
        self.annotate(request).await?;
        Ok(())
    }
}
