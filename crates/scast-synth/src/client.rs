//! Synthesis service HTTP clients.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use scast_pipeline::{CollaboratorError, ScriptEnhancer, SpeechSynthesizer, VideoRenderer};

use crate::error::{SynthError, SynthResult};
use crate::types::{EnhanceRequest, EnhanceResponse, SpeechRequest};

/// Configuration for the synthesis clients.
#[derive(Debug, Clone)]
pub struct SynthConfig {
    /// Base URL of the script enhancement service
    pub enhancer_url: String,
    /// Base URL of the text-to-speech service
    pub speech_url: String,
    /// Base URL of the video rendering service
    pub renderer_url: String,
    /// Voice preset for speech synthesis
    pub voice: Option<String>,
    /// Transport timeout
    pub timeout: Duration,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            enhancer_url: "http://localhost:8091".to_string(),
            speech_url: "http://localhost:8092".to_string(),
            renderer_url: "http://localhost:8093".to_string(),
            voice: None,
            // Rendering a long script can take minutes
            timeout: Duration::from_secs(300),
        }
    }
}

impl SynthConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            enhancer_url: std::env::var("ENHANCER_SERVICE_URL").unwrap_or(defaults.enhancer_url),
            speech_url: std::env::var("SPEECH_SERVICE_URL").unwrap_or(defaults.speech_url),
            renderer_url: std::env::var("RENDERER_SERVICE_URL").unwrap_or(defaults.renderer_url),
            voice: std::env::var("SPEECH_VOICE").ok(),
            timeout: Duration::from_secs(
                std::env::var("SYNTH_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(300),
            ),
        }
    }
}

fn build_http(timeout: Duration) -> SynthResult<Client> {
    Ok(Client::builder().timeout(timeout).build()?)
}

async fn check_status(response: reqwest::Response) -> SynthResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(SynthError::ServiceError {
        status: status.as_u16(),
        body: body.chars().take(512).collect(),
    })
}

/// Client for the script enhancement service.
pub struct EnhancerClient {
    http: Client,
    base_url: String,
}

impl EnhancerClient {
    pub fn new(config: &SynthConfig) -> SynthResult<Self> {
        Ok(Self {
            http: build_http(config.timeout)?,
            base_url: config.enhancer_url.clone(),
        })
    }

    /// Turn a raw script into narration text.
    pub async fn enhance_script(&self, script: &str) -> SynthResult<String> {
        let url = format!("{}/enhance", self.base_url);
        let response = self
            .http
            .post(&url)
            .json(&EnhanceRequest { script })
            .send()
            .await?;
        let response = check_status(response).await?;
        let body: EnhanceResponse = response
            .json()
            .await
            .map_err(|e| SynthError::InvalidResponse(e.to_string()))?;
        if body.narration.trim().is_empty() {
            return Err(SynthError::InvalidResponse(
                "empty narration".to_string(),
            ));
        }
        debug!(chars = body.narration.len(), "Enhanced script");
        Ok(body.narration)
    }
}

#[async_trait]
impl ScriptEnhancer for EnhancerClient {
    async fn enhance(&self, script: &str) -> Result<String, CollaboratorError> {
        Ok(self.enhance_script(script).await?)
    }
}

/// Client for the text-to-speech service.
pub struct SpeechClient {
    http: Client,
    base_url: String,
    voice: Option<String>,
}

impl SpeechClient {
    pub fn new(config: &SynthConfig) -> SynthResult<Self> {
        Ok(Self {
            http: build_http(config.timeout)?,
            base_url: config.speech_url.clone(),
            voice: config.voice.clone(),
        })
    }

    /// Synthesize narration text into encoded audio bytes.
    pub async fn synthesize_speech(&self, text: &str) -> SynthResult<Vec<u8>> {
        let url = format!("{}/synthesize", self.base_url);
        let response = self
            .http
            .post(&url)
            .json(&SpeechRequest {
                text,
                voice: self.voice.as_deref(),
            })
            .send()
            .await?;
        let response = check_status(response).await?;
        let audio = response.bytes().await?.to_vec();
        if audio.is_empty() {
            return Err(SynthError::InvalidResponse("empty audio".to_string()));
        }
        debug!(bytes = audio.len(), "Synthesized speech");
        Ok(audio)
    }
}

#[async_trait]
impl SpeechSynthesizer for SpeechClient {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, CollaboratorError> {
        Ok(self.synthesize_speech(text).await?)
    }
}

/// Client for the video rendering service.
pub struct RendererClient {
    http: Client,
    base_url: String,
}

impl RendererClient {
    pub fn new(config: &SynthConfig) -> SynthResult<Self> {
        Ok(Self {
            http: build_http(config.timeout)?,
            base_url: config.renderer_url.clone(),
        })
    }

    /// Render a scrolling-script video with the narration audio track.
    pub async fn render_video(&self, script: &str, audio: &[u8]) -> SynthResult<Vec<u8>> {
        let url = format!("{}/render", self.base_url);
        let form = reqwest::multipart::Form::new()
            .text("script", script.to_string())
            .part(
                "audio",
                reqwest::multipart::Part::bytes(audio.to_vec())
                    .file_name("narration.mp3")
                    .mime_str("audio/mpeg")
                    .map_err(|e| SynthError::InvalidResponse(e.to_string()))?,
            );

        let response = self.http.post(&url).multipart(form).send().await?;
        let response = check_status(response).await?;
        let video = response.bytes().await?.to_vec();
        if video.is_empty() {
            return Err(SynthError::InvalidResponse("empty video".to_string()));
        }
        debug!(bytes = video.len(), "Rendered video");
        Ok(video)
    }
}

#[async_trait]
impl VideoRenderer for RendererClient {
    async fn render(&self, script: &str, audio: &[u8]) -> Result<Vec<u8>, CollaboratorError> {
        Ok(self.render_video(script, audio).await?)
    }
}
