//! External synthesis collaborator traits.
//!
//! The orchestrator only sees these seams; concrete HTTP clients live in
//! `scast-synth`, and tests substitute fakes or mocks. Collaborators are
//! expected to apply their own timeouts and surface them as ordinary
//! errors.

use async_trait::async_trait;

/// Error type for collaborator calls.
pub type CollaboratorError = Box<dyn std::error::Error + Send + Sync>;

/// Turns a raw user script into narration text.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ScriptEnhancer: Send + Sync {
    async fn enhance(&self, script: &str) -> Result<String, CollaboratorError>;
}

/// Turns narration text into encoded audio bytes.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, CollaboratorError>;
}

/// Renders a video for a script with its narration audio track.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VideoRenderer: Send + Sync {
    async fn render(&self, script: &str, audio: &[u8]) -> Result<Vec<u8>, CollaboratorError>;
}
