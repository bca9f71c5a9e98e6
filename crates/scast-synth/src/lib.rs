//! HTTP clients for the external synthesis collaborators.
//!
//! One client per collaborator, each implementing the matching
//! `scast-pipeline` trait:
//! - script enhancement: `(raw script) -> narration text`
//! - speech synthesis: `(text) -> audio bytes`
//! - video rendering: `(script, audio) -> video bytes`
//!
//! The services apply their own processing timeouts; this crate only
//! enforces a transport timeout and surfaces failures as ordinary
//! errors for the orchestrator's settlement path.

pub mod client;
pub mod error;
pub mod types;

pub use client::{EnhancerClient, RendererClient, SpeechClient, SynthConfig};
pub use error::{SynthError, SynthResult};
