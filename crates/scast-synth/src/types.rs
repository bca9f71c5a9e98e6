//! Wire types for the synthesis services.

use serde::{Deserialize, Serialize};

/// Request body for the script enhancement service.
#[derive(Debug, Serialize)]
pub struct EnhanceRequest<'a> {
    pub script: &'a str,
}

/// Response from the script enhancement service.
#[derive(Debug, Deserialize)]
pub struct EnhanceResponse {
    pub narration: String,
}

/// Request body for the speech synthesis service.
#[derive(Debug, Serialize)]
pub struct SpeechRequest<'a> {
    pub text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice: Option<&'a str>,
}
