//! Service traits wiring the HTTP layer to external collaborators.
//!
//! The gateway only ever holds `Arc<dyn Trait>` handles, so tests inject
//! the scripted mocks from [`crate::mocks`] and production wires the
//! reqwest-backed clients.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::{IntentMatch, NormalizedImage, SearchOutcome};

/// One turn of a chat conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role (system, user, assistant).
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".into(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".into(),
            content: content.into(),
        }
    }
}

/// Per-call overrides for a chat completion.
#[derive(Debug, Clone, Default)]
pub struct ChatOptions {
    pub temperature: Option<f32>,
    pub model: Option<String>,
}

/// Text-generation model.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Generate one reply for a composed message sequence.
    async fn chat(&self, messages: &[ChatMessage], opts: &ChatOptions) -> Result<String>;
}

/// Vision-capable model: image plus instructions to raw text.
#[async_trait]
pub trait VisionModel: Send + Sync {
    async fn analyze(
        &self,
        image: &NormalizedImage,
        system: &str,
        prompt: &str,
    ) -> Result<String>;
}

/// Speech-to-text model over canonical waveform bytes.
#[async_trait]
pub trait SpeechToText: Send + Sync {
    async fn transcribe(&self, audio: Vec<u8>, filename: &str) -> Result<String>;
}

/// Storefront catalog search.
#[async_trait]
pub trait CatalogSearch: Send + Sync {
    async fn search(&self, query: &str) -> Result<SearchOutcome>;
}

/// Classifies a generated reply into a coarse intent.
///
/// The shipped implementation is a keyword heuristic standing in for a
/// real classifier; anything smarter replaces it behind this seam without
/// touching callers.
pub trait IntentDetector: Send + Sync {
    fn classify(&self, reply: &str) -> IntentMatch;
}
