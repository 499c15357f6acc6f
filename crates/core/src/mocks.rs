//! Mock implementations of core traits for testing.
//!
//! Scripted mocks with response queues and call counters, usable from any
//! crate in the workspace for unit and integration tests.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::traits::{
    CatalogSearch, ChatMessage, ChatModel, ChatOptions, SpeechToText, VisionModel,
};
use crate::types::{IntentMatch, NormalizedImage, SearchOutcome};
use crate::{Error, Result};

// =============================================================================
// Mock Chat Model
// =============================================================================

/// Scripted chat model returning queued responses in order, repeating the
/// last one once the queue is exhausted.
pub struct MockChatModel {
    responses: Mutex<Vec<String>>,
    call_count: Mutex<usize>,
    fail: bool,
}

impl MockChatModel {
    /// Create a mock with a queue of responses.
    pub fn new(responses: Vec<String>) -> Self {
        Self {
            responses: Mutex::new(responses),
            call_count: Mutex::new(0),
            fail: false,
        }
    }

    /// Create a mock that always returns the same response.
    pub fn constant(response: &str) -> Self {
        Self::new(vec![response.to_string()])
    }

    /// Create a mock whose calls always fail.
    pub fn failing() -> Self {
        Self {
            responses: Mutex::new(Vec::new()),
            call_count: Mutex::new(0),
            fail: true,
        }
    }

    /// Number of calls made to this mock.
    pub fn call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }
}

#[async_trait]
impl ChatModel for MockChatModel {
    async fn chat(&self, _messages: &[ChatMessage], _opts: &ChatOptions) -> Result<String> {
        let mut count = self.call_count.lock().unwrap();
        *count += 1;

        if self.fail {
            return Err(Error::upstream("mock-chat", "scripted failure"));
        }

        let responses = self.responses.lock().unwrap();
        let idx = (*count - 1).min(responses.len().saturating_sub(1));
        Ok(responses.get(idx).cloned().unwrap_or_default())
    }
}

// =============================================================================
// Mock Vision Model
// =============================================================================

/// Vision model returning a fixed raw-text response.
pub struct MockVisionModel {
    response: String,
    call_count: Mutex<usize>,
    fail: bool,
}

impl MockVisionModel {
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            call_count: Mutex::new(0),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            response: String::new(),
            call_count: Mutex::new(0),
            fail: true,
        }
    }

    pub fn call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }
}

#[async_trait]
impl VisionModel for MockVisionModel {
    async fn analyze(
        &self,
        _image: &NormalizedImage,
        _system: &str,
        _prompt: &str,
    ) -> Result<String> {
        *self.call_count.lock().unwrap() += 1;
        if self.fail {
            return Err(Error::upstream("mock-vision", "scripted failure"));
        }
        Ok(self.response.clone())
    }
}

// =============================================================================
// Mock Speech-to-Text
// =============================================================================

/// Transcriber returning a fixed transcript.
pub struct MockSpeechToText {
    transcript: String,
}

impl MockSpeechToText {
    pub fn new(transcript: impl Into<String>) -> Self {
        Self {
            transcript: transcript.into(),
        }
    }
}

#[async_trait]
impl SpeechToText for MockSpeechToText {
    async fn transcribe(&self, _audio: Vec<u8>, _filename: &str) -> Result<String> {
        Ok(self.transcript.clone())
    }
}

// =============================================================================
// Mock Catalog Search
// =============================================================================

/// Catalog search returning a fixed outcome.
pub struct MockCatalogSearch {
    outcome: SearchOutcome,
}

impl MockCatalogSearch {
    pub fn new(outcome: SearchOutcome) -> Self {
        Self { outcome }
    }

    /// Mock mirroring an unconfigured storefront: empty results plus note.
    pub fn unconfigured() -> Self {
        Self {
            outcome: SearchOutcome {
                results: Vec::new(),
                note: Some("catalog search is not configured".into()),
            },
        }
    }
}

#[async_trait]
impl CatalogSearch for MockCatalogSearch {
    async fn search(&self, _query: &str) -> Result<SearchOutcome> {
        Ok(self.outcome.clone())
    }
}

// =============================================================================
// Mock Intent Detector
// =============================================================================

/// Intent detector returning a fixed classification.
pub struct MockIntentDetector {
    result: IntentMatch,
}

impl MockIntentDetector {
    pub fn new(result: IntentMatch) -> Self {
        Self { result }
    }
}

impl crate::traits::IntentDetector for MockIntentDetector {
    fn classify(&self, _reply: &str) -> IntentMatch {
        self.result.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Intent;

    #[tokio::test]
    async fn test_mock_chat_queue() {
        let mock = MockChatModel::new(vec!["one".into(), "two".into()]);
        let opts = ChatOptions::default();

        assert_eq!(mock.chat(&[], &opts).await.unwrap(), "one");
        assert_eq!(mock.chat(&[], &opts).await.unwrap(), "two");
        // Queue exhausted: repeats the last response.
        assert_eq!(mock.chat(&[], &opts).await.unwrap(), "two");
        assert_eq!(mock.call_count(), 3);
    }

    #[tokio::test]
    async fn test_mock_chat_failure() {
        let mock = MockChatModel::failing();
        let result = mock.chat(&[], &ChatOptions::default()).await;
        assert!(matches!(result, Err(Error::Upstream { .. })));
    }

    #[test]
    fn test_mock_intent() {
        use crate::traits::IntentDetector;

        let mock = MockIntentDetector::new(IntentMatch {
            intent: Intent::MensajeGeneral,
            product_id: None,
        });
        assert_eq!(mock.classify("hola").intent, Intent::MensajeGeneral);
    }
}
