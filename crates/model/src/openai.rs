//! OpenAI-compatible model client.
//!
//! Covers the three provider roles this gateway needs: text completions,
//! vision completions with an inline image part, and speech-to-text via
//! the multipart transcription endpoint. Model names and the endpoint come
//! from the injected configuration, never from ambient environment state.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use secrecy::ExposeSecret;
use serde_json::json;

use tendero_core::config::ModelConfig;
use tendero_core::traits::{ChatMessage, ChatModel, ChatOptions, SpeechToText, VisionModel};
use tendero_core::{Error, NormalizedImage, Result};

pub struct OpenAiClient {
    http: reqwest::Client,
    cfg: ModelConfig,
}

impl OpenAiClient {
    pub fn new(cfg: ModelConfig, http: reqwest::Client) -> Self {
        Self { http, cfg }
    }

    fn api_key(&self) -> Result<String> {
        self.cfg
            .api_key
            .as_ref()
            .map(|k| k.expose_secret().clone())
            .ok_or_else(|| Error::missing_credential("model API key is not configured"))
    }

    /// POST a chat-completions body and pull out the first choice's text.
    async fn chat_completions(&self, body: serde_json::Value) -> Result<String> {
        let key = self.api_key()?;

        let response = self
            .http
            .post(format!("{}/chat/completions", self.cfg.api_url))
            .bearer_auth(key)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::upstream("model", format!("chat completions call failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, detail = %detail, "Chat completions call rejected");
            return Err(Error::upstream("model", format!("{}: {}", status, detail)));
        }

        let payload: serde_json::Value = response
            .json()
            .await
            .map_err(|e| Error::upstream("model", format!("invalid completion payload: {}", e)))?;

        payload["choices"][0]["message"]["content"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| Error::upstream("model", "completion payload had no message content"))
    }
}

#[async_trait]
impl ChatModel for OpenAiClient {
    async fn chat(&self, messages: &[ChatMessage], opts: &ChatOptions) -> Result<String> {
        let model = opts.model.as_deref().unwrap_or(&self.cfg.chat_model);
        let temperature = opts.temperature.unwrap_or(self.cfg.temperature);

        tracing::debug!(model = %model, messages = messages.len(), "Calling chat model");

        self.chat_completions(json!({
            "model": model,
            "messages": messages,
            "temperature": temperature,
        }))
        .await
    }
}

#[async_trait]
impl VisionModel for OpenAiClient {
    async fn analyze(
        &self,
        image: &NormalizedImage,
        system: &str,
        prompt: &str,
    ) -> Result<String> {
        let data_url = format!(
            "data:{};base64,{}",
            image.mime_type,
            BASE64.encode(&image.bytes)
        );

        tracing::debug!(
            model = %self.cfg.vision_model,
            image_bytes = image.bytes.len(),
            "Calling vision model"
        );

        self.chat_completions(json!({
            "model": self.cfg.vision_model,
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": [
                    { "type": "image_url", "image_url": { "url": data_url } },
                    { "type": "text", "text": prompt },
                ]},
            ],
            "max_tokens": 1024,
        }))
        .await
    }
}

#[async_trait]
impl SpeechToText for OpenAiClient {
    async fn transcribe(&self, audio: Vec<u8>, filename: &str) -> Result<String> {
        let key = self.api_key()?;

        tracing::debug!(
            model = %self.cfg.transcribe_model,
            size = audio.len(),
            "Transcribing audio"
        );

        let part = reqwest::multipart::Part::bytes(audio)
            .file_name(filename.to_string())
            .mime_str("audio/wav")
            .map_err(|e| Error::internal(format!("building upload part failed: {}", e)))?;

        let form = reqwest::multipart::Form::new()
            .text("model", self.cfg.transcribe_model.clone())
            .text("response_format", "text")
            .part("file", part);

        let response = self
            .http
            .post(format!("{}/audio/transcriptions", self.cfg.api_url))
            .bearer_auth(key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| Error::upstream("model", format!("transcription call failed: {}", e)))?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            tracing::error!(status = %status, detail = %body, "Transcription call rejected");
            return Err(Error::upstream("model", format!("{}: {}", status, body)));
        }

        Ok(body.trim().to_string())
    }
}
