//! Application configuration.
//!
//! The configuration is built once at startup and passed by reference into
//! every component; nothing below the binary reads ambient environment
//! state, which keeps the pipeline deterministic under test.

use config::{Config, ConfigError, Environment, File};
use secrecy::Secret;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub models: ModelConfig,
    #[serde(default)]
    pub media: MediaConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub enable_cors: bool,
    pub enable_tracing: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 10000,
            enable_cors: true,
            enable_tracing: true,
        }
    }
}

/// Model provider settings: one OpenAI-compatible endpoint serving the
/// text, vision, restructuring, and transcription roles.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ModelConfig {
    pub api_url: String,
    pub api_key: Option<Secret<String>>,
    pub chat_model: String,
    pub vision_model: String,
    /// Text model used for the restructure pass of attribute extraction.
    pub structurer_model: String,
    pub transcribe_model: String,
    pub temperature: f32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.openai.com/v1".into(),
            api_key: None,
            chat_model: "gpt-4o-mini".into(),
            vision_model: "gpt-4o".into(),
            structurer_model: "gpt-4o-mini".into(),
            transcribe_model: "whisper-1".into(),
            temperature: 0.7,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct MediaConfig {
    /// Hard cap on the re-encoded image size handed to the vision model.
    pub max_image_bytes: usize,
    /// Images wider than this are resized down, preserving aspect ratio.
    pub max_image_width: u32,
    /// Permit plain-http image sources. Off unless explicitly enabled.
    pub allow_http_sources: bool,
    /// Cap on any single media download.
    pub max_download_bytes: usize,
    pub ffmpeg_path: String,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            max_image_bytes: 4 * 1024 * 1024,
            max_image_width: 1024,
            allow_http_sources: false,
            max_download_bytes: 25 * 1024 * 1024,
            ffmpeg_path: "ffmpeg".into(),
        }
    }
}

/// Storefront API settings. Both fields must be present for catalog search
/// to reach the network; otherwise searches resolve to an empty result with
/// an explanatory note.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CatalogConfig {
    pub shop_domain: Option<String>,
    pub storefront_token: Option<Secret<String>>,
    pub api_version: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            shop_domain: None,
            storefront_token: None,
            api_version: "2024-07".into(),
        }
    }
}

impl AppConfig {
    /// Load configuration from layered files and the environment.
    ///
    /// Layering order (later wins): `config/default`, `config/<env>`,
    /// `config/local`, then `TENDERO__`-prefixed environment variables
    /// (e.g. `TENDERO__SERVER__PORT=8080`). The well-known provider
    /// variables are folded in last so a bare deployment works without a
    /// config tree.
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("TENDERO_ENV").unwrap_or_else(|_| "development".into());

        let s = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(File::with_name("config/local").required(false))
            // Map TENDERO__SERVER__PORT=10000 to server.port
            .add_source(Environment::with_prefix("TENDERO").separator("__"))
            .build()?;

        let mut cfg: AppConfig = s.try_deserialize()?;
        cfg.absorb_provider_env();
        Ok(cfg)
    }

    /// Fold in the provider variables the hosting platform conventionally
    /// sets, without overriding values already configured.
    fn absorb_provider_env(&mut self) {
        if self.models.api_key.is_none() {
            if let Ok(key) = std::env::var("OPENAI_API_KEY") {
                self.models.api_key = Some(Secret::new(key));
            }
        }
        if self.catalog.shop_domain.is_none() {
            if let Ok(domain) = std::env::var("SHOPIFY_SHOP_DOMAIN") {
                self.catalog.shop_domain = Some(domain);
            }
        }
        if self.catalog.storefront_token.is_none() {
            if let Ok(token) = std::env::var("SHOPIFY_STOREFRONT_TOKEN") {
                self.catalog.storefront_token = Some(Secret::new(token));
            }
        }
        if let Some(port) = std::env::var("PORT").ok().and_then(|p| p.parse().ok()) {
            self.server.port = port;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.server.port, 10000);
        assert_eq!(cfg.media.max_image_width, 1024);
        assert_eq!(cfg.media.max_image_bytes, 4 * 1024 * 1024);
        assert!(!cfg.media.allow_http_sources);
        assert_eq!(cfg.models.transcribe_model, "whisper-1");
        assert!(cfg.catalog.shop_domain.is_none());
    }

    #[test]
    fn test_empty_sources_deserialize_to_defaults() {
        let cfg: AppConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg.server.host, "0.0.0.0");
        assert_eq!(cfg.models.vision_model, "gpt-4o");
    }

    #[test]
    fn test_partial_override() {
        let cfg: AppConfig =
            serde_json::from_str(r#"{"media": {"max_image_width": 512}}"#).unwrap();
        assert_eq!(cfg.media.max_image_width, 512);
        // Untouched siblings keep their defaults.
        assert_eq!(cfg.media.max_image_bytes, 4 * 1024 * 1024);
    }
}
