//! Axum-based HTTP server for the gateway.

use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use tendero_catalog::build_query;
use tendero_core::traits::{
    CatalogSearch, ChatMessage, ChatModel, ChatOptions, IntentDetector, SpeechToText,
    VisionModel,
};
use tendero_core::{
    AppConfig, AttributeRecord, CatalogItem, Error, Intent, MediaReference, Result,
};
use tendero_media::{normalize_audio, normalize_image};
use tendero_model::AttributeExtractor;

/// System prompt used when the caller does not supply one.
const DEFAULT_SYSTEM_PROMPT: &str = "Eres el asistente de una tienda en línea. \
Responde de forma breve, amable y en el idioma del cliente.";

/// Shared application state: the immutable configuration plus the service
/// seams the handlers call through.
pub struct AppState {
    pub config: Arc<AppConfig>,
    /// Client for media fetches (images, voice notes).
    pub http: reqwest::Client,
    pub chat: Arc<dyn ChatModel>,
    pub stt: Arc<dyn SpeechToText>,
    pub catalog: Arc<dyn CatalogSearch>,
    pub intent: Arc<dyn IntentDetector>,
    pub extractor: AttributeExtractor,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        chat: Arc<dyn ChatModel>,
        vision: Arc<dyn VisionModel>,
        stt: Arc<dyn SpeechToText>,
        catalog: Arc<dyn CatalogSearch>,
        intent: Arc<dyn IntentDetector>,
    ) -> Self {
        let extractor =
            AttributeExtractor::new(vision, chat.clone(), config.models.structurer_model.clone());

        Self {
            config: Arc::new(config),
            http: reqwest::Client::new(),
            chat,
            stt,
            catalog,
            intent,
            extractor,
        }
    }
}

/// Gateway server.
pub struct GatewayServer {
    state: Arc<AppState>,
}

impl GatewayServer {
    pub fn new(state: AppState) -> Self {
        Self {
            state: Arc::new(state),
        }
    }

    /// Build the Axum router. Separate from `run` so tests can drive it
    /// with `tower::ServiceExt::oneshot`.
    pub fn build_router(&self) -> Router {
        let server_cfg = self.state.config.server.clone();

        let mut router = Router::new()
            .route("/", get(root_handler))
            .route("/webhook", get(webhook_status_handler).post(webhook_handler))
            .route("/chat/complete", post(chat_complete_handler))
            .route("/voice/transcribe", post(voice_transcribe_handler))
            .route("/vision/analyze", post(vision_analyze_handler))
            .route("/catalog/search", post(catalog_search_handler))
            .route("/by-image/search", post(by_image_search_handler))
            .with_state(self.state.clone());

        if server_cfg.enable_cors {
            router = router.layer(CorsLayer::new().allow_origin(Any).allow_methods(Any));
        }

        if server_cfg.enable_tracing {
            router = router.layer(TraceLayer::new_for_http());
        }

        router
    }

    /// Run the server.
    pub async fn run(self) -> Result<()> {
        let server_cfg = &self.state.config.server;
        let addr = format!("{}:{}", server_cfg.host, server_cfg.port);
        let listener = tokio::net::TcpListener::bind(&addr).await?;

        tracing::info!(addr = %addr, "Gateway server starting");

        axum::serve(listener, self.build_router()).await?;

        Ok(())
    }
}

// =============================================================================
// Error Mapping
// =============================================================================

/// Structured error body returned to clients.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Wrapper giving core errors an HTTP status per failure class.
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match &self.0 {
            Error::MissingInput(_)
            | Error::InvalidInput(_)
            | Error::NotAnImage { .. }
            | Error::NotAudio { .. }
            | Error::ImageDecode(_) => StatusCode::BAD_REQUEST,
            Error::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Error::Upstream { .. } => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let details = match &self.0 {
            Error::NotAnImage { sample, .. } | Error::NotAudio { sample, .. } => {
                Some(sample.clone())
            }
            _ => None,
        };

        if status.is_server_error() {
            tracing::error!(error = %self.0, "Request failed");
        } else {
            tracing::warn!(error = %self.0, "Request rejected");
        }

        let body = ErrorBody {
            error: self.0.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

// =============================================================================
// Request/Response Types
// =============================================================================

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: String,
    pub service: String,
    pub version: String,
}

#[derive(Debug, Deserialize)]
pub struct WebhookRequest {
    pub message: Option<String>,
    #[serde(rename = "imageUrl")]
    pub image_url: Option<String>,
    #[serde(rename = "audioUrl")]
    pub audio_url: Option<String>,
    pub channel: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WebhookResponse {
    pub reply: String,
}

#[derive(Debug, Deserialize)]
pub struct ChatCompleteRequest {
    pub message: Option<String>,
    pub messages: Option<Vec<ChatMessage>>,
    pub system: Option<String>,
    pub temperature: Option<f32>,
    pub model: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatCompleteResponse {
    pub reply: String,
    pub intent: Intent,
    pub product_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TranscribeRequest {
    #[serde(rename = "audioUrl")]
    pub audio_url: Option<String>,
    #[serde(rename = "audioBase64")]
    pub audio_base64: Option<String>,
    pub filename: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TranscribeResponse {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct VisionRequest {
    #[serde(rename = "imageUrl")]
    pub image_url: Option<String>,
    #[serde(rename = "imageBase64")]
    pub image_base64: Option<String>,
    pub prompt: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VisionResponse {
    pub attributes: AttributeRecord,
    pub degraded: bool,
}

#[derive(Debug, Deserialize)]
pub struct CatalogSearchRequest {
    pub query: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CatalogSearchResponse {
    pub results: Vec<CatalogItem>,
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ByImageSearchResponse {
    pub attributes: AttributeRecord,
    pub degraded: bool,
    pub query: String,
    pub results: Vec<CatalogItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

// =============================================================================
// Handlers
// =============================================================================

/// Root diagnostic handler.
async fn root_handler() -> impl IntoResponse {
    Json(StatusResponse {
        status: "ok".to_string(),
        service: "tendero-gateway".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Webhook verification handler: platforms probe this before subscribing.
async fn webhook_status_handler() -> impl IntoResponse {
    Json(StatusResponse {
        status: "ok".to_string(),
        service: "tendero-webhook".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Webhook handler: acknowledge the inbound event synchronously.
async fn webhook_handler(Json(payload): Json<WebhookRequest>) -> Json<WebhookResponse> {
    tracing::info!(
        channel = payload.channel.as_deref().unwrap_or("unknown"),
        has_message = payload.message.is_some(),
        has_image = payload.image_url.is_some(),
        has_audio = payload.audio_url.is_some(),
        "Webhook event received"
    );

    let message = payload
        .message
        .as_deref()
        .filter(|m| !m.is_empty())
        .unwrap_or("media");
    let channel = payload.channel.as_deref().unwrap_or("desconocido");

    Json(WebhookResponse {
        reply: format!("Hola 👋, recibí tu mensaje: \"{}\" desde {}", message, channel),
    })
}

/// Chat completion handler: system + history + message, one model call,
/// then the (placeholder) intent classification over the reply.
async fn chat_complete_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ChatCompleteRequest>,
) -> std::result::Result<Json<ChatCompleteResponse>, ApiError> {
    let message = payload.message.filter(|m| !m.is_empty());
    let history = payload.messages.unwrap_or_default();

    if message.is_none() && history.is_empty() {
        return Err(Error::missing_input("message or messages").into());
    }

    let mut messages = vec![ChatMessage::system(
        payload
            .system
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string()),
    )];
    messages.extend(history);
    if let Some(message) = message {
        messages.push(ChatMessage::user(message));
    }

    let opts = ChatOptions {
        temperature: payload.temperature,
        model: payload.model,
    };
    let reply = state.chat.chat(&messages, &opts).await?;

    let classified = state.intent.classify(&reply);
    tracing::info!(intent = ?classified.intent, "Chat reply produced");

    Ok(Json(ChatCompleteResponse {
        reply,
        intent: classified.intent,
        product_id: classified.product_id,
    }))
}

/// Voice transcription handler.
async fn voice_transcribe_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<TranscribeRequest>,
) -> std::result::Result<Json<TranscribeResponse>, ApiError> {
    let source = MediaReference::from_parts(
        payload.audio_url,
        payload.audio_base64,
        "audioUrl or audioBase64",
    )?;

    let audio = normalize_audio(&state.config.media, &state.http, &source).await?;

    // The canonical file is released before the result is inspected, so
    // transcription failures cannot leak it.
    let result = match audio.read().await {
        Ok(bytes) => {
            let filename = payload.filename.as_deref().unwrap_or("audio.wav");
            state.stt.transcribe(bytes, filename).await
        }
        Err(e) => Err(e),
    };
    audio.dispose();

    let text = result?;
    tracing::info!(chars = text.len(), "Audio transcribed");

    Ok(Json(TranscribeResponse { text }))
}

/// Vision extraction handler.
async fn vision_analyze_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<VisionRequest>,
) -> std::result::Result<Json<VisionResponse>, ApiError> {
    let source = MediaReference::from_parts(
        payload.image_url,
        payload.image_base64,
        "imageUrl or imageBase64",
    )?;

    let image = normalize_image(&state.config.media, &state.http, &source).await?;
    let extraction = state
        .extractor
        .extract(&image, payload.prompt.as_deref())
        .await?;

    let degraded = extraction.is_degraded();
    tracing::info!(degraded, "Attributes extracted");

    Ok(Json(VisionResponse {
        attributes: extraction.into_record(),
        degraded,
    }))
}

/// Catalog search handler.
async fn catalog_search_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CatalogSearchRequest>,
) -> std::result::Result<Json<CatalogSearchResponse>, ApiError> {
    let query = payload
        .query
        .filter(|q| !q.trim().is_empty())
        .ok_or_else(|| Error::missing_input("query"))?;

    let outcome = state.catalog.search(&query).await?;
    tracing::info!(query = %query, results = outcome.results.len(), "Catalog searched");

    Ok(Json(CatalogSearchResponse {
        results: outcome.results,
        query,
        note: outcome.note,
    }))
}

/// Composite handler: extraction, query building, and catalog search as
/// direct in-process calls, strictly in sequence.
async fn by_image_search_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<VisionRequest>,
) -> std::result::Result<Json<ByImageSearchResponse>, ApiError> {
    let source = MediaReference::from_parts(
        payload.image_url,
        payload.image_base64,
        "imageUrl or imageBase64",
    )?;

    let image = normalize_image(&state.config.media, &state.http, &source).await?;
    let extraction = state
        .extractor
        .extract(&image, payload.prompt.as_deref())
        .await?;
    let degraded = extraction.is_degraded();
    let attributes = extraction.into_record();

    let query = build_query(&attributes);
    let outcome = state.catalog.search(&query).await?;

    tracing::info!(
        query = %query,
        degraded,
        results = outcome.results.len(),
        "Image search resolved"
    );

    Ok(Json(ByImageSearchResponse {
        attributes,
        degraded,
        query,
        results: outcome.results,
        note: outcome.note,
    }))
}
