//! Model clients for tendero.
//!
//! One OpenAI-compatible HTTP client covers the three model roles (text
//! chat, vision, transcription), and the attribute extractor layers the
//! strict-JSON schema discipline with its restructuring fallback on top.

pub mod extractor;
pub mod intent;
pub mod openai;

pub use extractor::AttributeExtractor;
pub use intent::{KeywordIntentDetector, PLACEHOLDER_PRODUCT_ID};
pub use openai::OpenAiClient;
