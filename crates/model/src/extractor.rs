//! Attribute extraction with a schema-validation fallback.
//!
//! Vision models describe products reliably but honor strict-JSON
//! instructions inconsistently. The extractor therefore separates
//! "understand the image" from "conform to the schema": one vision call,
//! and only when its output fails to parse, one restructuring call against
//! a text model over the same free text. If that also fails, the result
//! degrades to an uncategorized record instead of erroring — a partial
//! classification is still useful to the caller.

use std::sync::Arc;

use tendero_core::traits::{ChatMessage, ChatModel, ChatOptions, VisionModel};
use tendero_core::{AttributeRecord, Extraction, NormalizedImage, Result};

const EXTRACTION_SYSTEM: &str = "\
You are a product recognition engine for an online store. Look at the \
product photo and answer with ONLY a strict JSON object, no prose, no \
markdown fences. The object has this shape: {\"domain\": one of apparel | \
shapewear | electronics | phones | phone_parts | auto_parts | cameras | \
computers | furniture | home | books | beauty | toys | sports | other, \
\"category\": string, \"type\": string, \"brand\": string, \"model\": string, \
\"colors\": [string], \"materials\": [string], \"details\": [string], \
\"features\": [string], \"compatibility\": [string], \"part_number\": string, \
\"size\": string, \"length\": string, \"fit\": string, \"style\": string, \
\"title\": string, \"author\": string, \"language\": string, \"topic\": string, \
\"keywords\": [string]}. Omit every field you cannot determine from the \
photo. \"domain\" is required.";

const RESTRUCTURE_SYSTEM: &str = "\
The following text describes a product but is not valid JSON. Rewrite it \
as ONLY a strict JSON object with the shape: {\"domain\": one of apparel | \
shapewear | electronics | phones | phone_parts | auto_parts | cameras | \
computers | furniture | home | books | beauty | toys | sports | other, plus \
any of category, type, brand, model, colors, materials, details, features, \
compatibility, part_number, size, length, fit, style, title, author, \
language, topic, keywords you can support from the text. No prose, no \
markdown fences. \"domain\" is required.";

/// Two-stage extractor: vision call, then an optional restructuring pass.
#[derive(Clone)]
pub struct AttributeExtractor {
    vision: Arc<dyn VisionModel>,
    structurer: Arc<dyn ChatModel>,
    structurer_model: String,
}

impl AttributeExtractor {
    pub fn new(
        vision: Arc<dyn VisionModel>,
        structurer: Arc<dyn ChatModel>,
        structurer_model: impl Into<String>,
    ) -> Self {
        Self {
            vision,
            structurer,
            structurer_model: structurer_model.into(),
        }
    }

    /// Extract product attributes from a normalized image.
    ///
    /// Malformed model output never surfaces as an error; a failing vision
    /// call (credentials, network, provider) still does.
    pub async fn extract(
        &self,
        image: &NormalizedImage,
        hint: Option<&str>,
    ) -> Result<Extraction> {
        let mut prompt =
            String::from("Identify the product in this photo and return the attribute JSON.");
        if let Some(hint) = hint {
            prompt.push_str("\nContext from the customer: ");
            prompt.push_str(hint);
        }

        let raw = self.vision.analyze(image, EXTRACTION_SYSTEM, &prompt).await?;

        match parse_attributes(&raw) {
            Ok(record) => Ok(Extraction::Parsed(record)),
            Err(parse_err) => {
                tracing::warn!(
                    error = %parse_err,
                    "Vision output failed schema parse, restructuring"
                );
                Ok(self.restructure(raw).await)
            }
        }
    }

    /// Second pass: re-ask for the schema over the free-text output. Any
    /// failure here degrades instead of erroring.
    async fn restructure(&self, raw: String) -> Extraction {
        let messages = [
            ChatMessage::system(RESTRUCTURE_SYSTEM),
            ChatMessage::user(raw.clone()),
        ];
        let opts = ChatOptions {
            temperature: Some(0.0),
            model: Some(self.structurer_model.clone()),
        };

        match self.structurer.chat(&messages, &opts).await {
            Ok(text) => match parse_attributes(&text) {
                Ok(record) => Extraction::Parsed(record),
                Err(e) => {
                    tracing::warn!(error = %e, "Restructured output still unparseable, degrading");
                    Extraction::Degraded {
                        record: AttributeRecord::degraded(raw.clone()),
                        raw,
                    }
                }
            },
            Err(e) => {
                tracing::warn!(error = %e, "Restructuring call failed, degrading");
                Extraction::Degraded {
                    record: AttributeRecord::degraded(raw.clone()),
                    raw,
                }
            }
        }
    }
}

/// Parse model text as an attribute record, tolerating markdown fences.
pub(crate) fn parse_attributes(
    text: &str,
) -> std::result::Result<AttributeRecord, serde_json::Error> {
    serde_json::from_str(strip_code_fences(text))
}

fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string ("json") up to the first newline.
    let rest = rest.split_once('\n').map(|(_, r)| r).unwrap_or(rest);
    let rest = rest.trim_end();
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tendero_core::mocks::{MockChatModel, MockVisionModel};
    use tendero_core::Domain;

    fn test_image() -> NormalizedImage {
        NormalizedImage {
            mime_type: "image/jpeg".into(),
            bytes: vec![0u8; 16],
            width: 16,
        }
    }

    fn extractor(
        vision: Arc<MockVisionModel>,
        structurer: Arc<MockChatModel>,
    ) -> AttributeExtractor {
        AttributeExtractor::new(vision, structurer, "gpt-4o-mini")
    }

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(strip_code_fences("{\"a\":1}"), "{\"a\":1}");
        assert_eq!(strip_code_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("```\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("  {\"a\":1}  "), "{\"a\":1}");
    }

    #[tokio::test]
    async fn test_clean_output_parses_without_fallback() {
        let vision = Arc::new(MockVisionModel::new(
            r#"{"domain": "apparel", "category": "faja", "colors": ["negro"]}"#,
        ));
        let structurer = Arc::new(MockChatModel::constant("unused"));
        let extraction = extractor(vision, structurer.clone())
            .extract(&test_image(), None)
            .await
            .unwrap();

        match &extraction {
            Extraction::Parsed(record) => {
                assert_eq!(record.domain, Domain::Apparel);
                assert_eq!(record.category.as_deref(), Some("faja"));
            }
            other => panic!("expected parsed extraction, got {other:?}"),
        }
        assert_eq!(structurer.call_count(), 0);
    }

    #[tokio::test]
    async fn test_fenced_output_parses() {
        let vision = Arc::new(MockVisionModel::new(
            "```json\n{\"domain\": \"books\", \"title\": \"Cien años de soledad\"}\n```",
        ));
        let structurer = Arc::new(MockChatModel::constant("unused"));
        let extraction = extractor(vision, structurer.clone())
            .extract(&test_image(), None)
            .await
            .unwrap();

        assert!(matches!(extraction, Extraction::Parsed(_)));
        assert_eq!(extraction.record().domain, Domain::Books);
        assert_eq!(structurer.call_count(), 0);
    }

    #[tokio::test]
    async fn test_prose_output_recovered_by_restructure() {
        let vision = Arc::new(MockVisionModel::new(
            "This looks like a black shapewear garment, size M.",
        ));
        let structurer = Arc::new(MockChatModel::constant(
            r#"{"domain": "shapewear", "colors": ["negro"], "size": "M"}"#,
        ));
        let extraction = extractor(vision.clone(), structurer.clone())
            .extract(&test_image(), Some("busco una faja"))
            .await
            .unwrap();

        assert!(matches!(extraction, Extraction::Parsed(_)));
        assert_eq!(extraction.record().domain, Domain::Shapewear);
        assert_eq!(vision.call_count(), 1);
        assert_eq!(structurer.call_count(), 1);
    }

    #[tokio::test]
    async fn test_missing_domain_triggers_restructure() {
        // Parses as JSON but lacks the required domain field.
        let vision = Arc::new(MockVisionModel::new(r#"{"category": "faja"}"#));
        let structurer = Arc::new(MockChatModel::constant(
            r#"{"domain": "apparel", "category": "faja"}"#,
        ));
        let extraction = extractor(vision, structurer.clone())
            .extract(&test_image(), None)
            .await
            .unwrap();

        assert!(matches!(extraction, Extraction::Parsed(_)));
        assert_eq!(structurer.call_count(), 1);
    }

    #[tokio::test]
    async fn test_double_failure_degrades_with_raw_text() {
        let vision = Arc::new(MockVisionModel::new("a lovely black garment"));
        let structurer = Arc::new(MockChatModel::constant("still not json"));
        let extraction = extractor(vision, structurer)
            .extract(&test_image(), None)
            .await
            .unwrap();

        match extraction {
            Extraction::Degraded { record, raw } => {
                assert_eq!(record.domain, Domain::Other);
                assert_eq!(record.raw.as_deref(), Some("a lovely black garment"));
                assert_eq!(raw, "a lovely black garment");
            }
            other => panic!("expected degraded extraction, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_restructure_call_failure_degrades() {
        let vision = Arc::new(MockVisionModel::new("prose, not json"));
        let structurer = Arc::new(MockChatModel::failing());
        let extraction = extractor(vision, structurer)
            .extract(&test_image(), None)
            .await
            .unwrap();

        assert!(extraction.is_degraded());
        assert_eq!(extraction.record().domain, Domain::Other);
    }

    #[tokio::test]
    async fn test_vision_failure_propagates() {
        let vision = Arc::new(MockVisionModel::failing());
        let structurer = Arc::new(MockChatModel::constant("unused"));
        let result = extractor(vision, structurer.clone())
            .extract(&test_image(), None)
            .await;

        assert!(result.is_err());
        assert_eq!(structurer.call_count(), 0);
    }
}
