//! Keyword-based intent detection.
//!
//! A substring heuristic standing in for a real classifier: it tags a
//! generated reply as product-seeking when purchase vocabulary shows up.
//! The product id it attaches is a fixed placeholder, never a catalog
//! lookup. Anything smarter replaces this behind the `IntentDetector`
//! seam without touching callers.

use tendero_core::traits::IntentDetector;
use tendero_core::{Intent, IntentMatch};

/// Placeholder id attached to product-seeking replies. Deliberately not a
/// plausible catalog id.
pub const PLACEHOLDER_PRODUCT_ID: &str = "0";

/// Purchase vocabulary, in the deployment's language.
const PRODUCT_KEYWORDS: &[&str] = &[
    "comprar",
    "compra",
    "precio",
    "cuesta",
    "producto",
    "disponible",
    "talla",
    "catálogo",
    "tienda",
    "envío",
];

#[derive(Debug, Default)]
pub struct KeywordIntentDetector;

impl KeywordIntentDetector {
    pub fn new() -> Self {
        Self
    }
}

impl IntentDetector for KeywordIntentDetector {
    fn classify(&self, reply: &str) -> IntentMatch {
        let lower = reply.to_lowercase();

        if PRODUCT_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
            return IntentMatch {
                intent: Intent::BuscarProducto,
                product_id: Some(PLACEHOLDER_PRODUCT_ID.to_string()),
            };
        }

        IntentMatch {
            intent: Intent::MensajeGeneral,
            product_id: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_purchase_terms_match() {
        let detector = KeywordIntentDetector::new();
        let result = detector.classify("Claro, puedes comprar la faja reductora por $95.000");
        assert_eq!(result.intent, Intent::BuscarProducto);
        assert_eq!(result.product_id.as_deref(), Some(PLACEHOLDER_PRODUCT_ID));
    }

    #[test]
    fn test_case_insensitive() {
        let detector = KeywordIntentDetector::new();
        let result = detector.classify("El PRECIO es de $50.000");
        assert_eq!(result.intent, Intent::BuscarProducto);
    }

    #[test]
    fn test_general_reply() {
        let detector = KeywordIntentDetector::new();
        let result = detector.classify("¡Hola! ¿En qué puedo ayudarte hoy?");
        assert_eq!(result.intent, Intent::MensajeGeneral);
        assert!(result.product_id.is_none());
    }
}
