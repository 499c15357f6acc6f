//! Request-scoped data model.
//!
//! Nothing here outlives a single request: media references arrive in the
//! request body, normalized media is consumed by the next pipeline stage,
//! and attribute records flow straight into the query builder.

use serde::{Deserialize, Serialize};

// =============================================================================
// Media
// =============================================================================

/// Reference to an input image or audio payload.
#[derive(Debug, Clone)]
pub enum MediaReference {
    /// Remote content to fetch.
    Url(String),
    /// Inline base64 content, optionally a full `data:` URL. The declared
    /// content type is advisory; normalization re-encodes canonically.
    Inline {
        data: String,
        content_type: Option<String>,
    },
}

impl MediaReference {
    /// Build a reference from the `url`/`base64` pair a request body
    /// carries, requiring exactly the named field to be present.
    pub fn from_parts(
        url: Option<String>,
        inline: Option<String>,
        what: &str,
    ) -> crate::Result<Self> {
        match (url, inline) {
            (Some(u), _) if !u.is_empty() => Ok(Self::Url(u)),
            (_, Some(b)) if !b.is_empty() => Ok(Self::Inline {
                data: b,
                content_type: None,
            }),
            _ => Err(crate::Error::missing_input(what.to_string())),
        }
    }
}

/// Canonical embeddable image: always JPEG, always within the configured
/// width and byte budget.
#[derive(Debug, Clone)]
pub struct NormalizedImage {
    pub mime_type: String,
    pub bytes: Vec<u8>,
    pub width: u32,
}

// =============================================================================
// Attributes
// =============================================================================

/// Product category driving query-builder field selection.
///
/// Unknown strings from the model deserialize to `Other` rather than
/// failing the whole record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    Apparel,
    Shapewear,
    Electronics,
    Phones,
    PhoneParts,
    AutoParts,
    Cameras,
    Computers,
    Furniture,
    Home,
    Books,
    Beauty,
    Toys,
    Sports,
    #[serde(other)]
    Other,
}

/// Flat attribute record extracted from a product photo.
///
/// `domain` is the only required field; everything else is optional and
/// domain-dependent. `raw` is populated only on the degraded path, carrying
/// the original model text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributeRecord {
    pub domain: Domain,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub colors: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub materials: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub features: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compatibility: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub part_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keywords: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
}

impl AttributeRecord {
    /// Minimal record for a given domain, all optional fields empty.
    pub fn bare(domain: Domain) -> Self {
        Self {
            domain,
            category: None,
            kind: None,
            brand: None,
            model: None,
            colors: None,
            materials: None,
            details: None,
            features: None,
            compatibility: None,
            part_number: None,
            size: None,
            length: None,
            fit: None,
            style: None,
            title: None,
            author: None,
            language: None,
            topic: None,
            keywords: None,
            raw: None,
        }
    }

    /// Degraded record: uncategorized, carrying the unparseable model text.
    pub fn degraded(raw: impl Into<String>) -> Self {
        let mut record = Self::bare(Domain::Other);
        record.raw = Some(raw.into());
        record
    }
}

/// Outcome of attribute extraction, tagged so callers can distinguish a
/// confident classification from a degraded one.
#[derive(Debug, Clone)]
pub enum Extraction {
    /// The model output (first or restructured) parsed against the schema.
    Parsed(AttributeRecord),
    /// Neither pass produced parseable output; the record is minimal.
    Degraded { record: AttributeRecord, raw: String },
}

impl Extraction {
    pub fn record(&self) -> &AttributeRecord {
        match self {
            Extraction::Parsed(record) => record,
            Extraction::Degraded { record, .. } => record,
        }
    }

    pub fn into_record(self) -> AttributeRecord {
        match self {
            Extraction::Parsed(record) => record,
            Extraction::Degraded { record, .. } => record,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Extraction::Degraded { .. })
    }
}

// =============================================================================
// Catalog
// =============================================================================

/// Lossy projection of a storefront product node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogItem {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub variants: Vec<CatalogVariant>,
}

/// Price and currency pass through from the storefront unmodified.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogVariant {
    pub title: String,
    pub available: bool,
    pub price: String,
    pub currency: String,
}

/// Result of a catalog search. `note` explains an unconfigured storefront;
/// it is not an error.
#[derive(Debug, Clone, Default)]
pub struct SearchOutcome {
    pub results: Vec<CatalogItem>,
    pub note: Option<String>,
}

// =============================================================================
// Intent
// =============================================================================

/// Coarse reply intent, serialized with the wire labels the messaging
/// platform expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    BuscarProducto,
    MensajeGeneral,
}

/// Classified intent plus the product id slot it may carry.
#[derive(Debug, Clone)]
pub struct IntentMatch {
    pub intent: Intent,
    pub product_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_unknown_maps_to_other() {
        let domain: Domain = serde_json::from_str("\"gardening\"").unwrap();
        assert_eq!(domain, Domain::Other);
    }

    #[test]
    fn test_domain_wire_names() {
        assert_eq!(serde_json::to_string(&Domain::PhoneParts).unwrap(), "\"phone_parts\"");
        assert_eq!(serde_json::to_string(&Domain::Other).unwrap(), "\"other\"");
        let domain: Domain = serde_json::from_str("\"auto_parts\"").unwrap();
        assert_eq!(domain, Domain::AutoParts);
    }

    #[test]
    fn test_record_requires_domain() {
        let err = serde_json::from_str::<AttributeRecord>(r#"{"category": "faja"}"#);
        assert!(err.is_err());
    }

    #[test]
    fn test_record_ignores_unknown_fields() {
        let record: AttributeRecord = serde_json::from_str(
            r#"{"domain": "apparel", "type": "faja", "confidence": 0.9}"#,
        )
        .unwrap();
        assert_eq!(record.domain, Domain::Apparel);
        assert_eq!(record.kind.as_deref(), Some("faja"));
    }

    #[test]
    fn test_degraded_record_shape() {
        let record = AttributeRecord::degraded("a black shapewear garment");
        assert_eq!(record.domain, Domain::Other);
        assert_eq!(record.raw.as_deref(), Some("a black shapewear garment"));
        assert!(record.category.is_none());
    }

    #[test]
    fn test_media_reference_requires_one_source() {
        let err = MediaReference::from_parts(None, None, "imageUrl or imageBase64");
        assert!(matches!(err, Err(crate::Error::MissingInput(_))));

        let url = MediaReference::from_parts(Some("https://x/y.jpg".into()), None, "image")
            .unwrap();
        assert!(matches!(url, MediaReference::Url(_)));
    }

    #[test]
    fn test_intent_wire_names() {
        assert_eq!(
            serde_json::to_string(&Intent::BuscarProducto).unwrap(),
            "\"buscar_producto\""
        );
        assert_eq!(
            serde_json::to_string(&Intent::MensajeGeneral).unwrap(),
            "\"mensaje_general\""
        );
    }
}
