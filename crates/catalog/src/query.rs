//! Deterministic search-query construction.
//!
//! Each domain selects a fixed ordered subset of attribute fields; values
//! are flattened and joined with single spaces. The function is pure and
//! total — missing fields are simply skipped, and the same record always
//! yields the same string.

use tendero_core::{AttributeRecord, Domain};

/// Attribute fields a domain may contribute to the query, in order.
#[derive(Debug, Clone, Copy)]
enum Field {
    Category,
    Kind,
    Brand,
    Model,
    Colors,
    Materials,
    Details,
    Features,
    Compatibility,
    PartNumber,
    Size,
    Length,
    Fit,
    Style,
    Title,
    Author,
    Language,
    Topic,
    Keywords,
}

/// Generic subset used for `other` and any future unmapped domain.
const GENERIC_FIELDS: &[Field] = &[Field::Category, Field::Kind, Field::Features, Field::Keywords];

fn fields_for(domain: Domain) -> &'static [Field] {
    use Field::*;

    match domain {
        Domain::Apparel | Domain::Shapewear => &[
            Category, Kind, Style, Length, Fit, Colors, Materials, Details, Size, Keywords,
        ],
        Domain::Electronics | Domain::Phones | Domain::Cameras | Domain::Computers => {
            &[Category, Kind, Brand, Model, Features, Keywords]
        }
        Domain::PhoneParts | Domain::AutoParts => &[
            Category, Kind, Brand, Model, Compatibility, PartNumber, Keywords,
        ],
        Domain::Furniture | Domain::Home => {
            &[Category, Kind, Style, Materials, Colors, Keywords]
        }
        Domain::Books => &[Title, Author, Language, Topic, Keywords],
        Domain::Beauty => &[Category, Kind, Brand, Details, Keywords],
        Domain::Toys | Domain::Sports => &[Category, Kind, Brand, Features, Keywords],
        Domain::Other => GENERIC_FIELDS,
    }
}

/// Build the search string for an attribute record.
pub fn build_query(attrs: &AttributeRecord) -> String {
    let mut parts: Vec<String> = Vec::new();

    for field in fields_for(attrs.domain) {
        match field {
            Field::Category => push_value(&mut parts, &attrs.category),
            Field::Kind => push_value(&mut parts, &attrs.kind),
            Field::Brand => push_value(&mut parts, &attrs.brand),
            Field::Model => push_value(&mut parts, &attrs.model),
            Field::Colors => push_values(&mut parts, &attrs.colors),
            Field::Materials => push_values(&mut parts, &attrs.materials),
            Field::Details => push_values(&mut parts, &attrs.details),
            Field::Features => push_values(&mut parts, &attrs.features),
            Field::Compatibility => push_values(&mut parts, &attrs.compatibility),
            Field::PartNumber => push_value(&mut parts, &attrs.part_number),
            Field::Size => push_value(&mut parts, &attrs.size),
            Field::Length => push_value(&mut parts, &attrs.length),
            Field::Fit => push_value(&mut parts, &attrs.fit),
            Field::Style => push_value(&mut parts, &attrs.style),
            Field::Title => push_value(&mut parts, &attrs.title),
            Field::Author => push_value(&mut parts, &attrs.author),
            Field::Language => push_value(&mut parts, &attrs.language),
            Field::Topic => push_value(&mut parts, &attrs.topic),
            Field::Keywords => push_values(&mut parts, &attrs.keywords),
        }
    }

    parts.join(" ")
}

fn push_value(parts: &mut Vec<String>, value: &Option<String>) {
    if let Some(value) = value {
        let trimmed = value.trim();
        if !trimmed.is_empty() {
            parts.push(trimmed.to_string());
        }
    }
}

fn push_values(parts: &mut Vec<String>, values: &Option<Vec<String>>) {
    if let Some(values) = values {
        for value in values {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                parts.push(trimmed.to_string());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apparel_scenario() {
        let mut record = AttributeRecord::bare(Domain::Apparel);
        record.category = Some("faja".into());
        record.colors = Some(vec!["negro".into()]);
        record.size = Some("M".into());

        assert_eq!(build_query(&record), "faja negro M");
    }

    #[test]
    fn test_deterministic() {
        let mut record = AttributeRecord::bare(Domain::Electronics);
        record.category = Some("audífonos".into());
        record.brand = Some("Sony".into());
        record.features = Some(vec!["bluetooth".into(), "noise cancelling".into()]);

        let first = build_query(&record);
        let second = build_query(&record);
        assert_eq!(first, second);
        assert_eq!(first, "audífonos Sony bluetooth noise cancelling");
    }

    #[test]
    fn test_absent_fields_never_appear() {
        let mut record = AttributeRecord::bare(Domain::Books);
        record.title = Some("Rayuela".into());
        // Fields outside the books subset are ignored even when present.
        record.colors = Some(vec!["azul".into()]);

        assert_eq!(build_query(&record), "Rayuela");
    }

    #[test]
    fn test_empty_record_builds_empty_query() {
        assert_eq!(build_query(&AttributeRecord::bare(Domain::Apparel)), "");
    }

    #[test]
    fn test_whitespace_values_skipped() {
        let mut record = AttributeRecord::bare(Domain::Other);
        record.category = Some("  ".into());
        record.keywords = Some(vec!["".into(), "repuesto ".into()]);

        assert_eq!(build_query(&record), "repuesto");
    }

    #[test]
    fn test_parts_domain_order() {
        let mut record = AttributeRecord::bare(Domain::AutoParts);
        record.kind = Some("pastillas de freno".into());
        record.compatibility = Some(vec!["Mazda 3".into()]);
        record.part_number = Some("BP-4421".into());

        assert_eq!(build_query(&record), "pastillas de freno Mazda 3 BP-4421");
    }

    #[test]
    fn test_other_uses_generic_subset() {
        let mut record = AttributeRecord::bare(Domain::Other);
        record.category = Some("herramienta".into());
        record.kind = Some("taladro".into());
        record.brand = Some("ignored".into());

        assert_eq!(build_query(&record), "herramienta taladro");
    }
}
