//! Metadata payload for one CLM certificate.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::coerce::CoercedValue;
use crate::field::UnifiedField;
use crate::sanitize::sanitize_text;
use crate::types::DestDataType;

/// CLM field name to value, ready for a metadata update.
///
/// Text values are sanitized on insert and dropped when they end up blank.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct MetadataPayload {
    values: BTreeMap<String, CoercedValue>,
}

impl MetadataPayload {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a coerced value for `field`. Big-text values keep their line
    /// breaks, every other text value has its whitespace collapsed.
    pub fn insert(&mut self, field: &UnifiedField, value: CoercedValue) {
        let collapse = field.dest_data_type != DestDataType::BigText;
        self.insert_named(&field.dest_field_name, value, collapse);
    }

    /// Insert a value under an explicit CLM field name.
    pub fn insert_named(&mut self, name: &str, value: CoercedValue, collapse_whitespace: bool) {
        let value = match value {
            CoercedValue::Text(text) => {
                let cleaned = sanitize_text(&text, collapse_whitespace);
                if cleaned.is_empty() {
                    return;
                }
                CoercedValue::Text(cleaned)
            }
            other => other,
        };
        self.values.insert(name.to_string(), value);
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&CoercedValue> {
        self.values.get(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &CoercedValue)> {
        self.values.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FieldKind;
    use serde_json::json;

    #[test]
    fn test_insert_sanitizes_and_drops_blank() {
        let field = UnifiedField::new("Dept", "Dept", DestDataType::String, FieldKind::Custom);
        let mut payload = MetadataPayload::new();
        payload.insert(&field, CoercedValue::Text("\u{200B}  ".to_string()));
        assert!(payload.is_empty());

        payload.insert(&field, CoercedValue::Text(" Eng \n Ops ".to_string()));
        assert_eq!(payload.get("Dept"), Some(&CoercedValue::Text("Eng Ops".to_string())));
    }

    #[test]
    fn test_big_text_keeps_newlines() {
        let field = UnifiedField::new("Notes", "Notes", DestDataType::BigText, FieldKind::Custom);
        let mut payload = MetadataPayload::new();
        payload.insert(&field, CoercedValue::Text("line 1\nline 2".to_string()));
        assert_eq!(payload.get("Notes"), Some(&CoercedValue::Text("line 1\nline 2".to_string())));
    }

    #[test]
    fn test_serializes_as_object() {
        let mut payload = MetadataPayload::new();
        payload.insert_named("Count", CoercedValue::Integer(3), true);
        payload.insert_named("Active", CoercedValue::Boolean(false), true);
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({"Active": false, "Count": 3})
        );
    }
}
