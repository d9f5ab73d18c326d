//! Wire models for the CLM REST API (PascalCase JSON).

use std::collections::BTreeMap;

use certmeta_core::{field::normalize_options, CatalogField, DestDataType, MetadataPayload, UnifiedField};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// One entry of the CLM metadata field catalogue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ClmMetadataField {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Numeric data type code.
    #[serde(default)]
    pub data_type: i64,
    #[serde(default)]
    pub hint: Option<String>,
    #[serde(default)]
    pub validation: Option<String>,
    #[serde(default)]
    pub enrollment: i64,
    #[serde(default)]
    pub message: Option<String>,
    /// Comma-separated choices for multiple-choice fields.
    #[serde(default)]
    pub options: Option<String>,
    #[serde(default)]
    pub default_value: Option<String>,
    #[serde(default)]
    pub display_order: i32,
    #[serde(default)]
    pub case_sensitive: bool,
    #[serde(default, rename = "AllowAPI")]
    pub allow_api: bool,
}

impl ClmMetadataField {
    /// Parsed choice list.
    #[must_use]
    pub fn option_list(&self) -> Vec<String> {
        self.options
            .as_deref()
            .map(|csv| normalize_options(csv.split(',')))
            .unwrap_or_default()
    }
}

impl CatalogField for ClmMetadataField {
    fn id(&self) -> i64 {
        self.id
    }

    fn label(&self) -> &str {
        &self.name
    }

    fn dest_data_type(&self) -> Option<DestDataType> {
        DestDataType::from_code(self.data_type)
    }
}

/// `POST MetadataFields` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ClmMetadataFieldRequest {
    pub name: String,
    pub description: String,
    pub data_type: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation: Option<String>,
    pub enrollment: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    pub display_order: i32,
    pub case_sensitive: bool,
    #[serde(rename = "AllowAPI")]
    pub allow_api: bool,
}

impl ClmMetadataFieldRequest {
    /// Creation request for a field missing from the CLM catalogue.
    ///
    /// The CLM rejects an empty description, so the field name stands in.
    #[must_use]
    pub fn from_unified(field: &UnifiedField) -> Self {
        let description = if field.description.trim().is_empty() {
            field.dest_field_name.clone()
        } else {
            field.description.clone()
        };
        let options = (field.dest_data_type == DestDataType::MultipleChoice && !field.options.is_empty())
            .then(|| field.options.join(","));
        Self {
            name: field.dest_field_name.clone(),
            description,
            data_type: field.dest_data_type.code(),
            hint: field.hint.clone(),
            validation: field.validation_regex.clone(),
            enrollment: field.enrollment_policy.code(),
            message: field.message.clone(),
            options,
            default_value: (!field.default_value.is_empty()).then(|| field.default_value.clone()),
            display_order: field.display_order,
            case_sensitive: field.case_sensitive,
            allow_api: field.allow_api,
        }
    }
}

/// A certificate from the CLM inventory.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ClmCertificate {
    pub id: i64,
    #[serde(default)]
    pub serial_number: Option<String>,
    #[serde(default)]
    pub thumbprint: Option<String>,
    #[serde(default, rename = "IssuerDN")]
    pub issuer_dn: Option<String>,
    /// Stored metadata as text, whatever JSON type the CLM used.
    #[serde(default, deserialize_with = "deserialize_metadata")]
    pub metadata: BTreeMap<String, String>,
}

/// Metadata values come back as strings, numbers or booleans depending on the
/// field type; nulls mean "unset" and are dropped.
fn deserialize_metadata<'de, D: Deserializer<'de>>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error> {
    let raw: Option<BTreeMap<String, Value>> = Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .filter_map(|(name, value)| {
            let text = match value {
                Value::Null => return None,
                Value::String(s) => s,
                other => other.to_string(),
            };
            Some((name, text))
        })
        .collect())
}

/// `PUT Certificates/Metadata` body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ClmMetadataUpdate<'a> {
    pub id: i64,
    pub metadata: &'a MetadataPayload,
}

#[cfg(test)]
mod tests {
    use super::*;
    use certmeta_core::{CoercedValue, EnrollmentPolicy, FieldKind};
    use serde_json::json;

    #[test]
    fn test_metadata_field_round_trip_names() {
        let field: ClmMetadataField = serde_json::from_value(json!({
            "Id": 3,
            "Name": "Team",
            "Description": "Owning team",
            "DataType": 5,
            "Options": "Ops, Dev,,Ops",
            "AllowAPI": true
        }))
        .unwrap();
        assert_eq!(field.dest_data_type(), Some(DestDataType::MultipleChoice));
        assert_eq!(field.option_list(), vec!["Ops", "Dev"]);
        assert!(field.allow_api);
        assert_eq!(field.label(), "Team");
    }

    #[test]
    fn test_unknown_data_type_code() {
        let field: ClmMetadataField = serde_json::from_value(json!({"Id": 1, "Name": "X", "DataType": 42})).unwrap();
        assert_eq!(field.dest_data_type(), None);
    }

    #[test]
    fn test_field_request_from_unified() {
        let mut field = UnifiedField::new("Team", "Team", DestDataType::MultipleChoice, FieldKind::Custom);
        field.options = vec!["Ops".into(), "Dev".into()];
        field.enrollment_policy = EnrollmentPolicy::Required;
        let body = serde_json::to_value(ClmMetadataFieldRequest::from_unified(&field)).unwrap();
        assert_eq!(
            body,
            json!({
                "Name": "Team",
                "Description": "Team",
                "DataType": 5,
                "Enrollment": 1,
                "Options": "Ops,Dev",
                "DisplayOrder": 0,
                "CaseSensitive": false,
                "AllowAPI": true
            })
        );
    }

    #[test]
    fn test_certificate_metadata_is_stringified() {
        let cert: ClmCertificate = serde_json::from_value(json!({
            "Id": 12,
            "SerialNumber": "0A1B",
            "IssuerDN": "CN=DigiCert Global G2",
            "Metadata": {"Dept": "Eng", "Count": 3, "Active": true, "Unset": null}
        }))
        .unwrap();
        assert_eq!(cert.metadata.get("Dept").map(String::as_str), Some("Eng"));
        assert_eq!(cert.metadata.get("Count").map(String::as_str), Some("3"));
        assert_eq!(cert.metadata.get("Active").map(String::as_str), Some("true"));
        assert!(!cert.metadata.contains_key("Unset"));
    }

    #[test]
    fn test_certificate_without_metadata() {
        let cert: ClmCertificate = serde_json::from_value(json!({"Id": 1, "Metadata": null})).unwrap();
        assert!(cert.metadata.is_empty());
        let cert: ClmCertificate = serde_json::from_value(json!({"Id": 2})).unwrap();
        assert!(cert.metadata.is_empty());
    }

    #[test]
    fn test_metadata_update_body() {
        let mut payload = MetadataPayload::new();
        payload.insert_named("Dept", CoercedValue::Text("Eng".into()), true);
        let body = serde_json::to_value(ClmMetadataUpdate {
            id: 9,
            metadata: &payload,
        })
        .unwrap();
        assert_eq!(body, json!({"Id": 9, "Metadata": {"Dept": "Eng"}}));
    }
}
