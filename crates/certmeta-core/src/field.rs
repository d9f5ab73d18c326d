//! Unified field model.
//!
//! A [`UnifiedField`] pairs one CA custom field (or one dotted path on a CA
//! order) with one CLM metadata field. Fields are rebuilt on every run, either
//! from a fields file ([`FieldDefinition`]) or by auto-importing the CA
//! account's custom-field catalogue.

use crate::error::{CoreError, CoreResult};
use crate::mapper;
use crate::path::FieldPath;
use crate::types::{DestDataType, EnrollmentPolicy, FieldKind, SourceDataType};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashSet;

/// One field known to both platforms.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnifiedField {
    /// CA custom-field label, or a dotted order path for manual fields.
    pub source_field_name: String,
    /// CLM metadata field name.
    pub dest_field_name: String,
    pub description: String,
    pub dest_data_type: DestDataType,
    pub source_data_type: SourceDataType,
    pub hint: Option<String>,
    pub validation_regex: Option<String>,
    pub message: Option<String>,
    pub default_value: String,
    /// Trimmed, non-blank and deduplicated in first-seen order.
    pub options: Vec<String>,
    pub enrollment_policy: EnrollmentPolicy,
    pub display_order: i32,
    pub case_sensitive: bool,
    pub allow_api: bool,
    /// CA field id, 0 until resolved.
    pub source_field_id: i64,
    /// CLM field id, 0 until resolved.
    pub dest_field_id: i64,
    pub field_kind: FieldKind,
}

impl UnifiedField {
    /// Create a field with default attributes.
    pub fn new(
        source_field_name: impl Into<String>,
        dest_field_name: impl Into<String>,
        dest_data_type: DestDataType,
        field_kind: FieldKind,
    ) -> Self {
        Self {
            source_field_name: source_field_name.into(),
            dest_field_name: dest_field_name.into(),
            description: String::new(),
            dest_data_type,
            source_data_type: SourceDataType::Anything,
            hint: None,
            validation_regex: None,
            message: None,
            default_value: String::new(),
            options: Vec::new(),
            enrollment_policy: EnrollmentPolicy::Optional,
            display_order: 0,
            case_sensitive: false,
            allow_api: true,
            source_field_id: 0,
            dest_field_id: 0,
            field_kind,
        }
    }

    /// Build a custom field from an entry of the CA account catalogue.
    ///
    /// The CLM name starts out equal to the CA label; it is made safe for the
    /// CLM later by the banned-character pass. Known CA wire types decide the
    /// CLM type, other names go through the synonym table.
    #[must_use]
    pub fn from_ca_catalogue(id: i64, label: &str, data_type: Option<&str>, is_required: bool) -> Self {
        let source_data_type = mapper::source_type_from_wire(data_type);
        let dest_data_type = match source_data_type {
            SourceDataType::Anything => mapper::dest_type_from_source_string(data_type),
            known => mapper::dest_type_from_source_type(known),
        };
        let mut field = Self::new(label, label, dest_data_type, FieldKind::Custom);
        field.description = label.to_string();
        field.source_data_type = source_data_type;
        field.source_field_id = id;
        if is_required {
            field.enrollment_policy = EnrollmentPolicy::Required;
        }
        field
    }

    /// Whether the field has been matched on the CA side.
    #[must_use]
    pub fn has_source_id(&self) -> bool {
        self.source_field_id > 0
    }

    /// Whether the field has been matched on the CLM side.
    #[must_use]
    pub fn has_dest_id(&self) -> bool {
        self.dest_field_id > 0
    }
}

/// Trim, drop blanks and deduplicate options, keeping first-seen order.
///
/// Deduplication is case-sensitive so that distinct spellings survive field
/// creation; lookups compare case-insensitively.
#[must_use]
pub fn normalize_options<I, S>(options: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    options
        .into_iter()
        .map(|o| o.as_ref().trim().to_string())
        .filter(|o| !o.is_empty())
        .filter(|o| seen.insert(o.clone()))
        .collect()
}

/// A field as written in the fields file.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct FieldDefinition {
    pub source_field_name: String,
    pub dest_field_name: String,
    pub description: String,
    pub dest_data_type: DestDataType,
    pub source_data_type: SourceDataType,
    pub hint: Option<String>,
    pub validation_regex: Option<String>,
    pub message: Option<String>,
    pub default_value: Option<String>,
    #[serde(deserialize_with = "deserialize_options")]
    pub options: Vec<String>,
    pub enrollment_policy: EnrollmentPolicy,
    pub display_order: i32,
    pub case_sensitive: bool,
    #[serde(default = "default_true")]
    pub allow_api: bool,
}

fn default_true() -> bool {
    true
}

impl FieldDefinition {
    /// Validate the definition and turn it into a [`UnifiedField`].
    ///
    /// Manual fields must carry a dotted path that resolves against the
    /// order schema.
    pub fn into_unified(self, kind: FieldKind) -> CoreResult<UnifiedField> {
        let source = self.source_field_name.trim().to_string();
        let dest = self.dest_field_name.trim().to_string();
        if source.is_empty() {
            return Err(CoreError::InvalidField {
                field: dest,
                message: "source_field_name is empty".to_string(),
            });
        }
        if dest.is_empty() {
            return Err(CoreError::InvalidField {
                field: source,
                message: "dest_field_name is empty".to_string(),
            });
        }
        if kind == FieldKind::Manual {
            FieldPath::parse(&source)?;
        }
        let options = normalize_options(self.options);
        // The CLM stores choices as one comma-separated string.
        if self.dest_data_type == DestDataType::MultipleChoice {
            if let Some(option) = options.iter().find(|o| o.contains(',')) {
                return Err(CoreError::InvalidField {
                    field: dest,
                    message: format!("option '{option}' contains a comma"),
                });
            }
        }

        let mut field = UnifiedField::new(source, dest, self.dest_data_type, kind);
        field.description = self.description;
        field.source_data_type = self.source_data_type;
        field.hint = self.hint.filter(|h| !h.trim().is_empty());
        field.validation_regex = self.validation_regex.filter(|v| !v.trim().is_empty());
        field.message = self.message.filter(|m| !m.trim().is_empty());
        field.default_value = self.default_value.unwrap_or_default();
        field.options = options;
        field.enrollment_policy = self.enrollment_policy;
        field.display_order = self.display_order;
        field.case_sensitive = self.case_sensitive;
        field.allow_api = self.allow_api;
        Ok(field)
    }
}

/// Options may be written as a list or as a comma-separated string.
fn deserialize_options<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Options {
        List(Vec<String>),
        Csv(String),
        Missing(()),
    }

    Ok(match Options::deserialize(deserializer)? {
        Options::List(list) => list,
        Options::Csv(csv) => csv.split(',').map(str::to_string).collect(),
        Options::Missing(()) => Vec::new(),
    })
}

/// Contents of the fields file.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct FieldsFile {
    pub manual_fields: Vec<FieldDefinition>,
    pub custom_fields: Vec<FieldDefinition>,
}

impl FieldsFile {
    /// Validate every definition and return manual fields followed by custom fields.
    pub fn into_unified(self) -> CoreResult<(Vec<UnifiedField>, Vec<UnifiedField>)> {
        let manual = self
            .manual_fields
            .into_iter()
            .map(|d| d.into_unified(FieldKind::Manual))
            .collect::<CoreResult<Vec<_>>>()?;
        let custom = self
            .custom_fields
            .into_iter()
            .map(|d| d.into_unified(FieldKind::Custom))
            .collect::<CoreResult<Vec<_>>>()?;
        Ok((manual, custom))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_options() {
        let opts = normalize_options(vec![" Red", "Blue ", "", "  ", "Red", "red"]);
        assert_eq!(opts, vec!["Red", "Blue", "red"]);
    }

    #[test]
    fn test_choice_option_with_comma_rejected() {
        let def: FieldDefinition = serde_json::from_value(serde_json::json!({
            "source_field_name": "Site",
            "dest_field_name": "Site",
            "dest_data_type": "MultipleChoice",
            "options": ["Austin, TX", "Berlin"]
        }))
        .unwrap();
        let err = def.into_unified(FieldKind::Custom).unwrap_err();
        assert!(matches!(err, CoreError::InvalidField { ref field, .. } if field == "Site"));
        assert!(err.to_string().contains("Austin, TX"));

        let def: FieldDefinition = serde_json::from_value(serde_json::json!({
            "source_field_name": "Site",
            "dest_field_name": "Site",
            "options": ["Austin, TX"]
        }))
        .unwrap();
        assert!(def.into_unified(FieldKind::Custom).is_ok());
    }

    #[test]
    fn test_from_ca_catalogue() {
        let field = UnifiedField::from_ca_catalogue(12, "Cost Center", Some("int"), true);
        assert_eq!(field.source_field_id, 12);
        assert_eq!(field.dest_field_name, "Cost Center");
        assert_eq!(field.dest_data_type, DestDataType::Integer);
        assert_eq!(field.source_data_type, SourceDataType::Int);
        assert_eq!(field.enrollment_policy, EnrollmentPolicy::Required);
        assert!(field.allow_api);
    }

    #[test]
    fn test_from_ca_catalogue_type_resolution() {
        let field = UnifiedField::from_ca_catalogue(3, "Owners", Some("EmailList"), false);
        assert_eq!(field.source_data_type, SourceDataType::EmailList);
        assert_eq!(field.dest_data_type, DestDataType::Email);

        let field = UnifiedField::from_ca_catalogue(4, "Go Live", Some("date"), false);
        assert_eq!(field.source_data_type, SourceDataType::Anything);
        assert_eq!(field.dest_data_type, DestDataType::Date);

        let field = UnifiedField::from_ca_catalogue(5, "Notes", None, false);
        assert_eq!(field.source_data_type, SourceDataType::Anything);
        assert_eq!(field.dest_data_type, DestDataType::String);
        assert_eq!(field.enrollment_policy, EnrollmentPolicy::Optional);
    }

    #[test]
    fn test_definition_into_unified() {
        let def: FieldDefinition = serde_json::from_value(serde_json::json!({
            "source_field_name": "Team",
            "dest_field_name": "Team",
            "dest_data_type": "Multiple Choice",
            "options": "Ops, Dev,,Ops",
            "enrollment_policy": 1,
            "hint": ""
        }))
        .unwrap();
        let field = def.into_unified(FieldKind::Custom).unwrap();
        assert_eq!(field.dest_data_type, DestDataType::MultipleChoice);
        assert_eq!(field.options, vec!["Ops", "Dev"]);
        assert_eq!(field.enrollment_policy, EnrollmentPolicy::Required);
        assert_eq!(field.hint, None);
        assert!(field.allow_api);
    }

    #[test]
    fn test_definition_rejects_blank_names() {
        let def = FieldDefinition {
            source_field_name: "  ".to_string(),
            dest_field_name: "X".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            def.into_unified(FieldKind::Custom),
            Err(CoreError::InvalidField { .. })
        ));
    }

    #[test]
    fn test_manual_definition_validates_path() {
        let def = FieldDefinition {
            source_field_name: "certificate.nonsense".to_string(),
            dest_field_name: "X".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            def.into_unified(FieldKind::Manual),
            Err(CoreError::InvalidPath { .. })
        ));
    }

    #[test]
    fn test_fields_file_from_yaml_shape() {
        let file: FieldsFile = serde_json::from_value(serde_json::json!({
            "manual_fields": [
                {"source_field_name": "certificate.common_name", "dest_field_name": "CN"}
            ],
            "custom_fields": [
                {"source_field_name": "Owner", "dest_field_name": "Owner", "dest_data_type": 7}
            ]
        }))
        .unwrap();
        let (manual, custom) = file.into_unified().unwrap();
        assert_eq!(manual[0].field_kind, FieldKind::Manual);
        assert_eq!(custom[0].dest_data_type, DestDataType::Email);
    }
}
