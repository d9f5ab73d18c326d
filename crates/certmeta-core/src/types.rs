//! Field type definitions
//!
//! Data types for both platforms, the enrollment policy and the field kind.
//! `DestDataType` describes a CLM metadata field, `SourceDataType` describes a
//! CA account custom field.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Data type of a CLM metadata field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Default)]
pub enum DestDataType {
    #[default]
    String,
    Integer,
    Date,
    Boolean,
    MultipleChoice,
    BigText,
    Email,
}

impl DestDataType {
    /// Get all available data types.
    #[must_use]
    pub fn all() -> &'static [DestDataType] {
        &[
            DestDataType::String,
            DestDataType::Integer,
            DestDataType::Date,
            DestDataType::Boolean,
            DestDataType::MultipleChoice,
            DestDataType::BigText,
            DestDataType::Email,
        ]
    }

    /// Numeric code used on the CLM wire.
    #[must_use]
    pub fn code(&self) -> i32 {
        match self {
            DestDataType::String => 1,
            DestDataType::Integer => 2,
            DestDataType::Date => 3,
            DestDataType::Boolean => 4,
            DestDataType::MultipleChoice => 5,
            DestDataType::BigText => 6,
            DestDataType::Email => 7,
        }
    }

    /// Look up a data type by wire code.
    #[must_use]
    pub fn from_code(code: i64) -> Option<Self> {
        Self::all().iter().copied().find(|t| i64::from(t.code()) == code)
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            DestDataType::String => "String",
            DestDataType::Integer => "Integer",
            DestDataType::Date => "Date",
            DestDataType::Boolean => "Boolean",
            DestDataType::MultipleChoice => "MultipleChoice",
            DestDataType::BigText => "BigText",
            DestDataType::Email => "Email",
        }
    }
}

impl fmt::Display for DestDataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DestDataType {
    type Err = ParseTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, ' ' | '_' | '-'))
            .collect::<String>()
            .to_lowercase();
        if let Ok(code) = key.parse::<i64>() {
            return Self::from_code(code).ok_or_else(|| ParseTypeError::new("data type", s));
        }
        match key.as_str() {
            "string" => Ok(DestDataType::String),
            "integer" | "int" => Ok(DestDataType::Integer),
            "date" => Ok(DestDataType::Date),
            "boolean" | "bool" => Ok(DestDataType::Boolean),
            "multiplechoice" => Ok(DestDataType::MultipleChoice),
            "bigtext" => Ok(DestDataType::BigText),
            "email" => Ok(DestDataType::Email),
            _ => Err(ParseTypeError::new("data type", s)),
        }
    }
}

impl<'de> Deserialize<'de> for DestDataType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match CodeOrName::deserialize(deserializer)? {
            // Unknown numeric codes fall back to a plain string field.
            CodeOrName::Code(code) => Ok(Self::from_code(code).unwrap_or_default()),
            CodeOrName::Name(name) => name.parse().map_err(serde::de::Error::custom),
        }
    }
}

/// Data type of a CA account custom field.
///
/// `Anything` is the unconstrained type; it is omitted from the wire when
/// creating a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Default)]
pub enum SourceDataType {
    #[default]
    Anything,
    Text,
    Int,
    EmailAddress,
    EmailList,
}

impl SourceDataType {
    #[must_use]
    pub fn code(&self) -> i32 {
        match self {
            SourceDataType::Anything => 0,
            SourceDataType::Text => 1,
            SourceDataType::Int => 2,
            SourceDataType::EmailAddress => 3,
            SourceDataType::EmailList => 4,
        }
    }

    #[must_use]
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(SourceDataType::Anything),
            1 => Some(SourceDataType::Text),
            2 => Some(SourceDataType::Int),
            3 => Some(SourceDataType::EmailAddress),
            4 => Some(SourceDataType::EmailList),
            _ => None,
        }
    }

    /// Wire token sent to the CA, `None` for `Anything`.
    #[must_use]
    pub fn wire_token(&self) -> Option<&'static str> {
        match self {
            SourceDataType::Anything => None,
            SourceDataType::Text => Some("text"),
            SourceDataType::Int => Some("int"),
            SourceDataType::EmailAddress => Some("email_address"),
            SourceDataType::EmailList => Some("email_list"),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceDataType::Anything => "Anything",
            SourceDataType::Text => "Text",
            SourceDataType::Int => "Int",
            SourceDataType::EmailAddress => "EmailAddress",
            SourceDataType::EmailList => "EmailList",
        }
    }
}

impl fmt::Display for SourceDataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl<'de> Deserialize<'de> for SourceDataType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match CodeOrName::deserialize(deserializer)? {
            CodeOrName::Code(code) => Ok(Self::from_code(code).unwrap_or_default()),
            CodeOrName::Name(name) => Ok(crate::mapper::source_type_from_wire(Some(&name))),
        }
    }
}

/// Enrollment behaviour of a CLM metadata field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Default)]
pub enum EnrollmentPolicy {
    #[default]
    Optional,
    Required,
    Hidden,
}

impl EnrollmentPolicy {
    #[must_use]
    pub fn code(&self) -> i32 {
        match self {
            EnrollmentPolicy::Optional => 0,
            EnrollmentPolicy::Required => 1,
            EnrollmentPolicy::Hidden => 2,
        }
    }

    #[must_use]
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(EnrollmentPolicy::Optional),
            1 => Some(EnrollmentPolicy::Required),
            2 => Some(EnrollmentPolicy::Hidden),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            EnrollmentPolicy::Optional => "optional",
            EnrollmentPolicy::Required => "required",
            EnrollmentPolicy::Hidden => "hidden",
        }
    }
}

impl fmt::Display for EnrollmentPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EnrollmentPolicy {
    type Err = ParseTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_lowercase();
        if let Ok(code) = key.parse::<i64>() {
            return Self::from_code(code).ok_or_else(|| ParseTypeError::new("enrollment", s));
        }
        match key.as_str() {
            "optional" => Ok(EnrollmentPolicy::Optional),
            "required" => Ok(EnrollmentPolicy::Required),
            "hidden" => Ok(EnrollmentPolicy::Hidden),
            _ => Err(ParseTypeError::new("enrollment", s)),
        }
    }
}

impl<'de> Deserialize<'de> for EnrollmentPolicy {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match CodeOrName::deserialize(deserializer)? {
            CodeOrName::Code(code) => Ok(Self::from_code(code).unwrap_or_default()),
            CodeOrName::Name(name) => name.parse().map_err(serde::de::Error::custom),
        }
    }
}

/// How a field's value is obtained from a CA order.
///
/// `Manual` fields are read from a dotted path on the order record, `Custom`
/// fields from the order's custom-field values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Manual,
    #[default]
    Custom,
}

impl FieldKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Manual => "manual",
            FieldKind::Custom => "custom",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Config files carry types either as a numeric code or as a name.
#[derive(Deserialize)]
#[serde(untagged)]
enum CodeOrName {
    Code(i64),
    Name(String),
}

/// Error parsing a type name from string.
#[derive(Debug, Clone)]
pub struct ParseTypeError {
    kind: &'static str,
    value: String,
}

impl ParseTypeError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

impl fmt::Display for ParseTypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {} '{}'", self.kind, self.value)
    }
}

impl std::error::Error for ParseTypeError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dest_type_codes_are_stable() {
        let codes: Vec<i32> = DestDataType::all().iter().map(DestDataType::code).collect();
        assert_eq!(codes, vec![1, 2, 3, 4, 5, 6, 7]);
        assert_eq!(DestDataType::from_code(5), Some(DestDataType::MultipleChoice));
        assert_eq!(DestDataType::from_code(42), None);
    }

    #[test]
    fn test_dest_type_from_str_lenient() {
        assert_eq!("Multiple Choice".parse::<DestDataType>().unwrap(), DestDataType::MultipleChoice);
        assert_eq!("big_text".parse::<DestDataType>().unwrap(), DestDataType::BigText);
        assert_eq!("6".parse::<DestDataType>().unwrap(), DestDataType::BigText);
        assert!("widget".parse::<DestDataType>().is_err());
    }

    #[test]
    fn test_dest_type_deserialize_unknown_code_defaults_to_string() {
        let t: DestDataType = serde_json::from_str("99").unwrap();
        assert_eq!(t, DestDataType::String);
        let t: DestDataType = serde_json::from_str("\"Date\"").unwrap();
        assert_eq!(t, DestDataType::Date);
    }

    #[test]
    fn test_source_type_wire_tokens() {
        assert_eq!(SourceDataType::Anything.wire_token(), None);
        assert_eq!(SourceDataType::EmailList.wire_token(), Some("email_list"));
        let t: SourceDataType = serde_json::from_str("\"email-address\"").unwrap();
        assert_eq!(t, SourceDataType::EmailAddress);
        let t: SourceDataType = serde_json::from_str("2").unwrap();
        assert_eq!(t, SourceDataType::Int);
    }

    #[test]
    fn test_enrollment_parse() {
        assert_eq!("Required".parse::<EnrollmentPolicy>().unwrap(), EnrollmentPolicy::Required);
        assert_eq!("2".parse::<EnrollmentPolicy>().unwrap(), EnrollmentPolicy::Hidden);
        let e: EnrollmentPolicy = serde_json::from_str("7").unwrap();
        assert_eq!(e, EnrollmentPolicy::Optional);
    }
}
