//! Type mapping between CA custom-field types and CLM metadata types.
//!
//! All functions are total: unknown or absent inputs map to the platform's
//! plain text type.

use crate::types::{DestDataType, EnrollmentPolicy, SourceDataType};

/// Map a free-form CA type name to a CLM data type.
///
/// Matching is case-insensitive after trimming; anything unrecognised,
/// including an absent name, maps to [`DestDataType::String`].
#[must_use]
pub fn dest_type_from_source_string(name: Option<&str>) -> DestDataType {
    let Some(name) = name else {
        return DestDataType::String;
    };
    match name.trim().to_lowercase().as_str() {
        "text" | "string" => DestDataType::String,
        "int" | "integer" | "number" => DestDataType::Integer,
        "date" | "datetime" => DestDataType::Date,
        "bool" | "boolean" => DestDataType::Boolean,
        "select" | "dropdown" | "drop_down_menu" | "picklist" | "options" | "choice" => {
            DestDataType::String
        }
        "textarea" | "multiline" => DestDataType::BigText,
        "email" | "email_address" | "email_list" => DestDataType::Email,
        _ => DestDataType::String,
    }
}

/// Map a CA data type to the CLM data type used when auto-importing fields.
#[must_use]
pub fn dest_type_from_source_type(source: SourceDataType) -> DestDataType {
    match source {
        SourceDataType::Anything | SourceDataType::Text => DestDataType::String,
        SourceDataType::Int => DestDataType::Integer,
        SourceDataType::EmailAddress | SourceDataType::EmailList => DestDataType::Email,
    }
}

/// Map a CLM data type to the CA data type used when creating a CA field.
///
/// The CLM has no list-of-emails concept, so `Email` maps to a single address.
#[must_use]
pub fn source_type_from_dest_type(dest: DestDataType) -> SourceDataType {
    match dest {
        DestDataType::Integer => SourceDataType::Int,
        DestDataType::Email => SourceDataType::EmailAddress,
        DestDataType::String
        | DestDataType::BigText
        | DestDataType::MultipleChoice
        | DestDataType::Date
        | DestDataType::Boolean => SourceDataType::Text,
    }
}

/// Parse a CA wire token (or a loose synonym) into a CA data type.
///
/// `-` and spaces are treated as `_`, numeric codes are accepted, and
/// anything else is `Anything`.
#[must_use]
pub fn source_type_from_wire(token: Option<&str>) -> SourceDataType {
    let Some(token) = token else {
        return SourceDataType::Anything;
    };
    let key = token.trim().replace(['-', ' '], "_").to_lowercase();
    if let Ok(code) = key.parse::<i64>() {
        return SourceDataType::from_code(code).unwrap_or_default();
    }
    match key.as_str() {
        "text" | "string" => SourceDataType::Text,
        "int" | "integer" | "number" => SourceDataType::Int,
        "email" | "email_address" | "emailaddress" => SourceDataType::EmailAddress,
        "email_list" | "emaillist" | "emails" | "email_address_list" => SourceDataType::EmailList,
        _ => SourceDataType::Anything,
    }
}

/// Wire token for a CA data type; `None` means the field is omitted.
#[must_use]
pub fn wire_from_source_type(source: SourceDataType) -> Option<&'static str> {
    source.wire_token()
}

/// Translate an enrollment policy into the CA's `(is_required, is_active)` flags.
#[must_use]
pub fn enrollment_to_source_flags(policy: EnrollmentPolicy) -> (bool, bool) {
    match policy {
        EnrollmentPolicy::Required => (true, true),
        EnrollmentPolicy::Hidden => (false, false),
        EnrollmentPolicy::Optional => (false, true),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_string_synonyms() {
        assert_eq!(dest_type_from_source_string(Some("Number")), DestDataType::Integer);
        assert_eq!(dest_type_from_source_string(Some(" datetime ")), DestDataType::Date);
        assert_eq!(dest_type_from_source_string(Some("BOOL")), DestDataType::Boolean);
        assert_eq!(dest_type_from_source_string(Some("picklist")), DestDataType::String);
        assert_eq!(dest_type_from_source_string(Some("textarea")), DestDataType::BigText);
        assert_eq!(dest_type_from_source_string(Some("email_list")), DestDataType::Email);
    }

    #[test]
    fn test_source_string_unknown_or_absent_is_string() {
        assert_eq!(dest_type_from_source_string(None), DestDataType::String);
        assert_eq!(dest_type_from_source_string(Some("")), DestDataType::String);
        assert_eq!(dest_type_from_source_string(Some("gibberish")), DestDataType::String);
    }

    #[test]
    fn test_source_type_to_dest() {
        assert_eq!(dest_type_from_source_type(SourceDataType::Anything), DestDataType::String);
        assert_eq!(dest_type_from_source_type(SourceDataType::Text), DestDataType::String);
        assert_eq!(dest_type_from_source_type(SourceDataType::Int), DestDataType::Integer);
        assert_eq!(dest_type_from_source_type(SourceDataType::EmailAddress), DestDataType::Email);
        assert_eq!(dest_type_from_source_type(SourceDataType::EmailList), DestDataType::Email);
    }

    #[test]
    fn test_dest_to_source() {
        assert_eq!(source_type_from_dest_type(DestDataType::Integer), SourceDataType::Int);
        assert_eq!(source_type_from_dest_type(DestDataType::Email), SourceDataType::EmailAddress);
        assert_eq!(source_type_from_dest_type(DestDataType::Boolean), SourceDataType::Text);
        assert_eq!(source_type_from_dest_type(DestDataType::MultipleChoice), SourceDataType::Text);
    }

    #[test]
    fn test_wire_token_parsing() {
        assert_eq!(source_type_from_wire(Some("email-address")), SourceDataType::EmailAddress);
        assert_eq!(source_type_from_wire(Some("Email Address List")), SourceDataType::EmailList);
        assert_eq!(source_type_from_wire(Some("EmailList")), SourceDataType::EmailList);
        assert_eq!(source_type_from_wire(Some("3")), SourceDataType::EmailAddress);
        assert_eq!(source_type_from_wire(Some("dropdown")), SourceDataType::Anything);
        assert_eq!(source_type_from_wire(None), SourceDataType::Anything);
    }

    #[test]
    fn test_wire_roundtrip_for_named_types() {
        for t in [
            SourceDataType::Text,
            SourceDataType::Int,
            SourceDataType::EmailAddress,
            SourceDataType::EmailList,
        ] {
            assert_eq!(source_type_from_wire(wire_from_source_type(t)), t);
        }
        assert_eq!(wire_from_source_type(SourceDataType::Anything), None);
    }

    #[test]
    fn test_enrollment_flags() {
        assert_eq!(enrollment_to_source_flags(EnrollmentPolicy::Required), (true, true));
        assert_eq!(enrollment_to_source_flags(EnrollmentPolicy::Hidden), (false, false));
        assert_eq!(enrollment_to_source_flags(EnrollmentPolicy::Optional), (false, true));
    }
}
