//! Dotted-path access into CA order records.
//!
//! Manual fields name a property of the order detail record with a dotted
//! path such as `certificate.common_name` or `organization.address.locality`.
//! Paths are checked against a fixed schema of the order record when the
//! fields file is loaded, so a typo fails the run before any remote call.

use crate::error::{CoreError, CoreResult};
use serde_json::Value;

/// Shape of one property in the order schema.
#[derive(Debug)]
enum Node {
    /// Scalar or array value.
    Leaf,
    /// Nested object with its own known properties.
    Object(&'static [(&'static str, Node)]),
}

const CONTACT: &[(&str, Node)] = &[
    ("id", Node::Leaf),
    ("name", Node::Leaf),
    ("first_name", Node::Leaf),
    ("last_name", Node::Leaf),
    ("email", Node::Leaf),
    ("telephone", Node::Leaf),
    ("job_title", Node::Leaf),
];

const ID_NAME: &[(&str, Node)] = &[("id", Node::Leaf), ("name", Node::Leaf)];

const ADDRESS: &[(&str, Node)] = &[
    ("street_address", Node::Leaf),
    ("address", Node::Leaf),
    ("address2", Node::Leaf),
    ("locality", Node::Leaf),
    ("city", Node::Leaf),
    ("state", Node::Leaf),
    ("postal_code", Node::Leaf),
    ("zip", Node::Leaf),
    ("country", Node::Leaf),
];

const CERTIFICATE: &[(&str, Node)] = &[
    ("id", Node::Leaf),
    ("thumbprint", Node::Leaf),
    ("serial_number", Node::Leaf),
    ("common_name", Node::Leaf),
    ("dns_names", Node::Leaf),
    ("emails", Node::Leaf),
    ("date_created", Node::Leaf),
    ("date_issued", Node::Leaf),
    ("valid_from", Node::Leaf),
    ("valid_till", Node::Leaf),
    ("days_remaining", Node::Leaf),
    ("csr", Node::Leaf),
    ("organization_units", Node::Leaf),
    ("signature_hash", Node::Leaf),
    ("key_size", Node::Leaf),
    ("user_id", Node::Leaf),
    ("organization", Node::Object(&[("id", Node::Leaf)])),
    ("server_platform", Node::Object(ID_NAME)),
    ("ca_cert", Node::Object(ID_NAME)),
];

const ORGANIZATION: &[(&str, Node)] = &[
    ("id", Node::Leaf),
    ("name", Node::Leaf),
    ("assumed_name", Node::Leaf),
    ("display_name", Node::Leaf),
    ("telephone", Node::Leaf),
    ("address", Node::Object(ADDRESS)),
];

const PRODUCT: &[(&str, Node)] = &[
    ("name_id", Node::Leaf),
    ("name", Node::Leaf),
    ("type", Node::Leaf),
    ("type_hint", Node::Leaf),
    ("brand", Node::Leaf),
    ("description", Node::Leaf),
];

const ORDER: &[(&str, Node)] = &[
    ("id", Node::Leaf),
    ("status", Node::Leaf),
    ("date_created", Node::Leaf),
    ("product_name_id", Node::Leaf),
    ("additional_emails", Node::Leaf),
    ("is_renewal", Node::Leaf),
    ("renewed_order_id", Node::Leaf),
    ("certificate", Node::Object(CERTIFICATE)),
    ("organization", Node::Object(ORGANIZATION)),
    ("organization_contact", Node::Object(CONTACT)),
    ("technical_contact", Node::Object(CONTACT)),
    ("user", Node::Object(CONTACT)),
    ("container", Node::Object(ID_NAME)),
    ("product", Node::Object(PRODUCT)),
];

/// A validated dotted path into an order record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath {
    segments: Vec<String>,
}

impl FieldPath {
    /// Parse and validate a dotted path against the order schema.
    ///
    /// Segments are matched case-insensitively.
    pub fn parse(raw: &str) -> CoreResult<Self> {
        let invalid = |message: String| CoreError::InvalidPath {
            path: raw.to_string(),
            message,
        };

        let segments: Vec<String> = raw.trim().split('.').map(str::to_lowercase).collect();
        let mut level = ORDER;
        let mut at_leaf = false;
        for (i, segment) in segments.iter().enumerate() {
            if segment.is_empty() {
                return Err(invalid("empty path segment".to_string()));
            }
            if at_leaf {
                return Err(invalid(format!(
                    "'{}' has no nested properties",
                    segments[..i].join(".")
                )));
            }
            let Some((_, node)) = level.iter().find(|(name, _)| *name == segment.as_str()) else {
                return Err(invalid(format!("unknown property '{segment}'")));
            };
            match node {
                Node::Leaf => at_leaf = true,
                Node::Object(children) => level = *children,
            }
        }
        Ok(Self { segments })
    }

    /// Look the path up in a serialized order record.
    ///
    /// Returns `None` when any step is missing or the final value is null.
    #[must_use]
    pub fn resolve<'a>(&self, order: &'a Value) -> Option<&'a Value> {
        let value = self
            .segments
            .iter()
            .try_fold(order, |node, segment| node.get(segment.as_str()))?;
        (!value.is_null()).then_some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_known_paths() {
        assert!(FieldPath::parse("id").is_ok());
        assert!(FieldPath::parse("certificate.common_name").is_ok());
        assert!(FieldPath::parse("Organization.Address.Locality").is_ok());
        assert!(FieldPath::parse("certificate.ca_cert.name").is_ok());
        assert!(FieldPath::parse("technical_contact").is_ok());
    }

    #[test]
    fn test_parse_rejects_unknown_and_malformed() {
        assert!(FieldPath::parse("certificat.common_name").is_err());
        assert!(FieldPath::parse("certificate..id").is_err());
        assert!(FieldPath::parse("certificate.common_name.length").is_err());
        assert!(FieldPath::parse("").is_err());
    }

    #[test]
    fn test_resolve() {
        let order = json!({
            "id": 4411,
            "certificate": { "common_name": "www.example.com", "dns_names": ["a", "b"] },
            "organization": { "address": null }
        });
        let cn = FieldPath::parse("certificate.common_name").unwrap();
        assert_eq!(cn.resolve(&order), Some(&json!("www.example.com")));
        let id = FieldPath::parse("id").unwrap();
        assert_eq!(id.resolve(&order), Some(&json!(4411)));
        let city = FieldPath::parse("organization.address.locality").unwrap();
        assert_eq!(city.resolve(&order), None);
        let missing = FieldPath::parse("container.name").unwrap();
        assert_eq!(missing.resolve(&order), None);
    }
}
