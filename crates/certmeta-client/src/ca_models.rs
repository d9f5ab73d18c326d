//! Wire models for the CA order-management API.

use certmeta_core::{mapper, CatalogField, SourceDataType, UnifiedField};
use serde::{Deserialize, Serialize};
use serde_json::Value;

fn default_true() -> bool {
    true
}

/// One entry of the account's custom-field catalogue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaCustomField {
    pub id: i64,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_required: bool,
    #[serde(default = "default_true")]
    pub is_active: bool,
    /// Validation token (`text`, `int`, `email_address`, `email_list`); absent
    /// means "anything".
    #[serde(default)]
    pub data_type: Option<String>,
}

impl CatalogField for CaCustomField {
    fn id(&self) -> i64 {
        self.id
    }

    fn label(&self) -> &str {
        &self.label
    }
}

/// `GET account/metadata` response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CaCustomFieldList {
    #[serde(default)]
    pub metadata: Vec<CaCustomField>,
}

/// `POST account/metadata` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CaCustomFieldCreate {
    pub label: String,
    pub is_required: bool,
    pub is_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,
    pub show_in_receipt: bool,
}

impl CaCustomFieldCreate {
    /// Creation request for a custom field missing from the CA account.
    ///
    /// Fields without an explicit CA type take the closest match for their
    /// CLM type.
    #[must_use]
    pub fn from_unified(field: &UnifiedField) -> Self {
        let (is_required, is_active) = mapper::enrollment_to_source_flags(field.enrollment_policy);
        let source_type = if field.source_data_type == SourceDataType::Anything {
            mapper::source_type_from_dest_type(field.dest_data_type)
        } else {
            field.source_data_type
        };
        Self {
            label: field.source_field_name.clone(),
            is_required,
            is_active,
            data_type: mapper::wire_from_source_type(source_type).map(str::to_string),
            show_in_receipt: false,
        }
    }
}

/// `POST order/certificate/{order_id}/custom-field` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CaCustomFieldValueUpdate {
    pub metadata_id: i64,
    pub value: String,
}

/// A custom-field value stored on an order.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OrderCustomField {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub metadata_id: Option<i64>,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub value: Value,
}

/// Certificate block of an order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct OrderCertificate {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub common_name: Option<String>,
    #[serde(default)]
    pub serial_number: Option<String>,
    #[serde(default)]
    pub thumbprint: Option<String>,
}

/// A certificate order as returned by `GET order/certificate/{identifier}`.
///
/// The typed fields cover what the sync engine reads directly; `raw` keeps the
/// full record for dotted-path lookups by manual fields.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderDetail {
    pub id: i64,
    pub status: Option<String>,
    pub certificate: Option<OrderCertificate>,
    pub custom_fields: Vec<OrderCustomField>,
    pub raw: Value,
}

impl OrderDetail {
    /// Build an order from its JSON record.
    pub fn from_value(raw: Value) -> Result<Self, serde_json::Error> {
        #[derive(Deserialize)]
        struct Typed {
            id: i64,
            #[serde(default)]
            status: Option<String>,
            #[serde(default)]
            certificate: Option<OrderCertificate>,
            #[serde(default)]
            custom_fields: Option<Vec<OrderCustomField>>,
        }

        let typed = Typed::deserialize(&raw)?;
        Ok(Self {
            id: typed.id,
            status: typed.status,
            certificate: typed.certificate,
            custom_fields: typed.custom_fields.unwrap_or_default(),
            raw,
        })
    }

    /// Stored value of the custom field labelled `label` (case-insensitive).
    #[must_use]
    pub fn custom_field_value(&self, label: &str) -> Option<&Value> {
        let wanted = label.trim().to_lowercase();
        self.custom_fields
            .iter()
            .find(|f| f.label.trim().to_lowercase() == wanted)
            .map(|f| &f.value)
            .filter(|v| !v.is_null())
    }
}

/// `GET order/certificate?filters[...]` response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderList {
    #[serde(default)]
    pub orders: Vec<OrderSummary>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrderSummary {
    pub id: i64,
    #[serde(default)]
    pub certificate: Option<OrderCertificate>,
}

/// `POST reports/query` body looking up an order id by thumbprint.
#[derive(Debug, Clone, Serialize)]
pub struct ThumbprintReportQuery {
    pub query: &'static str,
    pub variables: ThumbprintVariables,
}

#[derive(Debug, Clone, Serialize)]
pub struct ThumbprintVariables {
    pub t: String,
}

impl ThumbprintReportQuery {
    const QUERY: &'static str = "query($t:String!){ order_details(thumbprint:$t, limit:1){ id } }";

    #[must_use]
    pub fn new(thumbprint: &str) -> Self {
        Self {
            query: Self::QUERY,
            variables: ThumbprintVariables {
                t: thumbprint.to_string(),
            },
        }
    }
}

/// `POST reports/query` response. Ids come back as strings or numbers.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ThumbprintReportResponse {
    #[serde(default)]
    pub data: Option<ThumbprintReportData>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ThumbprintReportData {
    #[serde(default)]
    pub order_details: Vec<ReportOrderId>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReportOrderId {
    #[serde(default)]
    pub id: Value,
}

impl ThumbprintReportResponse {
    /// Id of the first matching order, if it parses.
    #[must_use]
    pub fn first_order_id(&self) -> Option<i64> {
        let first = self.data.as_ref()?.order_details.first()?;
        match &first.id {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

/// Keep hex digits only, uppercased. Serials and thumbprints arrive with
/// colons, spaces or mixed case depending on the source.
#[must_use]
pub fn normalize_hex(input: &str) -> String {
    input
        .chars()
        .filter(char::is_ascii_hexdigit)
        .map(|c| c.to_ascii_uppercase())
        .collect()
}
