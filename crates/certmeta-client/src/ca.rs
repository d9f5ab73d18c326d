//! HTTP client for the CA order-management API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::api::CaApi;
use crate::auth::Credentials;
use crate::ca_models::{
    normalize_hex, CaCustomField, CaCustomFieldCreate, CaCustomFieldList, CaCustomFieldValueUpdate, OrderDetail,
    OrderList, ThumbprintReportQuery, ThumbprintReportResponse,
};
use crate::error::{ClientError, ClientResult};
use crate::http::HttpTransport;
use crate::retry::RetryPolicy;

/// Production API root.
pub const DEFAULT_CA_BASE_URL: &str = "https://www.digicert.com/services/v2/";

/// CA API client.
#[derive(Debug, Clone)]
pub struct CaClient {
    transport: HttpTransport,
}

impl CaClient {
    /// Create a client authenticating with an account API key.
    pub fn new(base_url: &str, api_key: &str, timeout: Duration, retry: RetryPolicy) -> ClientResult<Self> {
        if api_key.trim().is_empty() {
            return Err(ClientError::InvalidConfig("CA API key is empty".to_string()));
        }
        let transport = HttpTransport::new(base_url, Credentials::ca_api_key(api_key), timeout, retry)?;
        Ok(Self { transport })
    }

    /// Create a client with a pre-built `reqwest::Client` (for testing).
    pub fn with_http_client(
        base_url: &str,
        api_key: &str,
        http_client: Client,
        retry: RetryPolicy,
    ) -> ClientResult<Self> {
        let transport = HttpTransport::with_http_client(base_url, Credentials::ca_api_key(api_key), http_client, retry)?;
        Ok(Self { transport })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        self.transport.base_url()
    }

    /// `GET order/certificate/{identifier}`; a 404 means "no such order".
    async fn order_by_identifier(&self, identifier: &str) -> ClientResult<Option<OrderDetail>> {
        let path = format!("order/certificate/{identifier}");
        match self.transport.get::<Value>(&path, &[]).await {
            Ok(raw) => {
                let order = OrderDetail::from_value(raw)
                    .map_err(|e| ClientError::ParseError(format!("Failed to parse order '{identifier}': {e}")))?;
                if order.certificate.is_none() {
                    debug!(order_id = order.id, "Order returned without a certificate block");
                }
                Ok(Some(order))
            }
            Err(ClientError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn order_id_by_serial(&self, serial: &str) -> ClientResult<Option<i64>> {
        let query = [
            ("filters[serial_number]", serial.to_string()),
            ("limit", "1".to_string()),
        ];
        match self.transport.get::<OrderList>("order/certificate", &query).await {
            Ok(list) => {
                let id = list.orders.first().map(|o| o.id);
                debug!(serial, order_id = ?id, "Looked up order id by serial");
                Ok(id)
            }
            Err(ClientError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Reports query by thumbprint. The endpoint answers 400 or 404 when the
    /// account has no reporting access, which counts as "no match".
    async fn order_id_by_thumbprint(&self, thumbprint: &str) -> ClientResult<Option<i64>> {
        let body = ThumbprintReportQuery::new(thumbprint);
        match self
            .transport
            .post::<Option<ThumbprintReportResponse>, _>("reports/query", &body)
            .await
        {
            Ok(response) => {
                let id = response.and_then(|r| r.first_order_id());
                debug!(thumbprint, order_id = ?id, "Looked up order id by thumbprint report");
                Ok(id)
            }
            Err(ClientError::NotFound(_)) | Err(ClientError::Api { status: 400, .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl CaApi for CaClient {
    async fn list_custom_fields(&self, include_deactivated: bool) -> ClientResult<Vec<CaCustomField>> {
        let list: Option<CaCustomFieldList> = self.transport.get("account/metadata", &[]).await?;
        let fields: Vec<CaCustomField> = list
            .unwrap_or_default()
            .metadata
            .into_iter()
            .filter(|f| include_deactivated || f.is_active)
            .collect();
        debug!(count = fields.len(), include_deactivated, "Fetched CA custom fields");
        Ok(fields)
    }

    async fn create_custom_field(&self, field: &CaCustomFieldCreate) -> ClientResult<()> {
        // The response id is ignored, callers re-read the catalogue.
        let _: Value = self.transport.post("account/metadata", field).await?;
        info!(label = %field.label, "Created CA custom field");
        Ok(())
    }

    async fn get_order_by_serial_or_thumbprint(
        &self,
        serial: Option<&str>,
        thumbprint: Option<&str>,
    ) -> ClientResult<Option<OrderDetail>> {
        let serial = serial.map(normalize_hex).filter(|s| !s.is_empty());
        let thumbprint = thumbprint.map(normalize_hex).filter(|s| !s.is_empty());

        if let Some(serial) = serial.as_deref() {
            if let Some(order) = self.order_by_identifier(serial).await? {
                return Ok(Some(order));
            }
            if let Some(order_id) = self.order_id_by_serial(serial).await? {
                if let Some(order) = self.order_by_identifier(&order_id.to_string()).await? {
                    return Ok(Some(order));
                }
            }
        }

        if let Some(thumbprint) = thumbprint.as_deref() {
            if let Some(order) = self.order_by_identifier(thumbprint).await? {
                return Ok(Some(order));
            }
            if let Some(order_id) = self.order_id_by_thumbprint(thumbprint).await? {
                if let Some(order) = self.order_by_identifier(&order_id.to_string()).await? {
                    return Ok(Some(order));
                }
            }
        }

        warn!(
            serial = serial.as_deref().unwrap_or("<none>"),
            thumbprint = thumbprint.as_deref().unwrap_or("<none>"),
            "Unable to locate CA order for certificate"
        );
        Ok(None)
    }

    async fn update_order_custom_field_value(&self, order_id: i64, field_id: i64, value: &str) -> ClientResult<()> {
        let path = format!("order/certificate/{order_id}/custom-field");
        let body = CaCustomFieldValueUpdate {
            metadata_id: field_id,
            value: value.to_string(),
        };
        let _: Value = self.transport.post(&path, &body).await?;
        debug!(order_id, field_id, "Updated order custom field");
        Ok(())
    }
}
