//! Service traits consumed by the sync engine.
//!
//! [`CaClient`](crate::CaClient) and [`ClmClient`](crate::ClmClient) are the
//! HTTP implementations; tests can supply their own.

use async_trait::async_trait;
use certmeta_core::MetadataPayload;

use crate::ca_models::{CaCustomField, CaCustomFieldCreate, OrderDetail};
use crate::clm_models::{ClmCertificate, ClmMetadataField, ClmMetadataFieldRequest};
use crate::error::ClientResult;

/// CA order-management operations.
#[async_trait]
pub trait CaApi: Send + Sync {
    /// Account custom-field catalogue. Inactive fields are left out unless
    /// `include_deactivated` is set.
    async fn list_custom_fields(&self, include_deactivated: bool) -> ClientResult<Vec<CaCustomField>>;

    async fn create_custom_field(&self, field: &CaCustomFieldCreate) -> ClientResult<()>;

    /// Find the order behind a certificate. `Ok(None)` when neither
    /// identifier matches an order.
    async fn get_order_by_serial_or_thumbprint(
        &self,
        serial: Option<&str>,
        thumbprint: Option<&str>,
    ) -> ClientResult<Option<OrderDetail>>;

    /// Write one custom-field value on an order.
    async fn update_order_custom_field_value(&self, order_id: i64, field_id: i64, value: &str) -> ClientResult<()>;
}

/// CLM inventory operations.
#[async_trait]
pub trait ClmApi: Send + Sync {
    async fn list_metadata_fields(&self) -> ClientResult<Vec<ClmMetadataField>>;

    async fn create_metadata_field(&self, field: &ClmMetadataFieldRequest) -> ClientResult<()>;

    /// One page (1-based) of certificates whose issuer DN contains `issuer_term`.
    async fn list_certificates_by_issuer(
        &self,
        issuer_term: &str,
        include_revoked_and_expired: bool,
        page: u32,
        page_size: u32,
    ) -> ClientResult<Vec<ClmCertificate>>;

    /// Replace the listed metadata values on one certificate.
    async fn update_certificate_metadata(&self, certificate_id: i64, payload: &MetadataPayload) -> ClientResult<()>;
}
