//! HTTP client for the CLM REST API.

use std::time::Duration;

use async_trait::async_trait;
use certmeta_core::MetadataPayload;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, info};

use crate::api::ClmApi;
use crate::auth::Credentials;
use crate::clm_models::{ClmCertificate, ClmMetadataField, ClmMetadataFieldRequest, ClmMetadataUpdate};
use crate::error::{ClientError, ClientResult};
use crate::http::HttpTransport;
use crate::retry::RetryPolicy;

const REQUESTED_WITH_HEADER: &str = "x-keyfactor-requested-with";
const API_VERSION_HEADER: &str = "x-keyfactor-api-version";

/// CLM API client.
#[derive(Debug, Clone)]
pub struct ClmClient {
    transport: HttpTransport,
}

impl ClmClient {
    /// Create a client authenticating with HTTP Basic credentials.
    pub fn new(
        base_url: &str,
        username: &str,
        password: &str,
        timeout: Duration,
        retry: RetryPolicy,
    ) -> ClientResult<Self> {
        if username.trim().is_empty() {
            return Err(ClientError::InvalidConfig("CLM username is empty".to_string()));
        }
        let transport = HttpTransport::new(base_url, Credentials::basic(username, password), timeout, retry)?;
        Ok(Self::from_transport(transport))
    }

    /// Create a client with a pre-built `reqwest::Client` (for testing).
    pub fn with_http_client(
        base_url: &str,
        username: &str,
        password: &str,
        http_client: Client,
        retry: RetryPolicy,
    ) -> ClientResult<Self> {
        let transport =
            HttpTransport::with_http_client(base_url, Credentials::basic(username, password), http_client, retry)?;
        Ok(Self::from_transport(transport))
    }

    fn from_transport(transport: HttpTransport) -> Self {
        Self {
            transport: transport
                .with_header(REQUESTED_WITH_HEADER, "APIClient")
                .with_header(API_VERSION_HEADER, "1"),
        }
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        self.transport.base_url()
    }
}

/// CLM query language filter selecting certificates by issuer.
fn issuer_query(term: &str) -> String {
    format!("IssuerDN -contains \"{}\"", term.replace('"', "\\\""))
}

#[async_trait]
impl ClmApi for ClmClient {
    async fn list_metadata_fields(&self) -> ClientResult<Vec<ClmMetadataField>> {
        let fields: Option<Vec<ClmMetadataField>> = self.transport.get("MetadataFields", &[]).await?;
        let fields = fields.unwrap_or_default();
        debug!(count = fields.len(), "Fetched CLM metadata fields");
        Ok(fields)
    }

    async fn create_metadata_field(&self, field: &ClmMetadataFieldRequest) -> ClientResult<()> {
        let _: Value = self.transport.post("MetadataFields", field).await?;
        info!(name = %field.name, data_type = field.data_type, "Created CLM metadata field");
        Ok(())
    }

    async fn list_certificates_by_issuer(
        &self,
        issuer_term: &str,
        include_revoked_and_expired: bool,
        page: u32,
        page_size: u32,
    ) -> ClientResult<Vec<ClmCertificate>> {
        let mut query = vec![
            ("QueryString", issuer_query(issuer_term)),
            ("includeMetadata", "true".to_string()),
            ("PageReturned", page.to_string()),
            ("ReturnLimit", page_size.to_string()),
            ("SortField", "NotBefore".to_string()),
            ("SortAscending", "1".to_string()),
        ];
        if include_revoked_and_expired {
            query.push(("IncludeRevoked", "true".to_string()));
            query.push(("IncludeExpired", "true".to_string()));
        }
        let certificates: Option<Vec<ClmCertificate>> = self.transport.get("Certificates", &query).await?;
        let certificates = certificates.unwrap_or_default();
        debug!(page, page_size, count = certificates.len(), "Fetched CLM certificate page");
        Ok(certificates)
    }

    async fn update_certificate_metadata(&self, certificate_id: i64, payload: &MetadataPayload) -> ClientResult<()> {
        let body = ClmMetadataUpdate {
            id: certificate_id,
            metadata: payload,
        };
        let _: Value = self.transport.put("Certificates/Metadata", &body).await?;
        debug!(certificate_id, fields = payload.len(), "Updated certificate metadata");
        Ok(())
    }
}
