//! Wiremock fixtures for the CA and CLM APIs.

#![allow(dead_code)]

use serde_json::{json, Value};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use certmeta_client::{CaClient, ClmClient, RetryPolicy};

pub const TEST_API_KEY: &str = "test-api-key";
pub const TEST_USERNAME: &str = "DOMAIN\\svc-sync";
pub const TEST_PASSWORD: &str = "test-password";

/// CA client pointed at `server`, without retries.
pub fn ca_client(server: &MockServer) -> CaClient {
    ca_client_with_retry(server, RetryPolicy::none())
}

pub fn ca_client_with_retry(server: &MockServer, retry: RetryPolicy) -> CaClient {
    CaClient::with_http_client(&server.uri(), TEST_API_KEY, reqwest::Client::new(), retry).unwrap()
}

/// CLM client pointed at `server`, without retries.
pub fn clm_client(server: &MockServer) -> ClmClient {
    ClmClient::with_http_client(
        &server.uri(),
        TEST_USERNAME,
        TEST_PASSWORD,
        reqwest::Client::new(),
        RetryPolicy::none(),
    )
    .unwrap()
}

// =========================================================================
// JSON fixtures
// =========================================================================

pub fn ca_field(id: i64, label: &str, data_type: Option<&str>) -> Value {
    let mut field = json!({
        "id": id,
        "label": label,
        "is_required": false,
        "is_active": true
    });
    if let Some(data_type) = data_type {
        field["data_type"] = json!(data_type);
    }
    field
}

pub fn clm_field(id: i64, name: &str, data_type: i64) -> Value {
    json!({
        "Id": id,
        "Name": name,
        "Description": name,
        "DataType": data_type,
        "Enrollment": 0,
        "DisplayOrder": 0,
        "CaseSensitive": false,
        "AllowAPI": true
    })
}

pub fn clm_certificate(id: i64, serial: &str, metadata: Value) -> Value {
    json!({
        "Id": id,
        "SerialNumber": serial,
        "Thumbprint": format!("TP{serial}"),
        "IssuerDN": "CN=DigiCert Global G2 TLS RSA SHA256 2020 CA1",
        "Metadata": metadata
    })
}

pub fn order(id: i64, serial: &str, custom_fields: Value) -> Value {
    json!({
        "id": id,
        "status": "issued",
        "date_created": "2024-03-05T10:20:30+00:00",
        "certificate": {
            "id": id + 1,
            "common_name": "www.example.com",
            "serial_number": serial
        },
        "organization": {"id": 9, "name": "Example Ltd"},
        "custom_fields": custom_fields
    })
}

// =========================================================================
// Mounting helpers
// =========================================================================

pub async fn mount_ca_catalogue(server: &MockServer, fields: Vec<Value>) {
    Mock::given(method("GET"))
        .and(path("/account/metadata"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "metadata": fields })))
        .mount(server)
        .await;
}

pub async fn mount_clm_catalogue(server: &MockServer, fields: Vec<Value>) {
    Mock::given(method("GET"))
        .and(path("/MetadataFields"))
        .respond_with(ResponseTemplate::new(200).set_body_json(Value::Array(fields)))
        .mount(server)
        .await;
}

/// Serve `pages` as pages 1..=n of the certificate listing, then an empty page.
pub async fn mount_certificate_pages(server: &MockServer, pages: Vec<Vec<Value>>) {
    let last = pages.len() + 1;
    for (index, page) in pages.into_iter().enumerate() {
        Mock::given(method("GET"))
            .and(path("/Certificates"))
            .and(query_param("PageReturned", (index + 1).to_string()))
            .respond_with(ResponseTemplate::new(200).set_body_json(Value::Array(page)))
            .mount(server)
            .await;
    }
    Mock::given(method("GET"))
        .and(path("/Certificates"))
        .and(query_param("PageReturned", last.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(server)
        .await;
}

/// Serve `order` for `GET order/certificate/{identifier}`.
pub async fn mount_order(server: &MockServer, identifier: &str, order: Value) {
    Mock::given(method("GET"))
        .and(path(format!("/order/certificate/{identifier}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(order))
        .mount(server)
        .await;
}
