//! CLM client tests against a mock server.

mod helpers;

use certmeta_client::clm_models::ClmMetadataFieldRequest;
use certmeta_client::{ClientError, ClmApi};
use certmeta_core::{CoercedValue, DestDataType, FieldKind, MetadataPayload, UnifiedField};
use helpers::mock_servers::{clm_certificate, clm_client, clm_field, TEST_PASSWORD, TEST_USERNAME};
use serde_json::json;
use wiremock::matchers::{basic_auth, body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_list_metadata_fields_sends_auth_and_api_headers() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/MetadataFields"))
        .and(basic_auth(TEST_USERNAME, TEST_PASSWORD))
        .and(header("x-keyfactor-requested-with", "APIClient"))
        .and(header("x-keyfactor-api-version", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            clm_field(1, "DigicertID", 1),
            {
                "Id": 2,
                "Name": "Environment",
                "DataType": 5,
                "Options": "Prod, Test,,Dev"
            }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let fields = clm_client(&server).list_metadata_fields().await.unwrap();
    assert_eq!(fields.len(), 2);
    assert_eq!(fields[0].name, "DigicertID");
    assert_eq!(fields[1].option_list(), vec!["Prod", "Test", "Dev"]);
}

#[tokio::test]
async fn test_list_certificates_query() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/Certificates"))
        .and(query_param("QueryString", "IssuerDN -contains \"DigiCert\""))
        .and(query_param("includeMetadata", "true"))
        .and(query_param("PageReturned", "2"))
        .and(query_param("ReturnLimit", "50"))
        .and(query_param("IncludeRevoked", "true"))
        .and(query_param("IncludeExpired", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            clm_certificate(11, "0A1B", json!({"Dept": "Eng", "Seats": 4, "Empty": null}))
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let certificates = clm_client(&server)
        .list_certificates_by_issuer("DigiCert", true, 2, 50)
        .await
        .unwrap();
    assert_eq!(certificates.len(), 1);
    let certificate = &certificates[0];
    assert_eq!(certificate.id, 11);
    assert_eq!(certificate.serial_number.as_deref(), Some("0A1B"));
    assert_eq!(certificate.metadata.get("Seats").map(String::as_str), Some("4"));
    assert!(!certificate.metadata.contains_key("Empty"));
}

#[tokio::test]
async fn test_list_certificates_null_body_is_empty() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/Certificates"))
        .respond_with(ResponseTemplate::new(200).set_body_string("null"))
        .mount(&server)
        .await;

    let certificates = clm_client(&server)
        .list_certificates_by_issuer("DigiCert", false, 1, 100)
        .await
        .unwrap();
    assert!(certificates.is_empty());
}

#[tokio::test]
async fn test_create_metadata_field_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/MetadataFields"))
        .and(body_json(json!({
            "Name": "Environment",
            "Description": "Environment",
            "DataType": 5,
            "Enrollment": 0,
            "Options": "Prod,Test",
            "DisplayOrder": 0,
            "CaseSensitive": false,
            "AllowAPI": true
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"Id": 9})))
        .expect(1)
        .mount(&server)
        .await;

    let mut field = UnifiedField::new("Environment", "Environment", DestDataType::MultipleChoice, FieldKind::Custom);
    field.options = vec!["Prod".to_string(), "Test".to_string()];
    clm_client(&server)
        .create_metadata_field(&ClmMetadataFieldRequest::from_unified(&field))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_update_certificate_metadata_body() {
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/Certificates/Metadata"))
        .and(body_json(json!({
            "Id": 11,
            "Metadata": {"Dept": "Eng", "Seats": 4, "Managed": true}
        })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let mut payload = MetadataPayload::new();
    payload.insert_named("Dept", CoercedValue::Text("Eng".into()), false);
    payload.insert_named("Seats", CoercedValue::Integer(4), false);
    payload.insert_named("Managed", CoercedValue::Boolean(true), false);
    clm_client(&server)
        .update_certificate_metadata(11, &payload)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_bad_credentials_are_auth_errors() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/MetadataFields"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Unauthorized"))
        .expect(1)
        .mount(&server)
        .await;

    let err = clm_client(&server).list_metadata_fields().await.unwrap_err();
    assert!(matches!(err, ClientError::AuthError(_)));
}

#[tokio::test]
async fn test_unparseable_body_is_parse_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/MetadataFields"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>login</html>"))
        .mount(&server)
        .await;

    let err = clm_client(&server).list_metadata_fields().await.unwrap_err();
    assert!(matches!(err, ClientError::ParseError(_)));
}
