//! Transport and client construction tests

use openvox_ca_client::config::{PemSource, PuppetCaConfig};
use openvox_ca_client::{CaClient, CaError};
use reqwest::{Method, StatusCode};
use rstest::rstest;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

use crate::common::{MockCa, TlsFixture};

fn config_with(cert: PemSource, key: PemSource, ca: PemSource) -> PuppetCaConfig {
    let mut config = PuppetCaConfig::default();
    config.ssl.cert = Some(cert);
    config.ssl.key = Some(key);
    config.ssl.ca = Some(ca);
    config
}

#[test]
fn test_client_builds_from_inline_pem() {
    let tls = TlsFixture::generate();
    let config = config_with(
        PemSource::Inline(tls.cert_pem),
        PemSource::Inline(tls.key_pem),
        PemSource::Inline(tls.ca_pem),
    );

    let ca = CaClient::new(&config).unwrap();
    assert_eq!(ca.base_url(), "https://puppet:8140/puppet-ca/v1");
}

#[test]
fn test_client_builds_from_files() {
    let tls = TlsFixture::generate();
    let files = tls.write_files();
    let config = config_with(
        PemSource::File(files.cert.clone()),
        PemSource::File(files.key.clone()),
        PemSource::File(files.ca.clone()),
    );

    assert!(CaClient::new(&config).is_ok());
}

#[test]
fn test_mixed_identity_forms_are_rejected() {
    let tls = TlsFixture::generate();
    let files = tls.write_files();
    let config = config_with(
        PemSource::File(files.cert.clone()),
        PemSource::Inline(tls.key_pem),
        PemSource::Inline(tls.ca_pem),
    );

    assert!(matches!(CaClient::new(&config), Err(CaError::Config(_))));
}

#[test]
fn test_unreadable_ca_bundle_is_config_error() {
    let tls = TlsFixture::generate();
    let config = config_with(
        PemSource::Inline(tls.cert_pem),
        PemSource::Inline(tls.key_pem),
        PemSource::File("/nonexistent/ca.pem".into()),
    );

    let err = CaClient::new(&config).unwrap_err();
    assert!(matches!(err, CaError::Config(ref msg) if msg.contains("/nonexistent/ca.pem")));
}

#[rstest]
#[case(400)]
#[case(403)]
#[case(404)]
#[case(409)]
#[case(500)]
#[case(503)]
#[tokio::test]
async fn test_non_success_status_is_http_error(#[case] code: u16) {
    let ca = MockCa::start().await;
    ca.expect(
        "GET",
        "certificate_status/node1",
        ResponseTemplate::new(code).set_body_string("error"),
    )
    .await;

    let err = ca.client.get_certificate("node1").await.unwrap_err();
    match err {
        CaError::HttpStatus {
            method,
            url,
            status,
        } => {
            assert_eq!(method, Method::GET);
            assert!(url.ends_with("/puppet-ca/v1/certificate_status/node1"));
            assert_eq!(status.as_u16(), code);
        }
        other => panic!("expected status error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_created_is_not_success() {
    // Only 200 and 204 count as success
    let ca = MockCa::start().await;
    ca.expect("PUT", "certificate_request/node1", ResponseTemplate::new(201))
        .await;

    let err = ca
        .client
        .submit_certificate_request("node1", "csr")
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::CREATED));
}

#[tokio::test]
async fn test_no_content_is_success_with_empty_body() {
    let ca = MockCa::start().await;
    ca.expect("DELETE", "certificate_request/node1", ResponseTemplate::new(204))
        .await;

    let body = ca
        .client
        .delete(ca.client.request().path("certificate_request/node1"))
        .await
        .unwrap();
    assert!(body.is_empty());
}

#[tokio::test]
async fn test_request_headers_and_query_reach_server() {
    let ca = MockCa::start().await;
    Mock::given(method("GET"))
        .and(path(MockCa::api("certificate_statuses/any_key")))
        .and(query_param("state", "signed"))
        .and(header("x-request-source", "tests"))
        .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
        .expect(1)
        .mount(&ca.server)
        .await;

    let req = ca
        .client
        .request()
        .path("certificate_statuses/any_key")
        .header("X-Request-Source", "tests")
        .query("state", "signed")
        .query("ignored", "");
    ca.client.get(req).await.unwrap();

    let requests = ca.server.received_requests().await.unwrap();
    assert_eq!(requests[0].url.query(), Some("state=signed"));
}

#[tokio::test]
async fn test_names_are_percent_encoded_in_path() {
    let ca = MockCa::start().await;
    ca.expect(
        "GET",
        "certificate/node%201",
        ResponseTemplate::new(200).set_body_string("PEM"),
    )
    .await;

    assert_eq!(ca.client.download_certificate("node 1").await.unwrap(), "PEM");
}
