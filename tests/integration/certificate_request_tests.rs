//! Certificate signing request tests

use openvox_ca_client::{CaError, CertificateState};
use serde_json::json;
use wiremock::matchers::{body_json, body_string, header, method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

use crate::common::{MockCa, StatusFixtures, TEST_CSR};

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn test_submit_sends_plain_text_csr() {
    let ca = MockCa::start().await;
    Mock::given(method("PUT"))
        .and(path(MockCa::api("certificate_request/node1")))
        .and(header("content-type", "text/plain"))
        .and(body_string(TEST_CSR))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&ca.server)
        .await;

    ca.client
        .submit_certificate_request("node1", TEST_CSR)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_download_request_returns_pem() {
    let ca = MockCa::start().await;
    ca.expect(
        "GET",
        "certificate_request/node1",
        ResponseTemplate::new(200).set_body_string(TEST_CSR),
    )
    .await;

    let pem = ca.client.download_certificate_request("node1").await.unwrap();
    assert_eq!(pem, TEST_CSR);
}

#[tokio::test]
async fn test_withdraw_deletes_request() {
    let ca = MockCa::start().await;
    ca.expect("DELETE", "certificate_request/node1", ResponseTemplate::new(204))
        .await;

    ca.client.withdraw_certificate_request("node1").await.unwrap();
}

#[tokio::test]
async fn test_list_requests_filters_requested() {
    let ca = MockCa::start().await;
    Mock::given(method("GET"))
        .and(path(MockCa::api("certificate_statuses/any_key")))
        .and(query_param("state", "requested"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([StatusFixtures::requested("node2")])),
        )
        .expect(1)
        .mount(&ca.server)
        .await;

    let pending = ca.client.list_certificate_requests().await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].state, CertificateState::Requested);
}

#[tokio::test]
async fn test_sign_without_ttl_omits_cert_ttl() {
    let ca = MockCa::start().await;
    ca.expect("PUT", "certificate_status/node1", ResponseTemplate::new(204))
        .await;

    ca.client.sign_certificate_request("node1", None).await.unwrap();
    assert_eq!(ca.last_json_body().await, json!({"desired_state": "signed"}));
}

#[tokio::test]
async fn test_sign_with_zero_ttl_omits_cert_ttl() {
    let ca = MockCa::start().await;
    ca.expect("PUT", "certificate_status/node1", ResponseTemplate::new(204))
        .await;

    ca.client.sign_certificate_request("node1", Some(0)).await.unwrap();
    assert_eq!(ca.last_json_body().await, json!({"desired_state": "signed"}));
}

#[tokio::test]
async fn test_sign_with_ttl_sends_cert_ttl() {
    let ca = MockCa::start().await;
    Mock::given(method("PUT"))
        .and(path(MockCa::api("certificate_status/node1")))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({"desired_state": "signed", "cert_ttl": 86400})))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&ca.server)
        .await;

    ca.client
        .sign_certificate_request("node1", Some(86400))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_sign_conflict_is_http_error() {
    let ca = MockCa::start().await;
    ca.expect("PUT", "certificate_status/node1", ResponseTemplate::new(409))
        .await;

    let err = ca
        .client
        .sign_certificate_request("node1", None)
        .await
        .unwrap_err();
    assert_eq!(err.status().map(|s| s.as_u16()), Some(409));
}

#[tokio::test]
async fn test_bulk_sign_reports_outcomes() {
    let ca = MockCa::start().await;
    Mock::given(method("POST"))
        .and(path(MockCa::api("sign")))
        .and(body_json(json!({"certnames": ["a", "b", "c"]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "signed": ["a"],
            "no-csr": ["b"],
            "signing-errors": ["c"]
        })))
        .expect(1)
        .mount(&ca.server)
        .await;

    let result = ca.client.bulk_sign(&names(&["a", "b", "c"])).await.unwrap();
    assert_eq!(result.signed, names(&["a"]));
    assert_eq!(result.no_csr, names(&["b"]));
    assert_eq!(result.signing_errors, names(&["c"]));
}

#[tokio::test]
async fn test_bulk_sign_rejects_unrepresentable_name() {
    let ca = MockCa::start().await;

    let err = ca.client.bulk_sign(&names(&["€uro"])).await.unwrap_err();
    assert!(matches!(err, CaError::Codec(_)));
    assert!(ca.server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_sign_all_posts_without_body() {
    let ca = MockCa::start().await;
    ca.expect(
        "POST",
        "sign/all",
        ResponseTemplate::new(200).set_body_json(json!({"signed": ["a", "b"]})),
    )
    .await;

    let result = ca.client.sign_all().await.unwrap();
    assert_eq!(result.signed, names(&["a", "b"]));
    assert!(result.no_csr.is_empty());

    let requests = ca.server.received_requests().await.unwrap();
    assert!(requests[0].body.is_empty());
}

#[tokio::test]
async fn test_sign_all_bad_body_is_decode_error() {
    let ca = MockCa::start().await;
    ca.expect(
        "POST",
        "sign/all",
        ResponseTemplate::new(200).set_body_string("not json"),
    )
    .await;

    let err = ca.client.sign_all().await.unwrap_err();
    assert!(matches!(err, CaError::Decode { .. }));
}
