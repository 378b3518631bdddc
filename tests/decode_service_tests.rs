// SPDX-License-Identifier: MPL-2.0

//! Integration tests for the decode service client against a local server

mod common;

use common::{MockBackend, ScriptedDecoder, page, serve_once};
use qrscan::app::{Notice, ScanOutcome, SubmitOutcome};
use qrscan::decode_service::DecodeServiceClient;
use qrscan::errors::SubmissionError;
use qrscan::media::latin1;
use serde_json::json;
use std::time::Duration;

fn client(endpoint: &str) -> DecodeServiceClient {
    DecodeServiceClient::new(endpoint, "tok-123", Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn test_request_shape() {
    let (endpoint, server) = serve_once(200, r#"{"valid":true,"data":{"name":"ok"}}"#).await;
    let payload = latin1::encode("Olá\u{00FF}\u{0001}").unwrap();

    let value = client(&endpoint).post(payload.clone()).await.unwrap();
    assert_eq!(value, json!({"valid": true, "data": {"name": "ok"}}));

    let request = server.await.unwrap();
    assert!(request.request_line.starts_with("POST /decode "));
    assert_eq!(request.headers.get("accept").map(String::as_str), Some("application/json"));
    assert_eq!(
        request.headers.get("authorization").map(String::as_str),
        Some("Bearer tok-123")
    );
    assert_eq!(
        request.headers.get("content-type").map(String::as_str),
        Some("application/octet-stream")
    );
    assert_eq!(request.body, payload);
}

#[tokio::test]
async fn test_error_status_keeps_body() {
    let (endpoint, server) = serve_once(401, r#"{"message":"invalid token"}"#).await;

    let result = client(&endpoint).post(vec![0x41]).await;
    match result {
        Err(SubmissionError::Http { status, body }) => {
            assert_eq!(status, 401);
            assert_eq!(body, json!({"message": "invalid token"}));
        }
        other => panic!("expected HTTP error, got {:?}", other),
    }
    server.await.unwrap();
}

#[tokio::test]
async fn test_non_json_success_is_invalid_response() {
    let (endpoint, server) = serve_once(200, "not json").await;

    let result = client(&endpoint).post(vec![0x41]).await;
    assert!(matches!(result, Err(SubmissionError::InvalidResponse(_))));
    server.await.unwrap();
}

#[tokio::test]
async fn test_unreachable_endpoint_is_transport_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let result = client(&format!("http://{}/decode", addr)).post(vec![0x41]).await;
    assert!(matches!(result, Err(SubmissionError::Transport(_))));
}

#[tokio::test]
async fn test_rejected_submission_notifies_once() {
    let (endpoint, server) = serve_once(401, r#"{"message":"invalid token"}"#).await;
    let (mut page, notifier) = page(
        MockBackend::with_devices(1),
        ScriptedDecoder::succeeding_on(2, "00020101"),
        client(&endpoint),
    );
    page.mount();

    let outcome = page.scan_once().await;
    assert!(matches!(
        outcome,
        ScanOutcome::Completed(SubmitOutcome::Failed(SubmissionError::Http { status: 401, .. }))
    ));
    assert_eq!(
        notifier.notices(),
        vec![Notice::SubmissionFailed {
            status: 401,
            body: json!({"message": "invalid token"}),
        }]
    );

    let request = server.await.unwrap();
    assert_eq!(request.body, b"00020101".to_vec());
    assert!(page.phase().is_idle());
}
