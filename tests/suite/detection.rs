//! Request and response handling against a mock detection service.

use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use studyspot_detect::{DetectionService, HttpDetectionClient};
use studyspot_types::FailureKind;
use tempfile::tempdir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, ResponseTemplate};

use crate::common::{app_for, detect_body, mount_detect_count, start_detect_mock, write_frame};

#[tokio::test]
async fn captured_frame_is_posted_as_base64_jpeg() {
    let server = start_detect_mock().await;
    mount_detect_count(&server, 3).await;
    let dir = tempdir().unwrap();
    let frame = write_frame(dir.path(), "lobby.png");

    let mut app = app_for(&server, &frame, Duration::from_secs(5));
    app.start().await;
    app.trigger_capture();
    app.settle().await;

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request.url.path(), "/detect");

    let body: serde_json::Value = serde_json::from_slice(&request.body).unwrap();
    let object = body.as_object().unwrap();
    assert_eq!(object.len(), 1, "request carries only the image field");
    let jpeg = STANDARD
        .decode(object["image"].as_str().unwrap())
        .unwrap();
    assert_eq!(&jpeg[..2], &[0xFF, 0xD8], "payload is a JPEG");
}

#[tokio::test]
async fn base_url_path_prefix_is_kept() {
    let server = start_detect_mock().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/detect"))
        .and(header("accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(detect_body(5)))
        .expect(1)
        .mount(&server)
        .await;

    let base = format!("{}/api/v1", server.uri());
    let client = HttpDetectionClient::new(&base, Duration::from_secs(5)).unwrap();
    let result = client.detect(&[0xFF, 0xD8, 0xFF, 0xD9]).await.unwrap();
    assert_eq!(result.people_count(), 5);
}

#[tokio::test]
async fn redirect_is_not_followed() {
    let server = start_detect_mock().await;
    Mock::given(method("POST"))
        .and(path("/detect"))
        .respond_with(
            ResponseTemplate::new(307).insert_header("location", "http://127.0.0.1:9/detect"),
        )
        .mount(&server)
        .await;

    let client = HttpDetectionClient::new(&server.uri(), Duration::from_secs(5)).unwrap();
    let err = client.detect(&[0xFF, 0xD8]).await.unwrap_err();
    assert_eq!(err.kind(), FailureKind::TransportFailure);
}

#[tokio::test]
async fn zero_people_is_a_valid_result() {
    let server = start_detect_mock().await;
    mount_detect_count(&server, 0).await;

    let client = HttpDetectionClient::new(&server.uri(), Duration::from_secs(5)).unwrap();
    let result = client.detect(&[0xFF, 0xD8]).await.unwrap();
    assert_eq!(result.people_count(), 0);
    assert!(!result.annotated_image().as_bytes().is_empty());
}
