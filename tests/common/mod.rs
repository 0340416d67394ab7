//! Shared test utilities and fixtures
//!
//! Common infrastructure for integration tests: a mock detection service,
//! on-disk camera frames, and app construction.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use image::{Rgb, RgbImage};
use studyspot_camera::ReplayCamera;
use studyspot_detect::HttpDetectionClient;
use studyspot_engine::{App, AppInit};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Base64 of `FF D8 FF D9`, a minimal JPEG marker pair.
pub const ANNOTATED_B64: &str = "/9j/2Q==";

pub async fn start_detect_mock() -> MockServer {
    MockServer::start().await
}

pub fn detect_body(people_count: u32) -> serde_json::Value {
    serde_json::json!({
        "people_count": people_count,
        "processed_image": ANNOTATED_B64,
    })
}

/// Mount a successful `/detect` response.
pub async fn mount_detect_count(server: &MockServer, people_count: u32) {
    Mock::given(method("POST"))
        .and(path("/detect"))
        .respond_with(ResponseTemplate::new(200).set_body_json(detect_body(people_count)))
        .mount(server)
        .await;
}

/// Mount a successful `/detect` response that takes `delay` to arrive.
pub async fn mount_detect_delayed(server: &MockServer, people_count: u32, delay: Duration) {
    Mock::given(method("POST"))
        .and(path("/detect"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(detect_body(people_count))
                .set_delay(delay),
        )
        .mount(server)
        .await;
}

/// Mount a `/detect` failure in the service's `{ "error": ... }` shape.
pub async fn mount_detect_error(server: &MockServer, status: u16, message: &str) {
    Mock::given(method("POST"))
        .and(path("/detect"))
        .respond_with(
            ResponseTemplate::new(status).set_body_json(serde_json::json!({ "error": message })),
        )
        .mount(server)
        .await;
}

/// Write a small solid-color PNG to `dir/name` and return its path.
pub fn write_frame(dir: &Path, name: &str) -> PathBuf {
    let frame = RgbImage::from_pixel(16, 12, Rgb([0, 39, 76]));
    let path = dir.join(name);
    frame.save(&path).unwrap();
    path
}

/// App wired to a replay camera over `source` and the mock detection service.
pub fn app_for(server: &MockServer, source: &Path, timeout: Duration) -> App {
    let detector = HttpDetectionClient::new(&server.uri(), timeout).unwrap();
    App::new(AppInit::new(
        Arc::new(ReplayCamera::new(source)),
        Arc::new(detector),
    ))
}
