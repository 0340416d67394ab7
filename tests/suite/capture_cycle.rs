//! End-to-end capture cycles: replay camera, HTTP detection, capture store.

use std::fs;
use std::time::Duration;

use studyspot_config::StudyspotConfig;
use studyspot_engine::{
    App, COUNTS_FILE, CycleState, FAILED_TO_PROCESS_MESSAGE, FailureKind, LATEST_IMAGE_FILE,
    PermissionState, TriggerOutcome,
};
use tempfile::tempdir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

use crate::common::{
    app_for, detect_body, mount_detect_count, mount_detect_delayed, mount_detect_error,
    start_detect_mock, write_frame,
};

#[tokio::test]
async fn count_of_seven_succeeds() {
    let server = start_detect_mock().await;
    mount_detect_count(&server, 7).await;
    let dir = tempdir().unwrap();
    let frame = write_frame(dir.path(), "frame.png");

    let mut app = app_for(&server, &frame, Duration::from_secs(5));
    assert_eq!(app.start().await, PermissionState::Granted);
    assert!(matches!(app.trigger_capture(), TriggerOutcome::Started(_)));

    let state = app.settle().await.clone();
    let CycleState::Succeeded(result) = state else {
        panic!("expected success, got {state:?}");
    };
    assert_eq!(result.people_count(), 7);
    assert_eq!(
        result.annotated_image().as_bytes(),
        &[0xFF, 0xD8, 0xFF, 0xD9]
    );
}

#[tokio::test]
async fn detection_timeout_fails_with_fixed_message() {
    let server = start_detect_mock().await;
    mount_detect_delayed(&server, 1, Duration::from_secs(3)).await;
    let dir = tempdir().unwrap();
    let frame = write_frame(dir.path(), "frame.png");

    let mut app = app_for(&server, &frame, Duration::from_millis(200));
    app.start().await;
    app.trigger_capture();
    let state = app.settle().await.clone();

    let failure = state.failure().cloned().unwrap();
    assert_eq!(failure.kind(), FailureKind::TransportFailure);
    assert_eq!(state.error_message(), Some(FAILED_TO_PROCESS_MESSAGE));
    assert!(app.last_result().is_none());
}

#[tokio::test]
async fn overlapping_triggers_make_one_request() {
    let server = start_detect_mock().await;
    Mock::given(method("POST"))
        .and(path("/detect"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(detect_body(2))
                .set_delay(Duration::from_millis(300)),
        )
        .expect(1)
        .mount(&server)
        .await;
    let dir = tempdir().unwrap();
    let frame = write_frame(dir.path(), "frame.png");

    let mut app = app_for(&server, &frame, Duration::from_secs(5));
    app.start().await;
    let TriggerOutcome::Started(seq) = app.trigger_capture() else {
        panic!("expected the first trigger to start a cycle");
    };
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(app.trigger_capture(), TriggerOutcome::Busy(seq));

    app.settle().await;
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn server_error_keeps_previous_result() {
    let server = start_detect_mock().await;
    Mock::given(method("POST"))
        .and(path("/detect"))
        .respond_with(ResponseTemplate::new(200).set_body_json(detect_body(4)))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_detect_error(&server, 500, "model crashed").await;
    let dir = tempdir().unwrap();
    let frame = write_frame(dir.path(), "frame.png");

    let mut app = app_for(&server, &frame, Duration::from_secs(5));
    app.start().await;
    app.trigger_capture();
    app.settle().await;
    assert_eq!(app.last_result().map(|r| r.people_count()), Some(4));

    app.trigger_capture();
    let state = app.settle().await.clone();
    let failure = state.failure().cloned().unwrap();
    assert_eq!(failure.kind(), FailureKind::TransportFailure);
    assert!(failure.detail().contains("model crashed"));
    assert_eq!(app.last_result().map(|r| r.people_count()), Some(4));
}

#[tokio::test]
async fn unreadable_frame_is_camera_unavailable() {
    let server = start_detect_mock().await;
    mount_detect_count(&server, 1).await;
    let dir = tempdir().unwrap();
    let frame = dir.path().join("broken.png");
    fs::write(&frame, b"not an image").unwrap();

    let mut app = app_for(&server, &frame, Duration::from_secs(5));
    app.start().await;
    app.trigger_capture();
    let state = app.settle().await.clone();

    assert_eq!(
        state.failure().map(|f| f.kind()),
        Some(FailureKind::CameraUnavailable)
    );
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn missing_camera_source_denies_permission() {
    let server = start_detect_mock().await;
    mount_detect_count(&server, 1).await;
    let dir = tempdir().unwrap();

    let mut app = app_for(&server, &dir.path().join("absent.png"), Duration::from_secs(5));
    assert_eq!(app.start().await, PermissionState::Denied);
    assert!(matches!(
        app.trigger_capture(),
        TriggerOutcome::PermissionRequired(PermissionState::Denied)
    ));
    assert_eq!(app.cycle_state(), &CycleState::Idle);
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn directory_source_cycles_frames() {
    let server = start_detect_mock().await;
    mount_detect_count(&server, 1).await;
    let dir = tempdir().unwrap();
    write_frame(dir.path(), "a.png");
    write_frame(dir.path(), "b.png");
    fs::write(dir.path().join("notes.txt"), b"ignored").unwrap();

    let mut app = app_for(&server, dir.path(), Duration::from_secs(5));
    app.start().await;
    for _ in 0..3 {
        app.trigger_capture();
        assert!(matches!(app.settle().await, CycleState::Succeeded(_)));
    }
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}

#[tokio::test]
async fn app_from_config_saves_captures() {
    let server = start_detect_mock().await;
    mount_detect_count(&server, 45).await;
    let frames = tempdir().unwrap();
    let frame = write_frame(frames.path(), "frame.png");
    let captures = tempdir().unwrap();

    let toml_str = format!(
        r#"
[detection]
base_url = "{}"
timeout_secs = 5

[camera]
source = "{}"
library = "Law Library"
floor = "Third Floor"

[app]
captures_dir = "{}"
"#,
        server.uri(),
        frame.display(),
        captures.path().display()
    );
    let config: StudyspotConfig = toml::from_str(&toml_str).unwrap();

    let mut app = App::from_config(&config).unwrap();
    app.start().await;
    app.trigger_capture();
    app.settle().await;

    let occupancy = app.camera_occupancy().unwrap();
    assert!((occupancy - 0.5).abs() < f64::EPSILON);

    let saved = app.last_saved().cloned().unwrap();
    assert_eq!(saved.people_count, 45);
    assert_eq!(
        fs::read(captures.path().join(LATEST_IMAGE_FILE)).unwrap(),
        vec![0xFF, 0xD8, 0xFF, 0xD9]
    );
    let summary: serde_json::Value =
        serde_json::from_slice(&fs::read(captures.path().join(COUNTS_FILE)).unwrap()).unwrap();
    assert_eq!(summary["people_count"], 45);
}
