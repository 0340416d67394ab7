//! Rendering checks against ratatui's test backend.

use std::time::Duration;

use ratatui::{Terminal, backend::TestBackend};
use studyspot_engine::{App, FAILED_TO_PROCESS_MESSAGE};
use studyspot_tui::draw;
use tempfile::tempdir;

use crate::common::{app_for, mount_detect_count, mount_detect_error, start_detect_mock, write_frame};

fn render(app: &App) -> String {
    let mut terminal = Terminal::new(TestBackend::new(120, 30)).unwrap();
    terminal.draw(|frame| draw(frame, app)).unwrap();
    let buffer = terminal.backend().buffer().clone();
    let mut out = String::new();
    for y in 0..buffer.area.height {
        for x in 0..buffer.area.width {
            out.push_str(buffer[(x, y)].symbol());
        }
        out.push('\n');
    }
    out
}

#[tokio::test]
async fn success_shows_count_and_capture_hint() {
    let server = start_detect_mock().await;
    mount_detect_count(&server, 7).await;
    let dir = tempdir().unwrap();
    let frame = write_frame(dir.path(), "frame.png");

    let mut app = app_for(&server, &frame, Duration::from_secs(5));
    app.start().await;
    let idle = render(&app);
    assert!(idle.contains("camera ready"));
    assert!(idle.contains("Press c to count people"));

    app.trigger_capture();
    app.settle().await;
    let screen = render(&app);
    assert!(screen.contains("7 people detected"));
    assert!(screen.contains("capture"));
}

#[tokio::test]
async fn failure_shows_only_the_fixed_message() {
    let server = start_detect_mock().await;
    mount_detect_error(&server, 400, "Failed to decode image").await;
    let dir = tempdir().unwrap();
    let frame = write_frame(dir.path(), "frame.png");

    let mut app = app_for(&server, &frame, Duration::from_secs(5));
    app.start().await;
    app.trigger_capture();
    app.settle().await;

    let screen = render(&app);
    assert!(screen.contains(FAILED_TO_PROCESS_MESSAGE));
    assert!(!screen.contains("Failed to decode image"));
}

#[tokio::test]
async fn in_flight_shows_progress() {
    let server = start_detect_mock().await;
    crate::common::mount_detect_delayed(&server, 1, Duration::from_secs(2)).await;
    let dir = tempdir().unwrap();
    let frame = write_frame(dir.path(), "frame.png");

    let mut app = app_for(&server, &frame, Duration::from_secs(5));
    app.start().await;
    app.trigger_capture();
    let screen = render(&app);
    assert!(screen.contains("Counting people..."));
    app.shutdown();
}

#[tokio::test]
async fn auto_refresh_state_is_visible() {
    let server = start_detect_mock().await;
    let dir = tempdir().unwrap();
    let frame = write_frame(dir.path(), "frame.png");

    let mut app = app_for(&server, &frame, Duration::from_secs(5));
    assert!(render(&app).contains("Auto-refresh off"));
    app.toggle_auto_refresh();
    assert!(render(&app).contains("on, every 30s"));
}
