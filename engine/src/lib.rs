//! Core engine for Studyspot - capture state machine and screen state.
//!
//! This crate contains the App state without TUI dependencies. The renderer
//! reads from [`App`] and calls its operations in response to input; nothing
//! here knows about terminals.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use studyspot_camera::{CameraDevice, JpegQuality, NoCamera, ReplayCamera};
use studyspot_config::StudyspotConfig;
use studyspot_detect::{DetectError, DetectionService, HttpDetectionClient};

pub use studyspot_types::ui::UiOptions;
pub use studyspot_types::{
    AnnotatedImage, AutoRefreshConfig, CaptureFailure, CaptureResult, CaptureSeq, CycleState,
    FAILED_TO_PROCESS_MESSAGE, FailureKind, Floor, Library, LibraryCatalog, PermissionState,
};

mod auto_refresh;
mod capture;
mod store;

pub use auto_refresh::AutoRefreshTimer;
pub use capture::{CaptureController, TriggerOutcome};
pub use store::{COUNTS_FILE, CaptureStore, LATEST_IMAGE_FILE, SavedCapture, StoreError};

const PERMISSION_REQUIRED_STATUS: &str = "Camera access is required to count people";
const BUSY_STATUS: &str = "A capture is already in progress";

/// Everything needed to build an [`App`].
pub struct AppInit {
    pub camera: Arc<dyn CameraDevice>,
    pub detector: Arc<dyn DetectionService>,
    pub quality: JpegQuality,
    pub catalog: LibraryCatalog,
    pub auto_refresh: AutoRefreshConfig,
    pub captures_dir: Option<PathBuf>,
    /// `(library, floor)` names the camera is pointed at.
    pub camera_location: Option<(String, String)>,
    pub ui_options: UiOptions,
}

impl AppInit {
    /// Built-in catalog, default quality, auto-refresh off, nothing saved.
    pub fn new(camera: Arc<dyn CameraDevice>, detector: Arc<dyn DetectionService>) -> Self {
        Self {
            camera,
            detector,
            quality: JpegQuality::default(),
            catalog: LibraryCatalog::builtin(),
            auto_refresh: AutoRefreshConfig::default(),
            captures_dir: None,
            camera_location: None,
            ui_options: UiOptions::default(),
        }
    }
}

/// Floor the camera watches, resolved against the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraLocation {
    pub library_index: usize,
    pub library: String,
    pub floor: Floor,
}

pub struct App {
    catalog: LibraryCatalog,
    expanded: Vec<bool>,
    selected: usize,
    controller: CaptureController,
    auto_refresh: AutoRefreshConfig,
    timer: Option<AutoRefreshTimer>,
    store: Option<CaptureStore>,
    last_saved: Option<SavedCapture>,
    camera_location: Option<CameraLocation>,
    ui_options: UiOptions,
    status: Option<String>,
    should_quit: bool,
    started_at: Instant,
}

impl App {
    pub fn new(init: AppInit) -> Self {
        let AppInit {
            camera,
            detector,
            quality,
            catalog,
            auto_refresh,
            captures_dir,
            camera_location,
            ui_options,
        } = init;

        let camera_location = camera_location.and_then(|(library, floor)| {
            let resolved = catalog.find_floor(&library, &floor).and_then(|(index, floor)| {
                catalog.get(index).map(|lib| CameraLocation {
                    library_index: index,
                    library: lib.name.clone(),
                    floor: floor.clone(),
                })
            });
            if resolved.is_none() {
                tracing::warn!(%library, %floor, "Camera location not found in catalog");
            }
            resolved
        });

        let mut expanded = vec![false; catalog.len()];
        let selected = camera_location.as_ref().map_or(0, |loc| loc.library_index);
        if let Some(slot) = expanded.get_mut(selected)
            && camera_location.is_some()
        {
            *slot = true;
        }

        Self {
            catalog,
            expanded,
            selected,
            controller: CaptureController::new(camera, detector, quality),
            auto_refresh,
            timer: None,
            store: captures_dir.map(CaptureStore::new),
            last_saved: None,
            camera_location,
            ui_options,
            status: None,
            should_quit: false,
            started_at: Instant::now(),
        }
    }

    /// Build the app from loaded configuration: a replay camera when a source
    /// is configured, the HTTP detection client, and the configured catalog.
    pub fn from_config(config: &StudyspotConfig) -> Result<Self, DetectError> {
        let camera: Arc<dyn CameraDevice> = match config.camera_source() {
            Some(source) => Arc::new(ReplayCamera::new(source)),
            None => {
                tracing::info!("No camera source configured");
                Arc::new(NoCamera)
            }
        };
        let base_url = config.detect_base_url();
        let detector = HttpDetectionClient::new(&base_url, config.detect_timeout())?;
        tracing::info!(endpoint = %detector.endpoint(), "Detection service configured");

        Ok(Self::new(AppInit {
            camera,
            detector: Arc::new(detector),
            quality: JpegQuality::new(config.jpeg_quality()).unwrap_or_default(),
            catalog: config.catalog(),
            auto_refresh: config.auto_refresh(),
            captures_dir: config.captures_dir(),
            camera_location: config.camera_location(),
            ui_options: config.ui_options(),
        }))
    }

    /// Request camera permission and arm auto-refresh if configured. Call once
    /// when the screen comes up.
    pub async fn start(&mut self) -> PermissionState {
        let permission = self.controller.request_permission().await;
        if !permission.is_granted() {
            self.status = Some(PERMISSION_REQUIRED_STATUS.to_string());
        }
        if self.auto_refresh.enabled {
            self.set_auto_refresh(true);
        }
        permission
    }

    // ------------------------------------------------------------------
    // Capture
    // ------------------------------------------------------------------

    pub fn trigger_capture(&mut self) -> TriggerOutcome {
        let outcome = self.controller.trigger();
        match outcome {
            TriggerOutcome::Started(_) => self.status = None,
            TriggerOutcome::Busy(_) => self.status = Some(BUSY_STATUS.to_string()),
            TriggerOutcome::PermissionRequired(_) => {
                self.status = Some(PERMISSION_REQUIRED_STATUS.to_string());
            }
        }
        outcome
    }

    #[must_use]
    pub fn cycle_state(&self) -> &CycleState {
        self.controller.state()
    }

    #[must_use]
    pub fn last_result(&self) -> Option<&CaptureResult> {
        self.controller.last_result()
    }

    #[must_use]
    pub fn permission(&self) -> PermissionState {
        self.controller.permission()
    }

    /// Whether the capture affordance should be offered at all.
    #[must_use]
    pub fn can_capture(&self) -> bool {
        self.permission().is_granted()
    }

    #[must_use]
    pub fn controller(&self) -> &CaptureController {
        &self.controller
    }

    #[must_use]
    pub fn camera_label(&self) -> String {
        self.controller.camera_description()
    }

    #[must_use]
    pub fn last_saved(&self) -> Option<&SavedCapture> {
        self.last_saved.as_ref()
    }

    // ------------------------------------------------------------------
    // Auto-refresh
    // ------------------------------------------------------------------

    pub fn set_auto_refresh(&mut self, enabled: bool) {
        self.auto_refresh.enabled = enabled;
        match (enabled, self.timer.is_some()) {
            (true, false) => {
                self.timer = Some(AutoRefreshTimer::start(self.auto_refresh.interval()));
            }
            (false, true) => self.timer = None,
            _ => {}
        }
    }

    pub fn toggle_auto_refresh(&mut self) {
        self.set_auto_refresh(!self.auto_refresh_enabled());
    }

    #[must_use]
    pub fn auto_refresh_enabled(&self) -> bool {
        self.timer.is_some()
    }

    #[must_use]
    pub fn auto_refresh_interval(&self) -> Duration {
        self.auto_refresh.interval()
    }

    // ------------------------------------------------------------------
    // Library panels
    // ------------------------------------------------------------------

    #[must_use]
    pub fn catalog(&self) -> &LibraryCatalog {
        &self.catalog
    }

    #[must_use]
    pub fn is_expanded(&self, index: usize) -> bool {
        self.expanded.get(index).copied().unwrap_or(false)
    }

    /// Flip one panel open or closed. Returns `false` (and changes nothing)
    /// for an out-of-range index.
    pub fn toggle_panel(&mut self, index: usize) -> bool {
        match self.expanded.get_mut(index) {
            Some(open) => {
                *open = !*open;
                true
            }
            None => false,
        }
    }

    pub fn toggle_selected(&mut self) -> bool {
        self.toggle_panel(self.selected)
    }

    #[must_use]
    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn select_next(&mut self) {
        if !self.catalog.is_empty() {
            self.selected = (self.selected + 1) % self.catalog.len();
        }
    }

    pub fn select_prev(&mut self) {
        if !self.catalog.is_empty() {
            self.selected = self
                .selected
                .checked_sub(1)
                .unwrap_or(self.catalog.len() - 1);
        }
    }

    #[must_use]
    pub fn camera_location(&self) -> Option<&CameraLocation> {
        self.camera_location.as_ref()
    }

    /// Share of the watched floor's seats taken, from the last result.
    #[must_use]
    pub fn camera_occupancy(&self) -> Option<f64> {
        let location = self.camera_location.as_ref()?;
        let result = self.last_result()?;
        location.floor.occupancy(result.people_count())
    }

    // ------------------------------------------------------------------
    // Loop
    // ------------------------------------------------------------------

    /// Advance non-blocking work: fire a pending auto-refresh tick and apply
    /// finished cycles. Returns whether anything visible changed.
    pub fn tick(&mut self) -> bool {
        let mut changed = false;
        if self.timer.as_mut().is_some_and(AutoRefreshTimer::take_tick) {
            tracing::debug!("Auto-refresh tick");
            changed |= matches!(self.controller.trigger(), TriggerOutcome::Started(_));
        }
        if self.controller.process_completions() {
            self.after_completion();
            changed = true;
        }
        changed
    }

    /// Wait for the in-flight cycle to finish (headless mode).
    pub async fn settle(&mut self) -> &CycleState {
        let was_in_flight = self.controller.state().is_in_flight();
        self.controller.settle().await;
        if was_in_flight {
            self.after_completion();
        }
        self.controller.state()
    }

    fn after_completion(&mut self) {
        let CycleState::Succeeded(result) = self.controller.state() else {
            return;
        };
        let Some(store) = &self.store else {
            return;
        };
        match store.save(self.controller.latest_seq(), result) {
            Ok(saved) => self.last_saved = Some(saved),
            Err(err) => tracing::warn!("Failed to save capture: {err}"),
        }
    }

    #[must_use]
    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    #[must_use]
    pub fn ui_options(&self) -> UiOptions {
        self.ui_options
    }

    /// Time since the app was created; drives spinner animation.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    pub fn request_quit(&mut self) {
        self.should_quit = true;
    }

    #[must_use]
    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Release the timer and abandon any in-flight cycle. The screen is going
    /// away; nothing may update it afterwards.
    pub fn shutdown(&mut self) {
        self.timer = None;
        self.controller.shutdown();
    }
}
