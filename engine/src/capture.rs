//! Capture cycle state machine.
//!
//! ```text
//!            trigger()                completion(seq == latest)
//!   Idle ─────────────────▶ InFlight ───────────────────────────▶ Succeeded | Failed
//!     ▲                        │  ▲                                     │
//!     │      shutdown()        │  └──────────── trigger() ──────────────┘
//!     └────────────────────────┘
//! ```
//!
//! One accepted trigger performs exactly one camera capture and one detection
//! request, in that order, on a spawned task. The task reports back through a
//! channel; the controller applies the completion on the UI side
//! ([`CaptureController::process_completions`] or [`CaptureController::settle`]).
//!
//! Overlap policy: a trigger while `InFlight` is dropped. Completions are
//! tagged with their [`CaptureSeq`] and only the latest issued one is applied,
//! so an abandoned cycle can never overwrite a newer result.

use std::sync::Arc;

use futures_util::future::{AbortHandle, Abortable};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use studyspot_camera::{CameraDevice, JpegQuality};
use studyspot_detect::DetectionService;
use studyspot_types::{
    CaptureFailure, CaptureResult, CaptureSeq, CycleState, FailureKind, PermissionState,
};

const COMPLETION_CHANNEL_CAPACITY: usize = 4;

/// What happened to a trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// A new cycle was started.
    Started(CaptureSeq),
    /// A cycle is already in flight; the trigger was dropped.
    Busy(CaptureSeq),
    /// Camera permission is not granted; nothing happened.
    PermissionRequired(PermissionState),
}

#[derive(Debug)]
struct Completion {
    seq: CaptureSeq,
    outcome: Result<CaptureResult, CaptureFailure>,
}

pub struct CaptureController {
    camera: Arc<dyn CameraDevice>,
    detector: Arc<dyn DetectionService>,
    quality: JpegQuality,
    permission: PermissionState,
    permission_requested: bool,
    state: CycleState,
    last_result: Option<CaptureResult>,
    latest_seq: CaptureSeq,
    active: Option<AbortHandle>,
    completions_tx: mpsc::Sender<Completion>,
    completions_rx: mpsc::Receiver<Completion>,
    observers: watch::Sender<CycleState>,
}

impl CaptureController {
    pub fn new(
        camera: Arc<dyn CameraDevice>,
        detector: Arc<dyn DetectionService>,
        quality: JpegQuality,
    ) -> Self {
        let (completions_tx, completions_rx) = mpsc::channel(COMPLETION_CHANNEL_CAPACITY);
        let (observers, _) = watch::channel(CycleState::Idle);
        Self {
            camera,
            detector,
            quality,
            permission: PermissionState::Unknown,
            permission_requested: false,
            state: CycleState::Idle,
            last_result: None,
            latest_seq: CaptureSeq::ZERO,
            active: None,
            completions_tx,
            completions_rx,
            observers,
        }
    }

    #[must_use]
    pub fn state(&self) -> &CycleState {
        &self.state
    }

    /// Most recent successful result. Survives later failures.
    #[must_use]
    pub fn last_result(&self) -> Option<&CaptureResult> {
        self.last_result.as_ref()
    }

    #[must_use]
    pub fn permission(&self) -> PermissionState {
        self.permission
    }

    #[must_use]
    pub fn latest_seq(&self) -> CaptureSeq {
        self.latest_seq
    }

    #[must_use]
    pub fn quality(&self) -> JpegQuality {
        self.quality
    }

    #[must_use]
    pub fn camera_description(&self) -> String {
        self.camera.describe()
    }

    /// Watch every state transition.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<CycleState> {
        self.observers.subscribe()
    }

    /// Ask the camera for access. Only the first call reaches the device;
    /// later calls return the recorded answer.
    pub async fn request_permission(&mut self) -> PermissionState {
        if self.permission_requested {
            return self.permission;
        }
        self.permission_requested = true;

        let answer = self.camera.request_permission().await;
        info!(
            camera = %self.camera.describe(),
            permission = answer.as_str(),
            "Camera permission resolved"
        );
        self.permission = answer;
        answer
    }

    /// Start a cycle unless one is running or the camera is not permitted.
    pub fn trigger(&mut self) -> TriggerOutcome {
        if !self.permission.is_granted() {
            debug!(
                permission = self.permission.as_str(),
                "Capture trigger ignored: permission not granted"
            );
            return TriggerOutcome::PermissionRequired(self.permission);
        }
        if let CycleState::InFlight { seq } = self.state {
            debug!(%seq, "Capture trigger dropped: cycle already in flight");
            return TriggerOutcome::Busy(seq);
        }

        let seq = self.latest_seq.next();
        self.latest_seq = seq;

        let camera = Arc::clone(&self.camera);
        let detector = Arc::clone(&self.detector);
        let quality = self.quality;
        let tx = self.completions_tx.clone();
        let task = async move {
            let outcome = run_cycle(camera.as_ref(), detector.as_ref(), quality).await;
            let _ = tx.send(Completion { seq, outcome }).await;
        };

        let (abort_handle, abort_registration) = AbortHandle::new_pair();
        tokio::spawn(async move {
            let _ = Abortable::new(task, abort_registration).await;
        });
        self.active = Some(abort_handle);

        info!(%seq, "Capture cycle started");
        self.transition(CycleState::InFlight { seq });
        TriggerOutcome::Started(seq)
    }

    /// Apply any finished cycles without waiting. Returns whether the state
    /// changed.
    pub fn process_completions(&mut self) -> bool {
        let mut applied = false;
        while let Ok(completion) = self.completions_rx.try_recv() {
            applied |= self.apply(completion);
        }
        applied
    }

    /// Wait until the in-flight cycle (if any) finishes and return the
    /// resulting state.
    pub async fn settle(&mut self) -> &CycleState {
        while self.state.is_in_flight() {
            let Some(completion) = self.completions_rx.recv().await else {
                break;
            };
            self.apply(completion);
        }
        &self.state
    }

    /// Abandon the in-flight cycle. Its completion, if it still arrives, is
    /// discarded. The last result is kept.
    pub fn shutdown(&mut self) {
        if let Some(handle) = self.active.take() {
            handle.abort();
        }
        while self.completions_rx.try_recv().is_ok() {}
        if let CycleState::InFlight { seq } = self.state {
            info!(%seq, "Capture cycle abandoned");
            self.transition(CycleState::Idle);
        }
    }

    fn apply(&mut self, completion: Completion) -> bool {
        let Completion { seq, outcome } = completion;
        let current = matches!(self.state, CycleState::InFlight { seq: s } if s == seq);
        if seq != self.latest_seq || !current {
            debug!(%seq, latest = %self.latest_seq, "Discarding stale capture completion");
            return false;
        }

        self.active = None;
        match outcome {
            Ok(result) => {
                info!(%seq, people = result.people_count(), "Capture cycle succeeded");
                self.last_result = Some(result.clone());
                self.transition(CycleState::Succeeded(result));
            }
            Err(failure) => {
                warn!(
                    %seq,
                    kind = %failure.kind(),
                    detail = failure.detail(),
                    "Capture cycle failed"
                );
                if failure.kind() == FailureKind::PermissionDenied {
                    self.permission = PermissionState::Denied;
                }
                self.transition(CycleState::Failed(failure));
            }
        }
        true
    }

    fn transition(&mut self, next: CycleState) {
        self.observers.send_replace(next.clone());
        self.state = next;
    }
}

impl Drop for CaptureController {
    fn drop(&mut self) {
        if let Some(handle) = self.active.take() {
            handle.abort();
        }
    }
}

async fn run_cycle(
    camera: &dyn CameraDevice,
    detector: &dyn DetectionService,
    quality: JpegQuality,
) -> Result<CaptureResult, CaptureFailure> {
    let jpeg = camera
        .capture_still(quality)
        .await
        .map_err(|e| CaptureFailure::new(e.kind(), e.to_string()))?;
    debug!(jpeg_bytes = jpeg.len(), "Frame captured");

    detector
        .detect(&jpeg)
        .await
        .map_err(|e| CaptureFailure::new(e.kind(), e.to_string()))
}
