//! Core domain types for Studyspot.
//!
//! This crate contains pure domain types with no IO, no async, and minimal dependencies.
//! Everything here can be used from any layer of the application.

// Pedantic lint configuration - these are intentional design choices
#![allow(clippy::missing_errors_doc)] // Result-returning functions are self-explanatory
#![allow(clippy::missing_panics_doc)] // Panics are documented in assertions

mod capture;
mod catalog;
pub mod ui;

pub use capture::{
    AnnotatedImage, AutoRefreshConfig, CaptureFailure, CaptureResult, CaptureSeq, CycleState,
    DEFAULT_AUTO_REFRESH_INTERVAL_MS, EmptyImageError, FAILED_TO_PROCESS_MESSAGE, FailureKind,
    PermissionState,
};
pub use catalog::{Floor, Library, LibraryCatalog};
