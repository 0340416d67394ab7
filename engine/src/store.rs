//! Persisting successful captures to disk.
//!
//! Each success overwrites `latest.jpg` (the annotated image) and
//! `people_counts.json` (a small summary) inside the captures directory. Both
//! writes are atomic so a reader never observes a half-written file.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tempfile::NamedTempFile;
use thiserror::Error;

use studyspot_types::{CaptureResult, CaptureSeq};

pub const LATEST_IMAGE_FILE: &str = "latest.jpg";
pub const COUNTS_FILE: &str = "people_counts.json";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to create captures directory {}: {source}", path.display())]
    CreateDir { path: PathBuf, source: io::Error },
    #[error("failed to write {}: {source}", path.display())]
    Write { path: PathBuf, source: io::Error },
    #[error("failed to encode capture summary: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Summary written next to the image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SavedCapture {
    pub people_count: u32,
    pub seq: u64,
    pub captured_at: String,
    pub image: PathBuf,
}

#[derive(Debug, Clone)]
pub struct CaptureStore {
    dir: PathBuf,
}

impl CaptureStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[must_use]
    pub fn image_path(&self) -> PathBuf {
        self.dir.join(LATEST_IMAGE_FILE)
    }

    #[must_use]
    pub fn counts_path(&self) -> PathBuf {
        self.dir.join(COUNTS_FILE)
    }

    pub fn save(&self, seq: CaptureSeq, result: &CaptureResult) -> Result<SavedCapture, StoreError> {
        fs::create_dir_all(&self.dir).map_err(|source| StoreError::CreateDir {
            path: self.dir.clone(),
            source,
        })?;

        let image = self.image_path();
        atomic_write(&image, result.annotated_image().as_bytes())?;

        let saved = SavedCapture {
            people_count: result.people_count(),
            seq: seq.get(),
            captured_at: chrono::Utc::now().to_rfc3339(),
            image,
        };
        let mut summary = serde_json::to_vec_pretty(&saved)?;
        summary.push(b'\n');
        atomic_write(&self.counts_path(), &summary)?;

        tracing::debug!(
            dir = %self.dir.display(),
            %seq,
            people = saved.people_count,
            "Capture saved"
        );
        Ok(saved)
    }
}

fn atomic_write(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let write_err = |source| StoreError::Write {
        path: path.to_path_buf(),
        source,
    };
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let mut tmp = NamedTempFile::new_in(parent).map_err(write_err)?;
    tmp.write_all(bytes).map_err(write_err)?;
    tmp.as_file().sync_all().map_err(write_err)?;
    tmp.persist(path).map_err(|err| write_err(err.error))?;
    Ok(())
}
