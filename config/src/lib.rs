//! Configuration for Studyspot.
//!
//! Settings come from `~/.studyspot/config.toml`, with a handful of environment
//! overrides for values that are usually deployment-specific:
//!
//! | Variable | Overrides |
//! |----------|-----------|
//! | `STUDYSPOT_DETECT_URL` | `[detection] base_url` |
//! | `STUDYSPOT_CAMERA_SOURCE` | `[camera] source` |
//!
//! String values may reference environment variables with `${VAR}` syntax.
//!
//! ```toml
//! [detection]
//! base_url = "http://192.168.1.20:5000"
//! timeout_secs = 30
//!
//! [camera]
//! source = "~/Pictures/lobby"
//! quality = 0.5
//! library = "Shapiro Undergraduate Library"
//! floor = "First Floor"
//!
//! [auto_refresh]
//! enabled = false
//! interval_ms = 30000
//!
//! [app]
//! ascii_only = false
//! high_contrast = false
//! captures_dir = "~/.studyspot/captures"
//! ```

use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use studyspot_types::ui::UiOptions;
use studyspot_types::{AutoRefreshConfig, LibraryCatalog};

pub const DEFAULT_DETECT_BASE_URL: &str = "http://localhost:5000";
pub const DEFAULT_DETECT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_JPEG_QUALITY: f32 = 0.5;

pub const DETECT_URL_ENV: &str = "STUDYSPOT_DETECT_URL";
pub const CAMERA_SOURCE_ENV: &str = "STUDYSPOT_CAMERA_SOURCE";

#[derive(Debug, Default, Deserialize)]
pub struct StudyspotConfig {
    pub app: Option<AppConfig>,
    pub detection: Option<DetectionConfig>,
    pub camera: Option<CameraConfig>,
    pub auto_refresh: Option<AutoRefreshConfig>,
    /// Replaces the built-in catalog when present and non-empty.
    pub libraries: Option<LibraryCatalog>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config at {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl ConfigError {
    pub fn path(&self) -> &PathBuf {
        match self {
            ConfigError::Read { path, .. } | ConfigError::Parse { path, .. } => path,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct AppConfig {
    /// Use ASCII-only glyphs for icons and spinners.
    #[serde(default)]
    pub ascii_only: bool,
    /// Enable a high-contrast color palette.
    #[serde(default)]
    pub high_contrast: bool,
    /// Where annotated images and count summaries are written.
    pub captures_dir: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DetectionConfig {
    pub base_url: Option<String>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CameraConfig {
    /// Image file or directory of frames to capture from.
    pub source: Option<String>,
    /// JPEG quality in `(0.0, 1.0]`.
    pub quality: Option<f32>,
    /// Library the camera watches (matched case-insensitively against the catalog).
    pub library: Option<String>,
    pub floor: Option<String>,
}

pub fn expand_env_vars(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find('}') {
            Some(end) => {
                let var = &after[..end];
                if !var.is_empty() {
                    out.push_str(&env::var(var).unwrap_or_default());
                }
                rest = &after[end + 1..];
            }
            None => {
                // Unclosed reference is kept verbatim.
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);

    out
}

/// Expand `${VAR}` references and a leading `~/`.
fn expand_path(value: &str) -> PathBuf {
    let expanded = expand_env_vars(value.trim());
    if let Some(rest) = expanded.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    PathBuf::from(expanded)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn resolve_base_url(env_value: Option<String>, configured: Option<&str>) -> String {
    non_empty(env_value)
        .or_else(|| non_empty(configured.map(expand_env_vars)))
        .map(|url| url.trim().to_string())
        .unwrap_or_else(|| DEFAULT_DETECT_BASE_URL.to_string())
}

fn resolve_quality(configured: Option<f32>) -> f32 {
    match configured {
        Some(q) if q.is_finite() && q > 0.0 && q <= 1.0 => q,
        Some(q) => {
            tracing::warn!(quality = q, "Ignoring out-of-range camera quality");
            DEFAULT_JPEG_QUALITY
        }
        None => DEFAULT_JPEG_QUALITY,
    }
}

impl StudyspotConfig {
    pub fn load() -> Result<Option<Self>, ConfigError> {
        match config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(None),
        }
    }

    pub fn load_from(path: &Path) -> Result<Option<Self>, ConfigError> {
        if !path.exists() {
            return Ok(None);
        }

        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) => {
                tracing::warn!("Failed to read config at {:?}: {}", path, err);
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source: err,
                });
            }
        };

        match toml::from_str(&content) {
            Ok(config) => Ok(Some(config)),
            Err(err) => {
                tracing::warn!("Failed to parse config at {:?}: {}", path, err);
                Err(ConfigError::Parse {
                    path: path.to_path_buf(),
                    source: err,
                })
            }
        }
    }

    #[must_use]
    pub fn path() -> Option<PathBuf> {
        config_path()
    }

    /// Detection service base URL: env override, then config, then the local
    /// development default.
    #[must_use]
    pub fn detect_base_url(&self) -> String {
        let configured = self
            .detection
            .as_ref()
            .and_then(|d| d.base_url.as_deref());
        resolve_base_url(env::var(DETECT_URL_ENV).ok(), configured)
    }

    #[must_use]
    pub fn detect_timeout(&self) -> Duration {
        let secs = self
            .detection
            .as_ref()
            .and_then(|d| d.timeout_secs)
            .filter(|secs| *secs > 0)
            .unwrap_or(DEFAULT_DETECT_TIMEOUT_SECS);
        Duration::from_secs(secs)
    }

    #[must_use]
    pub fn camera_source(&self) -> Option<PathBuf> {
        non_empty(env::var(CAMERA_SOURCE_ENV).ok())
            .or_else(|| non_empty(self.camera.as_ref().and_then(|c| c.source.clone())))
            .map(|source| expand_path(&source))
    }

    #[must_use]
    pub fn jpeg_quality(&self) -> f32 {
        resolve_quality(self.camera.as_ref().and_then(|c| c.quality))
    }

    /// `(library, floor)` the camera is pinned to, if both are set.
    #[must_use]
    pub fn camera_location(&self) -> Option<(String, String)> {
        let camera = self.camera.as_ref()?;
        let library = non_empty(camera.library.clone())?;
        let floor = non_empty(camera.floor.clone())?;
        Some((library, floor))
    }

    #[must_use]
    pub fn auto_refresh(&self) -> AutoRefreshConfig {
        self.auto_refresh.unwrap_or_default()
    }

    #[must_use]
    pub fn catalog(&self) -> LibraryCatalog {
        match &self.libraries {
            Some(catalog) if !catalog.is_empty() => catalog.clone(),
            _ => LibraryCatalog::builtin(),
        }
    }

    #[must_use]
    pub fn ui_options(&self) -> UiOptions {
        self.app
            .as_ref()
            .map(|app| UiOptions {
                ascii_only: app.ascii_only,
                high_contrast: app.high_contrast,
            })
            .unwrap_or_default()
    }

    /// Configured captures directory, or `~/.studyspot/captures`.
    #[must_use]
    pub fn captures_dir(&self) -> Option<PathBuf> {
        non_empty(self.app.as_ref().and_then(|app| app.captures_dir.clone()))
            .map(|dir| expand_path(&dir))
            .or_else(|| config_dir().map(|dir| dir.join("captures")))
    }
}

#[must_use]
pub fn config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".studyspot"))
}

#[must_use]
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    // expand_env_vars tests

    #[test]
    fn expand_env_vars_no_vars() {
        assert_eq!(expand_env_vars("http://localhost:5000"), "http://localhost:5000");
    }

    #[test]
    fn expand_env_vars_single_var() {
        unsafe {
            env::set_var("STUDYSPOT_TEST_HOST", "10.0.0.7");
        }
        let result = expand_env_vars("http://${STUDYSPOT_TEST_HOST}:5000");
        assert_eq!(result, "http://10.0.0.7:5000");
        unsafe {
            env::remove_var("STUDYSPOT_TEST_HOST");
        }
    }

    #[test]
    fn expand_env_vars_missing_var_becomes_empty() {
        unsafe {
            env::remove_var("STUDYSPOT_MISSING_FOR_TEST");
        }
        let result = expand_env_vars("a${STUDYSPOT_MISSING_FOR_TEST}b");
        assert_eq!(result, "ab");
    }

    #[test]
    fn expand_env_vars_unclosed_brace_preserved() {
        assert_eq!(expand_env_vars("prefix ${UNCLOSED"), "prefix ${UNCLOSED");
    }

    #[test]
    fn expand_env_vars_empty_var_name_dropped() {
        assert_eq!(expand_env_vars("x${}y"), "xy");
    }

    #[test]
    fn expand_env_vars_unicode_content() {
        assert_eq!(expand_env_vars("bibliothèque ✓"), "bibliothèque ✓");
    }

    // resolution helpers

    #[test]
    fn base_url_prefers_env_then_config_then_default() {
        assert_eq!(
            resolve_base_url(Some("http://env:1".into()), Some("http://cfg:2")),
            "http://env:1"
        );
        assert_eq!(resolve_base_url(None, Some("http://cfg:2")), "http://cfg:2");
        assert_eq!(
            resolve_base_url(Some("  ".into()), None),
            DEFAULT_DETECT_BASE_URL
        );
        assert_eq!(resolve_base_url(None, Some("")), DEFAULT_DETECT_BASE_URL);
    }

    #[test]
    fn quality_out_of_range_falls_back() {
        assert!((resolve_quality(Some(0.8)) - 0.8).abs() < f32::EPSILON);
        assert!((resolve_quality(Some(0.0)) - DEFAULT_JPEG_QUALITY).abs() < f32::EPSILON);
        assert!((resolve_quality(Some(1.5)) - DEFAULT_JPEG_QUALITY).abs() < f32::EPSILON);
        assert!((resolve_quality(Some(f32::NAN)) - DEFAULT_JPEG_QUALITY).abs() < f32::EPSILON);
        assert!((resolve_quality(None) - DEFAULT_JPEG_QUALITY).abs() < f32::EPSILON);
    }

    // parsing tests

    #[test]
    fn parse_empty_config() {
        let config: StudyspotConfig = toml::from_str("").unwrap();
        assert!(config.app.is_none());
        assert!(config.detection.is_none());
        assert_eq!(config.auto_refresh(), AutoRefreshConfig::default());
        assert_eq!(config.catalog(), LibraryCatalog::builtin());
        assert_eq!(config.detect_timeout(), Duration::from_secs(30));
        assert!(config.camera_location().is_none());
    }

    #[test]
    fn parse_full_config() {
        let toml_str = r#"
[app]
ascii_only = true
captures_dir = "/tmp/studyspot-captures"

[detection]
base_url = "http://detector:5000"
timeout_secs = 5

[camera]
source = "/srv/frames"
quality = 0.9
library = "Law Library"
floor = "Third Floor"

[auto_refresh]
enabled = true
interval_ms = 1000
"#;
        let config: StudyspotConfig = toml::from_str(toml_str).unwrap();
        assert!(config.ui_options().ascii_only);
        assert!(!config.ui_options().high_contrast);
        assert_eq!(config.detect_timeout(), Duration::from_secs(5));
        assert!((config.jpeg_quality() - 0.9).abs() < f32::EPSILON);
        assert_eq!(
            config.camera_location(),
            Some(("Law Library".to_string(), "Third Floor".to_string()))
        );
        let refresh = config.auto_refresh();
        assert!(refresh.enabled);
        assert_eq!(refresh.interval(), Duration::from_secs(1));
        assert_eq!(
            config.captures_dir(),
            Some(PathBuf::from("/tmp/studyspot-captures"))
        );
    }

    #[test]
    fn zero_timeout_uses_default() {
        let config: StudyspotConfig = toml::from_str("[detection]\ntimeout_secs = 0").unwrap();
        assert_eq!(config.detect_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn empty_libraries_fall_back_to_builtin() {
        let config: StudyspotConfig = toml::from_str("libraries = []").unwrap();
        assert_eq!(config.catalog(), LibraryCatalog::builtin());
    }

    #[test]
    fn custom_libraries_replace_builtin() {
        let toml_str = r#"
[[libraries]]
name = "Music Library"

[[libraries.floors]]
name = "Listening Room"
capacity = 12
"#;
        let config: StudyspotConfig = toml::from_str(toml_str).unwrap();
        let catalog = config.catalog();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get(0).unwrap().total_capacity(), 12);
    }

    #[test]
    fn load_from_missing_path_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let result = StudyspotConfig::load_from(&dir.path().join("config.toml")).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn load_from_reports_parse_errors_with_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[detection\nbase_url = ").unwrap();
        let err = StudyspotConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert_eq!(err.path(), &path);
    }

    #[test]
    fn load_from_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[auto_refresh]\nenabled = true\n").unwrap();
        let config = StudyspotConfig::load_from(&path).unwrap().unwrap();
        assert!(config.auto_refresh().enabled);
    }
}
