//! Failure-artifact capture.
//!
//! Invoked by the runner's post-test hook whenever a test's actual status
//! differs from its expected status. Capture is best-effort: any error
//! here is logged and swallowed so artifact problems can never change a
//! test's outcome. The artifact directory is append-only; nothing cleans
//! it up.

use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{info, warn};

use crate::driver::DriverSession;

static UNSAFE_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9\-]+").expect("valid pattern"));

/// A screenshot captured for a failed test.
#[derive(Debug, Clone)]
pub struct FailureArtifact {
    pub title: String,
    pub timestamp_ms: i64,
    pub image_path: PathBuf,
}

/// Captures full-page screenshots into a fixed directory.
#[derive(Debug, Clone)]
pub struct ArtifactCapture {
    dir: PathBuf,
}

impl ArtifactCapture {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Case-fold the title and collapse every non-alphanumeric run into a
    /// single separator, so any test name yields a filesystem-safe stem.
    pub fn sanitize_title(title: &str) -> String {
        UNSAFE_CHARS
            .replace_all(&title.to_lowercase(), "_")
            .into_owned()
    }

    fn artifact_path(&self, title: &str, timestamp_ms: i64) -> PathBuf {
        self.dir
            .join(format!("{}-{timestamp_ms}.png", Self::sanitize_title(title)))
    }

    /// Capture a full-page screenshot for `title`. Returns `None` on any
    /// capture problem; the failure it documents has already been reported
    /// through the test result.
    pub async fn capture(&self, session: &DriverSession, title: &str) -> Option<FailureArtifact> {
        if let Err(e) = std::fs::create_dir_all(&self.dir) {
            warn!(dir = %self.dir.display(), "could not create artifact directory: {e}");
            return None;
        }

        let timestamp_ms = chrono::Utc::now().timestamp_millis();
        let path = self.artifact_path(title, timestamp_ms);

        match session.screenshot(&path, true).await {
            Ok(image_path) => {
                info!(path = %image_path.display(), "captured failure screenshot");
                Some(FailureArtifact {
                    title: title.to_string(),
                    timestamp_ms,
                    image_path,
                })
            }
            Err(e) => {
                warn!(test = title, "failure screenshot capture failed: {e}");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("should login successfully", "should_login_successfully")]
    #[test_case("Cart: remove item [@smoke] [@ui]", "cart_remove_item_smoke_ui_")]
    #[test_case("weird///name!!!", "weird_name_")]
    #[test_case("UPPER-case-KEPT", "upper-case-kept")]
    fn titles_become_filesystem_safe(title: &str, expected: &str) {
        assert_eq!(ArtifactCapture::sanitize_title(title), expected);
    }

    #[test]
    fn artifact_path_appends_timestamp() {
        let capture = ArtifactCapture::new("screenshots");
        let path = capture.artifact_path("checkout fails", 1_700_000_000_123);
        assert_eq!(
            path,
            PathBuf::from("screenshots/checkout_fails-1700000000123.png")
        );
    }

    #[test]
    fn identical_titles_differ_by_timestamp() {
        let capture = ArtifactCapture::new("screenshots");
        let a = capture.artifact_path("same title", 1);
        let b = capture.artifact_path("same title", 2);
        assert_ne!(a, b);
    }
}
