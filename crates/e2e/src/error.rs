//! Error taxonomy for the harness

use thiserror::Error;

#[derive(Error, Debug)]
pub enum HarnessError {
    /// Missing or malformed environment configuration. Fatal: aborts
    /// before any test body runs.
    #[error("configuration error: {0}")]
    Config(String),

    /// An expected UI or state condition was not met.
    #[error("assertion failed: {0}")]
    Assertion(String),

    /// A driver action or network wait exceeded its bound.
    #[error("timed out waiting for {0}")]
    Timeout(String),

    /// A target element or catalog entry is absent.
    #[error("not found: {0}")]
    NotFound(String),

    #[error("driver error: {0}")]
    Driver(String),

    #[error("browser driver not available. Install Node and run: npx playwright install")]
    DriverNotFound,

    /// Raised only under `ViolationPolicy::Fail`.
    #[error("accessibility scan found {count} violation(s)")]
    Accessibility { count: usize },

    #[error("baseline not found: {0}")]
    BaselineNotFound(String),

    #[error("visual regression: {0}")]
    VisualRegression(String),

    #[error("snapshot mismatch: {name} differs by {diff_percent:.2}% (threshold: {threshold:.2}%)")]
    SnapshotMismatch {
        name: String,
        diff_percent: f64,
        threshold: f64,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}

impl HarnessError {
    /// Timeouts are surfaced as a distinct failure reason in reports.
    pub fn is_timeout(&self) -> bool {
        matches!(self, HarnessError::Timeout(_))
    }
}

pub type HarnessResult<T> = Result<T, HarnessError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_is_distinguishable() {
        assert!(HarnessError::Timeout("login button".into()).is_timeout());
        assert!(!HarnessError::Assertion("cart empty".into()).is_timeout());
    }

    #[test]
    fn not_found_message_names_the_target() {
        let err = HarnessError::NotFound("catalog entry: Sauce Labs Backpack".into());
        assert!(err.to_string().contains("Sauce Labs Backpack"));
    }
}
