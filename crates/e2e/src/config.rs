//! Harness configuration.
//!
//! Built once at suite start from the environment (a `.env` file is honored)
//! and passed by reference into every page object and helper. Nothing else
//! in the harness reads process-wide state.

use std::path::PathBuf;
use std::time::Duration;

use crate::a11y::ViolationPolicy;
use crate::driver::{Browser, DriverConfig};
use crate::error::{HarnessError, HarnessResult};
use crate::fixtures::Credential;

/// Environment variable naming the storefront entry point.
pub const BASE_URL_VAR: &str = "BASE_URL";
/// Environment variables holding the valid credential pair.
pub const USERNAME_VAR: &str = "LOGIN_USERNAME";
pub const PASSWORD_VAR: &str = "LOGIN_PASSWORD";

#[derive(Debug, Clone)]
pub struct HarnessConfig {
    /// Storefront entry point. Absence is a fatal setup error.
    pub base_url: String,

    /// The one externally-provided valid credential pair.
    pub credentials: Credential,

    /// Bound on every driver interaction (click, fill, locate).
    pub action_timeout: Duration,

    /// Bound on polling expectations (URL patterns, visibility).
    pub expect_timeout: Duration,

    /// Bound on page navigations.
    pub navigation_timeout: Duration,

    /// Bound on a whole test body.
    pub test_timeout: Duration,

    /// Parallel worker count.
    pub workers: usize,

    /// Failed tests are re-run this many times, each as a fresh attempt.
    pub retries: u32,

    pub browser: Browser,
    pub headless: bool,
    pub viewport_width: u32,
    pub viewport_height: u32,

    /// Failure screenshots land here (append-only, never cleaned up).
    pub artifacts_dir: PathBuf,

    /// Suite results (JSON) and visual comparison artifacts land here.
    pub output_dir: PathBuf,

    /// What to do with accessibility findings.
    pub a11y_policy: ViolationPolicy,
}

impl HarnessConfig {
    /// Defaults mirror the team's runner configuration: 5s actions and
    /// expectations, 30s per test, 2 workers, retries only on CI.
    pub fn new(base_url: impl Into<String>, credentials: Credential) -> Self {
        Self {
            base_url: base_url.into(),
            credentials,
            action_timeout: Duration::from_millis(5_000),
            expect_timeout: Duration::from_millis(5_000),
            navigation_timeout: Duration::from_millis(30_000),
            test_timeout: Duration::from_millis(30_000),
            workers: 2,
            retries: 0,
            browser: Browser::Chromium,
            headless: true,
            viewport_width: 1280,
            viewport_height: 720,
            artifacts_dir: PathBuf::from("screenshots"),
            output_dir: PathBuf::from("test-results"),
            a11y_policy: ViolationPolicy::Warn,
        }
    }

    /// Whether an entry point is configured at all. Used by the runner
    /// entry to report a skip instead of failing unit-only CI runs.
    pub fn is_configured() -> bool {
        dotenvy::dotenv().ok();
        std::env::var(BASE_URL_VAR).map(|v| !v.is_empty()).unwrap_or(false)
    }

    /// Load the configuration from the environment.
    ///
    /// A missing entry point or credential is a configuration error, not a
    /// test failure: it aborts before any test body runs.
    pub fn from_env() -> HarnessResult<Self> {
        dotenvy::dotenv().ok();

        let base_url = require_var(BASE_URL_VAR)?;
        let username = require_var(USERNAME_VAR)?;
        let password = require_var(PASSWORD_VAR)?;

        let mut config = Self::new(base_url, Credential::new(username, password));

        if std::env::var("CI").is_ok() {
            config.retries = 2;
        }
        if let Ok(v) = std::env::var("E2E_WORKERS") {
            config.workers = parse_var("E2E_WORKERS", &v)?;
        }
        if let Ok(v) = std::env::var("E2E_RETRIES") {
            config.retries = parse_var("E2E_RETRIES", &v)?;
        }
        if let Ok(v) = std::env::var("E2E_ACTION_TIMEOUT_MS") {
            config.action_timeout = Duration::from_millis(parse_var("E2E_ACTION_TIMEOUT_MS", &v)?);
        }
        if let Ok(v) = std::env::var("E2E_A11Y_POLICY") {
            config.a11y_policy = v.parse()?;
        }

        if config.workers == 0 {
            return Err(HarnessError::Config("E2E_WORKERS must be at least 1".into()));
        }

        Ok(config)
    }

    /// Driver settings for one browser session.
    pub fn driver_config(&self) -> DriverConfig {
        DriverConfig {
            browser: self.browser,
            headless: self.headless,
            viewport_width: self.viewport_width,
            viewport_height: self.viewport_height,
            action_timeout: self.action_timeout,
            navigation_timeout: self.navigation_timeout,
        }
    }
}

fn require_var(name: &str) -> HarnessResult<String> {
    match std::env::var(name) {
        Ok(v) if !v.is_empty() => Ok(v),
        _ => Err(HarnessError::Config(format!("{name} is not set"))),
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, value: &str) -> HarnessResult<T> {
    value
        .parse()
        .map_err(|_| HarnessError::Config(format!("{name} has invalid value: {value}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> HarnessConfig {
        HarnessConfig::new(
            "https://www.saucedemo.com",
            Credential::new("standard_user", "secret_sauce"),
        )
    }

    #[test]
    fn defaults_match_runner_settings() {
        let config = sample();
        assert_eq!(config.action_timeout, Duration::from_millis(5_000));
        assert_eq!(config.expect_timeout, Duration::from_millis(5_000));
        assert_eq!(config.test_timeout, Duration::from_millis(30_000));
        assert_eq!(config.workers, 2);
        assert_eq!(config.retries, 0);
        assert!(config.headless);
    }

    #[test]
    fn driver_config_carries_timeouts() {
        let driver = sample().driver_config();
        assert_eq!(driver.action_timeout, Duration::from_millis(5_000));
        assert_eq!(driver.viewport_width, 1280);
        assert_eq!(driver.viewport_height, 720);
    }

    #[test]
    fn parse_var_rejects_garbage() {
        assert!(parse_var::<usize>("E2E_WORKERS", "two").is_err());
        assert_eq!(parse_var::<usize>("E2E_WORKERS", "4").unwrap(), 4);
    }
}
