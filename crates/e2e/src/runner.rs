//! Suite orchestration.
//!
//! Tests run as independent units across a bounded pool of workers. Each
//! test owns a freshly launched browser session; pre hooks, the test body,
//! the failure-artifact hook, user post hooks, and state cleanup run in a
//! fixed order, and everything after the body is guaranteed to run on both
//! success and failure paths. Retries re-run a failed test as a completely
//! fresh attempt with a new session.

use std::sync::Arc;
use std::time::Instant;

use futures::future::BoxFuture;
use serde::Serialize;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

use crate::artifacts::ArtifactCapture;
use crate::config::HarnessConfig;
use crate::driver::DriverSession;
use crate::error::{HarnessError, HarnessResult};

/// Terminal status of one test attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Passed,
    Failed,
    Skipped,
}

/// Everything a test body gets to work with. The session is absent only
/// for driverless harness self-tests.
#[derive(Clone)]
pub struct TestContext {
    pub config: Arc<HarnessConfig>,
    session: Option<Arc<DriverSession>>,
}

impl TestContext {
    /// The browser session bound to this test.
    pub fn session(&self) -> HarnessResult<&DriverSession> {
        self.session
            .as_deref()
            .ok_or_else(|| HarnessError::Config("this test requires a browser session".into()))
    }
}

pub type TestBody =
    Box<dyn Fn(TestContext) -> BoxFuture<'static, HarnessResult<()>> + Send + Sync>;
pub type PreHook =
    Box<dyn Fn(TestContext) -> BoxFuture<'static, HarnessResult<()>> + Send + Sync>;
pub type PostHook = Box<dyn Fn(TestReport, TestContext) -> BoxFuture<'static, ()> + Send + Sync>;

/// One runnable test. Generated and hand-written cases are identical to
/// the runner.
pub struct TestCase {
    pub name: String,
    pub tags: Vec<String>,
    /// Status this test is supposed to end with. The failure-artifact hook
    /// fires only when the actual status differs from this.
    pub expected: Outcome,
    pub body: TestBody,
}

/// Build a test case expected to pass.
pub fn case<F, Fut>(name: &str, tags: &[&str], f: F) -> TestCase
where
    F: Fn(TestContext) -> Fut + Send + Sync + 'static,
    Fut: std::future::Future<Output = HarnessResult<()>> + Send + 'static,
{
    TestCase {
        name: name.to_string(),
        tags: tags.iter().map(|t| t.to_string()).collect(),
        expected: Outcome::Passed,
        body: Box::new(move |ctx| Box::pin(f(ctx))),
    }
}

/// Result of one test (after retries, if any).
#[derive(Debug, Clone, Serialize)]
pub struct TestReport {
    pub name: String,
    pub tags: Vec<String>,
    pub outcome: Outcome,
    pub expected: Outcome,
    pub duration_ms: u64,
    pub attempts: u32,
    pub error: Option<String>,
    /// Timeouts are reported as a distinct failure reason.
    pub timed_out: bool,
    /// Path of the failure screenshot, when one was captured.
    pub artifact: Option<String>,
}

/// Aggregated result of a suite run.
#[derive(Debug, Clone, Serialize)]
pub struct SuiteResult {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub duration_ms: u64,
    pub reports: Vec<TestReport>,
}

impl SuiteResult {
    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }

    /// Write the full result document as pretty JSON.
    pub fn write_json(&self, dir: &std::path::Path) -> HarnessResult<std::path::PathBuf> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join("test-results.json");
        std::fs::write(&path, serde_json::to_string_pretty(self)?)?;
        info!(path = %path.display(), "results written");
        Ok(path)
    }
}

/// Whether tests get a real browser session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionMode {
    /// One fresh [`DriverSession`] per test attempt.
    Browser,
    /// No session; used to exercise the orchestration layer itself.
    Detached,
}

pub struct Suite {
    config: Arc<HarnessConfig>,
    session_mode: SessionMode,
    cases: Vec<Arc<TestCase>>,
    pre_hooks: Vec<PreHook>,
    post_hooks: Vec<PostHook>,
    artifacts: Option<ArtifactCapture>,
}

impl Suite {
    /// A browser-backed suite with failure screenshots enabled.
    pub fn new(config: Arc<HarnessConfig>) -> Self {
        let artifacts = ArtifactCapture::new(&config.artifacts_dir);
        Self {
            config,
            session_mode: SessionMode::Browser,
            cases: Vec::new(),
            pre_hooks: Vec::new(),
            post_hooks: Vec::new(),
            artifacts: Some(artifacts),
        }
    }

    /// A suite whose tests run without a browser.
    pub fn detached(config: Arc<HarnessConfig>) -> Self {
        Self {
            config,
            session_mode: SessionMode::Detached,
            cases: Vec::new(),
            pre_hooks: Vec::new(),
            post_hooks: Vec::new(),
            artifacts: None,
        }
    }

    pub fn add_case(&mut self, case: TestCase) {
        self.cases.push(Arc::new(case));
    }

    pub fn add_cases(&mut self, cases: impl IntoIterator<Item = TestCase>) {
        for case in cases {
            self.add_case(case);
        }
    }

    /// Register a callback to run before every test body. Hooks run in
    /// registration order; a hook error fails the test.
    pub fn add_pre_hook<F, Fut>(&mut self, f: F)
    where
        F: Fn(TestContext) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = HarnessResult<()>> + Send + 'static,
    {
        self.pre_hooks.push(Box::new(move |ctx| Box::pin(f(ctx))));
    }

    /// Register a callback to run after every test, on success and failure
    /// alike, in registration order.
    pub fn add_post_hook<F, Fut>(&mut self, f: F)
    where
        F: Fn(TestReport, TestContext) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = ()> + Send + 'static,
    {
        self.post_hooks
            .push(Box::new(move |report, ctx| Box::pin(f(report, ctx))));
    }

    pub fn set_failure_artifacts(&mut self, capture: ArtifactCapture) {
        self.artifacts = Some(capture);
    }

    /// Keep only cases carrying `tag`.
    pub fn retain_tag(&mut self, tag: &str) {
        self.cases.retain(|c| c.tags.iter().any(|t| t == tag));
    }

    /// Keep only cases whose name contains `needle`.
    pub fn retain_name_contains(&mut self, needle: &str) {
        self.cases.retain(|c| c.name.contains(needle));
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }

    /// Report every case as skipped without launching anything. Used by
    /// the entry point when no deployment is configured, so the results
    /// document still lists what would have run.
    pub fn skip_all(self, reason: &str) -> SuiteResult {
        let reports: Vec<TestReport> = self
            .cases
            .iter()
            .map(|test| TestReport {
                name: test.name.clone(),
                tags: test.tags.clone(),
                outcome: Outcome::Skipped,
                expected: test.expected,
                duration_ms: 0,
                attempts: 0,
                error: Some(reason.to_string()),
                timed_out: false,
                artifact: None,
            })
            .collect();

        let total = reports.len();
        info!(total, reason, "suite skipped");
        SuiteResult {
            total,
            passed: 0,
            failed: 0,
            skipped: total,
            duration_ms: 0,
            reports,
        }
    }

    /// Run every case and aggregate the reports in declaration order.
    pub async fn run(self) -> SuiteResult {
        let start = Instant::now();
        let total = self.cases.len();
        let workers = self.config.workers.max(1);
        let retries = self.config.retries;

        info!(total, workers, retries, "running suite");

        let semaphore = Arc::new(Semaphore::new(workers));
        let pre_hooks = Arc::new(self.pre_hooks);
        let post_hooks = Arc::new(self.post_hooks);
        let artifacts = self.artifacts.map(Arc::new);
        let config = self.config;
        let mode = self.session_mode;

        let mut handles = Vec::with_capacity(total);
        for (index, test) in self.cases.into_iter().enumerate() {
            let semaphore = Arc::clone(&semaphore);
            let pre_hooks = Arc::clone(&pre_hooks);
            let post_hooks = Arc::clone(&post_hooks);
            let artifacts = artifacts.clone();
            let config = Arc::clone(&config);
            let name = test.name.clone();
            let tags = test.tags.clone();

            let handle = tokio::spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => {
                        return setup_failure(&test, "worker pool closed");
                    }
                };
                run_case(test, config, pre_hooks, post_hooks, artifacts, mode, retries).await
            });
            handles.push((index, name, tags, handle));
        }

        let mut indexed = Vec::with_capacity(total);
        for (index, name, tags, handle) in handles {
            let report = match handle.await {
                Ok(report) => report,
                Err(e) => TestReport {
                    name,
                    tags,
                    outcome: Outcome::Failed,
                    expected: Outcome::Passed,
                    duration_ms: 0,
                    attempts: 1,
                    error: Some(format!("test panicked: {e}")),
                    timed_out: false,
                    artifact: None,
                },
            };
            indexed.push((index, report));
        }
        indexed.sort_by_key(|(index, _)| *index);

        let mut passed = 0;
        let mut failed = 0;
        let mut skipped = 0;
        let mut reports = Vec::with_capacity(total);
        for (_, report) in indexed {
            match report.outcome {
                Outcome::Passed => {
                    passed += 1;
                    info!("✓ {} ({} ms)", report.name, report.duration_ms);
                }
                Outcome::Failed => {
                    failed += 1;
                    error!(
                        "✗ {} - {}",
                        report.name,
                        report.error.as_deref().unwrap_or("unknown error")
                    );
                }
                Outcome::Skipped => skipped += 1,
            }
            reports.push(report);
        }

        let duration_ms = start.elapsed().as_millis() as u64;
        info!(
            "suite finished: {} passed, {} failed, {} skipped ({} ms)",
            passed, failed, skipped, duration_ms
        );

        SuiteResult {
            total,
            passed,
            failed,
            skipped,
            duration_ms,
            reports,
        }
    }
}

fn setup_failure(test: &TestCase, reason: &str) -> TestReport {
    TestReport {
        name: test.name.clone(),
        tags: test.tags.clone(),
        outcome: Outcome::Failed,
        expected: test.expected,
        duration_ms: 0,
        attempts: 1,
        error: Some(reason.to_string()),
        timed_out: false,
        artifact: None,
    }
}

async fn run_case(
    test: Arc<TestCase>,
    config: Arc<HarnessConfig>,
    pre_hooks: Arc<Vec<PreHook>>,
    post_hooks: Arc<Vec<PostHook>>,
    artifacts: Option<Arc<ArtifactCapture>>,
    mode: SessionMode,
    retries: u32,
) -> TestReport {
    let mut attempt = 0u32;
    loop {
        attempt += 1;
        let mut report = run_attempt(
            &test,
            &config,
            &pre_hooks,
            &post_hooks,
            artifacts.as_deref(),
            mode,
        )
        .await;
        report.attempts = attempt;

        if report.outcome == test.expected || attempt > retries {
            return report;
        }
        warn!(test = %test.name, attempt, "test failed; retrying with a fresh session");
    }
}

/// One fully independent attempt: fresh session in, cleaned-up session out.
async fn run_attempt(
    test: &TestCase,
    config: &Arc<HarnessConfig>,
    pre_hooks: &[PreHook],
    post_hooks: &[PostHook],
    artifacts: Option<&ArtifactCapture>,
    mode: SessionMode,
) -> TestReport {
    let start = Instant::now();

    let session = match mode {
        SessionMode::Browser => match DriverSession::launch(config.driver_config()).await {
            Ok(session) => Some(Arc::new(session)),
            Err(e) => {
                let mut report = setup_failure(test, &format!("session setup failed: {e}"));
                report.timed_out = e.is_timeout();
                report.duration_ms = start.elapsed().as_millis() as u64;
                return report;
            }
        },
        SessionMode::Detached => None,
    };

    let ctx = TestContext {
        config: Arc::clone(config),
        session: session.clone(),
    };

    let mut error: Option<HarnessError> = None;
    for hook in pre_hooks {
        if let Err(e) = hook(ctx.clone()).await {
            error = Some(e);
            break;
        }
    }

    if error.is_none() {
        match tokio::time::timeout(config.test_timeout, (test.body)(ctx.clone())).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => error = Some(e),
            Err(_) => error = Some(HarnessError::Timeout(format!("test body: {}", test.name))),
        }
    }

    let outcome = if error.is_none() {
        Outcome::Passed
    } else {
        Outcome::Failed
    };
    let timed_out = error.as_ref().map(HarnessError::is_timeout).unwrap_or(false);
    let mut report = TestReport {
        name: test.name.clone(),
        tags: test.tags.clone(),
        outcome,
        expected: test.expected,
        duration_ms: start.elapsed().as_millis() as u64,
        attempts: 1,
        error: error.map(|e| e.to_string()),
        timed_out,
        artifact: None,
    };

    // Failure-artifact hook: fires only on an expected/actual mismatch.
    if report.outcome != report.expected {
        if let (Some(artifacts), Some(session)) = (artifacts, session.as_deref()) {
            if let Some(artifact) = artifacts.capture(session, &test.name).await {
                report.artifact = Some(artifact.image_path.to_string_lossy().into_owned());
            }
        }
    }

    // User post hooks run on both terminal paths.
    for hook in post_hooks {
        hook(report.clone(), ctx.clone()).await;
    }

    // Cleanup so nothing leaks into the next test on this worker.
    if let Some(session) = session {
        if let Err(e) = session.clear_session_state().await {
            debug!(test = %test.name, "session state cleanup failed: {e}");
        }
        session.close().await;
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::Credential;

    fn test_config() -> Arc<HarnessConfig> {
        Arc::new(HarnessConfig::new(
            "http://127.0.0.1:1",
            Credential::new("user", "pass"),
        ))
    }

    #[test]
    fn case_builder_collects_tags() {
        let test = case("should do things", &["smoke", "ui"], |_ctx| async { Ok(()) });
        assert_eq!(test.name, "should do things");
        assert_eq!(test.tags, vec!["smoke", "ui"]);
        assert_eq!(test.expected, Outcome::Passed);
    }

    #[test]
    fn tag_filter_retains_only_matches() {
        let mut suite = Suite::detached(test_config());
        suite.add_case(case("a", &["smoke"], |_| async { Ok(()) }));
        suite.add_case(case("b", &["regression"], |_| async { Ok(()) }));
        suite.add_case(case("c", &["smoke", "ui"], |_| async { Ok(()) }));

        suite.retain_tag("smoke");
        assert_eq!(suite.len(), 2);
    }

    #[test]
    fn name_filter_matches_substrings() {
        let mut suite = Suite::detached(test_config());
        suite.add_case(case("login works", &[], |_| async { Ok(()) }));
        suite.add_case(case("cart works", &[], |_| async { Ok(()) }));

        suite.retain_name_contains("cart");
        assert_eq!(suite.len(), 1);
        assert!(!suite.is_empty());
    }

    #[tokio::test]
    async fn detached_context_has_no_session() {
        let ctx = TestContext {
            config: test_config(),
            session: None,
        };
        assert!(ctx.session().is_err());
    }
}
