//! Browser driver capability surface.
//!
//! A [`DriverSession`] owns one Playwright page for the lifetime of one
//! test. The browser side runs as a Node subprocess (`bridge.js`) that
//! executes newline-delimited JSON commands and answers each with a JSON
//! reply correlated by id. Every command is bounded: Playwright enforces
//! its own per-action timeout and the Rust side adds a grace bound so a
//! wedged bridge still surfaces as [`HarnessError::Timeout`].

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, Command};
use tokio::sync::{oneshot, Mutex};
use tracing::{debug, warn};

use crate::error::{HarnessError, HarnessResult};

/// Extra time allowed beyond the driver-side timeout before the Rust side
/// gives up on a reply.
const COMMAND_GRACE: Duration = Duration::from_secs(5);

/// Browser engine to launch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Browser {
    #[default]
    Chromium,
    Firefox,
    Webkit,
}

impl Browser {
    pub fn as_str(&self) -> &'static str {
        match self {
            Browser::Chromium => "chromium",
            Browser::Firefox => "firefox",
            Browser::Webkit => "webkit",
        }
    }
}

impl std::str::FromStr for Browser {
    type Err = HarnessError;

    fn from_str(s: &str) -> HarnessResult<Self> {
        match s {
            "chromium" => Ok(Browser::Chromium),
            "firefox" => Ok(Browser::Firefox),
            "webkit" => Ok(Browser::Webkit),
            other => Err(HarnessError::Config(format!("unknown browser: {other}"))),
        }
    }
}

/// Settings for one browser session.
#[derive(Debug, Clone)]
pub struct DriverConfig {
    pub browser: Browser,
    pub headless: bool,
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub action_timeout: Duration,
    pub navigation_timeout: Duration,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            browser: Browser::Chromium,
            headless: true,
            viewport_width: 1280,
            viewport_height: 720,
            action_timeout: Duration::from_millis(5_000),
            navigation_timeout: Duration::from_millis(30_000),
        }
    }
}

#[derive(Serialize)]
struct BridgeCommand<'a> {
    id: u64,
    op: &'a str,
    args: Value,
}

#[derive(Debug, Deserialize)]
struct BridgeReply {
    id: u64,
    ok: bool,
    #[serde(default)]
    value: Value,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    kind: Option<String>,
}

/// A network response observed by the bridge, in arrival order.
#[derive(Debug, Clone, Deserialize)]
pub struct ResponseRecord {
    pub seq: u64,
    pub url: String,
    pub status: u16,
    pub ok: bool,
}

type PendingMap = Arc<Mutex<HashMap<u64, oneshot::Sender<BridgeReply>>>>;

/// One live browser session, exclusively owned by the test that opened it.
pub struct DriverSession {
    child: std::sync::Mutex<Child>,
    stdin: Mutex<ChildStdin>,
    pending: PendingMap,
    next_id: AtomicU64,
    config: DriverConfig,
    // Holds the generated bridge script for the child's lifetime.
    _workdir: tempfile::TempDir,
}

impl DriverSession {
    /// Spawn a fresh bridge process and wait for its ready handshake.
    pub async fn launch(config: DriverConfig) -> HarnessResult<Self> {
        Self::check_node_installed()?;

        let workdir = tempfile::tempdir()?;
        let script_path = workdir.path().join("bridge.js");
        std::fs::write(&script_path, include_str!("bridge.js"))?;

        let options = json!({
            "browser": config.browser.as_str(),
            "headless": config.headless,
            "viewportWidth": config.viewport_width,
            "viewportHeight": config.viewport_height,
            "actionTimeoutMs": config.action_timeout.as_millis() as u64,
            "navigationTimeoutMs": config.navigation_timeout.as_millis() as u64,
        });

        let mut child = Command::new("node")
            .arg(&script_path)
            .arg(options.to_string())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| HarnessError::Driver(format!("failed to spawn bridge: {e}")))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| HarnessError::Driver("bridge stdin unavailable".into()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| HarnessError::Driver("bridge stdout unavailable".into()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| HarnessError::Driver("bridge stderr unavailable".into()))?;

        let pending: PendingMap = Arc::new(Mutex::new(HashMap::new()));

        // The ready handshake arrives as reply id 0.
        let (ready_tx, ready_rx) = oneshot::channel();
        pending.lock().await.insert(0, ready_tx);

        let reader_pending = Arc::clone(&pending);
        tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                match serde_json::from_str::<BridgeReply>(&line) {
                    Ok(reply) => {
                        let tx = reader_pending.lock().await.remove(&reply.id);
                        match tx {
                            Some(tx) => {
                                let _ = tx.send(reply);
                            }
                            None => warn!(id = reply.id, "unmatched bridge reply"),
                        }
                    }
                    Err(_) => debug!(line = %line, "bridge stdout"),
                }
            }
            // Dropping the map wakes every pending waiter with a recv error.
            reader_pending.lock().await.clear();
        });

        tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                debug!(line = %line, "bridge stderr");
            }
        });

        let launch_bound = config.navigation_timeout + COMMAND_GRACE;
        let session = Self {
            child: std::sync::Mutex::new(child),
            stdin: Mutex::new(stdin),
            pending,
            next_id: AtomicU64::new(1),
            config,
            _workdir: workdir,
        };

        match tokio::time::timeout(launch_bound, ready_rx).await {
            Ok(Ok(reply)) if reply.ok => Ok(session),
            Ok(Ok(reply)) => Err(HarnessError::Driver(
                reply.error.unwrap_or_else(|| "bridge failed to start".into()),
            )),
            Ok(Err(_)) => Err(HarnessError::DriverNotFound),
            Err(_) => Err(HarnessError::Timeout("browser launch".into())),
        }
    }

    fn check_node_installed() -> HarnessResult<()> {
        let status = std::process::Command::new("node")
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();

        match status {
            Ok(s) if s.success() => Ok(()),
            _ => Err(HarnessError::DriverNotFound),
        }
    }

    fn action_millis(&self) -> u64 {
        self.config.action_timeout.as_millis() as u64
    }

    async fn command(&self, op: &str, args: Value) -> HarnessResult<Value> {
        self.command_bounded(op, args, self.config.action_timeout + COMMAND_GRACE)
            .await
    }

    /// Navigations get the longer bound.
    async fn navigation(&self, op: &str, args: Value) -> HarnessResult<Value> {
        self.command_bounded(op, args, self.config.navigation_timeout + COMMAND_GRACE)
            .await
    }

    async fn command_bounded(&self, op: &str, args: Value, bound: Duration) -> HarnessResult<Value> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = oneshot::channel();
        self.pending.lock().await.insert(id, tx);

        let line = serde_json::to_string(&BridgeCommand { id, op, args })?;
        {
            let mut stdin = self.stdin.lock().await;
            let write = async {
                stdin.write_all(line.as_bytes()).await?;
                stdin.write_all(b"\n").await?;
                stdin.flush().await
            };
            if let Err(e) = write.await {
                self.pending.lock().await.remove(&id);
                return Err(HarnessError::Driver(format!("bridge write failed: {e}")));
            }
        }

        let reply = match tokio::time::timeout(bound, rx).await {
            Ok(Ok(reply)) => reply,
            Ok(Err(_)) => return Err(HarnessError::Driver("bridge exited unexpectedly".into())),
            Err(_) => {
                self.pending.lock().await.remove(&id);
                return Err(HarnessError::Timeout(format!("driver op `{op}`")));
            }
        };

        if reply.ok {
            Ok(reply.value)
        } else {
            let message = reply.error.unwrap_or_else(|| "unknown driver error".into());
            Err(match reply.kind.as_deref() {
                Some("timeout") => HarnessError::Timeout(message),
                Some("not_found") => HarnessError::NotFound(message),
                _ => HarnessError::Driver(message),
            })
        }
    }

    // ── Navigation ───────────────────────────────────────────────

    pub async fn goto(&self, url: &str) -> HarnessResult<()> {
        self.navigation("goto", json!({ "url": url })).await?;
        Ok(())
    }

    pub async fn reload(&self) -> HarnessResult<()> {
        self.navigation("reload", json!({})).await?;
        Ok(())
    }

    pub async fn go_back(&self) -> HarnessResult<()> {
        self.navigation("go_back", json!({})).await?;
        Ok(())
    }

    pub async fn current_url(&self) -> HarnessResult<String> {
        let value = self.command("url", json!({})).await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    pub async fn title(&self) -> HarnessResult<String> {
        let value = self.command("title", json!({})).await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    // ── Element interaction ──────────────────────────────────────

    pub async fn click(&self, selector: &str) -> HarnessResult<()> {
        self.command(
            "click",
            json!({ "selector": selector, "timeoutMs": self.action_millis() }),
        )
        .await?;
        Ok(())
    }

    pub async fn fill(&self, selector: &str, value: &str) -> HarnessResult<()> {
        self.command("fill", json!({ "selector": selector, "value": value }))
            .await?;
        Ok(())
    }

    pub async fn fill_by_placeholder(&self, placeholder: &str, value: &str) -> HarnessResult<()> {
        self.command(
            "placeholder_fill",
            json!({ "placeholder": placeholder, "value": value }),
        )
        .await?;
        Ok(())
    }

    pub async fn placeholder_visible(&self, placeholder: &str) -> HarnessResult<bool> {
        let value = self
            .command("placeholder_visible", json!({ "placeholder": placeholder }))
            .await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    pub async fn click_by_role(&self, role: &str, name: &str) -> HarnessResult<()> {
        self.command("role_click", json!({ "role": role, "name": name }))
            .await?;
        Ok(())
    }

    pub async fn role_visible(&self, role: &str, name: &str) -> HarnessResult<bool> {
        let value = self
            .command("role_visible", json!({ "role": role, "name": name }))
            .await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    pub async fn press(&self, selector: Option<&str>, key: &str) -> HarnessResult<()> {
        self.command("press", json!({ "selector": selector, "key": key }))
            .await?;
        Ok(())
    }

    // ── Queries ──────────────────────────────────────────────────

    pub async fn text_content(&self, selector: &str) -> HarnessResult<Option<String>> {
        let value = self.command("text", json!({ "selector": selector })).await?;
        Ok(value.as_str().map(str::to_string))
    }

    /// Text of every match, in render order, duplicates preserved.
    pub async fn all_text_contents(&self, selector: &str) -> HarnessResult<Vec<String>> {
        let value = self.command("texts", json!({ "selector": selector })).await?;
        Ok(serde_json::from_value(value)?)
    }

    pub async fn text_visible(&self, text: &str, exact: bool) -> HarnessResult<bool> {
        let value = self
            .command("text_visible", json!({ "text": text, "exact": exact }))
            .await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    pub async fn count(&self, selector: &str) -> HarnessResult<usize> {
        let value = self.command("count", json!({ "selector": selector })).await?;
        Ok(value.as_u64().unwrap_or(0) as usize)
    }

    pub async fn is_visible(&self, selector: &str) -> HarnessResult<bool> {
        let value = self
            .command("visible", json!({ "selector": selector }))
            .await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    pub async fn attribute(&self, selector: &str, name: &str) -> HarnessResult<Option<String>> {
        let value = self
            .command("attribute", json!({ "selector": selector, "name": name }))
            .await?;
        Ok(value.as_str().map(str::to_string))
    }

    pub async fn wait_for_selector(&self, selector: &str, timeout: Duration) -> HarnessResult<()> {
        self.command_bounded(
            "wait_selector",
            json!({ "selector": selector, "timeoutMs": timeout.as_millis() as u64 }),
            timeout + COMMAND_GRACE,
        )
        .await?;
        Ok(())
    }

    pub async fn evaluate(&self, script: &str) -> HarnessResult<Value> {
        self.command("evaluate", json!({ "script": script })).await
    }

    pub async fn set_viewport(&self, width: u32, height: u32) -> HarnessResult<()> {
        self.command("set_viewport", json!({ "width": width, "height": height }))
            .await?;
        Ok(())
    }

    // ── Row-scoped operations ────────────────────────────────────
    // Rows are matched by contained text; when several rows match,
    // the first rendered match wins.

    pub async fn row_count(&self, row_selector: &str, has_text: &str) -> HarnessResult<usize> {
        let value = self
            .command("row_count", json!({ "row": row_selector, "hasText": has_text }))
            .await?;
        Ok(value.as_u64().unwrap_or(0) as usize)
    }

    pub async fn row_click(
        &self,
        row_selector: &str,
        has_text: &str,
        button_name: &str,
    ) -> HarnessResult<()> {
        self.command(
            "row_click",
            json!({ "row": row_selector, "hasText": has_text, "role": "button", "name": button_name }),
        )
        .await?;
        Ok(())
    }

    pub async fn row_button_visible(
        &self,
        row_selector: &str,
        has_text: &str,
        button_name: &str,
    ) -> HarnessResult<bool> {
        let value = self
            .command(
                "row_visible",
                json!({ "row": row_selector, "hasText": has_text, "role": "button", "name": button_name }),
            )
            .await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    // ── Screenshots ──────────────────────────────────────────────

    pub async fn screenshot(&self, path: &Path, full_page: bool) -> HarnessResult<PathBuf> {
        let path = absolutize(path)?;
        self.command(
            "screenshot",
            json!({ "path": path.to_string_lossy(), "fullPage": full_page }),
        )
        .await?;
        Ok(path)
    }

    pub async fn screenshot_element(&self, selector: &str, path: &Path) -> HarnessResult<PathBuf> {
        let path = absolutize(path)?;
        self.command(
            "screenshot",
            json!({ "selector": selector, "path": path.to_string_lossy() }),
        )
        .await?;
        Ok(path)
    }

    // ── Network correlation ──────────────────────────────────────

    /// Current position in the bridge's response log. Responses observed
    /// before this point will never match a later wait.
    pub async fn response_watermark(&self) -> HarnessResult<u64> {
        let value = self.command("response_mark", json!({})).await?;
        Ok(value.as_u64().unwrap_or(0))
    }

    pub async fn wait_for_response(
        &self,
        url_part: &str,
        status: u16,
        after: u64,
        timeout: Duration,
    ) -> HarnessResult<ResponseRecord> {
        let value = self
            .command_bounded(
                "wait_response",
                json!({
                    "urlPart": url_part,
                    "status": status,
                    "after": after,
                    "timeoutMs": timeout.as_millis() as u64,
                }),
                timeout + COMMAND_GRACE,
            )
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    // ── Cross-cutting ────────────────────────────────────────────

    /// Run an axe-core audit against the current page state and return
    /// the raw result document.
    pub async fn a11y_scan(&self) -> HarnessResult<Value> {
        // Injecting and running axe can outlast a single action bound.
        self.navigation("a11y_scan", json!({})).await
    }

    /// Clear cookies and client-side storage so no state leaks into the
    /// next test sharing this worker.
    pub async fn clear_session_state(&self) -> HarnessResult<()> {
        self.command("clear_state", json!({})).await?;
        Ok(())
    }

    /// Ask the bridge to close the browser, then reap the subprocess.
    pub async fn close(&self) {
        let _ = self
            .command_bounded("close", json!({}), Duration::from_secs(5))
            .await;

        let pid = {
            let child = match self.child.lock() {
                Ok(child) => child,
                Err(poisoned) => poisoned.into_inner(),
            };
            child.id()
        };

        #[cfg(unix)]
        if let Some(pid) = pid {
            use nix::sys::signal::{kill, Signal};
            use nix::unistd::Pid;

            let _ = kill(Pid::from_raw(pid as i32), Signal::SIGTERM);
            tokio::time::sleep(Duration::from_millis(200)).await;
        }

        let mut child = match self.child.lock() {
            Ok(child) => child,
            Err(poisoned) => poisoned.into_inner(),
        };
        let _ = child.start_kill();
    }
}

fn absolutize(path: &Path) -> HarnessResult<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn browser_round_trips_through_str() {
        for browser in [Browser::Chromium, Browser::Firefox, Browser::Webkit] {
            assert_eq!(browser.as_str().parse::<Browser>().unwrap(), browser);
        }
        assert!("safari".parse::<Browser>().is_err());
    }

    #[test]
    fn bridge_script_covers_every_issued_op() {
        let script = include_str!("bridge.js");
        for op in [
            "goto",
            "reload",
            "go_back",
            "click",
            "fill",
            "placeholder_fill",
            "placeholder_visible",
            "role_click",
            "role_visible",
            "press",
            "text",
            "texts",
            "text_visible",
            "count",
            "visible",
            "attribute",
            "wait_selector",
            "url",
            "title",
            "set_viewport",
            "screenshot",
            "evaluate",
            "clear_state",
            "row_count",
            "row_click",
            "row_visible",
            "response_mark",
            "wait_response",
            "a11y_scan",
            "close",
        ] {
            assert!(
                script.contains(&format!("case '{op}'")),
                "bridge.js is missing op: {op}"
            );
        }
    }

    #[test]
    fn reply_parsing_tolerates_missing_fields() {
        let reply: BridgeReply = serde_json::from_str(r#"{"id":3,"ok":true}"#).unwrap();
        assert_eq!(reply.id, 3);
        assert!(reply.ok);
        assert!(reply.value.is_null());
        assert!(reply.error.is_none());

        let reply: BridgeReply =
            serde_json::from_str(r#"{"id":4,"ok":false,"error":"Timeout 5000ms","kind":"timeout"}"#)
                .unwrap();
        assert_eq!(reply.kind.as_deref(), Some("timeout"));
    }

    #[test]
    fn default_config_bounds_every_interaction() {
        let config = DriverConfig::default();
        assert!(config.action_timeout > Duration::ZERO);
        assert!(config.navigation_timeout >= config.action_timeout);
    }
}
