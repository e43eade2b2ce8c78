//! Accessibility scanning via axe-core.
//!
//! The scan runs against the current page state and always returns the
//! full result set. What happens on findings is a policy decision, not a
//! hard-wired behavior: `Warn` (the default) logs each violation and lets
//! the test pass; `Fail` raises an error that fails the test.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::driver::DriverSession;
use crate::error::{HarnessError, HarnessResult};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationPolicy {
    #[default]
    Warn,
    Fail,
}

impl std::str::FromStr for ViolationPolicy {
    type Err = HarnessError;

    fn from_str(s: &str) -> HarnessResult<Self> {
        match s {
            "warn" => Ok(ViolationPolicy::Warn),
            "fail" => Ok(ViolationPolicy::Fail),
            other => Err(HarnessError::Config(format!(
                "E2E_A11Y_POLICY must be `warn` or `fail`, got `{other}`"
            ))),
        }
    }
}

/// One axe-core rule violation.
#[derive(Debug, Clone, Deserialize)]
pub struct AxeViolation {
    pub id: String,
    #[serde(default)]
    pub impact: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub nodes: Vec<serde_json::Value>,
}

/// Full scan outcome. `passes` is a count only; violations carry detail.
#[derive(Debug, Clone)]
pub struct ScanResults {
    pub violations: Vec<AxeViolation>,
    pub passes: usize,
}

/// Audit the current page state.
pub async fn check_a11y(session: &DriverSession, policy: ViolationPolicy) -> HarnessResult<ScanResults> {
    let raw = session.a11y_scan().await?;

    let violations: Vec<AxeViolation> = raw
        .get("violations")
        .cloned()
        .map(serde_json::from_value)
        .transpose()?
        .unwrap_or_default();
    let passes = raw
        .get("passes")
        .and_then(|p| p.as_array())
        .map(|p| p.len())
        .unwrap_or(0);

    if violations.is_empty() {
        info!(passes, "accessibility scan clean");
    } else {
        for violation in &violations {
            warn!(
                rule = %violation.id,
                impact = violation.impact.as_deref().unwrap_or("unknown"),
                nodes = violation.nodes.len(),
                "accessibility violation: {}",
                violation.description
            );
        }
        if policy == ViolationPolicy::Fail {
            return Err(HarnessError::Accessibility {
                count: violations.len(),
            });
        }
    }

    Ok(ScanResults { violations, passes })
}
