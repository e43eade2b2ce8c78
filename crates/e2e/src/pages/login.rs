//! Login screen.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::HarnessConfig;
use crate::driver::DriverSession;
use crate::error::{HarnessError, HarnessResult};
use crate::pages::eventually;

const USERNAME_PLACEHOLDER: &str = "Username";
const PASSWORD_PLACEHOLDER: &str = "Password";
const PASSWORD_INPUT: &str = "[data-test=\"password\"], input[placeholder=\"Password\"]";
const LOGIN_BUTTON: &str = "login";
const ERROR_MESSAGE: &str = "[data-test=\"error\"], .error-message-container";

/// URL shapes that count as a successful post-login destination. This is
/// the single definition of login success shared by every suite.
static LOGGED_IN_URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)dashboard|inventory|home").expect("valid pattern"));

pub struct LoginPage<'a> {
    session: &'a DriverSession,
    config: &'a HarnessConfig,
}

impl<'a> LoginPage<'a> {
    pub fn new(session: &'a DriverSession, config: &'a HarnessConfig) -> Self {
        Self { session, config }
    }

    /// Navigate to the configured entry point.
    pub async fn goto(&self) -> HarnessResult<()> {
        if self.config.base_url.is_empty() {
            return Err(HarnessError::Config("base URL is not set".into()));
        }
        self.session.goto(&self.config.base_url).await
    }

    /// Fill both fields and submit. Side effect only; outcome is asserted
    /// separately so negative tests can share this path.
    pub async fn login(&self, username: &str, password: &str) -> HarnessResult<()> {
        self.session
            .fill_by_placeholder(USERNAME_PLACEHOLDER, username)
            .await?;
        self.session
            .fill_by_placeholder(PASSWORD_PLACEHOLDER, password)
            .await?;
        self.session.click_by_role("button", LOGIN_BUTTON).await
    }

    /// Fill both fields and submit from the keyboard instead of the
    /// button.
    pub async fn login_with_enter(&self, username: &str, password: &str) -> HarnessResult<()> {
        self.session
            .fill_by_placeholder(USERNAME_PLACEHOLDER, username)
            .await?;
        self.session
            .fill_by_placeholder(PASSWORD_PLACEHOLDER, password)
            .await?;
        self.session.press(Some(PASSWORD_INPUT), "Enter").await
    }

    /// Success means the browser reached a post-login destination.
    pub async fn assert_login_success(&self) -> HarnessResult<()> {
        let reached = eventually(self.config.expect_timeout, || async move {
            let url = self.session.current_url().await?;
            Ok(LOGGED_IN_URL.is_match(&url))
        })
        .await?;

        if reached {
            Ok(())
        } else {
            let url = self.session.current_url().await?;
            Err(HarnessError::Assertion(format!(
                "expected a post-login destination, still on {url}"
            )))
        }
    }

    /// Failure means the error indicator became visible.
    pub async fn assert_login_failure(&self) -> HarnessResult<()> {
        let visible = eventually(self.config.expect_timeout, || async move {
            self.session.is_visible(ERROR_MESSAGE).await
        })
        .await?;

        if visible {
            Ok(())
        } else {
            Err(HarnessError::Assertion(
                "expected a visible login error indicator".into(),
            ))
        }
    }

    pub async fn username_field_visible(&self) -> HarnessResult<bool> {
        self.session.placeholder_visible(USERNAME_PLACEHOLDER).await
    }

    pub async fn password_field_visible(&self) -> HarnessResult<bool> {
        self.session.placeholder_visible(PASSWORD_PLACEHOLDER).await
    }

    pub async fn login_button_visible(&self) -> HarnessResult<bool> {
        self.session.role_visible("button", LOGIN_BUTTON).await
    }

    /// Whether the password input masks its value.
    pub async fn password_is_masked(&self) -> HarnessResult<bool> {
        let kind = self.session.attribute(PASSWORD_INPUT, "type").await?;
        Ok(kind.as_deref() == Some("password"))
    }
}
