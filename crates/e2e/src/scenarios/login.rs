//! Login suite: the positive path, the derived invalid-credential matrix,
//! form structure, accessibility, and the visual baseline of the entry
//! page.

use std::time::Instant;

use crate::a11y::check_a11y;
use crate::config::HarnessConfig;
use crate::error::HarnessError;
use crate::fixtures::invalid_credentials;
use crate::generator::{expand, TestRecord};
use crate::pages::LoginPage;
use crate::runner::{case, TestCase};
use crate::visual::{VisualBaselines, VisualConfig};

/// Page title the storefront serves on every screen.
const STOREFRONT_TITLE: &str = "Swag Labs";

pub fn login_cases(config: &HarnessConfig) -> Vec<TestCase> {
    let mut cases = vec![
        case(
            "login: signs in with valid credentials",
            &["smoke", "login"],
            |ctx| async move {
                let session = ctx.session()?;
                let login = LoginPage::new(session, &ctx.config);
                login.goto().await?;
                login
                    .login(
                        &ctx.config.credentials.username,
                        &ctx.config.credentials.password,
                    )
                    .await?;
                login.assert_login_success().await
            },
        ),
        case(
            "login: submits from the keyboard with enter",
            &["ui", "login"],
            |ctx| async move {
                let session = ctx.session()?;
                let login = LoginPage::new(session, &ctx.config);
                login.goto().await?;
                login
                    .login_with_enter(
                        &ctx.config.credentials.username,
                        &ctx.config.credentials.password,
                    )
                    .await?;
                login.assert_login_success().await
            },
        ),
        case(
            "login: page title names the storefront",
            &["ui", "login"],
            |ctx| async move {
                let session = ctx.session()?;
                let login = LoginPage::new(session, &ctx.config);
                login.goto().await?;

                let title = session.title().await?;
                if title != STOREFRONT_TITLE {
                    return Err(HarnessError::Assertion(format!(
                        "expected page title {STOREFRONT_TITLE:?}, got {title:?}"
                    )));
                }
                Ok(())
            },
        ),
        case(
            "login: form stays usable at a mobile viewport",
            &["ui", "login"],
            |ctx| async move {
                let session = ctx.session()?;
                let login = LoginPage::new(session, &ctx.config);
                login.goto().await?;
                session.set_viewport(375, 812).await?;

                for (control, visible) in [
                    ("username field", login.username_field_visible().await?),
                    ("password field", login.password_field_visible().await?),
                    ("login button", login.login_button_visible().await?),
                ] {
                    if !visible {
                        return Err(HarnessError::Assertion(format!(
                            "{control} is not visible at a mobile viewport"
                        )));
                    }
                }
                Ok(())
            },
        ),
        case(
            "login: form exposes username, password and submit controls",
            &["ui", "login"],
            |ctx| async move {
                let session = ctx.session()?;
                let login = LoginPage::new(session, &ctx.config);
                login.goto().await?;

                for (control, visible) in [
                    ("username field", login.username_field_visible().await?),
                    ("password field", login.password_field_visible().await?),
                    ("login button", login.login_button_visible().await?),
                ] {
                    if !visible {
                        return Err(HarnessError::Assertion(format!(
                            "{control} is not visible on the login form"
                        )));
                    }
                }
                Ok(())
            },
        ),
        case(
            "login: password input masks its value",
            &["security", "login"],
            |ctx| async move {
                let session = ctx.session()?;
                let login = LoginPage::new(session, &ctx.config);
                login.goto().await?;
                if !login.password_is_masked().await? {
                    return Err(HarnessError::Assertion(
                        "password input renders its value in clear text".into(),
                    ));
                }
                Ok(())
            },
        ),
        case(
            "login: completes within the navigation budget",
            &["performance", "login"],
            |ctx| async move {
                let session = ctx.session()?;
                let login = LoginPage::new(session, &ctx.config);

                let start = Instant::now();
                login.goto().await?;
                login
                    .login(
                        &ctx.config.credentials.username,
                        &ctx.config.credentials.password,
                    )
                    .await?;
                login.assert_login_success().await?;
                let elapsed = start.elapsed();

                if elapsed > ctx.config.navigation_timeout {
                    return Err(HarnessError::Assertion(format!(
                        "login took {}ms, budget is {}ms",
                        elapsed.as_millis(),
                        ctx.config.navigation_timeout.as_millis()
                    )));
                }
                Ok(())
            },
        ),
        case(
            "login: entry page passes the accessibility audit",
            &["a11y", "login"],
            |ctx| async move {
                let session = ctx.session()?;
                let login = LoginPage::new(session, &ctx.config);
                login.goto().await?;
                check_a11y(session, ctx.config.a11y_policy).await?;
                Ok(())
            },
        ),
        case(
            "login: entry page matches its visual baseline",
            &["visual", "login"],
            |ctx| async move {
                let session = ctx.session()?;
                let login = LoginPage::new(session, &ctx.config);
                login.goto().await?;

                let baselines = VisualBaselines::new(VisualConfig {
                    baseline_dir: ctx.config.output_dir.join("baselines"),
                    actual_dir: ctx.config.output_dir.join("actual"),
                    diff_dir: ctx.config.output_dir.join("diffs"),
                    ..VisualConfig::default()
                })?;
                session
                    .screenshot(&baselines.actual_path("login-page"), false)
                    .await?;
                baselines.assert_matches("login-page")
            },
        ),
    ];

    for record in expand(
        "login: rejects invalid credentials",
        invalid_credentials(&config.credentials),
        |f| format!("{:?}", f.kind),
    ) {
        let TestRecord {
            description,
            fixture,
        } = record;
        cases.push(case(
            &description,
            &["login", "negative"],
            move |ctx| {
                let credential = fixture.credential.clone();
                async move {
                    let session = ctx.session()?;
                    let login = LoginPage::new(session, &ctx.config);
                    login.goto().await?;
                    login.login(&credential.username, &credential.password).await?;
                    login.assert_login_failure().await
                }
            },
        ));
    }

    cases
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::Credential;

    fn sample_config() -> HarnessConfig {
        HarnessConfig::new(
            "https://www.saucedemo.com",
            Credential::new("standard_user", "secret_sauce"),
        )
    }

    #[test]
    fn one_negative_case_per_invalid_credential_row() {
        let config = sample_config();
        let negatives = login_cases(&config)
            .into_iter()
            .filter(|c| c.tags.iter().any(|t| t == "negative"))
            .count();
        assert_eq!(negatives, invalid_credentials(&config.credentials).len());
    }

    #[test]
    fn suite_covers_keyboard_title_and_viewport_checks() {
        let config = sample_config();
        let names: Vec<_> = login_cases(&config).into_iter().map(|c| c.name).collect();
        for needle in ["keyboard with enter", "page title", "mobile viewport"] {
            assert!(
                names.iter().any(|n| n.contains(needle)),
                "missing login case: {needle}"
            );
        }
    }

    #[test]
    fn negative_case_names_name_the_rejection_reason() {
        let config = sample_config();
        let names: Vec<_> = login_cases(&config)
            .into_iter()
            .filter(|c| c.tags.iter().any(|t| t == "negative"))
            .map(|c| c.name)
            .collect();
        assert!(names.iter().any(|n| n.contains("Empty")));
        assert!(names.iter().any(|n| n.contains("WrongPassword")));
    }
}
