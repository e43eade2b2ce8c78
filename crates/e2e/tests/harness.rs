//! Orchestration tests that run the suite machinery without a browser.

use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use storefront_e2e::error::HarnessError;
use storefront_e2e::fixtures::Credential;
use storefront_e2e::runner::{case, Outcome, Suite};
use storefront_e2e::HarnessConfig;

fn detached_config() -> HarnessConfig {
    HarnessConfig::new("http://127.0.0.1:1", Credential::new("user", "pass"))
}

#[tokio::test]
async fn reports_stay_in_declaration_order() {
    let mut suite = Suite::detached(Arc::new(detached_config()));
    suite.add_case(case("first", &["a"], |_| async { Ok(()) }));
    suite.add_case(case("second", &["a"], |_| async {
        Err(HarnessError::Assertion("boom".into()))
    }));
    suite.add_case(case("third", &["a"], |_| async { Ok(()) }));

    let result = suite.run().await;
    assert_eq!(result.total, 3);
    assert_eq!(result.passed, 2);
    assert_eq!(result.failed, 1);
    assert!(!result.all_passed());

    let names: Vec<_> = result.reports.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, ["first", "second", "third"]);
    assert_eq!(result.reports[1].outcome, Outcome::Failed);
    assert_eq!(result.reports[1].error.as_deref(), Some("assertion failed: boom"));
}

#[tokio::test]
async fn post_hooks_run_on_success_and_failure() {
    let seen: Arc<Mutex<Vec<(String, Outcome)>>> = Arc::new(Mutex::new(Vec::new()));

    let mut suite = Suite::detached(Arc::new(detached_config()));
    suite.add_case(case("passes", &["x"], |_| async { Ok(()) }));
    suite.add_case(case("fails", &["x"], |_| async {
        Err(HarnessError::Assertion("nope".into()))
    }));

    let sink = Arc::clone(&seen);
    suite.add_post_hook(move |report, _ctx| {
        let sink = Arc::clone(&sink);
        async move {
            sink.lock().unwrap().push((report.name, report.outcome));
        }
    });

    suite.run().await;

    let mut seen = seen.lock().unwrap().clone();
    seen.sort_by(|a, b| a.0.cmp(&b.0));
    assert_eq!(
        seen,
        [
            ("fails".to_string(), Outcome::Failed),
            ("passes".to_string(), Outcome::Passed),
        ]
    );
}

#[tokio::test]
async fn pre_hook_error_fails_the_test_without_running_its_body() {
    let body_ran = Arc::new(AtomicUsize::new(0));

    let mut suite = Suite::detached(Arc::new(detached_config()));
    suite.add_pre_hook(|_ctx| async {
        Err(HarnessError::Config("setup broke".into()))
    });

    let counter = Arc::clone(&body_ran);
    suite.add_case(case("guarded", &["x"], move |_| {
        let counter = Arc::clone(&counter);
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }));

    let result = suite.run().await;
    assert_eq!(result.failed, 1);
    assert_eq!(body_ran.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn failed_tests_are_retried_as_fresh_attempts() {
    let mut config = detached_config();
    config.retries = 2;

    let attempts = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&attempts);

    let mut suite = Suite::detached(Arc::new(config));
    suite.add_case(case("flaky", &["x"], move |_| {
        let counter = Arc::clone(&counter);
        async move {
            if counter.fetch_add(1, Ordering::SeqCst) < 1 {
                Err(HarnessError::Assertion("first attempt fails".into()))
            } else {
                Ok(())
            }
        }
    }));

    let result = suite.run().await;
    assert_eq!(result.passed, 1);
    assert_eq!(result.reports[0].attempts, 2);
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn retries_stop_once_the_budget_is_spent() {
    let mut config = detached_config();
    config.retries = 1;

    let mut suite = Suite::detached(Arc::new(config));
    suite.add_case(case("always fails", &["x"], |_| async {
        Err(HarnessError::Assertion("still broken".into()))
    }));

    let result = suite.run().await;
    assert_eq!(result.failed, 1);
    assert_eq!(result.reports[0].attempts, 2);
}

#[tokio::test]
async fn slow_bodies_fail_with_a_timeout() {
    let mut config = detached_config();
    config.test_timeout = Duration::from_millis(50);

    let mut suite = Suite::detached(Arc::new(config));
    suite.add_case(case("sleeper", &["x"], |_| async {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Ok(())
    }));

    let result = suite.run().await;
    assert_eq!(result.failed, 1);
    assert!(result.reports[0].timed_out);
}

#[tokio::test]
async fn panicking_bodies_are_reported_not_propagated() {
    let mut suite = Suite::detached(Arc::new(detached_config()));
    suite.add_case(case("panics", &["x"], |_| async {
        if true {
            panic!("unexpected");
        }
        Ok(())
    }));
    suite.add_case(case("survives", &["x"], |_| async { Ok(()) }));

    let result = suite.run().await;
    assert_eq!(result.passed, 1);
    assert_eq!(result.failed, 1);
    assert!(result.reports[0]
        .error
        .as_deref()
        .unwrap()
        .contains("panicked"));
}

#[tokio::test]
async fn single_worker_never_overlaps_tests() {
    let mut config = detached_config();
    config.workers = 1;

    let in_flight = Arc::new(AtomicUsize::new(0));
    let overlapped = Arc::new(AtomicUsize::new(0));

    let mut suite = Suite::detached(Arc::new(config));
    for i in 0..4 {
        let in_flight = Arc::clone(&in_flight);
        let overlapped = Arc::clone(&overlapped);
        suite.add_case(case(&format!("serial {i}"), &["x"], move |_| {
            let in_flight = Arc::clone(&in_flight);
            let overlapped = Arc::clone(&overlapped);
            async move {
                if in_flight.fetch_add(1, Ordering::SeqCst) > 0 {
                    overlapped.fetch_add(1, Ordering::SeqCst);
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
                Ok(())
            }
        }));
    }

    let result = suite.run().await;
    assert_eq!(result.passed, 4);
    assert_eq!(overlapped.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn tag_filter_runs_only_matching_cases() {
    let mut suite = Suite::detached(Arc::new(detached_config()));
    suite.add_case(case("smoke one", &["smoke"], |_| async { Ok(()) }));
    suite.add_case(case("regression one", &["regression"], |_| async { Ok(()) }));
    suite.add_case(case("smoke two", &["smoke", "ui"], |_| async { Ok(()) }));

    suite.retain_tag("smoke");
    let result = suite.run().await;

    assert_eq!(result.total, 2);
    assert!(result
        .reports
        .iter()
        .all(|r| r.tags.iter().any(|t| t == "smoke")));
}

#[tokio::test]
async fn generated_cases_run_one_per_fixture_row() {
    use storefront_e2e::generator::{describe_json, expand};

    let rows = storefront_e2e::fixtures::invalid_checkout_info();
    let expected = rows.len();

    let mut suite = Suite::detached(Arc::new(detached_config()));
    for record in expand("rejects incomplete data", rows, describe_json) {
        let storefront_e2e::generator::TestRecord {
            description,
            fixture,
        } = record;
        suite.add_case(case(&description, &["generated"], move |_| {
            let complete = fixture.is_complete();
            async move {
                if complete {
                    Err(HarnessError::Assertion("row should be incomplete".into()))
                } else {
                    Ok(())
                }
            }
        }));
    }

    let result = suite.run().await;
    assert_eq!(result.total, expected);
    assert_eq!(result.passed, expected);
}

#[tokio::test]
async fn skip_all_reports_every_case_without_running_it() {
    let ran = Arc::new(AtomicUsize::new(0));

    let mut suite = Suite::detached(Arc::new(detached_config()));
    for name in ["a", "b"] {
        let ran = Arc::clone(&ran);
        suite.add_case(case(name, &["x"], move |_| {
            let ran = Arc::clone(&ran);
            async move {
                ran.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        }));
    }

    let result = suite.skip_all("no deployment configured");
    assert_eq!(result.total, 2);
    assert_eq!(result.skipped, 2);
    assert_eq!(result.passed, 0);
    assert!(result.all_passed());
    assert!(result
        .reports
        .iter()
        .all(|r| r.outcome == Outcome::Skipped && r.attempts == 0));
    assert_eq!(ran.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn results_document_round_trips_as_json() {
    let mut suite = Suite::detached(Arc::new(detached_config()));
    suite.add_case(case("only", &["smoke"], |_| async { Ok(()) }));

    let result = suite.run().await;
    let dir = tempfile::tempdir().unwrap();
    let path = result.write_json(dir.path()).unwrap();

    let doc: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
    assert_eq!(doc["total"], 1);
    assert_eq!(doc["reports"][0]["name"], "only");
    assert_eq!(doc["reports"][0]["outcome"], "passed");
}
