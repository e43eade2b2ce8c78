//! Page Object Model for the storefront.
//!
//! Each page object binds one application screen to intention-revealing
//! operations over the raw driver session, hiding selector details. A page
//! object borrows exactly one [`DriverSession`](crate::driver::DriverSession)
//! and the suite [`HarnessConfig`](crate::config::HarnessConfig); it is never
//! shared across tests.

mod cart;
mod checkout;
mod login;

pub use cart::CartPage;
pub use checkout::CheckoutPage;
pub use login::LoginPage;

use std::future::Future;
use std::time::{Duration, Instant};

use crate::error::HarnessResult;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Poll `check` until it reports true or `timeout` elapses. Returns whether
/// the condition was met; driver errors propagate immediately.
pub(crate) async fn eventually<F, Fut>(timeout: Duration, mut check: F) -> HarnessResult<bool>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = HarnessResult<bool>>,
{
    let deadline = Instant::now() + timeout;
    loop {
        if check().await? {
            return Ok(true);
        }
        if Instant::now() >= deadline {
            return Ok(false);
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn eventually_returns_on_first_success() {
        let calls = AtomicUsize::new(0);
        let met = eventually(Duration::from_secs(1), || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move { Ok(n >= 2) }
        })
        .await
        .unwrap();
        assert!(met);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn eventually_gives_up_after_deadline() {
        let met = eventually(Duration::from_millis(50), || async { Ok(false) })
            .await
            .unwrap();
        assert!(!met);
    }
}
