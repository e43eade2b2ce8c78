//! Network-response correlation.
//!
//! Matches only responses observed from the watch's start forward: the
//! bridge tags every response with a monotonic sequence number, and a
//! watch records the sequence at construction so stale responses can
//! never satisfy a later expectation.

use std::time::Duration;

use crate::driver::{DriverSession, ResponseRecord};
use crate::error::{HarnessError, HarnessResult};

pub const DEFAULT_EXPECTED_STATUS: u16 = 200;
pub const DEFAULT_RESPONSE_TIMEOUT: Duration = Duration::from_millis(5_000);

/// A correlation point: begin the watch, trigger the action, then expect.
pub struct ResponseWatch<'a> {
    session: &'a DriverSession,
    watermark: u64,
}

impl<'a> ResponseWatch<'a> {
    pub async fn begin(session: &'a DriverSession) -> HarnessResult<ResponseWatch<'a>> {
        let watermark = session.response_watermark().await?;
        Ok(Self { session, watermark })
    }

    /// Wait for a response whose URL contains `url_part` with the given
    /// status, bounded by `timeout`. Postcondition: the matched response
    /// reported ok.
    pub async fn expect(
        self,
        url_part: &str,
        status: u16,
        timeout: Duration,
    ) -> HarnessResult<ResponseRecord> {
        let response = self
            .session
            .wait_for_response(url_part, status, self.watermark, timeout)
            .await?;

        if !response.ok {
            return Err(HarnessError::Assertion(format!(
                "response for `{url_part}` was not ok: status {}",
                response.status
            )));
        }
        Ok(response)
    }
}
