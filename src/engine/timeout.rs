// SPDX-License-Identifier: Apache-2.0

//! Deadlines for backend calls.

use std::future::Future;
use std::time::Duration;

use tokio::time::timeout;

use crate::engine::error::{EngineError, EngineResult};

pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(15);
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(15);
pub const PING_TIMEOUT: Duration = Duration::from_secs(10);

/// Query deadline for a configured number of seconds; `<= 0` means the default.
pub fn query_timeout(secs: i64) -> Duration {
    if secs > 0 {
        Duration::from_secs(secs as u64)
    } else {
        DEFAULT_QUERY_TIMEOUT
    }
}

/// Runs `fut` under `deadline`. Expiry drops the future and yields `Timeout`.
pub async fn within<T, F>(deadline: Duration, fut: F) -> EngineResult<T>
where
    F: Future<Output = EngineResult<T>>,
{
    match timeout(deadline, fut).await {
        Ok(result) => result,
        Err(_) => {
            crate::metrics::record_timeout();
            Err(EngineError::Timeout {
                timeout_ms: deadline.as_millis() as u64,
            })
        }
    }
}
