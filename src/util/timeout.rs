//! Timeout helper.

use std::future::Future;
use std::time::Duration;

use crate::error::RefreshError;

/// Wrap a refresh exchange with a hard deadline.
///
/// Elapsed deadlines become [`RefreshError::Timeout`], so a stalled endpoint can
/// never hold a refresh episode open indefinitely.
pub async fn with_timeout<T>(
    duration: Duration,
    future: impl Future<Output = Result<T, RefreshError>>,
) -> Result<T, RefreshError> {
    match tokio::time::timeout(duration, future).await {
        Ok(result) => result,
        Err(_) => Err(RefreshError::Timeout(duration.as_millis() as u64)),
    }
}
