use std::future::Future;
use std::time::Duration;

use crate::error::OpsError;

/// Bounds a future, mapping expiry to [`OpsError::Timeout`].
///
/// Thin wrapper over `tokio::time::timeout` so that callers wrapping device
/// or broker I/O get a failure that retry policies can filter by kind.
pub async fn with_timeout<F, T>(fut: F, timeout: Duration) -> Result<T, OpsError>
where
    F: Future<Output = T>,
{
    tokio::time::timeout(timeout, fut)
        .await
        .map_err(|_| OpsError::Timeout { after: timeout })
}
