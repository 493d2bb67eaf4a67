use std::future::Future;
use std::time::Instant;

use tokio::time::sleep;

use crate::error::OpsError;
use crate::utils::with_timeout;

use super::policy::Retrier;

impl Retrier {
    /// Runs an asynchronous operation under this policy.
    ///
    /// `op` is called once per attempt. Waits between attempts suspend only
    /// the calling task; cancelling that task cancels the retry loop, and no
    /// further attempts run.
    pub async fn run<F, Fut, T>(&self, mut op: F) -> Result<T, OpsError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, OpsError>>,
    {
        let mut attempt = 1u32;

        loop {
            let result = match self.timeout {
                Some(limit) => with_timeout(op(), limit).await.and_then(|res| res),
                None => op().await,
            };

            match result {
                Ok(value) => return Ok(value),
                Err(err) => {
                    if attempt >= self.max_attempts || !self.should_retry(&err) {
                        log::debug!("Giving up after {attempt} attempt(s): {err}");
                        return Err(err);
                    }
                    if let Some(callback) = self.on_retry.as_deref() {
                        callback(&err)?;
                    }
                    let wait = self.calculate_delay(attempt);
                    log::warn!(
                        "Attempt {attempt}/{} failed: {err}; retrying in {wait:?}",
                        self.max_attempts
                    );
                    sleep(wait).await;
                    attempt += 1;
                }
            }
        }
    }

    /// Runs a synchronous operation under this policy.
    ///
    /// Waits between attempts block the calling thread. A configured
    /// [`timeout`](Retrier::with_timeout) is checked against the attempt's
    /// elapsed wall time once it returns: a late result, success included, is
    /// discarded and replaced with [`OpsError::Timeout`]. The attempt itself
    /// is not pre-empted.
    pub fn run_blocking<F, T>(&self, mut op: F) -> Result<T, OpsError>
    where
        F: FnMut() -> Result<T, OpsError>,
    {
        let mut attempt = 1u32;

        loop {
            let started = Instant::now();
            let mut result = op();
            if let Some(limit) = self.timeout {
                if started.elapsed() > limit {
                    result = Err(OpsError::Timeout { after: limit });
                }
            }

            match result {
                Ok(value) => return Ok(value),
                Err(err) => {
                    if attempt >= self.max_attempts || !self.should_retry(&err) {
                        log::debug!("Giving up after {attempt} attempt(s): {err}");
                        return Err(err);
                    }
                    if let Some(callback) = self.on_retry.as_deref() {
                        callback(&err)?;
                    }
                    let wait = self.calculate_delay(attempt);
                    log::warn!(
                        "Attempt {attempt}/{} failed: {err}; retrying in {wait:?}",
                        self.max_attempts
                    );
                    std::thread::sleep(wait);
                    attempt += 1;
                }
            }
        }
    }

    /// Wraps an asynchronous operation, decorator style.
    ///
    /// The returned [`Retried`] is a callable of the same signature that
    /// applies this policy on every [`call`](Retried::call). Each call starts
    /// a fresh attempt counter.
    pub fn wrap<F, Fut, T>(self, op: F) -> Retried<F>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, OpsError>>,
    {
        Retried { retrier: self, op }
    }

    /// Wraps a synchronous operation, decorator style.
    pub fn wrap_blocking<F, T>(self, op: F) -> RetriedBlocking<F>
    where
        F: FnMut() -> Result<T, OpsError>,
    {
        RetriedBlocking { retrier: self, op }
    }
}

/// An asynchronous callable wrapped with a retry policy.
pub struct Retried<F> {
    retrier: Retrier,
    op: F,
}

impl<F, Fut, T> Retried<F>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, OpsError>>,
{
    /// Invokes the wrapped operation under the policy.
    pub async fn call(&mut self) -> Result<T, OpsError> {
        self.retrier.run(&mut self.op).await
    }
}

/// A synchronous callable wrapped with a retry policy.
pub struct RetriedBlocking<F> {
    retrier: Retrier,
    op: F,
}

impl<F, T> RetriedBlocking<F>
where
    F: FnMut() -> Result<T, OpsError>,
{
    /// Invokes the wrapped operation under the policy.
    pub fn call(&mut self) -> Result<T, OpsError> {
        self.retrier.run_blocking(&mut self.op)
    }
}
